//! Bytecode disassembler: per-instruction text, a numbered listing,
//! and a machine-readable JSON listing.

use serde::Serialize;

use crate::gc::Heap;
use crate::value::{Value, ValueType};
use crate::vm::instr::Instr;

/// Operand rendering for one instruction, if it has one.
fn operand(instr: &Instr, heap: &Heap) -> Option<String> {
    let name = |handle: &crate::gc::ObjRef| -> String {
        heap.get(*handle)
            .and_then(|o| o.as_str())
            .unwrap_or("<unknown>")
            .to_string()
    };

    match instr {
        Instr::LoadConst(value) => Some(render_const(value, heap)),
        Instr::DeclareIdentifier(h)
        | Instr::LoadIdentifier(h)
        | Instr::StoreIdentifier(h)
        | Instr::LoadMember(h)
        | Instr::StoreMember(h) => Some(name(h)),
        Instr::LoadModule(id) => Some(format!("[module id={}]", id)),
        Instr::Jmp(target) | Instr::JmpIfFalse(target) => Some(target.to_string()),
        Instr::JmpRel(offset) | Instr::JmpIfFalseRel(offset) => Some(offset.to_string()),
        Instr::Call(count) => Some(count.to_string()),
        Instr::MakeObject(fields) => {
            let rendered: Vec<String> = fields.iter().map(|h| name(h)).collect();
            Some(format!("[{}]", rendered.join(", ")))
        }
        Instr::MakeModule(id) => Some(format!("[module id={}]", id)),
        _ => None,
    }
}

fn render_const(value: &Value, heap: &Heap) -> String {
    match value.tag() {
        ValueType::String => format!("[string \"{}\"]", value.display(heap)),
        _ => value.display(heap),
    }
}

/// Text of one instruction, e.g. `LOAD_IDENTIFIER x`.
pub fn dump_instr(instr: &Instr, heap: &Heap) -> String {
    match operand(instr, heap) {
        Some(operand) => format!("{} {}", instr.mnemonic(), operand),
        None => instr.mnemonic().to_string(),
    }
}

/// Numbered listing of a whole program.
pub fn dump(code: &[Instr], heap: &Heap) -> String {
    let mut out = String::new();
    for (line, instr) in code.iter().enumerate() {
        out.push_str(&format!("{}: {}\n", line, dump_instr(instr, heap)));
    }
    out
}

/// One row of the JSON listing.
#[derive(Debug, Serialize)]
pub struct InstrRecord {
    pub pc: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
}

/// Machine-readable listing of a whole program.
pub fn to_json(code: &[Instr], heap: &Heap) -> serde_json::Result<String> {
    let records: Vec<InstrRecord> = code
        .iter()
        .enumerate()
        .map(|(pc, instr)| InstrRecord {
            pc,
            op: instr.mnemonic(),
            operand: operand(instr, heap),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}
