//! The instruction set of the linked bytecode program.

use crate::gc::ObjRef;
use crate::value::Value;

/// One instruction. Identifier payloads are interned string handles;
/// jump payloads are instruction indices (absolute) or signed offsets
/// relative to the jump's own index.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Push a constant value.
    LoadConst(Value),
    /// Create an entry (initialized to Null) in the current frame.
    DeclareIdentifier(ObjRef),
    /// Push the value bound to a name.
    LoadIdentifier(ObjRef),
    /// Pop and store into the first frame containing the name.
    StoreIdentifier(ObjRef),
    /// Pop an object, push one of its fields.
    LoadMember(ObjRef),
    /// Pop a value, pop an object, store the field.
    StoreMember(ObjRef),
    /// Push a registered module's object.
    LoadModule(usize),
    /// Discard the top of stack.
    PopStack,
    /// Duplicate the top of stack.
    Peek,
    /// Replace the top of stack by its Bool coercion.
    ToBool,

    // Binary operators: pop two, push result.
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    LogicalAnd,
    LogicalOr,
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,

    // Unary operators: pop one, push result.
    Negate,
    Not,
    LogicalNot,

    /// Unconditional jump to an absolute instruction index.
    Jmp(usize),
    /// Pop a condition; jump to an absolute index when false.
    JmpIfFalse(usize),
    /// Unconditional jump relative to this instruction's index.
    JmpRel(isize),
    /// Pop a condition; relative jump when false.
    JmpIfFalseRel(isize),

    /// Pop the callee, pop that many arguments, invoke.
    Call(usize),
    /// Pop the return value, pop the frame, resume at its return
    /// address, push the return value back.
    Ret,

    /// Push a frame with identifier propagation off.
    BeginLocal,
    /// Push a frame with identifier propagation on.
    BeginLocalDerived,
    /// Pop the innermost frame.
    EndLocal,

    /// Fold the current frame's bindings into a Type and push it.
    MakeType,
    /// Pop a type descriptor, pop one value per listed field name (the
    /// list is reversed relative to source order), assemble an object.
    MakeObject(Vec<ObjRef>),
    /// Fold the current frame into a Module, push it, and register the
    /// object under the given module id.
    MakeModule(usize),
    /// Fold the current frame into a Module and push it.
    MakeModuleLocal,
}

impl Instr {
    /// Mnemonic used by the disassembler.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::LoadConst(_) => "LOAD_CONST",
            Instr::DeclareIdentifier(_) => "DECLARE_IDENTIFIER",
            Instr::LoadIdentifier(_) => "LOAD_IDENTIFIER",
            Instr::StoreIdentifier(_) => "STORE_IDENTIFIER",
            Instr::LoadMember(_) => "LOAD_MEMBER",
            Instr::StoreMember(_) => "STORE_MEMBER",
            Instr::LoadModule(_) => "LOAD_MODULE",
            Instr::PopStack => "POP_STACK",
            Instr::Peek => "PEEK",
            Instr::ToBool => "TO_BOOL",
            Instr::Add => "ADD",
            Instr::Sub => "SUB",
            Instr::Mul => "MUL",
            Instr::Div => "DIV",
            Instr::Mod => "MOD",
            Instr::And => "AND",
            Instr::Or => "OR",
            Instr::Xor => "XOR",
            Instr::Shl => "SHL",
            Instr::Shr => "SHR",
            Instr::LogicalAnd => "LOGICAL_AND",
            Instr::LogicalOr => "LOGICAL_OR",
            Instr::CmpEq => "CMP_EQ",
            Instr::CmpNe => "CMP_NE",
            Instr::CmpLt => "CMP_LT",
            Instr::CmpLe => "CMP_LE",
            Instr::CmpGt => "CMP_GT",
            Instr::CmpGe => "CMP_GE",
            Instr::Negate => "NEGATE",
            Instr::Not => "NOT",
            Instr::LogicalNot => "LOGICAL_NOT",
            Instr::Jmp(_) => "JMP",
            Instr::JmpIfFalse(_) => "JMP_IF_FALSE",
            Instr::JmpRel(_) => "JMP_REL",
            Instr::JmpIfFalseRel(_) => "JMP_IF_FALSE_REL",
            Instr::Call(_) => "CALL",
            Instr::Ret => "RET",
            Instr::BeginLocal => "BEGIN_LOCAL",
            Instr::BeginLocalDerived => "BEGIN_LOCAL_DERIVED",
            Instr::EndLocal => "END_LOCAL",
            Instr::MakeType => "MAKE_TYPE",
            Instr::MakeObject(_) => "MAKE_OBJECT",
            Instr::MakeModule(_) => "MAKE_MODULE",
            Instr::MakeModuleLocal => "MAKE_MODULE_LOCAL",
        }
    }
}
