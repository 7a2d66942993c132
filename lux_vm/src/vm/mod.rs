//! The virtual machine: a PC-driven interpreter over the linked
//! instruction buffer, with an operand stack and a chain of scoped
//! frames rooted at the global frame.

pub mod error;
mod exec;
pub(crate) mod frame;
pub mod instr;

pub use error::VmError;
pub use instr::Instr;

use crate::compile::Compiler;
use crate::error::LuxError;
use crate::gc::{HeapObject, ObjPayload, ObjRef};
use crate::runtime::{ImportConfig, Runtime};
use crate::value::{ops, Value, ValueType};
use frame::Frame;

/// One interpreter instance: runtime state plus execution state.
///
/// The bytecode buffer is append-only; `compile` adds a chunk and
/// `run` resumes from wherever the previous run stopped, which is what
/// keeps a REPL session's globals alive between inputs.
#[derive(Debug)]
pub struct Vm {
    pub(crate) rt: Runtime,
    pub(crate) pc: usize,
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: Vec<Frame>,
    /// Values that must stay rooted while off the operand stack
    /// (native call arguments, a popped constructor operand).
    pub(crate) transient_roots: Vec<Value>,
    /// When set, native print output is captured here instead of
    /// going to stdout.
    pub(crate) output: Option<String>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_runtime(Runtime::new())
    }

    pub fn with_import_config(imports: ImportConfig) -> Self {
        Self::with_runtime(Runtime::with_import_config(imports))
    }

    fn with_runtime(rt: Runtime) -> Self {
        let mut vm = Self {
            rt,
            pc: 0,
            stack: Vec::with_capacity(256),
            frames: vec![Frame::global()],
            transient_roots: Vec::new(),
            output: None,
        };
        vm.preload_native_bindings();
        vm
    }

    // ==================== public API ====================

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    /// Parse and lower a chunk, appending to the bytecode buffer. A
    /// failed compilation rolls the buffer and module registry back so
    /// no half-lowered instructions are ever executed.
    pub fn compile(&mut self, source: &str) -> Result<(), LuxError> {
        let code_checkpoint = self.rt.code.len();
        let modules_checkpoint = self.rt.modules.len();

        let result = lux_vm_parser::parse(source)
            .map_err(LuxError::Parse)
            .and_then(|program| {
                Compiler::new(&mut self.rt)
                    .compile_chunk(&program)
                    .map_err(LuxError::Compile)
            });

        if result.is_err() {
            self.rt.code.truncate(code_checkpoint);
            self.rt.modules.truncate(modules_checkpoint);
        }
        result
    }

    /// Execute from the current PC to the end of the buffer.
    pub fn run(&mut self) -> Result<(), LuxError> {
        self.execute().map_err(LuxError::Runtime)
    }

    pub fn eval(&mut self, source: &str) -> Result<(), LuxError> {
        self.compile(source)?;
        self.run()
    }

    /// Value of a global binding, if any.
    pub fn global(&self, name: &str) -> Option<Value> {
        let handle = self.rt.strings.get(name)?;
        self.frames.first()?.variables.get(&handle).copied()
    }

    /// Install a global binding from the host.
    pub fn define_global(&mut self, name: &str, value: Value) {
        let handle = self.rt.intern(name);
        if let Some(frame) = self.frames.first_mut() {
            frame.variables.insert(handle, value);
        }
    }

    pub fn display_value(&self, value: &Value) -> String {
        value.display(&self.rt.heap)
    }

    /// Bounds-checked array element read, for embedding hosts.
    pub fn array_element(&self, array: &Value, index: i64) -> Result<Value, VmError> {
        if array.tag() != ValueType::Array {
            return Err(VmError::TypeError(format!(
                "expected Array, got {}",
                array.tag().name()
            )));
        }
        let array_ref = array
            .obj()
            .ok_or_else(|| VmError::InternalError("array value without handle".into()))?;
        let elements = self
            .obj(array_ref)?
            .as_array()
            .ok_or_else(|| VmError::InternalError("array value with non-array payload".into()))?;

        let len = elements.len();
        if index < 0 {
            return Err(VmError::IndexOutOfBounds { index, len });
        }
        elements
            .get(index as usize)
            .ok_or(VmError::IndexOutOfBounds { index, len })
    }

    /// Route native print output into an in-memory buffer.
    pub fn capture_output(&mut self) {
        if self.output.is_none() {
            self.output = Some(String::new());
        }
    }

    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Some(buffer) => std::mem::take(buffer),
            None => String::new(),
        }
    }

    pub fn set_gc_enabled(&mut self, enabled: bool) {
        self.rt.heap.set_enabled(enabled);
    }

    pub fn gc_enabled(&self) -> bool {
        self.rt.heap.is_enabled()
    }

    /// Force a stop-the-world collection with the current stacks as
    /// roots.
    pub fn collect_garbage(&mut self) {
        let roots = self.gather_roots();
        self.rt.heap.collect(&roots);
    }

    /// Discard a failed run's leftovers: clear the operand stack, drop
    /// frames down to the global frame and skip past the remaining
    /// instructions of the failed chunk. Global bindings survive, so a
    /// session can keep going.
    pub fn reset_execution_state(&mut self) {
        self.stack.clear();
        self.frames.truncate(1);
        self.transient_roots.clear();
        self.pc = self.rt.code.len();
    }

    // ==================== execution loop ====================

    pub(crate) fn execute(&mut self) -> Result<(), VmError> {
        while self.pc < self.rt.code.len() {
            let instr = self.rt.code[self.pc].clone();
            let jumped = self.step(instr)?;
            if !jumped {
                self.pc += 1;
            }
        }
        Ok(())
    }

    /// Dispatch one instruction. Returns whether the handler set the
    /// PC itself.
    fn step(&mut self, instr: Instr) -> Result<bool, VmError> {
        match instr {
            Instr::LoadConst(value) => self.push(value),
            Instr::DeclareIdentifier(name) => self.declare_identifier(name)?,
            Instr::LoadIdentifier(name) => {
                let value = self
                    .lookup_identifier(name)
                    .ok_or_else(|| VmError::NameError(self.rt.string_text(name)))?;
                self.push(value);
            }
            Instr::StoreIdentifier(name) => {
                let value = self.pop()?;
                self.store_identifier(name, value)?;
            }
            Instr::LoadMember(name) => self.exec_load_member(name)?,
            Instr::StoreMember(name) => self.exec_store_member(name)?,
            Instr::LoadModule(id) => self.exec_load_module(id)?,
            Instr::PopStack => {
                self.pop()?;
            }
            Instr::Peek => {
                let top = *self.stack.last().ok_or(VmError::StackUnderflow)?;
                self.push(top);
            }
            Instr::ToBool => {
                let value = self.pop()?;
                self.push(Value::bool_(value.to_bool()?));
            }

            Instr::Add => self.binary_op(ops::add)?,
            Instr::Sub => self.binary_op(ops::sub)?,
            Instr::Mul => self.binary_op(ops::mul)?,
            Instr::Div => self.binary_op(ops::div)?,
            Instr::Mod => self.binary_op(ops::modulo)?,
            Instr::And => self.binary_op(ops::band)?,
            Instr::Or => self.binary_op(ops::bor)?,
            Instr::Xor => self.binary_op(ops::bxor)?,
            Instr::Shl => self.binary_op(ops::shl)?,
            Instr::Shr => self.binary_op(ops::shr)?,
            Instr::LogicalAnd => self.binary_op(ops::land)?,
            Instr::LogicalOr => self.binary_op(ops::lor)?,
            Instr::CmpEq => self.binary_op(ops::eq)?,
            Instr::CmpNe => self.binary_op(ops::ne)?,
            Instr::CmpLt => self.binary_op(ops::lt)?,
            Instr::CmpLe => self.binary_op(ops::le)?,
            Instr::CmpGt => self.binary_op(ops::gt)?,
            Instr::CmpGe => self.binary_op(ops::ge)?,

            Instr::Negate => self.unary_op(ops::neg)?,
            Instr::Not => self.unary_op(ops::bnot)?,
            Instr::LogicalNot => self.unary_op(ops::lnot)?,

            Instr::Jmp(target) => return self.exec_jump(target),
            Instr::JmpIfFalse(target) => return self.exec_jump_if_false(target),
            Instr::JmpRel(offset) => return self.exec_jump_rel(offset),
            Instr::JmpIfFalseRel(offset) => return self.exec_jump_if_false_rel(offset),

            Instr::Call(arg_count) => return self.exec_call(arg_count),
            Instr::Ret => return self.exec_ret(),

            Instr::BeginLocal => {
                self.frames.push(Frame::new(self.pc + 1, false));
            }
            Instr::BeginLocalDerived => {
                self.frames.push(Frame::new(self.pc + 1, true));
            }
            Instr::EndLocal => {
                if self.frames.len() <= 1 {
                    return Err(VmError::InternalError(
                        "END_LOCAL would pop the global frame".into(),
                    ));
                }
                self.frames.pop();
            }

            Instr::MakeType => self.exec_make_type()?,
            Instr::MakeObject(field_names) => self.exec_make_object(&field_names)?,
            Instr::MakeModule(id) => self.exec_make_module(id)?,
            Instr::MakeModuleLocal => {
                self.exec_make_module_local()?;
            }
        }
        Ok(false)
    }

    // ==================== stack helpers ====================

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Result<Value, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn binary_op(
        &mut self,
        op: fn(&Value, &Value) -> Result<Value, VmError>,
    ) -> Result<(), VmError> {
        // The left operand entered the stack first, so the right one
        // is on top.
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        let result = op(&lhs, &rhs)?;
        self.push(result);
        Ok(())
    }

    fn unary_op(&mut self, op: fn(&Value) -> Result<Value, VmError>) -> Result<(), VmError> {
        let operand = self.pop()?;
        let result = op(&operand)?;
        self.push(result);
        Ok(())
    }

    // ==================== identifier resolution ====================

    fn declare_identifier(&mut self, name: ObjRef) -> Result<(), VmError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| VmError::InternalError("no current frame".into()))?;
        frame.variables.insert(name, Value::null());
        Ok(())
    }

    /// Walk the live frame chain top-down, honoring propagation flags;
    /// consult the current function's frozen context; fall through to
    /// globals.
    pub(crate) fn lookup_identifier(&self, name: ObjRef) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.variables.get(&name) {
                return Some(*value);
            }
            if !frame.allow_propagation {
                break;
            }
        }

        if let Some(mut context_ref) = self.frames.last().and_then(|f| f.context) {
            loop {
                let Some(ObjPayload::Context(context)) =
                    self.rt.heap.get(context_ref).map(|o| &o.payload)
                else {
                    break;
                };
                if let Some(value) = context.query(name) {
                    return Some(value);
                }
                match context.next {
                    Some(next) => context_ref = next,
                    None => break,
                }
            }
        }

        self.frames.first()?.variables.get(&name).copied()
    }

    /// Store into the frame where the walk finds the name, falling
    /// through to globals; unknown names are an error.
    pub(crate) fn store_identifier(&mut self, name: ObjRef, value: Value) -> Result<(), VmError> {
        let mut target = None;
        for index in (0..self.frames.len()).rev() {
            if self.frames[index].variables.contains_key(&name) {
                target = Some(index);
                break;
            }
            if !self.frames[index].allow_propagation {
                break;
            }
        }

        let index = match target {
            Some(index) => index,
            None if self.frames[0].variables.contains_key(&name) => 0,
            None => return Err(VmError::NameError(self.rt.string_text(name))),
        };
        self.frames[index].variables.insert(name, value);
        Ok(())
    }

    // ==================== heap access ====================

    pub(crate) fn obj(&self, r: ObjRef) -> Result<&HeapObject, VmError> {
        self.rt
            .heap
            .get(r)
            .ok_or_else(|| VmError::InternalError(format!("dangling object handle {}", r.index())))
    }

    pub(crate) fn obj_mut(&mut self, r: ObjRef) -> Result<&mut HeapObject, VmError> {
        self.rt
            .heap
            .get_mut(r)
            .ok_or_else(|| VmError::InternalError(format!("dangling object handle {}", r.index())))
    }

    /// The effective type descriptor of a value: its attached pointer,
    /// or the primitive singleton implied by its tag.
    pub(crate) fn value_type_descriptor(&self, value: &Value) -> ObjRef {
        if let Some(descriptor) = value.type_info() {
            return descriptor;
        }
        let types = &self.rt.types;
        match value.tag() {
            ValueType::Bool => types.bool_,
            ValueType::Int => types.int,
            ValueType::Float => types.float,
            ValueType::String => types.string,
            ValueType::Function => types.function,
            ValueType::Array => types.array,
            ValueType::Object => types.object,
            ValueType::Module => types.any,
            ValueType::Type => types.type_,
            ValueType::Unit => types.unit,
            ValueType::Null => types.null,
            ValueType::Unknown => types.any,
        }
    }

    pub(crate) fn describe(&self, value: &Value) -> String {
        value.display(&self.rt.heap)
    }

    // ==================== allocation & roots ====================

    /// Allocation is the only GC safepoint: run the collector first
    /// when the heuristics ask for it, then allocate.
    pub(crate) fn alloc(&mut self, payload: ObjPayload) -> Result<ObjRef, VmError> {
        self.maybe_collect();
        self.rt.heap.alloc(payload)
    }

    pub(crate) fn maybe_collect(&mut self) {
        if self.rt.heap.wants_collect() {
            let roots = self.gather_roots();
            self.rt.heap.collect(&roots);
        }
    }

    /// Every handle the collector must treat as live: operand stack
    /// values, frame variables (names and values), frozen contexts and
    /// values parked in `transient_roots`.
    pub(crate) fn gather_roots(&self) -> Vec<ObjRef> {
        let mut roots = Vec::new();
        for value in &self.stack {
            value.referenced_objects(&mut roots);
        }
        for frame in &self.frames {
            for (name, value) in &frame.variables {
                roots.push(*name);
                value.referenced_objects(&mut roots);
            }
            if let Some(context) = frame.context {
                roots.push(context);
            }
        }
        for value in &self.transient_roots {
            value.referenced_objects(&mut roots);
        }
        roots
    }
}
