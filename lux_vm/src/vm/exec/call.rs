//! CALL and RET.

use super::super::frame::Frame;
use super::super::Vm;
use crate::gc::FunctionKind;
use crate::value::ValueType;
use crate::vm::error::VmError;

impl Vm {
    /// Pop the callee and `arg_count` arguments, then invoke.
    ///
    /// Native functions run in place, no frame pushed. Bytecode
    /// functions get an arity check — a non-method called with one
    /// extra argument silently discards the top of stack, which is how
    /// a plain function called through the method path sheds the
    /// receiver — then a fresh non-propagating frame and a jump to the
    /// resolved entry point.
    pub(crate) fn exec_call(&mut self, arg_count: usize) -> Result<bool, VmError> {
        let callee = self.pop()?;
        if callee.tag() != ValueType::Function {
            return Err(VmError::NotAFunction(self.describe(&callee)));
        }
        let function_ref = callee
            .obj()
            .ok_or_else(|| VmError::InternalError("function value without handle".into()))?;
        let function = self
            .obj(function_ref)?
            .as_function()
            .ok_or_else(|| VmError::InternalError("function value with non-function payload".into()))?;
        let kind = function.kind;
        let context = function.context;

        match kind {
            FunctionKind::Native(id) => {
                // Arguments were pushed in reverse, so popping yields
                // them in declaration order.
                let mut args = Vec::with_capacity(arg_count);
                for _ in 0..arg_count {
                    args.push(self.pop()?);
                }
                // Keep the arguments rooted across native allocations.
                let mark = self.transient_roots.len();
                self.transient_roots.extend_from_slice(&args);
                let result = self.call_native(id, args);
                self.transient_roots.truncate(mark);
                let value = result?;
                self.push(value);
                Ok(false)
            }
            FunctionKind::Bytecode {
                module_id,
                begin_offset,
                arity,
                is_method,
            } => {
                if arg_count != arity {
                    if !is_method && arg_count == arity + 1 {
                        let _ = self.pop()?;
                    } else {
                        return Err(VmError::ArityError {
                            expected: arity,
                            got: arg_count,
                        });
                    }
                }

                let target = self
                    .rt
                    .modules
                    .resolve(module_id, begin_offset)
                    .ok_or(VmError::UnknownModule(module_id))?;
                self.frames
                    .push(Frame::new(self.pc + 1, false).with_context(context));
                self.pc = target;
                Ok(true)
            }
        }
    }

    /// Pop the return value, pop the frame, resume at the saved return
    /// address with the value back on the stack.
    pub(crate) fn exec_ret(&mut self) -> Result<bool, VmError> {
        let value = self.pop()?;
        if self.frames.len() <= 1 {
            return Err(VmError::InternalError(
                "RET would pop the global frame".into(),
            ));
        }
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| VmError::InternalError("frame chain empty".into()))?;
        self.pc = frame.return_addr;
        self.push(value);
        Ok(true)
    }
}
