//! Jump instructions, absolute and relative.

use super::super::Vm;
use crate::vm::error::VmError;

impl Vm {
    pub(crate) fn exec_jump(&mut self, target: usize) -> Result<bool, VmError> {
        self.pc = target;
        Ok(true)
    }

    pub(crate) fn exec_jump_if_false(&mut self, target: usize) -> Result<bool, VmError> {
        let condition = self.pop()?.to_bool()?;
        if !condition {
            self.pc = target;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn exec_jump_rel(&mut self, offset: isize) -> Result<bool, VmError> {
        self.pc = self.relative_target(offset)?;
        Ok(true)
    }

    pub(crate) fn exec_jump_if_false_rel(&mut self, offset: isize) -> Result<bool, VmError> {
        let condition = self.pop()?.to_bool()?;
        if !condition {
            self.pc = self.relative_target(offset)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn relative_target(&self, offset: isize) -> Result<usize, VmError> {
        let target = self.pc as isize + offset;
        if target < 0 {
            return Err(VmError::InternalError(format!(
                "relative jump from {} by {} escapes the program",
                self.pc, offset
            )));
        }
        Ok(target as usize)
    }
}
