//! Umbrella error for the parse → compile → run pipeline.

use lux_vm_parser::ParseError;

use crate::compile::CompileError;
use crate::vm::error::VmError;

#[derive(Debug, Clone, PartialEq)]
pub enum LuxError {
    /// Source text failed to parse.
    Parse(ParseError),
    /// Lowering to bytecode failed.
    Compile(CompileError),
    /// Execution failed.
    Runtime(VmError),
}

impl std::fmt::Display for LuxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LuxError::Parse(e) => write!(f, "parse error: {}", e),
            LuxError::Compile(e) => write!(f, "compile error: {}", e),
            LuxError::Runtime(e) => write!(f, "runtime error: {}", e),
        }
    }
}

impl std::error::Error for LuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LuxError::Parse(e) => Some(e),
            LuxError::Compile(e) => Some(e),
            LuxError::Runtime(e) => Some(e),
        }
    }
}

impl From<ParseError> for LuxError {
    fn from(e: ParseError) -> Self {
        LuxError::Parse(e)
    }
}

impl From<CompileError> for LuxError {
    fn from(e: CompileError) -> Self {
        LuxError::Compile(e)
    }
}

impl From<VmError> for LuxError {
    fn from(e: VmError) -> Self {
        LuxError::Runtime(e)
    }
}
