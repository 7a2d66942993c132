//! Errors produced while lowering the AST to bytecode.

use lux_vm_parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A statement form the lowering does not handle.
    UnsupportedStatement(String),
    /// Assignment to something that is not an identifier or member.
    InvalidLvalue(String),
    /// Assignment used where a value is required.
    AssignmentAsValue,
    /// Malformed initializer list (duplicate fields and kin).
    InvalidInitializer(String),
    /// `break` outside of a loop body.
    BreakOutsideLoop,
    /// `continue` outside of a loop body.
    ContinueOutsideLoop,
    /// Imported module file was not found on the search paths.
    ModuleNotFound(String),
    /// Imported module file failed to parse.
    ModuleParse { path: String, error: ParseError },
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedStatement(what) => {
                write!(f, "unsupported statement: {}", what)
            }
            Self::InvalidLvalue(what) => {
                write!(f, "assigning value to an invalid lvalue expression: {}", what)
            }
            Self::AssignmentAsValue => {
                write!(f, "assignment does not produce a value")
            }
            Self::InvalidInitializer(what) => {
                write!(f, "malformed initializer list: {}", what)
            }
            Self::BreakOutsideLoop => write!(f, "'break' outside of a loop"),
            Self::ContinueOutsideLoop => write!(f, "'continue' outside of a loop"),
            Self::ModuleNotFound(path) => write!(f, "module '{}' not found", path),
            Self::ModuleParse { path, error } => {
                write!(f, "module '{}' failed to parse: {}", path, error)
            }
        }
    }
}

impl std::error::Error for CompileError {}
