//! Runtime errors surfaced from VM execution.

/// Runtime errors. None are catchable from the scripting language;
/// all propagate to the host and terminate the run.
#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    /// Operator applied to incompatible operand tags, a non-scalar in
    /// a boolean position, and similar misuse.
    TypeError(String),
    /// Integer division/modulo by zero and kin.
    DomainError(String),
    /// Identifier not found in any reachable frame or globals.
    NameError(String),
    /// CALL argument count does not match the declared arity.
    ArityError { expected: usize, got: usize },
    /// Allocation would exceed the hard heap maximum.
    HeapOverflow { requested: usize, max: usize },
    /// Member access on a value without that field.
    FieldNotFound(String),
    /// Member access on a non-object value.
    NotAnObject(String),
    /// CALL on a non-function value.
    NotAFunction(String),
    /// MAKE_OBJECT on a non-type value.
    NotAType(String),
    /// MAKE_TYPE over a frame binding that is neither a type nor a
    /// function.
    TypeConstruction(String),
    /// Array access past the end.
    IndexOutOfBounds { index: i64, len: usize },
    /// An instruction popped more values than the stack holds.
    StackUnderflow,
    /// LOAD_MODULE for an id that is not registered or not yet built.
    UnknownModule(usize),
    /// `__builtin_runtime_abort` was called.
    Aborted(String),
    /// Host I/O failure inside a native binding.
    IoError(String),
    /// Invariant violation inside the VM itself.
    InternalError(String),
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeError(msg) => write!(f, "type error: {}", msg),
            Self::DomainError(msg) => write!(f, "domain error: {}", msg),
            Self::NameError(name) => write!(f, "identifier not found: {}", name),
            Self::ArityError { expected, got } => {
                write!(
                    f,
                    "function argument count mismatch, expected {} got {}",
                    expected, got
                )
            }
            Self::HeapOverflow { requested, max } => {
                write!(
                    f,
                    "heap memory overflow: allocation of {} bytes exceeds maximum of {} bytes",
                    requested, max
                )
            }
            Self::FieldNotFound(name) => {
                write!(f, "object does not contain such field: {}", name)
            }
            Self::NotAnObject(what) => write!(f, "not a valid object: {}", what),
            Self::NotAFunction(what) => write!(f, "cannot invoke non-function: {}", what),
            Self::NotAType(what) => {
                write!(f, "not a valid type for object creation: {}", what)
            }
            Self::TypeConstruction(what) => {
                write!(f, "not a valid type member: {}", what)
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of range for array of length {}", index, len)
            }
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::UnknownModule(id) => write!(f, "unknown module id: {}", id),
            Self::Aborted(msg) => write!(f, "aborted: {}", msg),
            Self::IoError(msg) => write!(f, "i/o error: {}", msg),
            Self::InternalError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for VmError {}
