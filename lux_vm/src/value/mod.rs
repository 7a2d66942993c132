//! The tagged value type flowing through the operand stack and frames.

pub mod ops;

use crate::gc::{Heap, ObjPayload, ObjRef};
use crate::vm::error::VmError;

/// Value tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Function,
    Array,
    Object,
    Module,
    Type,
    Null,
    Unit,
    Unknown,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Bool => "Bool",
            ValueType::Int => "Int",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::Function => "Function",
            ValueType::Array => "Array",
            ValueType::Object => "Object",
            ValueType::Module => "Module",
            ValueType::Type => "Type",
            ValueType::Null => "Null",
            ValueType::Unit => "Unit",
            ValueType::Unknown => "Unknown",
        }
    }
}

/// Inline representation of a value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Repr {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Obj(ObjRef),
}

/// A tagged value with an attached type descriptor pointer.
///
/// `type_info` of `None` means "the primitive descriptor implied by the
/// tag"; it becomes `Some` when a store narrows the value to a declared
/// field type or an object is constructed from a descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    tag: ValueType,
    repr: Repr,
    type_info: Option<ObjRef>,
}

impl Value {
    // ==================== constructors ====================

    pub fn bool_(v: bool) -> Self {
        Self {
            tag: ValueType::Bool,
            repr: Repr::Bool(v),
            type_info: None,
        }
    }

    pub fn int(v: i64) -> Self {
        Self {
            tag: ValueType::Int,
            repr: Repr::Int(v),
            type_info: None,
        }
    }

    pub fn float(v: f64) -> Self {
        Self {
            tag: ValueType::Float,
            repr: Repr::Float(v),
            type_info: None,
        }
    }

    pub fn null() -> Self {
        Self {
            tag: ValueType::Null,
            repr: Repr::Empty,
            type_info: None,
        }
    }

    pub fn unit() -> Self {
        Self {
            tag: ValueType::Unit,
            repr: Repr::Empty,
            type_info: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            tag: ValueType::Unknown,
            repr: Repr::Empty,
            type_info: None,
        }
    }

    pub fn string(r: ObjRef) -> Self {
        Self {
            tag: ValueType::String,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    pub fn function(r: ObjRef) -> Self {
        Self {
            tag: ValueType::Function,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    pub fn array(r: ObjRef) -> Self {
        Self {
            tag: ValueType::Array,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    /// An object value carrying its constructing type descriptor.
    pub fn object(r: ObjRef, descriptor: ObjRef) -> Self {
        Self {
            tag: ValueType::Object,
            repr: Repr::Obj(r),
            type_info: Some(descriptor),
        }
    }

    /// An object value with no descriptor attached yet.
    pub(crate) fn object_raw(r: ObjRef) -> Self {
        Self {
            tag: ValueType::Object,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    pub fn module(r: ObjRef) -> Self {
        Self {
            tag: ValueType::Module,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    pub fn type_value(r: ObjRef) -> Self {
        Self {
            tag: ValueType::Type,
            repr: Repr::Obj(r),
            type_info: None,
        }
    }

    // ==================== predicates & accessors ====================

    pub fn tag(&self) -> ValueType {
        self.tag
    }

    pub fn is_null(&self) -> bool {
        self.tag == ValueType::Null
    }

    pub fn is_unit(&self) -> bool {
        self.tag == ValueType::Unit
    }

    pub fn is_int(&self) -> bool {
        self.tag == ValueType::Int
    }

    pub fn is_float(&self) -> bool {
        self.tag == ValueType::Float
    }

    pub fn is_number(&self) -> bool {
        self.is_int() || self.is_float()
    }

    pub fn is_bool(&self) -> bool {
        self.tag == ValueType::Bool
    }

    pub fn is_string(&self) -> bool {
        self.tag == ValueType::String
    }

    pub fn is_function(&self) -> bool {
        self.tag == ValueType::Function
    }

    /// Whether this value owns a handle into the tracked heap.
    pub fn is_gc_object(&self) -> bool {
        matches!(
            self.tag,
            ValueType::String
                | ValueType::Function
                | ValueType::Array
                | ValueType::Object
                | ValueType::Module
                | ValueType::Type
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.repr {
            Repr::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The heap handle, for heap-kind values.
    pub fn obj(&self) -> Option<ObjRef> {
        match self.repr {
            Repr::Obj(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn repr(&self) -> Repr {
        self.repr
    }

    // ==================== type descriptor ====================

    pub fn set_type_info(&mut self, descriptor: ObjRef) {
        self.type_info = Some(descriptor);
    }

    pub fn type_info(&self) -> Option<ObjRef> {
        self.type_info
    }

    // ==================== coercion & tracing ====================

    /// Bool coercion used by branches and logical operators. Scalars
    /// only; heap kinds and Unit are rejected.
    pub fn to_bool(&self) -> Result<bool, VmError> {
        match self.repr {
            Repr::Bool(v) => Ok(v),
            Repr::Int(v) => Ok(v != 0),
            Repr::Float(v) => Ok(v != 0.0),
            Repr::Empty if self.tag == ValueType::Null => Ok(false),
            _ => Err(VmError::TypeError(format!(
                "invalid operand type {} for boolean coercion",
                self.tag.name()
            ))),
        }
    }

    /// Push every heap handle this value keeps alive.
    pub(crate) fn referenced_objects(&self, out: &mut Vec<ObjRef>) {
        if let Repr::Obj(r) = self.repr {
            out.push(r);
        }
        if let Some(descriptor) = self.type_info {
            out.push(descriptor);
        }
    }

    /// Human-readable rendering; heap kinds resolve through the heap.
    pub fn display(&self, heap: &Heap) -> String {
        match self.repr {
            Repr::Bool(v) => {
                if v {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
            Repr::Int(v) => v.to_string(),
            Repr::Float(v) => format_float(v),
            Repr::Empty => match self.tag {
                ValueType::Null => "[null]".to_string(),
                ValueType::Unit => "[unit]".to_string(),
                _ => "[unknown]".to_string(),
            },
            Repr::Obj(r) => match heap.get(r) {
                None => "[dangling object]".to_string(),
                Some(object) => match &object.payload {
                    ObjPayload::Str(s) => s.to_string(),
                    ObjPayload::Array(array) => {
                        let rendered: Vec<String> =
                            array.elements.iter().map(|e| e.display(heap)).collect();
                        format!("[{}]", rendered.join(", "))
                    }
                    ObjPayload::Function(_) => "[function]".to_string(),
                    ObjPayload::Type(ty) => format!("[type {}]", ty.name),
                    ObjPayload::Object => "[object]".to_string(),
                    ObjPayload::Module => "[module]".to_string(),
                    ObjPayload::Context(_) => "[context]".to_string(),
                },
            },
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bool_coercions() {
        assert!(Value::bool_(true).to_bool().unwrap());
        assert!(!Value::bool_(false).to_bool().unwrap());
        assert!(!Value::int(0).to_bool().unwrap());
        assert!(Value::int(-3).to_bool().unwrap());
        assert!(!Value::float(0.0).to_bool().unwrap());
        assert!(Value::float(0.5).to_bool().unwrap());
        assert!(!Value::null().to_bool().unwrap());
    }

    #[test]
    fn test_to_bool_rejects_unit_and_heap_kinds() {
        assert!(Value::unit().to_bool().is_err());
        assert!(Value::string(ObjRef(0)).to_bool().is_err());
    }

    #[test]
    fn test_scalar_display() {
        let heap = Heap::new();
        assert_eq!(Value::int(15).display(&heap), "15");
        assert_eq!(Value::float(15.0).display(&heap), "15.0");
        assert_eq!(Value::float(0.5).display(&heap), "0.5");
        assert_eq!(Value::bool_(true).display(&heap), "true");
        assert_eq!(Value::null().display(&heap), "[null]");
        assert_eq!(Value::unit().display(&heap), "[unit]");
    }

    #[test]
    fn test_is_gc_object() {
        assert!(Value::string(ObjRef(0)).is_gc_object());
        assert!(Value::module(ObjRef(0)).is_gc_object());
        assert!(!Value::int(1).is_gc_object());
        assert!(!Value::null().is_gc_object());
        assert!(!Value::unknown().is_gc_object());
    }

    #[test]
    fn test_numeric_predicates() {
        assert!(Value::int(1).is_number());
        assert!(Value::float(1.0).is_number());
        assert!(!Value::bool_(true).is_number());
        assert!(!Value::unknown().is_number());
        assert_eq!(Value::unknown().tag(), ValueType::Unknown);
    }
}
