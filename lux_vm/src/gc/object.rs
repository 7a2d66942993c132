//! Heap object kinds tracked by the garbage collector.
//!
//! Every object carries a mark bit, a no-collect pin flag and a field
//! table keyed by interned string handles, so modules, types and plain
//! objects all share one member-access path.

use std::collections::HashMap;

use crate::builtins::NativeId;
use crate::value::Value;

/// Handle to a heap object: an index into the collector's slot arena.
/// Identity comparison on handles is object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) usize);

impl ObjRef {
    /// Raw slot index, for diagnostics.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A tracked heap object.
#[derive(Debug)]
pub struct HeapObject {
    pub(crate) marked: bool,
    pub(crate) no_collect: bool,
    /// Size estimate recorded at allocation, used for byte accounting.
    pub(crate) size: usize,
    /// Field table: interned name handle → value.
    pub fields: HashMap<ObjRef, Value>,
    pub payload: ObjPayload,
}

/// Kind-specific data of a heap object.
#[derive(Debug)]
pub enum ObjPayload {
    /// Immutable byte sequence; canonicalized through the intern pool
    /// when it originates from source text.
    Str(Box<str>),
    Array(ArrayObject),
    Function(FunctionObject),
    Type(TypeObject),
    /// Plain object: field table only.
    Object,
    /// Module object: field table only.
    Module,
    /// Snapshotted frames captured by a closure.
    Context(FrozenContext),
}

impl HeapObject {
    pub(crate) fn new(payload: ObjPayload) -> Self {
        let size = estimate_size(&payload);
        Self {
            marked: false,
            no_collect: false,
            size,
            fields: HashMap::new(),
            payload,
        }
    }

    pub fn object_size(&self) -> usize {
        self.size
    }

    pub fn is_pinned(&self) -> bool {
        self.no_collect
    }

    /// Contained string, for `Str` objects.
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            ObjPayload::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayObject> {
        match &self.payload {
            ObjPayload::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.payload {
            ObjPayload::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeObject> {
        match &self.payload {
            ObjPayload::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Every handle reachable from this object; drives the mark phase.
    pub fn referenced_objects(&self, out: &mut Vec<ObjRef>) {
        for (name, value) in &self.fields {
            out.push(*name);
            value.referenced_objects(out);
        }
        match &self.payload {
            ObjPayload::Str(_) | ObjPayload::Object | ObjPayload::Module => {}
            ObjPayload::Array(array) => {
                out.push(array.element_type);
                for element in &array.elements {
                    element.referenced_objects(out);
                }
            }
            ObjPayload::Function(function) => {
                if let Some(ctx) = function.context {
                    out.push(ctx);
                }
            }
            ObjPayload::Type(ty) => {
                for (name, descriptor) in &ty.fields {
                    out.push(*name);
                    out.push(*descriptor);
                }
                for (name, method) in &ty.methods {
                    out.push(*name);
                    out.push(*method);
                }
                for (name, method) in &ty.statics {
                    out.push(*name);
                    out.push(*method);
                }
            }
            ObjPayload::Context(context) => {
                for frame in &context.frames {
                    for (name, value) in frame {
                        out.push(*name);
                        value.referenced_objects(out);
                    }
                }
                if let Some(next) = context.next {
                    out.push(next);
                }
            }
        }
    }
}

fn estimate_size(payload: &ObjPayload) -> usize {
    let base = std::mem::size_of::<HeapObject>();
    match payload {
        ObjPayload::Str(s) => base + s.len(),
        ObjPayload::Array(a) => base + a.elements.len() * std::mem::size_of::<Value>(),
        ObjPayload::Function(_) => base,
        ObjPayload::Type(t) => {
            let entries = t.fields.len() + t.methods.len() + t.statics.len();
            base + entries * std::mem::size_of::<(ObjRef, ObjRef)>()
        }
        ObjPayload::Object | ObjPayload::Module => base,
        ObjPayload::Context(c) => {
            let bindings: usize = c.frames.iter().map(|f| f.len()).sum();
            base + bindings * std::mem::size_of::<(ObjRef, Value)>()
        }
    }
}

/// A fixed-length vector of values with an element type descriptor.
#[derive(Debug)]
pub struct ArrayObject {
    pub(crate) elements: Vec<Value>,
    pub(crate) element_type: ObjRef,
}

impl ArrayObject {
    pub fn new(elements: Vec<Value>, element_type: ObjRef) -> Self {
        Self {
            elements,
            element_type,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element_type(&self) -> ObjRef {
        self.element_type
    }

    /// Bounds-checked element read.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.get(index).copied()
    }

    /// Bounds-checked element write; `false` when out of range.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// How a function executes when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Host function dispatched by id, no frame pushed.
    Native(NativeId),
    /// Compiled function: entry point is `begin_offset` within the
    /// owning module's region of the linked bytecode buffer.
    Bytecode {
        module_id: usize,
        begin_offset: usize,
        arity: usize,
        is_method: bool,
    },
}

/// A callable value.
#[derive(Debug)]
pub struct FunctionObject {
    pub kind: FunctionKind,
    /// Frozen context chain for closures.
    pub context: Option<ObjRef>,
}

impl FunctionObject {
    pub fn native(id: NativeId) -> Self {
        Self {
            kind: FunctionKind::Native(id),
            context: None,
        }
    }

    pub fn bytecode(module_id: usize, begin_offset: usize, arity: usize) -> Self {
        Self {
            kind: FunctionKind::Bytecode {
                module_id,
                begin_offset,
                arity,
                is_method: false,
            },
            context: None,
        }
    }

    pub fn method(module_id: usize, begin_offset: usize, arity: usize) -> Self {
        Self {
            kind: FunctionKind::Bytecode {
                module_id,
                begin_offset,
                arity,
                is_method: true,
            },
            context: None,
        }
    }

    pub fn with_context(mut self, context: ObjRef) -> Self {
        self.context = Some(context);
        self
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, FunctionKind::Native(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(
            self.kind,
            FunctionKind::Bytecode {
                is_method: true,
                ..
            }
        )
    }
}

/// A named type descriptor: declared fields, methods and statics.
#[derive(Debug, Default)]
pub struct TypeObject {
    pub name: String,
    /// Field name → declared field type descriptor.
    pub fields: HashMap<ObjRef, ObjRef>,
    /// Method name → Function object.
    pub methods: HashMap<ObjRef, ObjRef>,
    /// Static method name → Function object.
    pub statics: HashMap<ObjRef, ObjRef>,
}

impl TypeObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::named("<anonymous>")
    }

    pub fn add_field(&mut self, name: ObjRef, descriptor: ObjRef) {
        self.fields.insert(name, descriptor);
    }

    pub fn field(&self, name: ObjRef) -> Option<ObjRef> {
        self.fields.get(&name).copied()
    }

    pub fn has_field(&self, name: ObjRef) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn add_method(&mut self, name: ObjRef, function: ObjRef) {
        self.methods.insert(name, function);
    }

    pub fn method(&self, name: ObjRef) -> Option<ObjRef> {
        self.methods.get(&name).copied()
    }

    pub fn add_static_method(&mut self, name: ObjRef, function: ObjRef) {
        self.statics.insert(name, function);
    }

    pub fn static_method(&self, name: ObjRef) -> Option<ObjRef> {
        self.statics.get(&name).copied()
    }
}

/// Snapshotted frames a closure carries; queried after the live frame
/// walk fails and before globals.
#[derive(Debug, Default)]
pub struct FrozenContext {
    /// Innermost snapshot last, mirroring the live chain.
    pub frames: Vec<HashMap<ObjRef, Value>>,
    /// Enclosing context, for nested closures.
    pub next: Option<ObjRef>,
}

impl FrozenContext {
    pub fn new(frames: Vec<HashMap<ObjRef, Value>>) -> Self {
        Self { frames, next: None }
    }

    pub fn query(&self, name: ObjRef) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(&name) {
                return Some(*value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::NativeId;

    #[test]
    fn test_array_bounds_checked_access() {
        let mut array = ArrayObject::new(vec![Value::int(1), Value::int(2)], ObjRef(0));
        assert_eq!(array.len(), 2);
        assert!(!array.is_empty());
        assert_eq!(array.get(1).unwrap().as_int(), Some(2));
        assert!(array.get(2).is_none());

        assert!(array.set(0, Value::int(9)));
        assert_eq!(array.get(0).unwrap().as_int(), Some(9));
        assert!(!array.set(5, Value::int(0)));
    }

    #[test]
    fn test_function_kind_predicates() {
        let native = FunctionObject::native(NativeId::Println);
        assert!(native.is_native());
        assert!(!native.is_method());

        let method = FunctionObject::method(0, 10, 2);
        assert!(!method.is_native());
        assert!(method.is_method());

        let plain = FunctionObject::bytecode(1, 5, 1);
        assert!(!plain.is_method());
        assert!(matches!(
            plain.kind,
            FunctionKind::Bytecode {
                module_id: 1,
                begin_offset: 5,
                arity: 1,
                is_method: false,
            }
        ));
    }

    #[test]
    fn test_object_size_grows_with_string_length() {
        let short = HeapObject::new(ObjPayload::Str("ab".into()));
        let long = HeapObject::new(ObjPayload::Str("abcdefghij".into()));
        assert!(long.object_size() > short.object_size());
        assert!(!short.is_pinned());
    }

    #[test]
    fn test_frozen_context_queries_innermost_first() {
        let name = ObjRef(7);
        let mut outer = HashMap::new();
        outer.insert(name, Value::int(1));
        let mut inner = HashMap::new();
        inner.insert(name, Value::int(2));

        let context = FrozenContext::new(vec![outer, inner]);
        assert_eq!(context.query(name).unwrap().as_int(), Some(2));
        assert!(context.query(ObjRef(8)).is_none());
    }

    #[test]
    fn test_referenced_objects_cover_payloads() {
        let element_type = ObjRef(3);
        let element = ObjRef(4);
        let array = HeapObject::new(ObjPayload::Array(ArrayObject::new(
            vec![Value::string(element)],
            element_type,
        )));
        let mut refs = Vec::new();
        array.referenced_objects(&mut refs);
        assert!(refs.contains(&element_type));
        assert!(refs.contains(&element));

        let function = HeapObject::new(ObjPayload::Function(
            FunctionObject::bytecode(0, 0, 0).with_context(ObjRef(9)),
        ));
        refs.clear();
        function.referenced_objects(&mut refs);
        assert!(refs.contains(&ObjRef(9)));
    }
}
