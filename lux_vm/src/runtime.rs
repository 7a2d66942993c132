//! Shared runtime state: heap, intern pool, module registry, primitive
//! type descriptors, the linked bytecode buffer and import paths.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::gc::{Heap, ObjPayload, ObjRef, TypeObject};
use crate::intern::StringPool;
use crate::modules::ModuleRegistry;
use crate::value::Value;
use crate::vm::instr::Instr;

/// Per-runtime singletons for the primitive type descriptors.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveTypes {
    pub any: ObjRef,
    pub int: ObjRef,
    pub float: ObjRef,
    pub bool_: ObjRef,
    pub string: ObjRef,
    pub array: ObjRef,
    pub function: ObjRef,
    pub object: ObjRef,
    pub unit: ObjRef,
    pub null: ObjRef,
    pub type_: ObjRef,
}

impl PrimitiveTypes {
    fn bootstrap(heap: &mut Heap) -> Self {
        let mut make = |name: &str| heap.alloc_pinned(ObjPayload::Type(TypeObject::named(name)));
        Self {
            any: make("Any"),
            int: make("Int"),
            float: make("Float"),
            bool_: make("Bool"),
            string: make("String"),
            array: make("Array"),
            function: make("Function"),
            object: make("Object"),
            unit: make("Unit"),
            null: make("Null"),
            type_: make("Type"),
        }
    }

    /// All descriptors with their names, in declaration order.
    pub fn all(&self) -> [(&'static str, ObjRef); 11] {
        [
            ("Any", self.any),
            ("Int", self.int),
            ("Float", self.float),
            ("Bool", self.bool_),
            ("String", self.string),
            ("Array", self.array),
            ("Function", self.function),
            ("Object", self.object),
            ("Unit", self.unit),
            ("Null", self.null),
            ("Type", self.type_),
        ]
    }

    pub fn by_name(&self, name: &str) -> Option<ObjRef> {
        self.all()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| *r)
    }
}

/// Search paths for `use "relative/path"` imports: the working
/// directory first, then a configured import path.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub cwd: PathBuf,
    pub import_path: PathBuf,
}

static DEFAULT_IMPORT_CONFIG: Lazy<ImportConfig> = Lazy::new(ImportConfig::from_env);

impl ImportConfig {
    /// Working directory plus `LUX_IMPORT_PATH` (defaults to the
    /// working directory itself).
    pub fn from_env() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let import_path = std::env::var_os("LUX_IMPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.clone());
        Self { cwd, import_path }
    }

    pub fn default_config() -> Self {
        DEFAULT_IMPORT_CONFIG.clone()
    }

    /// Two-path search for a module file; first regular file wins.
    pub fn find_file(&self, module_path: &str) -> Option<PathBuf> {
        for base in [&self.cwd, &self.import_path] {
            let candidate: &Path = &base.join(module_path);
            if candidate.is_file() {
                return Some(candidate.to_path_buf());
            }
        }
        None
    }
}

/// Global mutable state of one interpreter instance.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) strings: StringPool,
    pub(crate) modules: ModuleRegistry,
    pub(crate) types: PrimitiveTypes,
    pub(crate) code: Vec<Instr>,
    pub(crate) imports: ImportConfig,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_import_config(ImportConfig::default_config())
    }

    pub fn with_import_config(imports: ImportConfig) -> Self {
        let mut heap = Heap::new();
        let types = PrimitiveTypes::bootstrap(&mut heap);
        Self {
            heap,
            strings: StringPool::new(),
            modules: ModuleRegistry::new(),
            types,
            code: Vec::new(),
            imports,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn types(&self) -> &PrimitiveTypes {
        &self.types
    }

    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    pub(crate) fn intern(&mut self, text: &str) -> ObjRef {
        self.strings.intern(&mut self.heap, text)
    }

    /// The contained text of an interned handle, for error messages.
    pub(crate) fn string_text(&self, handle: ObjRef) -> String {
        self.heap
            .get(handle)
            .and_then(|o| o.as_str())
            .unwrap_or("<unknown>")
            .to_string()
    }

    /// Type-appropriate default for a declared field descriptor:
    /// Bool → false, Int → 0, Float → 0.0, String → "", else Null.
    pub(crate) fn default_value(&mut self, descriptor: ObjRef) -> Value {
        if descriptor == self.types.bool_ {
            Value::bool_(false)
        } else if descriptor == self.types.int {
            Value::int(0)
        } else if descriptor == self.types.float {
            Value::float(0.0)
        } else if descriptor == self.types.string {
            Value::string(self.intern(""))
        } else {
            Value::null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_types_are_distinct_and_named() {
        let rt = Runtime::new();
        let all = rt.types.all();
        for (name, r) in all {
            let ty = rt.heap.get(r).unwrap().as_type().unwrap();
            assert_eq!(ty.name, name);
        }
        assert_ne!(rt.types.int, rt.types.float);
        assert_eq!(rt.types.by_name("Int"), Some(rt.types.int));
        assert_eq!(rt.types.by_name("Missing"), None);
    }

    #[test]
    fn test_default_values_per_descriptor() {
        let mut rt = Runtime::new();
        assert_eq!(rt.default_value(rt.types.bool_).as_bool(), Some(false));
        assert_eq!(rt.default_value(rt.types.int).as_int(), Some(0));
        assert_eq!(rt.default_value(rt.types.float).as_float(), Some(0.0));
        let s = rt.default_value(rt.types.string);
        assert!(s.is_string());
        assert!(rt.default_value(rt.types.any).is_null());
        assert!(rt.default_value(rt.types.array).is_null());
    }

    #[test]
    fn test_primitive_types_survive_collection() {
        let mut rt = Runtime::new();
        let int = rt.types.int;
        rt.heap.collect(&[]);
        assert!(rt.heap.get(int).is_some());
    }
}
