//! MAKE_TYPE, MAKE_OBJECT, MAKE_MODULE and LOAD_MODULE.

use super::super::Vm;
use crate::gc::{ObjPayload, ObjRef, TypeObject};
use crate::value::{Value, ValueType};
use crate::vm::error::VmError;

impl Vm {
    /// Fold the current frame's bindings into an anonymous Type: type
    /// bindings become declared fields, function bindings become
    /// methods (declared with type Function). Anything else rejects.
    pub(crate) fn exec_make_type(&mut self) -> Result<(), VmError> {
        let function_descriptor = self.rt.types.function;
        let mut ty = TypeObject::anonymous();

        let frame = self
            .frames
            .last()
            .ok_or_else(|| VmError::InternalError("no current frame".into()))?;
        for (name, value) in &frame.variables {
            let handle = value
                .obj()
                .ok_or_else(|| VmError::TypeConstruction(self.rt.string_text(*name)));
            match value.tag() {
                ValueType::Type => ty.add_field(*name, handle?),
                ValueType::Function => {
                    let function = handle?;
                    ty.add_field(*name, function_descriptor);
                    ty.add_method(*name, function);
                }
                _ => return Err(VmError::TypeConstruction(self.rt.string_text(*name))),
            }
        }

        let type_ref = self.alloc(ObjPayload::Type(ty))?;
        self.push(Value::type_value(type_ref));
        Ok(())
    }

    /// Pop the type descriptor, assemble an object: declared fields
    /// pre-seeded with type-appropriate defaults, methods installed,
    /// then one popped value per supplied field name (the name list
    /// arrives reversed relative to source order). Unless the type is
    /// Any, supplied names must be declared, and supplied values adopt
    /// the declared field descriptor.
    pub(crate) fn exec_make_object(&mut self, field_names: &[ObjRef]) -> Result<(), VmError> {
        let type_value = self.pop()?;
        if type_value.tag() != ValueType::Type {
            return Err(VmError::NotAType(self.describe(&type_value)));
        }
        let descriptor = type_value
            .obj()
            .ok_or_else(|| VmError::InternalError("type value without handle".into()))?;
        let validation = descriptor != self.rt.types.any;

        let (declared_fields, methods) = {
            let ty = self
                .obj(descriptor)?
                .as_type()
                .ok_or_else(|| VmError::NotAType(self.describe(&type_value)))?;
            let fields: Vec<(ObjRef, ObjRef)> = ty.fields.iter().map(|(k, v)| (*k, *v)).collect();
            let methods: Vec<(ObjRef, ObjRef)> = ty.methods.iter().map(|(k, v)| (*k, *v)).collect();
            (fields, methods)
        };

        let defaults: Vec<(ObjRef, Value)> = declared_fields
            .iter()
            .map(|(name, field_type)| (*name, self.rt.default_value(*field_type)))
            .collect();

        // The descriptor left the stack; keep it rooted while the
        // object allocation may collect.
        self.transient_roots.push(type_value);
        let allocated = self.alloc(ObjPayload::Object);
        self.transient_roots.pop();
        let object_ref = allocated?;

        {
            let object = self.obj_mut(object_ref)?;
            for (name, value) in defaults {
                object.fields.insert(name, value);
            }
            for (name, function) in methods {
                object.fields.insert(name, Value::function(function));
            }
        }

        for name in field_names {
            let declared = declared_fields
                .iter()
                .find(|(declared_name, _)| declared_name == name)
                .map(|(_, field_type)| *field_type);
            if validation && declared.is_none() {
                return Err(VmError::FieldNotFound(self.rt.string_text(*name)));
            }

            let mut value = self.pop()?;
            if let Some(declared) = declared {
                value.set_type_info(declared);
            }
            self.obj_mut(object_ref)?.fields.insert(*name, value);
        }

        self.push(Value::object(object_ref, descriptor));
        Ok(())
    }

    /// Fold the current frame into a Module object and push it.
    pub(crate) fn exec_make_module_local(&mut self) -> Result<ObjRef, VmError> {
        let bindings: Vec<(ObjRef, Value)> = self
            .frames
            .last()
            .ok_or_else(|| VmError::InternalError("no current frame".into()))?
            .variables
            .iter()
            .map(|(name, value)| (*name, *value))
            .collect();

        let module_ref = self.alloc(ObjPayload::Module)?;
        let object = self.obj_mut(module_ref)?;
        for (name, value) in bindings {
            object.fields.insert(name, value);
        }

        self.push(Value::module(module_ref));
        Ok(module_ref)
    }

    /// MAKE_MODULE additionally registers the object so LOAD_MODULE
    /// can find it later; the registry reference pins it.
    pub(crate) fn exec_make_module(&mut self, id: usize) -> Result<(), VmError> {
        if self.rt.modules.entry(id).is_none() {
            return Err(VmError::UnknownModule(id));
        }
        let module_ref = self.exec_make_module_local()?;
        self.rt.heap.pin(module_ref);
        self.rt.modules.set_object(id, module_ref);
        Ok(())
    }

    pub(crate) fn exec_load_module(&mut self, id: usize) -> Result<(), VmError> {
        let entry = self
            .rt
            .modules
            .entry(id)
            .ok_or(VmError::UnknownModule(id))?;
        let module_ref = entry.object.ok_or(VmError::UnknownModule(id))?;
        self.push(Value::module(module_ref));
        Ok(())
    }
}
