//! LOAD_MEMBER and STORE_MEMBER.

use super::super::Vm;
use crate::value::Value;
use crate::vm::error::VmError;

impl Vm {
    /// Pop an object, push one of its fields. Type values additionally
    /// expose their method and static tables, so `T.m` resolves
    /// without an instance.
    pub(crate) fn exec_load_member(&mut self, name: crate::gc::ObjRef) -> Result<(), VmError> {
        let object = self.pop()?;
        if !object.is_gc_object() {
            return Err(VmError::NotAnObject(self.describe(&object)));
        }
        let object_ref = object
            .obj()
            .ok_or_else(|| VmError::InternalError("heap value without handle".into()))?;

        let heap_object = self.obj(object_ref)?;
        if let Some(value) = heap_object.fields.get(&name) {
            let value = *value;
            self.push(value);
            return Ok(());
        }
        if let Some(ty) = heap_object.as_type() {
            if let Some(function) = ty.method(name).or_else(|| ty.static_method(name)) {
                self.push(Value::function(function));
                return Ok(());
            }
        }

        Err(VmError::FieldNotFound(self.rt.string_text(name)))
    }

    /// Pop a value, pop an object, store the field. The field must
    /// already exist. When the object's type descriptor declares the
    /// field, the stored value narrows to the declared descriptor;
    /// Any-typed objects keep the value's own descriptor.
    pub(crate) fn exec_store_member(&mut self, name: crate::gc::ObjRef) -> Result<(), VmError> {
        let mut value = self.pop()?;
        let object = self.pop()?;
        if !object.is_gc_object() {
            return Err(VmError::NotAnObject(self.describe(&object)));
        }
        let object_ref = object
            .obj()
            .ok_or_else(|| VmError::InternalError("heap value without handle".into()))?;

        if !self.obj(object_ref)?.fields.contains_key(&name) {
            return Err(VmError::FieldNotFound(self.rt.string_text(name)));
        }

        let descriptor = self.value_type_descriptor(&object);
        let declared = self
            .obj(descriptor)?
            .as_type()
            .and_then(|ty| ty.field(name));
        if let Some(declared) = declared {
            value.set_type_info(declared);
        }

        self.obj_mut(object_ref)?.fields.insert(name, value);
        Ok(())
    }
}
