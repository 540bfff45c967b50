// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Dynamic values. Everything except [`Value::Object`] has copy semantics: reading a member
//! returns an independent copy, so editing a nested struct requires writing it back into its
//! owner. Objects are shared by reference and mutated in place.

use super::{builtin, ReflectError, TypeName};
use crate::color::Color;
use std::{cell::RefCell, fmt::Debug, rc::Rc};
use uuid::Uuid;

pub type ObjectRef = Rc<RefCell<Object>>;

/// An instance of a reference type.
#[derive(Debug)]
pub struct Object {
    id: Uuid,
    type_name: TypeName,
    fields: Vec<(String, Value)>,
}

impl Object {
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self::with_id(Uuid::new_v4(), type_name)
    }

    pub fn with_id(id: Uuid, type_name: impl Into<TypeName>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields: Default::default(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.insert_field(name, value);
        self
    }

    /// Writes the field, adding it if the object does not have one yet.
    pub fn insert_field(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Writes the field. Unlike [`Self::with_field`], the field must already exist.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => {
                *existing = value;
                Ok(())
            }
            None => Err(ReflectError::MemberNotFound {
                type_name: self.type_name.to_string(),
                member: name.to_owned(),
            }),
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }
}

/// An instance of a value type.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    pub type_name: TypeName,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Default::default(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        match self.field_mut(name) {
            Some(existing) => *existing = value,
            None => self.fields.push((name.to_owned(), value)),
        }
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: TypeName,
    pub variant: String,
}

impl EnumValue {
    pub fn new(type_name: impl Into<TypeName>, variant: &str) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Color(Color),
    Enum(EnumValue),
    Struct(StructValue),
    Array(Vec<Value>),
    Dictionary(Vec<(Value, Value)>),
    Object(ObjectRef),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            // Identity, not contents.
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Color> for Value {
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value.into_ref())
    }
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values shared by reference, writes to their members are visible to every
    /// holder of the value.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Id of the referenced object, if any.
    pub fn object_id(&self) -> Option<Uuid> {
        self.as_object()
            .and_then(|o| o.try_borrow().ok().map(|o| o.id()))
    }

    /// Concrete type of the value. Null and anonymous collections have no runtime type.
    pub fn runtime_type(&self) -> Option<TypeName> {
        match self {
            Value::Null | Value::Array(_) | Value::Dictionary(_) => None,
            Value::Bool(_) => Some(TypeName::new(builtin::BOOL)),
            Value::Int(_) => Some(TypeName::new(builtin::INT)),
            Value::Float(_) => Some(TypeName::new(builtin::FLOAT)),
            Value::String(_) => Some(TypeName::new(builtin::STRING)),
            Value::Color(_) => Some(TypeName::new(builtin::COLOR)),
            Value::Enum(e) => Some(e.type_name.clone()),
            Value::Struct(s) => Some(s.type_name.clone()),
            Value::Object(o) => o.try_borrow().ok().map(|o| o.type_name().clone()),
        }
    }

    fn kind_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| match self {
                Value::Array(_) => "array".to_owned(),
                Value::Dictionary(_) => "dictionary".to_owned(),
                _ => "null".to_owned(),
            })
    }

    /// Reads a named member. Struct members are returned as copies.
    pub fn member(&self, name: &str) -> Result<Value, ReflectError> {
        let not_found = |type_name: &TypeName| ReflectError::MemberNotFound {
            type_name: type_name.to_string(),
            member: name.to_owned(),
        };
        match self {
            Value::Struct(s) => s.field(name).cloned().ok_or_else(|| not_found(&s.type_name)),
            Value::Object(o) => {
                let object = o.try_borrow().map_err(|_| ReflectError::ObjectBusy)?;
                object
                    .field(name)
                    .cloned()
                    .ok_or_else(|| not_found(object.type_name()))
            }
            Value::Null => Err(ReflectError::NullTarget {
                member: name.to_owned(),
            }),
            _ => Err(ReflectError::NotAContainer {
                type_name: self.kind_name(),
            }),
        }
    }

    /// Writes a named member. The member must exist.
    pub fn set_member(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match self {
            Value::Struct(s) => {
                let type_name = s.type_name.to_string();
                match s.field_mut(name) {
                    Some(field) => {
                        *field = value;
                        Ok(())
                    }
                    None => Err(ReflectError::MemberNotFound {
                        type_name,
                        member: name.to_owned(),
                    }),
                }
            }
            Value::Object(o) => o
                .try_borrow_mut()
                .map_err(|_| ReflectError::ObjectBusy)?
                .set_field(name, value),
            Value::Null => Err(ReflectError::NullTarget {
                member: name.to_owned(),
            }),
            _ => Err(ReflectError::NotAContainer {
                type_name: self.kind_name(),
            }),
        }
    }

    pub fn element(&self, index: usize) -> Result<Value, ReflectError> {
        match self {
            Value::Array(items) => {
                items
                    .get(index)
                    .cloned()
                    .ok_or(ReflectError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })
            }
            _ => Err(ReflectError::NotAContainer {
                type_name: self.kind_name(),
            }),
        }
    }

    pub fn set_element(&mut self, index: usize, value: Value) -> Result<(), ReflectError> {
        let type_name = self.kind_name();
        match self {
            Value::Array(items) => {
                let len = items.len();
                match items.get_mut(index) {
                    Some(item) => {
                        *item = value;
                        Ok(())
                    }
                    None => Err(ReflectError::IndexOutOfBounds { index, len }),
                }
            }
            _ => Err(ReflectError::NotAContainer { type_name }),
        }
    }

    pub fn entry(&self, key: &Value) -> Result<Value, ReflectError> {
        match self {
            Value::Dictionary(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| ReflectError::KeyNotFound(format!("{key:?}"))),
            _ => Err(ReflectError::NotAContainer {
                type_name: self.kind_name(),
            }),
        }
    }

    pub fn set_entry(&mut self, key: &Value, value: Value) -> Result<(), ReflectError> {
        let type_name = self.kind_name();
        match self {
            Value::Dictionary(entries) => match entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, existing)) => {
                    *existing = value;
                    Ok(())
                }
                None => Err(ReflectError::KeyNotFound(format!("{key:?}"))),
            },
            _ => Err(ReflectError::NotAContainer { type_name }),
        }
    }

    /// Number of items in a collection, `None` for anything else.
    pub fn collection_len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::Dictionary(entries) => Some(entries.len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Object, StructValue, Value};
    use crate::reflect::ReflectError;

    #[test]
    fn struct_members_are_copies() {
        let inner = StructValue::new("Inner").with_field("x", 1.into());
        let mut outer = Value::Struct(StructValue::new("Outer").with_field("inner", inner.into()));
        let mut inner = outer.member("inner").unwrap();
        inner.set_member("x", 2.into()).unwrap();
        assert_eq!(outer.member("inner").unwrap().member("x").unwrap(), Value::Int(1));

        outer.set_member("inner", inner).unwrap();
        assert_eq!(outer.member("inner").unwrap().member("x").unwrap(), Value::Int(2));
    }

    #[test]
    fn objects_are_shared() {
        let object = Object::new("Thing").with_field("count", 5.into()).into_ref();
        let a = Value::Object(object.clone());
        let mut b = Value::Object(object);
        b.set_member("count", 7.into()).unwrap();
        assert_eq!(a.member("count").unwrap(), Value::Int(7));
        assert_eq!(a, b);

        let other = Value::from(Object::new("Thing").with_field("count", 7.into()));
        assert_ne!(a, other);
    }

    #[test]
    fn missing_member_is_reported() {
        let value = Value::from(Object::new("Thing"));
        assert_eq!(
            value.member("nope"),
            Err(ReflectError::MemberNotFound {
                type_name: "Thing".to_owned(),
                member: "nope".to_owned()
            })
        );
        assert!(matches!(
            Value::Int(1).member("x"),
            Err(ReflectError::NotAContainer { .. })
        ));
        assert!(matches!(
            Value::Null.member("x"),
            Err(ReflectError::NullTarget { .. })
        ));
    }

    #[test]
    fn array_elements() {
        let mut array = Value::Array(vec![1.into(), 2.into()]);
        array.set_element(1, 5.into()).unwrap();
        assert_eq!(array.element(1).unwrap(), Value::Int(5));
        assert_eq!(
            array.element(2),
            Err(ReflectError::IndexOutOfBounds { index: 2, len: 2 })
        );
    }
}
