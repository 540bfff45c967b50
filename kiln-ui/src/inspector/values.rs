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

//! Value containers. A container holds the values of one logical property for every selected
//! object and knows how to read them from (and write them into) the container of the parent
//! editor.

use crate::core::{
    object::ObjectModel,
    reflect::{MemberInfo, ReflectError, TypeName, Value},
};
use std::{
    fmt::{Debug, Formatter},
    rc::Rc,
};

pub type ValueGetter = Rc<dyn Fn(&Value) -> Result<Value, ReflectError>>;
pub type ValueSetter = Rc<dyn Fn(&mut Value, Value) -> Result<(), ReflectError>>;

/// Describes where values of a container come from.
#[derive(Clone)]
pub enum ValueBinding {
    /// Values are the selection itself.
    Root,
    /// Values are the values of the parent container.
    Identity,
    Member(MemberInfo),
    Element(usize),
    DictionaryValue(Value),
    Custom {
        getter: ValueGetter,
        setter: ValueSetter,
    },
}

impl Debug for ValueBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueBinding::Root => write!(f, "Root"),
            ValueBinding::Identity => write!(f, "Identity"),
            ValueBinding::Member(member) => write!(f, "Member({})", member.name),
            ValueBinding::Element(index) => write!(f, "Element({index})"),
            ValueBinding::DictionaryValue(key) => write!(f, "DictionaryValue({key:?})"),
            ValueBinding::Custom { .. } => write!(f, "Custom"),
        }
    }
}

impl ValueBinding {
    fn get(&self, parent: &Value) -> Result<Value, ReflectError> {
        match self {
            ValueBinding::Root | ValueBinding::Identity => Ok(parent.clone()),
            ValueBinding::Member(member) => parent.member(&member.name),
            ValueBinding::Element(index) => parent.element(*index),
            ValueBinding::DictionaryValue(key) => parent.entry(key),
            ValueBinding::Custom { getter, .. } => getter(parent),
        }
    }

    fn set(&self, parent: &mut Value, value: Value) -> Result<(), ReflectError> {
        match self {
            ValueBinding::Root => Ok(()),
            ValueBinding::Identity => {
                *parent = value;
                Ok(())
            }
            ValueBinding::Member(member) => parent.set_member(&member.name, value),
            ValueBinding::Element(index) => parent.set_element(*index, value),
            ValueBinding::DictionaryValue(key) => parent.set_entry(key, value),
            ValueBinding::Custom { setter, .. } => setter(parent, value),
        }
    }

    /// Reads the value from an optional baseline (default or reference value of the parent).
    fn get_baseline(&self, parent: Option<&Value>) -> Option<Value> {
        parent.and_then(|p| self.get(p).ok())
    }
}

#[derive(Clone, Debug)]
pub struct ValueContainer {
    values: Vec<Value>,
    binding: ValueBinding,
    value_type: TypeName,
    default_value: Option<Value>,
    reference_value: Option<Value>,
    read_only: bool,
}

impl ValueContainer {
    /// Creates the container of the root editor. Values are the selected objects.
    pub fn new_root(values: Vec<Value>, value_type: TypeName) -> Self {
        Self {
            values,
            binding: ValueBinding::Root,
            value_type,
            default_value: None,
            reference_value: None,
            read_only: false,
        }
    }

    /// Creates a container bound to the parent, reading the initial values and deriving the
    /// baselines from the parent.
    pub fn new(
        parent: &ValueContainer,
        binding: ValueBinding,
        value_type: TypeName,
    ) -> Result<Self, ReflectError> {
        let values = parent
            .values
            .iter()
            .map(|v| binding.get(v))
            .collect::<Result<Vec<_>, _>>()?;
        let (default_value, read_only) = match &binding {
            ValueBinding::Member(member) => (
                member
                    .default_value()
                    .cloned()
                    .or_else(|| binding.get_baseline(parent.default_value.as_ref())),
                member.is_read_only(),
            ),
            _ => (binding.get_baseline(parent.default_value.as_ref()), false),
        };
        Ok(Self {
            reference_value: binding.get_baseline(parent.reference_value.as_ref()),
            values,
            binding,
            value_type,
            default_value,
            read_only: read_only || parent.read_only,
        })
    }

    pub fn from_member(parent: &ValueContainer, member: &MemberInfo) -> Result<Self, ReflectError> {
        Self::new(
            parent,
            ValueBinding::Member(member.clone()),
            member.value_type.clone(),
        )
    }

    pub fn identity(parent: &ValueContainer) -> Self {
        Self {
            values: parent.values.clone(),
            binding: ValueBinding::Identity,
            value_type: parent.value_type.clone(),
            default_value: parent.default_value.clone(),
            reference_value: parent.reference_value.clone(),
            read_only: parent.read_only,
        }
    }

    /// Same as [`Self::identity`] but with another declared type (used when the declared type is
    /// the universal one and the actual values share a more specific type).
    pub fn identity_as(parent: &ValueContainer, value_type: TypeName) -> Self {
        Self {
            value_type,
            ..Self::identity(parent)
        }
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn binding(&self) -> &ValueBinding {
        &self.binding
    }

    #[inline]
    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    pub fn member(&self) -> Option<&MemberInfo> {
        match &self.binding {
            ValueBinding::Member(member) => Some(member),
            _ => None,
        }
    }

    /// Assigns the value to every target and writes it into the parent.
    pub fn set(
        &mut self,
        parent: Option<&mut ValueContainer>,
        value: Value,
    ) -> Result<(), ReflectError> {
        for item in self.values.iter_mut() {
            *item = value.clone();
        }
        match parent {
            Some(parent) => self.write_back(parent),
            None => Ok(()),
        }
    }

    /// Writes current values into the values of the parent. Needed after a value-type copy was
    /// modified.
    pub fn write_back(&self, parent: &mut ValueContainer) -> Result<(), ReflectError> {
        if parent.values.len() != self.values.len() {
            return Err(ReflectError::IndexOutOfBounds {
                index: self.values.len(),
                len: parent.values.len(),
            });
        }
        for (target, value) in parent.values.iter_mut().zip(self.values.iter()) {
            self.binding.set(target, value.clone())?;
        }
        Ok(())
    }

    /// Re-reads values from the parent. Fails if the parent no longer has the bound member,
    /// which means the editor was built for another type of data.
    pub fn refresh(&mut self, parent: &ValueContainer) -> Result<(), ReflectError> {
        if matches!(self.binding, ValueBinding::Root) {
            return Ok(());
        }
        let values = parent
            .values
            .iter()
            .map(|v| self.binding.get(v))
            .collect::<Result<Vec<_>, _>>()?;
        self.values = values;
        self.reference_value = self.binding.get_baseline(parent.reference_value.as_ref());
        Ok(())
    }

    /// Replaces values of a root container.
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    pub fn set_default_value(&mut self, value: Value) {
        self.default_value = Some(value);
    }

    pub fn clear_default_value(&mut self) {
        self.default_value = None;
    }

    pub fn set_reference_value(&mut self, value: Value) {
        self.reference_value = Some(value);
    }

    pub fn clear_reference_value(&mut self) {
        self.reference_value = None;
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn reference_value(&self) -> Option<&Value> {
        self.reference_value.as_ref()
    }

    #[inline]
    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    #[inline]
    pub fn has_reference_value(&self) -> bool {
        self.reference_value.is_some()
    }

    /// True if any value differs from the default value.
    pub fn is_default_value_modified(&self) -> bool {
        match self.default_value.as_ref() {
            Some(default) => self.values.iter().any(|v| v != default),
            None => false,
        }
    }

    /// True if any value differs from the reference value. Engine objects match their prefab
    /// counterparts.
    pub fn is_reference_value_modified(&self, objects: &dyn ObjectModel) -> bool {
        match self.reference_value.as_ref() {
            Some(reference) => self
                .values
                .iter()
                .any(|v| !matches_reference(v, reference, objects)),
            None => false,
        }
    }

    pub fn has_different_values(&self) -> bool {
        match self.values.split_first() {
            Some((first, rest)) => rest.iter().any(|v| v != first),
            None => false,
        }
    }

    pub fn has_different_types(&self) -> bool {
        match self.values.split_first() {
            Some((first, rest)) => {
                let first = first.runtime_type();
                rest.iter().any(|v| v.runtime_type() != first)
            }
            None => false,
        }
    }

    /// The single runtime type shared by every value.
    pub fn shared_runtime_type(&self) -> Option<TypeName> {
        if self.has_different_types() {
            None
        } else {
            self.values.first().and_then(|v| v.runtime_type())
        }
    }

    #[inline]
    pub fn is_single_object(&self) -> bool {
        self.values.len() == 1
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// True if values are copied on read, so edits must be written back into the parent.
    pub fn is_value_type(&self) -> bool {
        !self.values.is_empty()
            && self
                .values
                .iter()
                .all(|v| !matches!(v, Value::Object(_) | Value::Null))
    }
}

fn matches_reference(value: &Value, reference: &Value, objects: &dyn ObjectModel) -> bool {
    match (value, reference) {
        (Value::Object(object), Value::Object(_)) => {
            value == reference
                || objects
                    .prefab_object_id(object)
                    .is_some_and(|id| Some(id) == reference.object_id())
        }
        _ => value == reference,
    }
}

#[cfg(test)]
mod test {
    use super::{ValueBinding, ValueContainer};
    use crate::core::reflect::{
        builtin, Attribute, MemberInfo, Object, StructValue, TypeName, Value,
    };
    use std::rc::Rc;

    fn count_member() -> MemberInfo {
        MemberInfo::new("Count", builtin::INT).with_attribute(Attribute::DefaultValue(Value::Int(0)))
    }

    fn root(counts: &[i64]) -> ValueContainer {
        ValueContainer::new_root(
            counts
                .iter()
                .map(|c| Value::from(Object::new("Counter").with_field("Count", Value::Int(*c))))
                .collect(),
            TypeName::new("Counter"),
        )
    }

    #[test]
    fn default_value_diff() {
        let parent = root(&[5]);
        let count = ValueContainer::from_member(&parent, &count_member()).unwrap();
        assert!(count.has_default_value());
        assert!(count.is_default_value_modified());

        let parent = root(&[0]);
        let count = ValueContainer::from_member(&parent, &count_member()).unwrap();
        assert!(!count.is_default_value_modified());

        let parent = root(&[0, 5]);
        let count = ValueContainer::from_member(&parent, &count_member()).unwrap();
        assert!(count.has_different_values());
        assert!(count.is_default_value_modified());
    }

    #[test]
    fn set_writes_into_reference_parent() {
        let mut parent = root(&[1, 2]);
        let mut count = ValueContainer::from_member(&parent, &count_member()).unwrap();
        count.set(Some(&mut parent), Value::Int(7)).unwrap();
        for value in parent.values() {
            assert_eq!(value.member("Count").unwrap(), Value::Int(7));
        }
    }

    #[test]
    fn struct_copies_need_write_back() {
        let point = StructValue::new("Point").with_field("x", Value::Float(1.0));
        let mut parent = ValueContainer::new_root(vec![point.into()], TypeName::new("Point"));
        let mut x = ValueContainer::from_member(&parent, &MemberInfo::new("x", builtin::FLOAT))
            .unwrap();
        assert!(parent.is_value_type());

        x.set(None, Value::Float(3.0)).unwrap();
        assert_eq!(parent.values()[0].member("x").unwrap(), Value::Float(1.0));

        x.write_back(&mut parent).unwrap();
        assert_eq!(parent.values()[0].member("x").unwrap(), Value::Float(3.0));
    }

    #[test]
    fn refresh_detects_type_change() {
        let parent = root(&[1]);
        let mut count = ValueContainer::from_member(&parent, &count_member()).unwrap();
        let replaced = ValueContainer::new_root(
            vec![Object::new("Other").with_field("Name", "x".into()).into()],
            TypeName::new("Other"),
        );
        assert!(count.refresh(&replaced).is_err());
    }

    #[test]
    fn custom_binding() {
        let parent = ValueContainer::new_root(vec![Value::Int(4)], TypeName::new(builtin::INT));
        let binding = ValueBinding::Custom {
            getter: Rc::new(|v: &Value| Ok(Value::Int(v.as_int().unwrap_or_default() * 2))),
            setter: Rc::new(|target: &mut Value, value: Value| {
                *target = Value::Int(value.as_int().unwrap_or_default() / 2);
                Ok(())
            }),
        };
        let mut doubled = ValueContainer::new(&parent, binding, TypeName::new(builtin::INT)).unwrap();
        assert_eq!(doubled.first(), Some(&Value::Int(8)));

        let mut parent = parent;
        doubled.set(Some(&mut parent), Value::Int(10)).unwrap();
        assert_eq!(parent.first(), Some(&Value::Int(5)));
    }

    #[test]
    fn different_types() {
        let values = ValueContainer::new_root(
            vec![
                Object::new("Light").into(),
                Object::new("Camera").into(),
            ],
            TypeName::new(builtin::ACTOR),
        );
        assert!(values.has_different_types());
        assert_eq!(values.shared_runtime_type(), None);
    }
}
