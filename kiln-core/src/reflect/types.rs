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

use super::{builtin, StructValue, TypeName, Value};
use crate::color::Color;
use fxhash::FxHashMap;
use std::{
    fmt::{Debug, Formatter},
    rc::Rc,
};

/// Editor-facing metadata attached to types, members and methods.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    HideInEditor,
    ReadOnly,
    DisplayName(String),
    Tooltip(String),
    Order(i32),
    DefaultValue(Value),
    /// Name of a registered editor alias that must be used for the type or member.
    CustomEditor(String),
    /// Places the member into a named group and/or overrides its name. The name
    /// [`Attribute::INLINE`] flattens the member into its parent without a label.
    EditorDisplay {
        group: Option<String>,
        name: Option<String>,
    },
    InlineIntoParent,
    /// Zero-argument methods marked with this attribute are shown as buttons.
    Button(String),
    ExpandGroups,
    NoReferencePicker,
}

impl Attribute {
    pub const INLINE: &'static str = "__inline__";
}

fn find_attribute<'a, T>(
    attributes: &'a [Attribute],
    func: impl FnMut(&'a Attribute) -> Option<T>,
) -> Option<T> {
    attributes.iter().find_map(func)
}

#[derive(Clone, Debug)]
pub struct MemberInfo {
    pub name: String,
    pub value_type: TypeName,
    pub read_only: bool,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub fn new(name: &str, value_type: impl Into<TypeName>) -> Self {
        Self {
            name: name.to_owned(),
            value_type: value_type.into(),
            read_only: false,
            attributes: Default::default(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn has_attribute(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn is_hidden(&self) -> bool {
        self.has_attribute(&Attribute::HideInEditor)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only || self.has_attribute(&Attribute::ReadOnly)
    }

    pub fn display_name(&self) -> &str {
        find_attribute(&self.attributes, |a| match a {
            Attribute::DisplayName(name) => Some(name.as_str()),
            Attribute::EditorDisplay {
                name: Some(name), ..
            } if name != Attribute::INLINE => Some(name.as_str()),
            _ => None,
        })
        .unwrap_or(&self.name)
    }

    pub fn is_inline(&self) -> bool {
        self.has_attribute(&Attribute::InlineIntoParent)
            || self.attributes.iter().any(|a| {
                matches!(a, Attribute::EditorDisplay { name: Some(name), .. } if name == Attribute::INLINE)
            })
    }

    pub fn group(&self) -> Option<&str> {
        find_attribute(&self.attributes, |a| match a {
            Attribute::EditorDisplay {
                group: Some(group), ..
            } => Some(group.as_str()),
            _ => None,
        })
    }

    pub fn tooltip(&self) -> Option<&str> {
        find_attribute(&self.attributes, |a| match a {
            Attribute::Tooltip(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn order(&self) -> i32 {
        find_attribute(&self.attributes, |a| match a {
            Attribute::Order(order) => Some(*order),
            _ => None,
        })
        .unwrap_or(0)
    }

    pub fn default_value(&self) -> Option<&Value> {
        find_attribute(&self.attributes, |a| match a {
            Attribute::DefaultValue(value) => Some(value),
            _ => None,
        })
    }

    pub fn custom_editor(&self) -> Option<&str> {
        find_attribute(&self.attributes, |a| match a {
            Attribute::CustomEditor(alias) => Some(alias.as_str()),
            _ => None,
        })
    }
}

pub type MethodInvoker = Rc<dyn Fn(Option<&Value>)>;

#[derive(Clone)]
pub struct MethodInfo {
    pub name: String,
    pub is_static: bool,
    pub parameter_count: usize,
    pub attributes: Vec<Attribute>,
    invoker: MethodInvoker,
}

impl Debug for MethodInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("parameter_count", &self.parameter_count)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl MethodInfo {
    pub fn new<F>(name: &str, invoker: F) -> Self
    where
        F: Fn(Option<&Value>) + 'static,
    {
        Self {
            name: name.to_owned(),
            is_static: false,
            parameter_count: 0,
            attributes: Default::default(),
            invoker: Rc::new(invoker),
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Label of the button for methods that can be invoked from the editor.
    pub fn button_label(&self) -> Option<&str> {
        if self.parameter_count != 0 {
            return None;
        }
        find_attribute(&self.attributes, |a| match a {
            Attribute::Button(label) => Some(label.as_str()),
            _ => None,
        })
    }

    /// Calls the method on the target. Static methods receive `None`.
    pub fn invoke(&self, target: Option<&Value>) {
        (self.invoker)(if self.is_static { None } else { target })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    Primitive,
    /// Value type with members.
    Struct,
    /// Reference type with members.
    Class,
    Enum {
        variants: Vec<String>,
    },
    Array {
        element: TypeName,
    },
    Dictionary {
        key: TypeName,
        value: TypeName,
    },
    /// Closed generic type, editors may be registered for the open definition.
    Generic {
        definition: TypeName,
        arguments: Vec<TypeName>,
    },
    Any,
}

#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: TypeName,
    pub kind: TypeKind,
    pub base: Option<TypeName>,
    pub attributes: Vec<Attribute>,
    pub members: Vec<MemberInfo>,
    pub methods: Vec<MethodInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base: None,
            attributes: Default::default(),
            members: Default::default(),
            methods: Default::default(),
        }
    }

    pub fn primitive(name: impl Into<TypeName>) -> Self {
        Self::new(name, TypeKind::Primitive)
    }

    pub fn structure(name: impl Into<TypeName>) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    pub fn class(name: impl Into<TypeName>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn enumeration(name: impl Into<TypeName>, variants: &[&str]) -> Self {
        Self::new(
            name,
            TypeKind::Enum {
                variants: variants.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    pub fn array(name: impl Into<TypeName>, element: impl Into<TypeName>) -> Self {
        Self::new(
            name,
            TypeKind::Array {
                element: element.into(),
            },
        )
    }

    pub fn dictionary(
        name: impl Into<TypeName>,
        key: impl Into<TypeName>,
        value: impl Into<TypeName>,
    ) -> Self {
        Self::new(
            name,
            TypeKind::Dictionary {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    pub fn generic(
        name: impl Into<TypeName>,
        definition: impl Into<TypeName>,
        arguments: Vec<TypeName>,
    ) -> Self {
        Self::new(
            name,
            TypeKind::Generic {
                definition: definition.into(),
                arguments,
            },
        )
    }

    pub fn with_base(mut self, base: impl Into<TypeName>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn find_member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn custom_editor(&self) -> Option<&str> {
        find_attribute(&self.attributes, |a| match a {
            Attribute::CustomEditor(alias) => Some(alias.as_str()),
            _ => None,
        })
    }

    pub fn has_attribute(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    /// Value types are copied on read.
    pub fn is_value_type(&self) -> bool {
        !matches!(self.kind, TypeKind::Class | TypeKind::Any)
    }
}

/// Registry of every type known to the editor.
pub struct TypeDatabase {
    types: FxHashMap<TypeName, Rc<TypeInfo>>,
}

impl Default for TypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDatabase {
    /// Creates a database with builtin types registered.
    pub fn new() -> Self {
        let mut db = Self {
            types: Default::default(),
        };
        db.register(TypeInfo::new(builtin::ANY, TypeKind::Any));
        for primitive in [
            builtin::BOOL,
            builtin::INT,
            builtin::FLOAT,
            builtin::STRING,
            builtin::COLOR,
        ] {
            db.register(TypeInfo::primitive(primitive));
        }
        db.register(TypeInfo::class(builtin::ENGINE_OBJECT));
        for engine_type in [builtin::ASSET, builtin::ACTOR, builtin::SCRIPT] {
            db.register(TypeInfo::class(engine_type).with_base(builtin::ENGINE_OBJECT));
        }
        db
    }

    /// Adds (or replaces) a type.
    pub fn register(&mut self, info: TypeInfo) -> Rc<TypeInfo> {
        let info = Rc::new(info);
        self.types.insert(info.name.clone(), info.clone());
        info
    }

    pub fn unregister(&mut self, name: &str) -> Option<Rc<TypeInfo>> {
        self.types.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Rc<TypeInfo>> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// The type itself followed by its base types, most derived first.
    pub fn base_chain(&self, name: &TypeName) -> Vec<TypeName> {
        let mut chain = vec![name.clone()];
        let mut current = self.types.get(name.as_str()).and_then(|t| t.base.clone());
        while let Some(base) = current {
            // Guard against cyclic definitions.
            if chain.contains(&base) {
                break;
            }
            current = self.types.get(base.as_str()).and_then(|t| t.base.clone());
            chain.push(base);
        }
        chain
    }

    /// Inclusive subclass test.
    pub fn is_subclass_of(&self, name: &TypeName, base: &str) -> bool {
        self.base_chain(name).iter().any(|t| t == base)
    }

    pub fn is_engine_object(&self, name: &TypeName) -> bool {
        self.is_subclass_of(name, builtin::ENGINE_OBJECT)
    }

    pub fn is_asset(&self, name: &TypeName) -> bool {
        self.is_subclass_of(name, builtin::ASSET)
    }

    pub fn is_script(&self, name: &TypeName) -> bool {
        self.is_subclass_of(name, builtin::SCRIPT)
    }

    pub fn is_actor(&self, name: &TypeName) -> bool {
        self.is_subclass_of(name, builtin::ACTOR)
    }

    /// Unknown types are treated as reference types.
    pub fn is_value_type(&self, name: &TypeName) -> bool {
        self.types
            .get(name.as_str())
            .is_some_and(|t| t.is_value_type())
    }

    /// Value a freshly constructed instance of the type would have.
    pub fn default_value(&self, name: &TypeName) -> Value {
        let Some(info) = self.types.get(name.as_str()) else {
            return Value::Null;
        };
        match &info.kind {
            TypeKind::Primitive => match name.as_str() {
                builtin::BOOL => Value::Bool(false),
                builtin::INT => Value::Int(0),
                builtin::FLOAT => Value::Float(0.0),
                builtin::STRING => Value::String(String::new()),
                builtin::COLOR => Value::Color(Color::default()),
                _ => Value::Null,
            },
            TypeKind::Struct => {
                let mut value = StructValue::new(name.clone());
                for member in self.all_members(name) {
                    let member_value = match member.default_value() {
                        Some(default) => default.clone(),
                        None => self.default_value(&member.value_type),
                    };
                    value.fields.push((member.name.clone(), member_value));
                }
                Value::Struct(value)
            }
            TypeKind::Enum { variants } => variants
                .first()
                .map(|v| Value::Enum(super::EnumValue::new(name.clone(), v)))
                .unwrap_or_default(),
            TypeKind::Array { .. } => Value::Array(Vec::new()),
            TypeKind::Dictionary { .. } => Value::Dictionary(Vec::new()),
            TypeKind::Generic { .. } | TypeKind::Class | TypeKind::Any => Value::Null,
        }
    }

    /// Members of the type including inherited ones, base members first.
    pub fn all_members(&self, name: &TypeName) -> Vec<MemberInfo> {
        let mut members = Vec::new();
        for type_name in self.base_chain(name).iter().rev() {
            if let Some(info) = self.types.get(type_name.as_str()) {
                for member in info.members.iter() {
                    match members.iter_mut().find(|m: &&mut MemberInfo| m.name == member.name) {
                        Some(existing) => *existing = member.clone(),
                        None => members.push(member.clone()),
                    }
                }
            }
        }
        members
    }

    /// Methods of the type including inherited ones.
    pub fn all_methods(&self, name: &TypeName) -> Vec<MethodInfo> {
        let mut methods = Vec::new();
        for type_name in self.base_chain(name).iter().rev() {
            if let Some(info) = self.types.get(type_name.as_str()) {
                methods.extend(info.methods.iter().cloned());
            }
        }
        methods
    }

    /// Most derived type shared by every given type, or the universal type.
    pub fn common_base(&self, types: &[TypeName]) -> TypeName {
        let Some((first, rest)) = types.split_first() else {
            return TypeName::any();
        };
        let chains = rest
            .iter()
            .map(|t| self.base_chain(t))
            .collect::<Vec<_>>();
        self.base_chain(first)
            .into_iter()
            .find(|candidate| chains.iter().all(|chain| chain.contains(candidate)))
            .unwrap_or_else(TypeName::any)
    }
}

#[cfg(test)]
mod test {
    use super::{Attribute, MemberInfo, TypeDatabase, TypeInfo};
    use crate::reflect::{builtin, TypeName, Value};

    fn database() -> TypeDatabase {
        let mut db = TypeDatabase::new();
        db.register(
            TypeInfo::structure("Vector")
                .with_member(MemberInfo::new("x", builtin::FLOAT))
                .with_member(
                    MemberInfo::new("y", builtin::FLOAT)
                        .with_attribute(Attribute::DefaultValue(Value::Float(1.0))),
                ),
        );
        db.register(TypeInfo::class("Light").with_base(builtin::ACTOR));
        db.register(TypeInfo::class("PointLight").with_base("Light"));
        db.register(TypeInfo::class("Camera").with_base(builtin::ACTOR));
        db
    }

    #[test]
    fn base_chain_and_subclass() {
        let db = database();
        let chain = db.base_chain(&TypeName::new("PointLight"));
        assert_eq!(chain, vec![
            TypeName::new("PointLight"),
            TypeName::new("Light"),
            TypeName::new(builtin::ACTOR),
            TypeName::new(builtin::ENGINE_OBJECT),
        ]);
        assert!(db.is_engine_object(&TypeName::new("PointLight")));
        assert!(!db.is_asset(&TypeName::new("PointLight")));
        assert!(!db.is_engine_object(&TypeName::new("Vector")));
    }

    #[test]
    fn common_base() {
        let db = database();
        assert_eq!(
            db.common_base(&[TypeName::new("PointLight"), TypeName::new("Camera")]),
            TypeName::new(builtin::ACTOR)
        );
        assert_eq!(
            db.common_base(&[TypeName::new("PointLight"), TypeName::new("Vector")]),
            TypeName::any()
        );
        assert_eq!(
            db.common_base(&[TypeName::new("Light")]),
            TypeName::new("Light")
        );
    }

    #[test]
    fn struct_default_uses_member_defaults() {
        let db = database();
        let value = db.default_value(&TypeName::new("Vector"));
        assert_eq!(value.member("x").unwrap(), Value::Float(0.0));
        assert_eq!(value.member("y").unwrap(), Value::Float(1.0));
        assert!(db.default_value(&TypeName::new("Light")).is_null());
    }

    #[test]
    fn member_attributes() {
        let member = MemberInfo::new("speed", builtin::FLOAT)
            .with_attribute(Attribute::EditorDisplay {
                group: Some("Motion".to_owned()),
                name: Some("Max Speed".to_owned()),
            })
            .with_attribute(Attribute::Order(-1));
        assert_eq!(member.display_name(), "Max Speed");
        assert_eq!(member.group(), Some("Motion"));
        assert_eq!(member.order(), -1);
        assert!(!member.is_inline());

        let inline = MemberInfo::new("data", "Vector").with_attribute(Attribute::EditorDisplay {
            group: None,
            name: Some(Attribute::INLINE.to_owned()),
        });
        assert!(inline.is_inline());
        assert_eq!(inline.display_name(), "data");
    }
}
