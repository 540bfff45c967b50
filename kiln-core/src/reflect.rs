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

//! Runtime reflection contract. The inspector never touches concrete Rust types of the edited
//! data: it sees a [`TypeDatabase`] describing every type (members, attributes, methods, base
//! type) and dynamic [`Value`]s that can be read and written member by member.

use std::{
    borrow::Borrow,
    fmt::{Debug, Display, Formatter},
    rc::Rc,
};

pub mod json;
mod types;
mod value;

pub use types::*;
pub use value::*;

/// Names of the types that every [`TypeDatabase`] knows about.
pub mod builtin {
    /// The universal type, every value can be stored in a member of this type.
    pub const ANY: &str = "object";
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const FLOAT: &str = "float";
    pub const STRING: &str = "string";
    pub const COLOR: &str = "Color";
    /// Base type of every engine object (actors, scripts, assets).
    pub const ENGINE_OBJECT: &str = "Object";
    pub const ASSET: &str = "Asset";
    pub const ACTOR: &str = "Actor";
    pub const SCRIPT: &str = "Script";
}

/// Cheap to clone type identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Rc<str>);

impl TypeName {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn any() -> Self {
        Self::new(builtin::ANY)
    }

    pub fn is_any(&self) -> bool {
        &*self.0 == builtin::ANY
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Rc::from(name))
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// An error that may occur when reading or writing a value through reflection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectError {
    /// The target does not have a member with the given name. This is what happens when the
    /// runtime type of an edited object changes under the inspector.
    MemberNotFound { type_name: String, member: String },
    /// The target is null while a member access was requested.
    NullTarget { member: String },
    /// The target is not something that has members (or elements).
    NotAContainer { type_name: String },
    /// An array index is outside of the array.
    IndexOutOfBounds { index: usize, len: usize },
    /// A dictionary has no entry with the given key.
    KeyNotFound(String),
    /// A value of an unexpected type was supplied.
    TypeMismatch { expected: String, actual: String },
    /// The member cannot be written.
    ReadOnly(String),
    /// An object is already mutably borrowed elsewhere.
    ObjectBusy,
    /// Serialized data could not be converted to a value.
    InvalidData(String),
}

impl Display for ReflectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReflectError::MemberNotFound { type_name, member } => {
                write!(f, "type {type_name} has no member {member}")
            }
            ReflectError::NullTarget { member } => {
                write!(f, "unable to access member {member} of a null value")
            }
            ReflectError::NotAContainer { type_name } => {
                write!(f, "value of type {type_name} has no members")
            }
            ReflectError::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds (len is {len})")
            }
            ReflectError::KeyNotFound(key) => write!(f, "no entry with key {key}"),
            ReflectError::TypeMismatch { expected, actual } => {
                write!(f, "expected value of type {expected}, got {actual}")
            }
            ReflectError::ReadOnly(member) => write!(f, "member {member} is read-only"),
            ReflectError::ObjectBusy => write!(f, "object is borrowed"),
            ReflectError::InvalidData(reason) => write!(f, "invalid data: {reason}"),
        }
    }
}

impl std::error::Error for ReflectError {}

pub mod prelude {
    pub use super::{
        builtin, Attribute, EnumValue, MemberInfo, MethodInfo, Object, ObjectRef, ReflectError,
        StructValue, TypeDatabase, TypeInfo, TypeKind, TypeName, Value,
    };
}
