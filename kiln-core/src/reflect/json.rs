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

//! Conversion between dynamic values and JSON. Used by the editor clipboard, so the format is
//! plain: structs and non-engine objects become JSON objects, engine objects become their id
//! (simple hex form), colors become `#RRGGBBAA` strings and enums become variant names.

use super::{
    builtin, EnumValue, Object, ObjectRef, ReflectError, TypeDatabase, TypeKind, TypeName, Value,
};
use crate::{color::Color, object::ObjectModel};
use serde_json::{Map, Number};
use uuid::Uuid;

const DICTIONARY_KEY: &str = "Key";
const DICTIONARY_VALUE: &str = "Value";

fn invalid(reason: impl Into<String>) -> ReflectError {
    ReflectError::InvalidData(reason.into())
}

/// Formats an object id the way it appears in copied data.
pub fn format_id(id: Uuid) -> String {
    id.simple().to_string()
}

pub fn fields_to_json(fields: &[(String, Value)], db: &TypeDatabase) -> serde_json::Value {
    let mut map = Map::new();
    for (name, value) in fields {
        map.insert(name.clone(), to_json(value, db));
    }
    serde_json::Value::Object(map)
}

pub fn to_json(value: &Value, db: &TypeDatabase) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::Int(v) => serde_json::Value::Number(Number::from(*v)),
        Value::Float(v) => Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(v) => serde_json::Value::String(v.clone()),
        Value::Color(v) => serde_json::Value::String(v.to_hex()),
        Value::Enum(v) => serde_json::Value::String(v.variant.clone()),
        Value::Struct(v) => fields_to_json(&v.fields, db),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|i| to_json(i, db)).collect())
        }
        Value::Dictionary(entries) => serde_json::Value::Array(
            entries
                .iter()
                .map(|(k, v)| {
                    let mut entry = Map::new();
                    entry.insert(DICTIONARY_KEY.to_owned(), to_json(k, db));
                    entry.insert(DICTIONARY_VALUE.to_owned(), to_json(v, db));
                    serde_json::Value::Object(entry)
                })
                .collect(),
        ),
        Value::Object(object) => match object.try_borrow() {
            Ok(object) => {
                if db.is_engine_object(object.type_name()) {
                    serde_json::Value::String(format_id(object.id()))
                } else {
                    fields_to_json(object.fields(), db)
                }
            }
            Err(_) => serde_json::Value::Null,
        },
    }
}

fn expect_str<'a>(json: &'a serde_json::Value, ty: &TypeName) -> Result<&'a str, ReflectError> {
    json.as_str()
        .ok_or_else(|| invalid(format!("expected string for {ty}, got {json}")))
}

/// Converts JSON into a value of the given declared type. Engine objects are looked up by id
/// in the object model and must be of a compatible type.
pub fn from_json(
    json: &serde_json::Value,
    ty: &TypeName,
    db: &TypeDatabase,
    model: &dyn ObjectModel,
) -> Result<Value, ReflectError> {
    let Some(info) = db.get(ty.as_str()) else {
        return Err(invalid(format!("unknown type {ty}")));
    };

    match &info.kind {
        TypeKind::Primitive => match ty.as_str() {
            builtin::BOOL => json
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| invalid(format!("expected bool, got {json}"))),
            builtin::INT => json
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| invalid(format!("expected integer, got {json}"))),
            builtin::FLOAT => json
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| invalid(format!("expected number, got {json}"))),
            builtin::STRING => expect_str(json, ty).map(|s| Value::String(s.to_owned())),
            builtin::COLOR => {
                let text = expect_str(json, ty)?;
                Color::from_hex(text)
                    .map(Value::Color)
                    .ok_or_else(|| invalid(format!("{text} is not a color")))
            }
            _ => Err(invalid(format!("unsupported primitive {ty}"))),
        },
        TypeKind::Struct => {
            let map = json
                .as_object()
                .ok_or_else(|| invalid(format!("expected object for {ty}, got {json}")))?;
            let mut value = db.default_value(ty);
            for member in db.all_members(ty) {
                if let Some(field) = map.get(&member.name) {
                    let field = from_json(field, &member.value_type, db, model)?;
                    value.set_member(&member.name, field)?;
                }
            }
            Ok(value)
        }
        TypeKind::Enum { variants } => {
            let variant = expect_str(json, ty)?;
            if variants.iter().any(|v| v == variant) {
                Ok(Value::Enum(EnumValue::new(ty.clone(), variant)))
            } else {
                Err(invalid(format!("{variant} is not a variant of {ty}")))
            }
        }
        TypeKind::Array { element } => json
            .as_array()
            .ok_or_else(|| invalid(format!("expected array for {ty}, got {json}")))?
            .iter()
            .map(|item| from_json(item, element, db, model))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        TypeKind::Dictionary { key, value } => {
            let entries = json
                .as_array()
                .ok_or_else(|| invalid(format!("expected array for {ty}, got {json}")))?;
            let mut result = Vec::with_capacity(entries.len());
            for entry in entries {
                let (Some(k), Some(v)) = (entry.get(DICTIONARY_KEY), entry.get(DICTIONARY_VALUE))
                else {
                    return Err(invalid(format!("malformed dictionary entry {entry}")));
                };
                result.push((from_json(k, key, db, model)?, from_json(v, value, db, model)?));
            }
            Ok(Value::Dictionary(result))
        }
        TypeKind::Class if db.is_engine_object(ty) => {
            if json.is_null() {
                return Ok(Value::Null);
            }
            let text = expect_str(json, ty)?;
            let id = Uuid::try_parse(text).map_err(|e| invalid(e.to_string()))?;
            let object = model
                .find(id)
                .ok_or_else(|| invalid(format!("object {text} does not exist")))?;
            let object_type = object
                .try_borrow()
                .map_err(|_| ReflectError::ObjectBusy)?
                .type_name()
                .clone();
            if db.is_subclass_of(&object_type, ty.as_str()) {
                Ok(Value::Object(object))
            } else {
                Err(ReflectError::TypeMismatch {
                    expected: ty.to_string(),
                    actual: object_type.to_string(),
                })
            }
        }
        TypeKind::Class => {
            if json.is_null() {
                return Ok(Value::Null);
            }
            let mut object = Object::new(ty.clone());
            for member in db.all_members(ty) {
                object = object.with_field(&member.name, db.default_value(&member.value_type));
            }
            let object = object.into_ref();
            populate(&object, json, db, model)?;
            Ok(Value::Object(object))
        }
        TypeKind::Generic { .. } | TypeKind::Any => Ok(infer(json)),
    }
}

/// Best-effort conversion for values without a declared type.
fn infer(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(v) => Value::Bool(*v),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(infer).collect()),
        serde_json::Value::Object(_) => Value::Null,
    }
}

/// Converts JSON fields into member values of the object's type. Fields unknown to the type
/// and read-only members are skipped.
pub fn convert_fields(
    object: &ObjectRef,
    json: &serde_json::Value,
    db: &TypeDatabase,
    model: &dyn ObjectModel,
) -> Result<Vec<(String, Value)>, ReflectError> {
    let map = json
        .as_object()
        .ok_or_else(|| invalid(format!("expected object, got {json}")))?;
    let type_name = object
        .try_borrow()
        .map_err(|_| ReflectError::ObjectBusy)?
        .type_name()
        .clone();

    let mut converted = Vec::new();
    for member in db.all_members(&type_name) {
        if member.is_read_only() {
            continue;
        }
        if let Some(field) = map.get(&member.name) {
            converted.push((
                member.name.clone(),
                from_json(field, &member.value_type, db, model)?,
            ));
        }
    }
    Ok(converted)
}

/// Applies JSON fields onto an existing object, see [`convert_fields`].
pub fn populate(
    object: &ObjectRef,
    json: &serde_json::Value,
    db: &TypeDatabase,
    model: &dyn ObjectModel,
) -> Result<(), ReflectError> {
    // Convert everything first so a bad field leaves the object untouched.
    let converted = convert_fields(object, json, db, model)?;
    let mut object = object.try_borrow_mut().map_err(|_| ReflectError::ObjectBusy)?;
    for (name, value) in converted {
        object.insert_field(&name, value);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{from_json, populate, to_json};
    use crate::{
        color::Color,
        object::World,
        reflect::{builtin, MemberInfo, Object, StructValue, TypeDatabase, TypeInfo, TypeName, Value},
    };
    use serde_json::json;

    fn database() -> TypeDatabase {
        let mut db = TypeDatabase::new();
        db.register(
            TypeInfo::structure("Vector")
                .with_member(MemberInfo::new("x", builtin::FLOAT))
                .with_member(MemberInfo::new("y", builtin::FLOAT)),
        );
        db.register(
            TypeInfo::class("Mover")
                .with_base(builtin::SCRIPT)
                .with_member(MemberInfo::new("speed", builtin::FLOAT))
                .with_member(MemberInfo::new("tint", builtin::COLOR))
                .with_member(MemberInfo::new("target", builtin::ACTOR))
                .with_member(MemberInfo::new("id", builtin::INT).with_read_only(true)),
        );
        db.register(TypeInfo::array("Vector[]", "Vector"));
        db
    }

    #[test]
    fn struct_round_trip() {
        let db = database();
        let world = World::default();
        let value = Value::Struct(
            StructValue::new("Vector")
                .with_field("x", Value::Float(1.5))
                .with_field("y", Value::Float(-2.0)),
        );
        let json = to_json(&value, &db);
        assert_eq!(json, json!({ "x": 1.5, "y": -2.0 }));
        let array = Value::Array(vec![value.clone()]);
        let restored = from_json(
            &to_json(&array, &db),
            &TypeName::new("Vector[]"),
            &db,
            &world,
        )
        .unwrap();
        assert_eq!(restored, array);
    }

    #[test]
    fn engine_objects_are_ids() {
        let db = database();
        let mut world = World::default();
        let actor = Object::new(builtin::ACTOR).into_ref();
        let id = actor.borrow().id();
        world.add_actor(actor.clone(), None);

        let json = to_json(&Value::Object(actor.clone()), &db);
        assert_eq!(json, json!(id.simple().to_string()));
        assert_eq!(json.as_str().unwrap().len(), 32);

        let restored = from_json(&json, &TypeName::new(builtin::ACTOR), &db, &world).unwrap();
        assert_eq!(restored, Value::Object(actor));

        // Unknown id.
        assert!(from_json(
            &json!(uuid::Uuid::new_v4().simple().to_string()),
            &TypeName::new(builtin::ACTOR),
            &db,
            &world
        )
        .is_err());
    }

    #[test]
    fn populate_skips_unknown_and_read_only_fields() {
        let db = database();
        let world = World::default();
        let script = Object::new("Mover")
            .with_field("speed", Value::Float(1.0))
            .with_field("tint", Value::Color(Color::WHITE))
            .with_field("target", Value::Null)
            .with_field("id", Value::Int(3))
            .into_ref();
        populate(
            &script,
            &json!({ "speed": 4.0, "tint": "#FF0000FF", "id": 10, "unknown": true }),
            &db,
            &world,
        )
        .unwrap();
        let script = script.borrow();
        assert_eq!(script.field("speed"), Some(&Value::Float(4.0)));
        assert_eq!(script.field("tint"), Some(&Value::Color(Color::RED)));
        assert_eq!(script.field("id"), Some(&Value::Int(3)));
    }

    #[test]
    fn bad_field_leaves_object_untouched() {
        let db = database();
        let world = World::default();
        let script = Object::new("Mover")
            .with_field("speed", Value::Float(1.0))
            .with_field("tint", Value::Color(Color::WHITE))
            .into_ref();
        assert!(populate(
            &script,
            &json!({ "speed": 4.0, "tint": "not a color" }),
            &db,
            &world
        )
        .is_err());
        assert_eq!(script.borrow().field("speed"), Some(&Value::Float(1.0)));
    }
}
