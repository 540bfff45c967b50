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

//! Copy and paste of editor values through the system clipboard.
//!
//! Values are copied as text: engine objects as their id, colors as `#RRGGBBAA`, everything else
//! as JSON. Scripts edited as a whole are copied with their fields, except the fields that tie
//! the script to its actor.

use crate::{
    core::{
        color::Color,
        err,
        pool::Handle,
        reflect::{
            json::{self, format_id},
            ReflectError, TypeKind, TypeName, Value,
        },
        uuid::Uuid,
    },
    inspector::{
        editor::{EditorNode, EditorTree},
        values::{ValueBinding, ValueContainer},
    },
    UserInterface,
};
use std::fmt::{Display, Formatter};
use strum_macros::{AsRefStr, EnumString, VariantNames};

/// Fields that tie a script to its place in the scene. They are never copied nor pasted.
const SCRIPT_PLACEMENT_FIELDS: [&str; 3] = ["Actor", "Parent", "OrderInParent"];

/// Items of the context menu of a property label.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, AsRefStr, EnumString, VariantNames)]
pub enum ContextAction {
    Copy,
    Paste,
    #[strum(serialize = "Reset to default")]
    ResetToDefault,
    #[strum(serialize = "Revert to prefab")]
    RevertToReference,
}

#[derive(Debug)]
pub enum ClipboardError {
    /// There is no clipboard.
    Unavailable,
    /// The clipboard provider failed.
    Provider(String),
    /// The editor has nothing to copy or cannot be modified.
    NoTarget,
    /// The clipboard content does not look like a value of the edited type.
    Malformed(String),
    TypeMismatch {
        expected: TypeName,
        actual: String,
    },
    Json(serde_json::Error),
    Reflect(ReflectError),
    /// The modification was rejected by the editor tree.
    Rejected,
}

impl Display for ClipboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::Unavailable => write!(f, "clipboard is not available"),
            ClipboardError::Provider(e) => write!(f, "clipboard error: {e}"),
            ClipboardError::NoTarget => write!(f, "editor has no values to copy or paste"),
            ClipboardError::Malformed(text) => write!(f, "malformed clipboard data: {text}"),
            ClipboardError::TypeMismatch { expected, actual } => {
                write!(f, "expected a value of type {expected}, got {actual}")
            }
            ClipboardError::Json(e) => write!(f, "json error: {e}"),
            ClipboardError::Reflect(e) => Display::fmt(e, f),
            ClipboardError::Rejected => write!(f, "modification was rejected"),
        }
    }
}

impl std::error::Error for ClipboardError {}

impl From<serde_json::Error> for ClipboardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ReflectError> for ClipboardError {
    fn from(e: ReflectError) -> Self {
        Self::Reflect(e)
    }
}

/// Validated clipboard content.
enum Paste {
    Set(Value),
    /// Fields applied in place onto every target object.
    Populate(serde_json::Value),
}

fn is_whole_script(tree: &EditorTree, values: &ValueContainer) -> bool {
    matches!(
        values.binding(),
        ValueBinding::Root | ValueBinding::Identity
    ) && values
        .first()
        .and_then(|v| v.runtime_type())
        .is_some_and(|t| tree.env().types.is_script(&t))
}

fn strip_placement_fields(json: &mut serde_json::Value) {
    if let Some(map) = json.as_object_mut() {
        for field in SCRIPT_PLACEMENT_FIELDS {
            map.remove(field);
        }
    }
}

fn writable_values(tree: &EditorTree, handle: Handle<EditorNode>) -> Option<&ValueContainer> {
    tree.node(handle)
        .and_then(|n| n.values())
        .filter(|v| !v.is_empty())
}

impl EditorTree {
    /// Text the editor's first value is copied as.
    pub fn copy_text(&self, handle: Handle<EditorNode>) -> Result<String, ClipboardError> {
        let values = writable_values(self, handle).ok_or(ClipboardError::NoTarget)?;
        let Some(value) = values.first() else {
            return Err(ClipboardError::NoTarget);
        };
        let types = &self.env().types;
        let text = match value {
            Value::Object(object) if is_whole_script(self, values) => {
                let object = object.try_borrow().map_err(|_| ReflectError::ObjectBusy)?;
                let mut fields = json::fields_to_json(object.fields(), types);
                strip_placement_fields(&mut fields);
                serde_json::to_string(&fields)?
            }
            Value::Object(_)
                if value
                    .runtime_type()
                    .is_some_and(|t| types.is_engine_object(&t)) =>
            {
                value.object_id().map(format_id).unwrap_or_default()
            }
            Value::Color(color) => color.to_hex(),
            _ => serde_json::to_string(&json::to_json(value, types))?,
        };
        Ok(text)
    }

    /// Copies the editor's first value to the clipboard.
    pub fn copy(&self, ui: &UserInterface, handle: Handle<EditorNode>) -> Result<(), ClipboardError> {
        let result = self.copy_text(handle).and_then(|text| {
            ui.clipboard_mut()
                .ok_or(ClipboardError::Unavailable)?
                .set_contents(text)
                .map_err(|e| ClipboardError::Provider(e.to_string()))
        });
        if let Err(e) = result.as_ref() {
            err!("Cannot copy the value. {e}");
        }
        result
    }

    fn clipboard_text(ui: &UserInterface) -> Result<String, ClipboardError> {
        ui.clipboard_mut()
            .ok_or(ClipboardError::Unavailable)?
            .get_contents()
            .map_err(|e| ClipboardError::Provider(e.to_string()))
    }

    fn parse_paste(&self, handle: Handle<EditorNode>, text: &str) -> Result<Paste, ClipboardError> {
        let values = writable_values(self, handle).ok_or(ClipboardError::NoTarget)?;
        if self.is_read_only() || values.is_read_only() {
            return Err(ClipboardError::NoTarget);
        }
        let env = self.env();
        let types = &env.types;
        let objects = env.objects.as_ref();
        let text = text.trim();

        // A member of the universal type is pasted as whatever it currently holds.
        let value_type = match values.shared_runtime_type() {
            Some(runtime_type) if values.value_type().is_any() => runtime_type,
            _ => values.value_type().clone(),
        };

        if is_whole_script(self, values) {
            let mut fields = parse_braced(text)?;
            strip_placement_fields(&mut fields);
            return populate_targets(self, values, fields);
        }

        if types.is_engine_object(&value_type) {
            if text.len() != 32 {
                return Err(ClipboardError::Malformed(text.to_owned()));
            }
            let id = Uuid::try_parse(text).map_err(|_| ClipboardError::Malformed(text.to_owned()))?;
            let object = objects
                .find(id)
                .ok_or_else(|| ClipboardError::Malformed(format!("object {text} does not exist")))?;
            let actual = Value::Object(object.clone())
                .runtime_type()
                .ok_or(ReflectError::ObjectBusy)?;
            if !types.is_subclass_of(&actual, value_type.as_str()) {
                return Err(ClipboardError::TypeMismatch {
                    expected: value_type,
                    actual: actual.to_string(),
                });
            }
            return Ok(Paste::Set(Value::Object(object)));
        }

        if value_type.as_str() == crate::core::reflect::builtin::COLOR {
            let hex = text.trim_matches('"');
            return Color::from_hex(hex)
                .map(|c| Paste::Set(Value::Color(c)))
                .ok_or_else(|| ClipboardError::Malformed(text.to_owned()));
        }

        let kind = types.get(value_type.as_str()).map(|info| info.kind.clone());
        let all_objects = values.values().iter().all(|v| matches!(v, Value::Object(_)));
        match kind {
            Some(TypeKind::Class) if all_objects => {
                populate_targets(self, values, parse_braced(text)?)
            }
            Some(TypeKind::Struct | TypeKind::Class) => {
                let json = parse_braced(text)?;
                Ok(Paste::Set(json::from_json(&json, &value_type, types, objects)?))
            }
            _ => {
                let json = serde_json::from_str::<serde_json::Value>(text)?;
                Ok(Paste::Set(json::from_json(&json, &value_type, types, objects)?))
            }
        }
    }

    /// True if the clipboard holds something that can be pasted into the editor.
    pub fn can_paste(&self, ui: &UserInterface, handle: Handle<EditorNode>) -> bool {
        Self::clipboard_text(ui)
            .and_then(|text| self.parse_paste(handle, &text))
            .is_ok()
    }

    /// Validates the clipboard content and applies it. Nothing is modified if validation fails.
    pub fn paste(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> Result<(), ClipboardError> {
        let result = Self::clipboard_text(ui)
            .and_then(|text| self.parse_paste(handle, &text))
            .and_then(|paste| self.apply_paste(ui, handle, paste));
        if let Err(e) = result.as_ref() {
            err!("Cannot paste the value. {e}");
        }
        result
    }

    fn apply_paste(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
        paste: Paste,
    ) -> Result<(), ClipboardError> {
        match paste {
            Paste::Set(value) => {
                if self.set_value(ui, handle, value, None) {
                    Ok(())
                } else {
                    Err(ClipboardError::Rejected)
                }
            }
            Paste::Populate(fields) => {
                if self.set_fields(ui, handle, fields, None) {
                    Ok(())
                } else {
                    Err(ClipboardError::Rejected)
                }
            }
        }
    }
}

/// Checks that the fields convert for every target object.
fn populate_targets(
    tree: &EditorTree,
    values: &ValueContainer,
    fields: serde_json::Value,
) -> Result<Paste, ClipboardError> {
    let env = tree.env();
    for value in values.values() {
        let Value::Object(object) = value else {
            return Err(ClipboardError::NoTarget);
        };
        json::convert_fields(object, &fields, &env.types, env.objects.as_ref())?;
    }
    Ok(Paste::Populate(fields))
}

fn parse_braced(text: &str) -> Result<serde_json::Value, ClipboardError> {
    if !(text.starts_with('{') && text.ends_with('}')) {
        return Err(ClipboardError::Malformed(text.to_owned()));
    }
    Ok(serde_json::from_str(text)?)
}
