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

//! Builtin editors.

mod array;
mod boolean;
mod color;
mod dictionary;
mod enumeration;
mod generic;
mod numeric;
mod object_ref;
mod root;
mod string;

pub use array::ArrayEditor;
pub use boolean::BooleanEditor;
pub use color::ColorEditor;
pub use dictionary::DictionaryEditor;
pub use enumeration::EnumEditor;
pub use generic::GenericEditor;
pub use numeric::{FloatEditor, IntegerEditor};
pub use object_ref::{AssetRefEditor, ObjectRefEditor};
pub use root::RootEditor;
pub use string::StringEditor;

use crate::{
    core::{
        pool::Handle,
        reflect::{builtin, Value},
    },
    inspector::{editor::EditorContext, resolver::EditorModule, InspectorError},
    message::MessageData,
    UiNode,
};

pub const BUILTIN_MODULE: &str = "builtin";

/// Default editors of primitive types. Every builtin editor is also available under its name
/// for custom editor attributes.
pub fn builtin_module() -> EditorModule {
    let mut module = EditorModule::new(BUILTIN_MODULE)
        .with_default(builtin::BOOL, BooleanEditor::descriptor())
        .with_default(builtin::INT, IntegerEditor::descriptor())
        .with_default(builtin::FLOAT, FloatEditor::descriptor())
        .with_default(builtin::STRING, StringEditor::descriptor())
        .with_default(builtin::COLOR, ColorEditor::descriptor());
    for descriptor in [
        GenericEditor::descriptor(),
        BooleanEditor::descriptor(),
        IntegerEditor::descriptor(),
        FloatEditor::descriptor(),
        StringEditor::descriptor(),
        ColorEditor::descriptor(),
        EnumEditor::descriptor(),
        ArrayEditor::descriptor(),
        DictionaryEditor::descriptor(),
        ObjectRefEditor::descriptor(),
        ObjectRefEditor::asset_descriptor(),
    ] {
        let name = descriptor.name().to_owned();
        module = module.with_alias(&name, descriptor);
    }
    module
}

/// Disables the widget of a read-only editor.
pub(crate) fn sync_enabled(ctx: &mut EditorContext, widget: Handle<UiNode>) {
    let enabled = !ctx.is_read_only();
    ctx.send(widget, MessageData::Enabled(enabled));
}

/// Shared value of all targets, `None` if targets have different values.
pub(crate) fn shared_value(ctx: &EditorContext) -> Result<Option<Value>, InspectorError> {
    let values = ctx.values()?;
    if values.has_different_values() {
        Ok(None)
    } else {
        Ok(values.first().cloned())
    }
}
