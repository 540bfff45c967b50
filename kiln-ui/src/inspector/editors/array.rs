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

use crate::{
    core::{
        pool::Handle,
        reflect::{TypeKind, TypeName, Value},
    },
    inspector::{
        editor::{CustomEditor, DisplayStyle, EditorContext},
        editors::sync_enabled,
        layout::LayoutElementsContainer,
        resolver::EditorDescriptor,
        values::{ValueBinding, ValueContainer},
        InspectorError,
    },
    message::{MessageData, MessageDirection, UiMessage},
    UiNode, WidgetKind,
};
use std::any::Any;

/// Editor of arrays: a size field with add and remove buttons followed by an editor per
/// element. Selected arrays of different lengths show their common prefix.
#[derive(Default)]
pub struct ArrayEditor {
    size: Handle<UiNode>,
    add: Handle<UiNode>,
    remove: Handle<UiNode>,
    built_len: usize,
    element_type: Option<TypeName>,
}

impl ArrayEditor {
    pub const NAME: &'static str = "ArrayEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

/// Lengths of the shortest and the longest array, `None` if some value is not an array.
fn lengths(values: &ValueContainer) -> Option<(usize, usize)> {
    let mut lengths = values.values().iter().map(|v| v.as_array().map(<[Value]>::len));
    let first = lengths.next()??;
    lengths.try_fold((first, first), |(min, max), len| {
        let len = len?;
        Some((min.min(len), max.max(len)))
    })
}

fn element_label(index: usize) -> String {
    format!("[{index}]")
}

impl ArrayEditor {
    fn element_default(&self, ctx: &EditorContext) -> Value {
        match self.element_type.as_ref() {
            Some(element_type) => ctx.env().types.default_value(element_type),
            None => Value::Null,
        }
    }

    fn resize(&self, ctx: &mut EditorContext, new_len: usize) -> Result<(), InspectorError> {
        let Some(Value::Array(mut items)) = ctx.values()?.first().cloned() else {
            return Ok(());
        };
        if new_len == items.len() {
            return Ok(());
        }
        let filler = self.element_default(ctx);
        items.resize(new_len, filler);
        ctx.set_value(Value::Array(items));
        Ok(())
    }
}

impl CustomEditor for ArrayEditor {
    fn style(&self) -> DisplayStyle {
        DisplayStyle::Group
    }

    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        let values = layout.values()?.clone();
        self.element_type = match layout
            .env()
            .types
            .get(values.value_type().as_str())
            .map(|info| info.kind.clone())
        {
            Some(TypeKind::Array { element }) => Some(element),
            _ => None,
        };
        let element_type = self.element_type.clone().unwrap_or_else(TypeName::any);

        let (min, max) = lengths(&values).unwrap_or_default();
        self.built_len = min;
        self.size = layout.widget(WidgetKind::NumericField {
            value: min as f64,
            integer: true,
            mixed: min != max,
        });
        self.add = layout.button("+");
        self.remove = layout.button("-");

        for index in 0..min {
            let element =
                ValueContainer::new(&values, ValueBinding::Element(index), element_type.clone())?;
            layout.property(&element_label(index), element)?;
        }
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let (min, max) = lengths(ctx.values()?).ok_or_else(|| {
            InspectorError::StructuralMismatch("array editor got a non-array value".to_owned())
        })?;
        if min != self.built_len {
            ctx.rebuild_layout_on_refresh();
            ctx.skip_children_refresh();
        }
        if min == max {
            ctx.send(self.size, MessageData::Integer(min as i64));
        }
        for widget in [self.size, self.add, self.remove] {
            sync_enabled(ctx, widget);
        }
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.direction() != MessageDirection::FromWidget {
            return Ok(());
        }
        let destination = message.destination();
        match message.data() {
            MessageData::Integer(len) if destination == self.size => {
                self.resize(ctx, (*len).max(0) as usize)?
            }
            MessageData::Click if destination == self.add => self.resize(ctx, self.built_len + 1)?,
            MessageData::Click if destination == self.remove && self.built_len > 0 => {
                self.resize(ctx, self.built_len - 1)?
            }
            _ => (),
        }
        Ok(())
    }

    // The array is replaced as a whole, element editors are rebuilt anyway.
    fn revert_value_with_children(&self) -> Option<bool> {
        Some(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
