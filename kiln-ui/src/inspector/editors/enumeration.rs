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
        reflect::{EnumValue, TypeKind, Value},
    },
    inspector::{
        editor::{CustomEditor, EditorContext},
        editors::{shared_value, sync_enabled},
        layout::LayoutElementsContainer,
        resolver::EditorDescriptor,
        InspectorError,
    },
    message::{MessageData, MessageDirection, UiMessage},
    UiNode, WidgetKind,
};
use std::any::Any;

/// Combo box with the variants of the enumeration.
#[derive(Default)]
pub struct EnumEditor {
    combo_box: Handle<UiNode>,
    variants: Vec<String>,
}

impl EnumEditor {
    pub const NAME: &'static str = "EnumEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for EnumEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        let value_type = layout.values()?.value_type().clone();
        self.variants = match layout.env().types.get(value_type.as_str()).map(|i| i.kind.clone()) {
            Some(TypeKind::Enum { variants }) => variants,
            _ => {
                return Err(InspectorError::Custom(format!(
                    "{value_type} is not an enumeration"
                )))
            }
        };
        self.combo_box = layout.widget(WidgetKind::ComboBox {
            items: self.variants.clone(),
            selected: None,
        });
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let selected = match shared_value(ctx)? {
            Some(Value::Enum(value)) => self.variants.iter().position(|v| *v == value.variant),
            _ => None,
        };
        ctx.send(self.combo_box, MessageData::Selection(selected));
        sync_enabled(ctx, self.combo_box);
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() != self.combo_box
            || message.direction() != MessageDirection::FromWidget
        {
            return Ok(());
        }
        if let MessageData::Selection(Some(index)) = message.data() {
            if let Some(variant) = self.variants.get(*index) {
                let value_type = ctx.values()?.value_type().clone();
                ctx.set_value(Value::Enum(EnumValue::new(value_type, variant)));
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
