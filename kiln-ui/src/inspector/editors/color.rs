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
    core::{color::Color, pool::Handle, reflect::Value},
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

#[derive(Default)]
pub struct ColorEditor {
    field: Handle<UiNode>,
}

impl ColorEditor {
    pub const NAME: &'static str = "ColorEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for ColorEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.field = layout.widget(WidgetKind::ColorField {
            color: Color::default(),
        });
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        if let Some(color) = shared_value(ctx)?.and_then(|v| v.as_color()) {
            ctx.send(self.field, MessageData::Color(color));
        }
        sync_enabled(ctx, self.field);
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() == self.field
            && message.direction() == MessageDirection::FromWidget
        {
            if let MessageData::Color(color) = message.data() {
                ctx.set_value(Value::Color(*color));
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
