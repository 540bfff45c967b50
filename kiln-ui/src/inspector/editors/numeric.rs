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
    core::{pool::Handle, reflect::Value},
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

fn add_field(layout: &mut LayoutElementsContainer, integer: bool) -> Handle<UiNode> {
    layout.widget(WidgetKind::NumericField {
        value: 0.0,
        integer,
        mixed: false,
    })
}

/// Shows the shared value, or marks the field as mixed.
fn refresh_field(
    ctx: &mut EditorContext,
    field: Handle<UiNode>,
    integer: bool,
) -> Result<(), InspectorError> {
    match shared_value(ctx)? {
        Some(Value::Int(value)) if integer => ctx.send(field, MessageData::Integer(value)),
        Some(Value::Float(value)) if !integer => ctx.send(field, MessageData::Float(value)),
        _ => {
            if let Some(WidgetKind::NumericField { mixed, .. }) =
                ctx.ui.try_get_mut(field).map(|n| &mut n.kind)
            {
                *mixed = true;
            }
        }
    }
    sync_enabled(ctx, field);
    Ok(())
}

#[derive(Default)]
pub struct IntegerEditor {
    field: Handle<UiNode>,
}

impl IntegerEditor {
    pub const NAME: &'static str = "IntegerEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for IntegerEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.field = add_field(layout, true);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        refresh_field(ctx, self.field, true)
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() == self.field
            && message.direction() == MessageDirection::FromWidget
        {
            match message.data() {
                MessageData::Integer(value) => {
                    ctx.set_value(Value::Int(*value));
                }
                MessageData::Float(value) => {
                    ctx.set_value(Value::Int(value.round() as i64));
                }
                _ => (),
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

#[derive(Default)]
pub struct FloatEditor {
    field: Handle<UiNode>,
}

impl FloatEditor {
    pub const NAME: &'static str = "FloatEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for FloatEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.field = add_field(layout, false);
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        refresh_field(ctx, self.field, false)
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() == self.field
            && message.direction() == MessageDirection::FromWidget
        {
            match message.data() {
                MessageData::Float(value) => {
                    ctx.set_value_with_token(Value::Float(*value), "drag");
                }
                MessageData::Integer(value) => {
                    ctx.set_value(Value::Float(*value as f64));
                }
                _ => (),
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

#[cfg(test)]
mod test {
    use crate::{
        core::reflect::Value,
        message::{MessageData, UiMessage},
        test::{counter, TestEnvironment},
        WidgetKind,
    };

    #[test]
    fn mixed_values_are_marked() {
        let mut env = TestEnvironment::new();
        let mut presenter = env.presenter();
        presenter.select_many(vec![counter(1).into(), counter(2).into()]);
        presenter.update(&mut env.ui);

        let field = env
            .ui
            .find(env.ui.root(), &mut |n| {
                matches!(n.kind(), WidgetKind::NumericField { .. })
            })
            .unwrap();
        assert!(matches!(
            env.ui.node(field).kind(),
            WidgetKind::NumericField { mixed: true, .. }
        ));
    }

    #[test]
    fn field_input_is_applied() {
        let mut env = TestEnvironment::new();
        let object = counter(1);
        let mut presenter = env.presenter();
        presenter.select(object.clone().into());
        presenter.update(&mut env.ui);

        let field = env
            .ui
            .find(env.ui.root(), &mut |n| {
                matches!(n.kind(), WidgetKind::NumericField { .. })
            })
            .unwrap();
        env.ui
            .send_message(UiMessage::from_widget(field, MessageData::Integer(42)));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert_eq!(object.borrow().field("Count"), Some(&Value::Int(42)));
    }
}
