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

/// Check box. Mixed values are shown as an undetermined state.
#[derive(Default)]
pub struct BooleanEditor {
    check_box: Handle<UiNode>,
}

impl BooleanEditor {
    pub const NAME: &'static str = "BooleanEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for BooleanEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.check_box = layout.widget(WidgetKind::CheckBox { checked: None });
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let checked = shared_value(ctx)?.and_then(|v| v.as_bool());
        ctx.send(self.check_box, MessageData::Checked(checked));
        sync_enabled(ctx, self.check_box);
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() == self.check_box
            && message.direction() == MessageDirection::FromWidget
        {
            if let MessageData::Checked(Some(checked)) = message.data() {
                ctx.set_value(Value::Bool(*checked));
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
        core::reflect::{builtin, MemberInfo, Object, TypeInfo, Value},
        message::{MessageData, UiMessage},
        test::TestEnvironment,
        WidgetKind,
    };

    #[test]
    fn check_box_edits_value() {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::class("Toggle").with_member(MemberInfo::new("On", builtin::BOOL)));
        let first = Object::new("Toggle").with_field("On", Value::Bool(false)).into_ref();
        let second = Object::new("Toggle").with_field("On", Value::Bool(true)).into_ref();
        let mut presenter = env.presenter();
        presenter.select_many(vec![first.clone().into(), second.clone().into()]);
        presenter.update(&mut env.ui);

        let check_box = env
            .ui
            .find(env.ui.root(), &mut |n| {
                matches!(n.kind(), WidgetKind::CheckBox { .. })
            })
            .unwrap();
        assert_eq!(
            env.ui.node(check_box).kind(),
            &WidgetKind::CheckBox { checked: None }
        );

        env.ui
            .send_message(UiMessage::from_widget(check_box, MessageData::Checked(Some(true))));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert_eq!(first.borrow().field("On"), Some(&Value::Bool(true)));
        assert_eq!(second.borrow().field("On"), Some(&Value::Bool(true)));
        assert_eq!(
            env.ui.node(check_box).kind(),
            &WidgetKind::CheckBox {
                checked: Some(true)
            }
        );
    }
}
