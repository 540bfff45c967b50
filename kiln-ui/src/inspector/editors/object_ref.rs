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
        reflect::{json::format_id, Value},
        warn,
    },
    inspector::{
        editor::{CustomEditor, EditorContext},
        editors::sync_enabled,
        layout::LayoutElementsContainer,
        resolver::EditorDescriptor,
        InspectorError,
    },
    message::{MessageData, MessageDirection, UiMessage},
    UiNode, WidgetKind,
};
use std::any::Any;
use uuid::Uuid;

/// Picker of engine object references. The field shows the name of the referenced object (or
/// its id if it has no name) and accepts objects of the declared type.
pub struct ObjectRefEditor {
    field: Handle<UiNode>,
    /// Member holding the displayed name.
    caption_member: &'static str,
}

impl Default for ObjectRefEditor {
    fn default() -> Self {
        Self::with_caption("Name")
    }
}

impl ObjectRefEditor {
    pub const NAME: &'static str = "ObjectRefEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }

    /// Picker for assets, which are captioned by their path.
    pub fn asset_descriptor() -> EditorDescriptor {
        AssetRefEditor::descriptor()
    }

    fn with_caption(caption_member: &'static str) -> Self {
        Self {
            field: Handle::NONE,
            caption_member,
        }
    }

    fn caption(&self, value: &Value) -> (Option<Uuid>, String) {
        match value {
            Value::Object(_) => {
                let id = value.object_id();
                let caption = match value.member(self.caption_member) {
                    Ok(Value::String(text)) if !text.is_empty() => text,
                    _ => id.map(format_id).unwrap_or_default(),
                };
                (id, caption)
            }
            _ => (None, "None".to_owned()),
        }
    }

    fn pick(&self, ctx: &mut EditorContext, id: Option<Uuid>) -> Result<(), InspectorError> {
        let Some(id) = id else {
            ctx.set_value(Value::Null);
            return Ok(());
        };
        let env = ctx.env();
        let Some(object) = env.objects.find(id) else {
            warn!("Unable to pick object {}: there is no such object.", format_id(id));
            return Ok(());
        };
        let value = Value::Object(object);
        let expected = ctx.values()?.value_type().clone();
        let fits = expected.is_any()
            || value
                .runtime_type()
                .is_some_and(|t| env.types.is_subclass_of(&t, expected.as_str()));
        if fits {
            ctx.set_value(value);
        } else {
            warn!(
                "Unable to pick object {}: it is not an instance of {expected}.",
                format_id(id)
            );
        }
        Ok(())
    }
}

impl CustomEditor for ObjectRefEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.field = layout.widget(WidgetKind::ObjectField {
            target: None,
            text: String::new(),
        });
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let values = ctx.values()?;
        let (target, caption) = if values.has_different_values() {
            (None, "-".to_owned())
        } else {
            values
                .first()
                .map(|v| self.caption(v))
                .unwrap_or((None, String::new()))
        };
        ctx.send(self.field, MessageData::ObjectPicked(target));
        ctx.send(self.field, MessageData::Text(caption));
        sync_enabled(ctx, self.field);
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.destination() != self.field
            || message.direction() != MessageDirection::FromWidget
        {
            return Ok(());
        }
        match message.data() {
            MessageData::ObjectPicked(id) => self.pick(ctx, *id),
            _ => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// [`ObjectRefEditor`] for asset references.
pub struct AssetRefEditor(ObjectRefEditor);

impl Default for AssetRefEditor {
    fn default() -> Self {
        Self(ObjectRefEditor::with_caption("Path"))
    }
}

impl AssetRefEditor {
    pub const NAME: &'static str = "AssetRefEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

impl CustomEditor for AssetRefEditor {
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        self.0.initialize(layout)
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        self.0.refresh(ctx)
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        self.0.handle_ui_message(ctx, message)
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
    use std::rc::Rc;

    #[test]
    fn picked_object_must_match_declared_type() {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::class("Texture").with_base(builtin::ASSET));
        env.register(
            TypeInfo::class("Camera")
                .with_base(builtin::SCRIPT)
                .with_member(MemberInfo::new("Target", builtin::ACTOR))
                .with_member(MemberInfo::new("Skybox", "Texture")),
        );
        let player = Object::new(builtin::ACTOR)
            .with_field("Name", "Player".into())
            .into_ref();
        let texture = Object::new("Texture")
            .with_field("Path", "sky.png".into())
            .into_ref();
        let camera = Object::new("Camera")
            .with_field("Target", Value::Null)
            .with_field("Skybox", Value::Object(texture.clone()))
            .into_ref();
        let player_id = env.world.add_actor(player.clone(), None);
        let texture_id = env.world.add_object(texture);

        let mut presenter = env.presenter();
        presenter.select(camera.clone().into());
        presenter.update(&mut env.ui);

        let target = presenter.find_editor("Target").unwrap();
        let skybox = presenter.find_editor("Skybox").unwrap();
        assert_eq!(presenter.editor_name(target), Some("ObjectRefEditor"));
        assert_eq!(presenter.editor_name(skybox), Some("AssetRefEditor"));

        let field_of = |env: &TestEnvironment, text: &str| {
            env.ui
                .find(env.ui.root(), &mut |n| {
                    matches!(n.kind(), WidgetKind::ObjectField { .. }) && n.text() == Some(text)
                })
                .unwrap()
        };
        field_of(&env, "sky.png");
        let target_field = field_of(&env, "None");

        // A texture is not an actor.
        env.ui.send_message(UiMessage::from_widget(
            target_field,
            MessageData::ObjectPicked(Some(texture_id)),
        ));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert_eq!(camera.borrow().field("Target"), Some(&Value::Null));

        env.ui.send_message(UiMessage::from_widget(
            target_field,
            MessageData::ObjectPicked(Some(player_id)),
        ));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert!(matches!(
            camera.borrow().field("Target"),
            Some(Value::Object(o)) if Rc::ptr_eq(o, &player)
        ));
        assert_eq!(env.ui.node(target_field).text(), Some("Player"));
    }
}
