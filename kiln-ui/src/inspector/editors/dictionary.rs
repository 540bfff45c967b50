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
        reflect::{builtin, EnumValue, TypeKind, TypeName, Value},
        warn,
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

/// Editor of dictionaries. Shows the entries present in every selected dictionary, each one
/// with a remove button, and a key field to add new entries.
#[derive(Default)]
pub struct DictionaryEditor {
    key_type: Option<TypeName>,
    value_type: Option<TypeName>,
    built_keys: Vec<Value>,
    removers: Vec<(Handle<UiNode>, Value)>,
    new_key: Handle<UiNode>,
    add: Handle<UiNode>,
}

impl DictionaryEditor {
    pub const NAME: &'static str = "DictionaryEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

fn entries(value: &Value) -> Option<&[(Value, Value)]> {
    match value {
        Value::Dictionary(entries) => Some(entries),
        _ => None,
    }
}

/// Keys of the first dictionary that every other dictionary has too.
fn shared_keys(values: &ValueContainer) -> Option<Vec<Value>> {
    let (first, rest) = values.values().split_first()?;
    let first = entries(first)?;
    let rest = rest.iter().map(entries).collect::<Option<Vec<_>>>()?;
    Some(
        first
            .iter()
            .map(|(k, _)| k)
            .filter(|k| rest.iter().all(|e| e.iter().any(|(other, _)| other == *k)))
            .cloned()
            .collect(),
    )
}

pub(crate) fn key_label(key: &Value) -> String {
    match key {
        Value::String(text) => text.clone(),
        Value::Int(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Enum(e) => e.variant.clone(),
        other => format!("{other:?}"),
    }
}

impl DictionaryEditor {
    /// Parses the text of the key field according to the key type.
    fn parse_key(&self, ctx: &EditorContext, text: &str) -> Option<Value> {
        let key_type = self.key_type.clone().unwrap_or_else(|| TypeName::new(builtin::STRING));
        match key_type.as_str() {
            builtin::STRING => Some(Value::String(text.to_owned())),
            builtin::INT => text.trim().parse().ok().map(Value::Int),
            builtin::BOOL => text.trim().parse().ok().map(Value::Bool),
            _ => match ctx.env().types.get(key_type.as_str()).map(|i| i.kind.clone()) {
                Some(TypeKind::Enum { variants }) if variants.iter().any(|v| v == text) => {
                    Some(Value::Enum(EnumValue::new(key_type, text)))
                }
                _ => None,
            },
        }
    }

    fn add_entry(&self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let text = ctx
            .ui
            .try_get(self.new_key)
            .and_then(|n| n.text())
            .unwrap_or_default()
            .to_owned();
        let Some(key) = self.parse_key(ctx, &text) else {
            warn!("Unable to add a dictionary entry: {text:?} is not a valid key.");
            return Ok(());
        };
        let Some(Value::Dictionary(mut items)) = ctx.values()?.first().cloned() else {
            return Ok(());
        };
        if items.iter().any(|(k, _)| *k == key) {
            warn!("Unable to add a dictionary entry: key {text:?} already exists.");
            return Ok(());
        }
        let value = match self.value_type.as_ref() {
            Some(value_type) => ctx.env().types.default_value(value_type),
            None => Value::Null,
        };
        items.push((key, value));
        ctx.set_value(Value::Dictionary(items));
        Ok(())
    }

    fn remove_entry(&self, ctx: &mut EditorContext, key: &Value) -> Result<(), InspectorError> {
        let Some(Value::Dictionary(mut items)) = ctx.values()?.first().cloned() else {
            return Ok(());
        };
        items.retain(|(k, _)| k != key);
        ctx.set_value(Value::Dictionary(items));
        Ok(())
    }
}

impl CustomEditor for DictionaryEditor {
    fn style(&self) -> DisplayStyle {
        DisplayStyle::Group
    }

    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        let values = layout.values()?.clone();
        (self.key_type, self.value_type) = match layout
            .env()
            .types
            .get(values.value_type().as_str())
            .map(|info| info.kind.clone())
        {
            Some(TypeKind::Dictionary { key, value }) => (Some(key), Some(value)),
            _ => (None, None),
        };
        let value_type = self.value_type.clone().unwrap_or_else(TypeName::any);

        self.removers.clear();
        self.built_keys = shared_keys(&values).unwrap_or_default();
        for key in self.built_keys.clone() {
            let label = key_label(&key);
            let entry = ValueContainer::new(
                &values,
                ValueBinding::DictionaryValue(key.clone()),
                value_type.clone(),
            )?;
            layout.property(&label, entry)?;
            let remove = layout.button("Remove");
            self.removers.push((remove, key));
        }

        self.new_key = layout.widget(WidgetKind::TextField {
            text: String::new(),
        });
        self.add = layout.button("Add");
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        let keys = shared_keys(ctx.values()?).ok_or_else(|| {
            InspectorError::StructuralMismatch("dictionary editor got a non-dictionary value".to_owned())
        })?;
        if keys != self.built_keys {
            ctx.rebuild_layout_on_refresh();
            ctx.skip_children_refresh();
        }
        let widgets = self
            .removers
            .iter()
            .map(|(button, _)| *button)
            .chain([self.new_key, self.add])
            .collect::<Vec<_>>();
        for widget in widgets {
            sync_enabled(ctx, widget);
        }
        Ok(())
    }

    fn handle_ui_message(
        &mut self,
        ctx: &mut EditorContext,
        message: &UiMessage,
    ) -> Result<(), InspectorError> {
        if message.direction() != MessageDirection::FromWidget
            || *message.data() != MessageData::Click
        {
            return Ok(());
        }
        if message.destination() == self.add {
            return self.add_entry(ctx);
        }
        let key = self
            .removers
            .iter()
            .find(|(button, _)| *button == message.destination())
            .map(|(_, key)| key.clone());
        match key {
            Some(key) => self.remove_entry(ctx, &key),
            None => Ok(()),
        }
    }

    fn revert_value_with_children(&self) -> Option<bool> {
        Some(false)
    }

    fn deinitialize(&mut self, _ctx: &mut EditorContext) {
        self.removers.clear();
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

    fn stats() -> Value {
        Value::Dictionary(vec![
            (Value::from("Hp"), Value::Int(10)),
            (Value::from("Mana"), Value::Int(5)),
        ])
    }

    fn button(env: &TestEnvironment, text: &str, nth: usize) -> crate::core::pool::Handle<crate::UiNode> {
        let mut seen = 0;
        env.ui
            .find(env.ui.root(), &mut |n| {
                if n.kind()
                    == &(WidgetKind::Button {
                        text: text.to_owned(),
                    })
                {
                    seen += 1;
                    seen > nth
                } else {
                    false
                }
            })
            .unwrap()
    }

    fn setup(env: &mut TestEnvironment) {
        env.register(TypeInfo::dictionary("Stats", builtin::STRING, builtin::INT));
        env.register(TypeInfo::class("Hero").with_member(MemberInfo::new("Stats", "Stats")));
    }

    #[test]
    fn entries_are_edited_by_key() {
        let mut env = TestEnvironment::new();
        setup(&mut env);
        let hero = Object::new("Hero").with_field("Stats", stats()).into_ref();
        let mut presenter = env.presenter();
        presenter.select(hero.clone().into());
        presenter.update(&mut env.ui);

        let mana = presenter.find_editor("Stats.Mana").unwrap();
        presenter
            .tree_mut()
            .set_value(&mut env.ui, mana, Value::Int(50), None);
        presenter.update(&mut env.ui);
        assert_eq!(
            hero.borrow().field("Stats").unwrap().entry(&"Mana".into()).unwrap(),
            Value::Int(50)
        );
    }

    #[test]
    fn remove_and_add_entries() {
        let mut env = TestEnvironment::new();
        setup(&mut env);
        let hero = Object::new("Hero").with_field("Stats", stats()).into_ref();
        let mut presenter = env.presenter();
        presenter.select(hero.clone().into());
        presenter.update(&mut env.ui);

        let remove_hp = button(&env, "Remove", 0);
        env.ui
            .send_message(UiMessage::from_widget(remove_hp, MessageData::Click));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert_eq!(
            hero.borrow().field("Stats"),
            Some(&Value::Dictionary(vec![(Value::from("Mana"), Value::Int(5))]))
        );
        assert!(presenter.find_editor("Stats.Hp").is_none());

        let key_field = env
            .ui
            .find(env.ui.root(), &mut |n| matches!(n.kind(), WidgetKind::TextField { .. }))
            .unwrap();
        env.ui.send_message(UiMessage::from_widget(
            key_field,
            MessageData::Text("Armor".to_owned()),
        ));
        let add = button(&env, "Add", 0);
        env.ui.send_message(UiMessage::from_widget(add, MessageData::Click));
        env.route(&mut presenter);
        presenter.update(&mut env.ui);
        assert_eq!(
            hero.borrow().field("Stats").unwrap().entry(&"Armor".into()).unwrap(),
            Value::Int(0)
        );
        assert!(presenter.find_editor("Stats.Armor").is_some());
    }
}
