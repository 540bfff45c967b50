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
        reflect::{Attribute, MemberInfo, MethodInfo, TypeName, Value},
    },
    inspector::{
        editor::{CustomEditor, DisplayStyle, EditorContext},
        layout::{LayoutElement, LayoutElementsContainer},
        resolver::EditorDescriptor,
        values::ValueContainer,
        InspectorError,
    },
    message::{MessageData, MessageDirection, UiMessage},
    UiNode,
};
use std::any::Any;

/// Member-wise editor, used for every type that has no dedicated editor. Visible members are
/// shown in their declared order (adjusted by order attributes), grouped members are placed
/// into collapsible groups and methods marked as buttons become buttons.
#[derive(Default)]
pub struct GenericEditor {
    buttons: Vec<(Handle<UiNode>, MethodInfo)>,
    /// Type the layout was built for, `None` for a null reference.
    built_for: Option<TypeName>,
}

impl GenericEditor {
    pub const NAME: &'static str = "GenericEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }
}

/// Members placed either directly or into a named group, in the order of first appearance.
enum Item {
    Member(MemberInfo),
    Group(String, Vec<MemberInfo>),
}

fn arrange(mut members: Vec<MemberInfo>) -> Vec<Item> {
    members.retain(|m| !m.is_hidden());
    // Stable, so members with equal order keep the declaration order.
    members.sort_by_key(|m| m.order());

    let mut items = Vec::<Item>::new();
    for member in members {
        match member.group().map(str::to_owned) {
            None => items.push(Item::Member(member)),
            Some(title) => {
                let existing = items.iter_mut().find_map(|item| match item {
                    Item::Group(group, members) if *group == title => Some(members),
                    _ => None,
                });
                match existing {
                    Some(members) => members.push(member),
                    None => items.push(Item::Group(title, vec![member])),
                }
            }
        }
    }
    items
}

fn add_member(
    layout: &mut LayoutElementsContainer,
    values: &ValueContainer,
    member: &MemberInfo,
) -> Result<(), InspectorError> {
    let child_values = ValueContainer::from_member(values, member)?;
    layout.property(member.display_name(), child_values)?;
    Ok(())
}

fn edited_type(values: &ValueContainer) -> Option<TypeName> {
    match values.first() {
        None | Some(Value::Null) => None,
        Some(_) => Some(
            values
                .shared_runtime_type()
                .unwrap_or_else(|| values.value_type().clone()),
        ),
    }
}

impl CustomEditor for GenericEditor {
    fn style(&self) -> DisplayStyle {
        DisplayStyle::Group
    }

    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        let values = layout.values()?.clone();
        self.buttons.clear();
        self.built_for = edited_type(&values);
        let Some(value_type) = self.built_for.clone() else {
            if !values.is_empty() {
                layout.label("None");
            }
            return Ok(());
        };

        let env = layout.env();

        for item in arrange(env.types.all_members(&value_type)) {
            match item {
                Item::Member(member) => add_member(layout, &values, &member)?,
                Item::Group(title, members) => layout.group(&title, |group| {
                    for member in members.iter() {
                        add_member(group, &values, member)?;
                    }
                    Ok(())
                })?,
            }
        }

        let expand_groups = env
            .types
            .get(value_type.as_str())
            .is_some_and(|info| info.has_attribute(&Attribute::ExpandGroups));
        if expand_groups {
            // Stored collapse state is ignored for such types.
            let groups = layout
                .elements()
                .iter()
                .filter_map(|e| match e {
                    LayoutElement::Group { panel, .. } => Some(*panel),
                    _ => None,
                })
                .collect::<Vec<_>>();
            for widget in groups {
                layout.ui().send_message(UiMessage::to_widget(
                    widget,
                    MessageData::Expand(true),
                ));
            }
        }
        for method in env.types.all_methods(&value_type) {
            if let Some(label) = method.button_label().map(str::to_owned) {
                let button = layout.button(&label);
                self.buttons.push((button, method));
            }
        }
        Ok(())
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
        // A polymorphic member got an instance of another type (or was set to null).
        if edited_type(ctx.values()?) != self.built_for {
            ctx.rebuild_layout_on_refresh();
            ctx.skip_children_refresh();
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
        let Some((_, method)) = self
            .buttons
            .iter()
            .find(|(button, _)| *button == message.destination())
        else {
            return Ok(());
        };
        if method.is_static {
            method.invoke(None);
        } else {
            for value in ctx.values()?.values() {
                method.invoke(Some(value));
            }
        }
        Ok(())
    }

    fn deinitialize(&mut self, _ctx: &mut EditorContext) {
        self.buttons.clear();
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
    use super::{arrange, Item};
    use crate::{
        core::reflect::{builtin, Attribute, MemberInfo, MethodInfo, Object, TypeInfo, Value},
        message::{MessageData, UiMessage},
        test::TestEnvironment,
        WidgetKind,
    };
    use std::{cell::Cell, rc::Rc};

    fn grouped(name: &str, group: &str) -> MemberInfo {
        MemberInfo::new(name, builtin::INT).with_attribute(Attribute::EditorDisplay {
            group: Some(group.to_owned()),
            name: None,
        })
    }

    #[test]
    fn members_are_ordered_and_grouped() {
        let members = vec![
            MemberInfo::new("B", builtin::INT).with_attribute(Attribute::Order(2)),
            grouped("C", "Physics"),
            MemberInfo::new("Hidden", builtin::INT).with_attribute(Attribute::HideInEditor),
            MemberInfo::new("A", builtin::INT).with_attribute(Attribute::Order(-1)),
            grouped("D", "Physics"),
        ];
        let names = arrange(members)
            .into_iter()
            .map(|item| match item {
                Item::Member(m) => m.name,
                Item::Group(title, members) => format!(
                    "{title}[{}]",
                    members
                        .iter()
                        .map(|m| m.name.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                ),
            })
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "Physics[C,D]", "B"]);
    }

    #[test]
    fn buttons_invoke_methods() {
        let calls = Rc::new(Cell::new(0));
        let mut env = TestEnvironment::new();
        {
            let calls = calls.clone();
            env.register(
                TypeInfo::class("Door").with_method(
                    MethodInfo::new("Open", move |target| {
                        assert!(target.is_some());
                        calls.set(calls.get() + 1);
                    })
                    .with_attribute(Attribute::Button("Open".to_owned())),
                ),
            );
        }
        let mut presenter = env.presenter();
        presenter.select_many(vec![
            Object::new("Door").into(),
            Object::new("Door").into(),
        ]);
        presenter.update(&mut env.ui);

        let button = env
            .ui
            .find(env.ui.root(), &mut |n| {
                n.kind()
                    == &WidgetKind::Button {
                        text: "Open".to_owned(),
                    }
            })
            .unwrap();
        env.ui
            .send_message(UiMessage::from_widget(button, MessageData::Click));
        env.route(&mut presenter);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn null_object_shows_placeholder() {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::class("Node").with_member(MemberInfo::new("Next", "Node")));
        let mut presenter = env.presenter();
        presenter.select(Object::new("Node").with_field("Next", Value::Null).into());
        presenter.update(&mut env.ui);

        let next = presenter.find_editor("Next").unwrap();
        assert_eq!(presenter.editor_name(next), Some("GenericEditor"));
        assert!(presenter.tree().node(next).unwrap().children().is_empty());
    }
}
