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

//! Layout builder handed to editors while they initialize.

use crate::{
    core::{
        pool::Handle,
        reflect::{Attribute, MemberInfo},
    },
    inspector::{
        editor::{DisplayStyle, EditorNode, EditorTree},
        resolver::EditorDescriptor,
        values::ValueContainer,
        EditorEnvironment, InspectorError,
    },
    UiNode, UserInterface, WidgetKind,
};
use std::rc::Rc;

/// Something an editor added to its layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutElement {
    Label(Handle<UiNode>),
    Button(Handle<UiNode>),
    Space(Handle<UiNode>),
    Widget(Handle<UiNode>),
    /// Child editor that shares the layout panel of its parent.
    Editor(Handle<EditorNode>),
    Group {
        panel: Handle<UiNode>,
        elements: Vec<LayoutElement>,
    },
    /// `name | editor` row.
    Property {
        row: Handle<UiNode>,
        label: Handle<UiNode>,
        editor: Handle<EditorNode>,
    },
    Container {
        panel: Handle<UiNode>,
        elements: Vec<LayoutElement>,
    },
}

impl LayoutElement {
    /// Top-level widget of the element, if it has one.
    pub fn widget(&self) -> Option<Handle<UiNode>> {
        match self {
            LayoutElement::Label(h)
            | LayoutElement::Button(h)
            | LayoutElement::Space(h)
            | LayoutElement::Widget(h) => Some(*h),
            LayoutElement::Group { panel, .. } | LayoutElement::Container { panel, .. } => {
                Some(*panel)
            }
            LayoutElement::Property { row, .. } => Some(*row),
            LayoutElement::Editor(_) => None,
        }
    }
}

/// Collects widgets and child editors of the editor being initialized. Widgets are added to the
/// layout panel, child editors are created, registered in the tree and initialized right away.
pub struct LayoutElementsContainer<'a> {
    tree: &'a mut EditorTree,
    ui: &'a mut UserInterface,
    editor: Handle<EditorNode>,
    panel: Handle<UiNode>,
    elements: &'a mut Vec<LayoutElement>,
}

impl<'a> LayoutElementsContainer<'a> {
    pub(crate) fn new(
        tree: &'a mut EditorTree,
        ui: &'a mut UserInterface,
        editor: Handle<EditorNode>,
        panel: Handle<UiNode>,
        elements: &'a mut Vec<LayoutElement>,
    ) -> Self {
        Self {
            tree,
            ui,
            editor,
            panel,
            elements,
        }
    }

    /// Editor being built.
    #[inline]
    pub fn editor(&self) -> Handle<EditorNode> {
        self.editor
    }

    /// Panel new widgets are added to.
    #[inline]
    pub fn container(&self) -> Handle<UiNode> {
        self.panel
    }

    pub fn env(&self) -> Rc<EditorEnvironment> {
        self.tree.env().clone()
    }

    pub fn tree(&self) -> &EditorTree {
        self.tree
    }

    pub fn ui(&mut self) -> &mut UserInterface {
        self.ui
    }

    /// Values of the editor being built.
    pub fn values(&self) -> Result<&ValueContainer, InspectorError> {
        self.tree.values_of(self.editor)
    }

    pub fn elements(&self) -> &[LayoutElement] {
        self.elements
    }

    pub fn is_read_only(&self) -> bool {
        self.tree.is_read_only() || self.values().map_or(true, |v| v.is_read_only())
    }

    fn add_widget(&mut self, kind: WidgetKind) -> Handle<UiNode> {
        let handle = self.ui.add_node(kind, self.panel);
        self.ui.set_owner(handle, self.editor.into());
        handle
    }

    /// Adds an already created element. Its widget is moved to the layout panel. Every element
    /// ends up here, so the panel's children and the element list stay in lock-step.
    pub fn add_element(&mut self, element: LayoutElement) {
        if let Some(widget) = element.widget() {
            self.ui.link(widget, self.panel);
        }
        self.elements.push(element);
    }

    pub fn label(&mut self, text: &str) -> Handle<UiNode> {
        let label = self.add_widget(WidgetKind::Label {
            text: text.to_owned(),
        });
        self.add_element(LayoutElement::Label(label));
        label
    }

    /// Label followed by a small gap, used to title a section.
    pub fn header(&mut self, text: &str) -> Handle<UiNode> {
        let label = self.label(text);
        self.space(4.0);
        label
    }

    pub fn button(&mut self, text: &str) -> Handle<UiNode> {
        let button = self.add_widget(WidgetKind::Button {
            text: text.to_owned(),
        });
        self.add_element(LayoutElement::Button(button));
        button
    }

    pub fn space(&mut self, height: f32) -> Handle<UiNode> {
        let space = self.add_widget(WidgetKind::Space { height });
        self.add_element(LayoutElement::Space(space));
        space
    }

    /// Adds an arbitrary widget owned by the editor.
    pub fn widget(&mut self, kind: WidgetKind) -> Handle<UiNode> {
        let widget = self.add_widget(kind);
        self.add_element(LayoutElement::Widget(widget));
        widget
    }

    fn nested<R>(
        &mut self,
        panel: Handle<UiNode>,
        func: impl FnOnce(&mut LayoutElementsContainer) -> Result<R, InspectorError>,
    ) -> (Vec<LayoutElement>, Result<R, InspectorError>) {
        let mut elements = Vec::new();
        let result = {
            let mut nested =
                LayoutElementsContainer::new(self.tree, self.ui, self.editor, panel, &mut elements);
            func(&mut nested)
        };
        (elements, result)
    }

    /// Collapsible group. The expand state is restored from the settings.
    pub fn group<R>(
        &mut self,
        title: &str,
        func: impl FnOnce(&mut LayoutElementsContainer) -> Result<R, InspectorError>,
    ) -> Result<R, InspectorError> {
        let panel = self.add_group_widget(title);
        let (elements, result) = self.nested(panel, func);
        self.add_element(LayoutElement::Group { panel, elements });
        result
    }

    /// Plain vertical panel.
    pub fn vertical_panel<R>(
        &mut self,
        func: impl FnOnce(&mut LayoutElementsContainer) -> Result<R, InspectorError>,
    ) -> Result<R, InspectorError> {
        let panel = self.add_widget(WidgetKind::Panel);
        let (elements, result) = self.nested(panel, func);
        self.add_element(LayoutElement::Container { panel, elements });
        result
    }

    fn add_group_widget(&mut self, title: &str) -> Handle<UiNode> {
        let expanded = self
            .tree
            .env()
            .settings
            .borrow()
            .is_group_expanded(title);
        self.add_widget(WidgetKind::Group {
            title: title.to_owned(),
            expanded,
        })
    }

    fn spawn_editor(
        &mut self,
        descriptor: &EditorDescriptor,
        property_name: String,
        values: ValueContainer,
        layout: Handle<UiNode>,
    ) -> Handle<EditorNode> {
        self.tree.add_editor(
            EditorNode::new(descriptor, property_name, values, layout),
            self.editor,
        )
    }

    /// Child editor for the values, resolved from their type. Shares the layout panel and has
    /// no label.
    pub fn object(&mut self, values: ValueContainer) -> Result<Handle<EditorNode>, InspectorError> {
        let descriptor = self.resolve(&values, None);
        self.object_with_editor(values, descriptor)
    }

    pub fn object_with_editor(
        &mut self,
        values: ValueContainer,
        descriptor: EditorDescriptor,
    ) -> Result<Handle<EditorNode>, InspectorError> {
        let editor = self.spawn_editor(&descriptor, String::new(), values, self.panel);
        self.add_element(LayoutElement::Editor(editor));
        self.tree.initialize(self.ui, editor)?;
        Ok(editor)
    }

    /// Labeled child editor resolved from the values' type (or the member's custom editor).
    pub fn property(
        &mut self,
        name: &str,
        values: ValueContainer,
    ) -> Result<Handle<EditorNode>, InspectorError> {
        let override_editor = values
            .member()
            .and_then(|m| m.custom_editor())
            .and_then(|alias| self.tree.env().registry.borrow().alias(alias));
        let descriptor = self.resolve(&values, override_editor.as_ref());
        self.property_with_editor(name, values, descriptor)
    }

    /// Labeled child editor. Placement depends on the editor's [`DisplayStyle`] and on inline
    /// hints of the member.
    pub fn property_with_editor(
        &mut self,
        name: &str,
        values: ValueContainer,
        descriptor: EditorDescriptor,
    ) -> Result<Handle<EditorNode>, InspectorError> {
        let member = values.member().cloned();
        let property_name = member
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| name.to_owned());
        let tooltip = member.as_ref().and_then(|m| m.tooltip()).map(str::to_owned);
        let is_inline = name == Attribute::INLINE || member.as_ref().is_some_and(MemberInfo::is_inline);

        let editor = self.spawn_editor(&descriptor, property_name, values, Handle::NONE);
        let style = self
            .tree
            .node(editor)
            .and_then(|n| n.behavior())
            .map(|b| b.style())
            .unwrap_or_default();

        let layout = if is_inline || style == DisplayStyle::InlineIntoParent {
            self.add_element(LayoutElement::Editor(editor));
            self.panel
        } else if style == DisplayStyle::Group {
            let panel = self.add_group_widget(name);
            self.ui.set_tooltip(panel, tooltip);
            self.add_element(LayoutElement::Group {
                panel,
                elements: vec![LayoutElement::Editor(editor)],
            });
            panel
        } else {
            let row = self.add_widget(WidgetKind::Row);
            let label = self.ui.add_node(
                WidgetKind::Label {
                    text: name.to_owned(),
                },
                row,
            );
            // Context actions of the label (copy, paste, revert) target the child editor.
            self.ui.set_owner(label, editor.into());
            self.ui.set_tooltip(label, tooltip);
            let content = self.ui.add_node(WidgetKind::Panel, row);
            self.tree.set_linked_label(editor, label);
            self.add_element(LayoutElement::Property { row, label, editor });
            content
        };

        if let Some(node) = self.tree.editors.try_borrow_mut(editor) {
            node.layout = layout;
        }
        self.tree.initialize(self.ui, editor)?;
        Ok(editor)
    }

    fn resolve(
        &self,
        values: &ValueContainer,
        override_editor: Option<&EditorDescriptor>,
    ) -> EditorDescriptor {
        let env = self.tree.env();
        let allow_reference_picker = env.settings.borrow().use_reference_picker
            && !values
                .member()
                .is_some_and(|m| m.has_attribute(&Attribute::NoReferencePicker));
        env.resolve(values, override_editor, allow_reference_picker)
    }

    /// Removes every widget of the layout panel and forgets the elements.
    pub fn clear_layout(&mut self) {
        self.ui.clear_children(self.panel);
        self.elements.clear();
    }
}

#[cfg(test)]
mod test {
    use crate::{
        core::reflect::{builtin, Attribute, MemberInfo, TypeInfo, Value},
        inspector::layout::LayoutElement,
        test::{counter, TestEnvironment},
        WidgetKind,
    };

    #[test]
    fn property_row_links_label_to_editor() {
        let mut env = TestEnvironment::new();
        let mut presenter = env.presenter();
        presenter.select(counter(3).into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        let node = presenter.tree().node(count).unwrap();
        let label = node.linked_label();
        assert_eq!(
            env.ui.node(label).kind(),
            &WidgetKind::Label {
                text: "Count".to_owned()
            }
        );
        assert_eq!(env.ui.node(label).owner(), count.into());
        assert_eq!(env.ui.node(label).tooltip(), Some("Number of items"));

        let parent = presenter.tree().node(node.parent()).unwrap();
        assert!(parent.elements().iter().any(|e| matches!(
            e,
            LayoutElement::Property { editor, label: l, .. } if *editor == count && *l == label
        )));
    }

    #[test]
    fn inline_members_share_parent_layout() {
        let mut env = TestEnvironment::new();
        env.register(
            TypeInfo::structure("Flags").with_member(MemberInfo::new("Visible", builtin::BOOL)),
        );
        env.register(
            TypeInfo::class("Widget").with_member(
                MemberInfo::new("Flags", "Flags").with_attribute(Attribute::InlineIntoParent),
            ),
        );
        let mut presenter = env.presenter();
        presenter.select(
            crate::core::reflect::Object::new("Widget")
                .with_field(
                    "Flags",
                    crate::core::reflect::StructValue::new("Flags")
                        .with_field("Visible", Value::Bool(true))
                        .into(),
                )
                .into(),
        );
        presenter.update(&mut env.ui);

        let flags = presenter.find_editor("Flags").unwrap();
        let node = presenter.tree().node(flags).unwrap();
        let parent = presenter.tree().node(node.parent()).unwrap();
        assert_eq!(node.layout(), parent.layout());
        assert!(node.linked_label().is_none());
        assert!(presenter.find_editor("Flags.Visible").is_some());
    }

    #[test]
    fn group_expand_state_comes_from_settings() {
        let mut env = TestEnvironment::new();
        env.register(
            TypeInfo::class("Light")
                .with_member(MemberInfo::new("Range", builtin::FLOAT).with_attribute(
                    Attribute::EditorDisplay {
                        group: Some("Shadows".to_owned()),
                        name: None,
                    },
                )),
        );
        env.settings.set_group_expanded("Shadows", false);
        let mut presenter = env.presenter();
        presenter.select(
            crate::core::reflect::Object::new("Light")
                .with_field("Range", Value::Float(1.0))
                .into(),
        );
        presenter.update(&mut env.ui);

        let group = env
            .ui
            .find(env.ui.root(), &mut |n| {
                matches!(n.kind(), WidgetKind::Group { title, .. } if title == "Shadows")
            })
            .unwrap();
        assert_eq!(
            env.ui.node(group).kind(),
            &WidgetKind::Group {
                title: "Shadows".to_owned(),
                expanded: false
            }
        );
    }
}
