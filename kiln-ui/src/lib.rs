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

//! Retained widget tree and the editing widgets built on top of it: the reflection-driven
//! inspector, keyframes editor and gradient editor.
//!
//! The widget tree is deliberately minimal: it stores widget state and hierarchy and passes
//! messages, rendering and layout are left to the host.

#![allow(clippy::too_many_arguments)]

pub use kiln_core as core;

pub mod gradient;
pub mod inspector;
pub mod keyframes;
pub mod message;
pub mod settings;
#[cfg(test)]
pub mod test;

use crate::{
    core::{
        algebra::Vector2,
        color::Color,
        pool::{ErasedHandle, Handle, Pool},
    },
    message::{MessageData, MessageDirection, UiMessage},
};
use copypasta::{ClipboardContext, ClipboardProvider};
use std::{
    cell::{RefCell, RefMut},
    collections::VecDeque,
};
use uuid::Uuid;

/// State of a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Vertical stack of children.
    Panel,
    /// Horizontal row, used for `name | editor` property rows.
    Row,
    ScrollViewer {
        offset: f32,
    },
    /// Collapsible titled panel.
    Group {
        title: String,
        expanded: bool,
    },
    Label {
        text: String,
    },
    Button {
        text: String,
    },
    Space {
        height: f32,
    },
    /// `None` means the state is undetermined (mixed values).
    CheckBox {
        checked: Option<bool>,
    },
    NumericField {
        value: f64,
        integer: bool,
        mixed: bool,
    },
    TextField {
        text: String,
    },
    ComboBox {
        items: Vec<String>,
        selected: Option<usize>,
    },
    ColorField {
        color: Color,
    },
    ObjectField {
        target: Option<Uuid>,
        text: String,
    },
    /// Free-form drawing surface for direct-manipulation widgets.
    Canvas {
        size: Vector2<f32>,
    },
    Popup {
        open: bool,
    },
}

#[derive(Debug, Clone)]
pub struct UiNode {
    parent: Handle<UiNode>,
    children: Vec<Handle<UiNode>>,
    kind: WidgetKind,
    enabled: bool,
    visible: bool,
    tooltip: Option<String>,
    owner: ErasedHandle,
}

impl UiNode {
    fn new(kind: WidgetKind) -> Self {
        Self {
            parent: Handle::NONE,
            children: Default::default(),
            kind,
            enabled: true,
            visible: true,
            tooltip: None,
            owner: ErasedHandle::none(),
        }
    }

    #[inline]
    pub fn parent(&self) -> Handle<UiNode> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[Handle<UiNode>] {
        &self.children
    }

    #[inline]
    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Handle of an object (usually an editor) that created the widget and receives its messages.
    #[inline]
    pub fn owner(&self) -> ErasedHandle {
        self.owner
    }

    /// Text of text-carrying widgets.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            WidgetKind::Label { text }
            | WidgetKind::Button { text }
            | WidgetKind::TextField { text }
            | WidgetKind::ObjectField { text, .. } => Some(text),
            WidgetKind::Group { title, .. } => Some(title),
            _ => None,
        }
    }

    fn apply(&mut self, data: &MessageData) {
        match (&mut self.kind, data) {
            (WidgetKind::CheckBox { checked }, MessageData::Checked(value)) => *checked = *value,
            (
                WidgetKind::NumericField { value, mixed, .. },
                MessageData::Integer(new_value),
            ) => {
                *value = *new_value as f64;
                *mixed = false;
            }
            (WidgetKind::NumericField { value, mixed, .. }, MessageData::Float(new_value)) => {
                *value = *new_value;
                *mixed = false;
            }
            (
                WidgetKind::Label { text }
                | WidgetKind::Button { text }
                | WidgetKind::TextField { text }
                | WidgetKind::ObjectField { text, .. },
                MessageData::Text(new_text),
            ) => new_text.clone_into(text),
            (WidgetKind::ComboBox { selected, .. }, MessageData::Selection(index)) => {
                *selected = *index
            }
            (WidgetKind::ColorField { color }, MessageData::Color(new_color)) => {
                *color = *new_color
            }
            (WidgetKind::ObjectField { target, .. }, MessageData::ObjectPicked(id)) => {
                *target = *id
            }
            (WidgetKind::Group { expanded, .. }, MessageData::Expand(state)) => *expanded = *state,
            (WidgetKind::Popup { open }, MessageData::Expand(state)) => *open = *state,
            (_, MessageData::Enabled(state)) => self.enabled = *state,
            (_, MessageData::Visible(state)) => self.visible = *state,
            _ => (),
        }
    }
}

/// See module docs.
pub struct UserInterface {
    nodes: Pool<UiNode>,
    root: Handle<UiNode>,
    queue: VecDeque<UiMessage>,
    clipboard: Option<RefCell<Box<dyn ClipboardProvider>>>,
}

impl Default for UserInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface {
    /// Creates a widget tree that uses the system clipboard (if it is available).
    pub fn new() -> Self {
        let clipboard = ClipboardContext::new()
            .ok()
            .map(|c| Box::new(c) as Box<dyn ClipboardProvider>);
        Self::with_clipboard(clipboard)
    }

    pub fn with_clipboard(clipboard: Option<Box<dyn ClipboardProvider>>) -> Self {
        let mut nodes = Pool::new();
        let root = nodes.spawn(UiNode::new(WidgetKind::Panel));
        Self {
            nodes,
            root,
            queue: Default::default(),
            clipboard: clipboard.map(RefCell::new),
        }
    }

    #[inline]
    pub fn root(&self) -> Handle<UiNode> {
        self.root
    }

    /// Adds a widget as the last child of the parent. [`Handle::NONE`] parent means the root.
    pub fn add_node(&mut self, kind: WidgetKind, parent: Handle<UiNode>) -> Handle<UiNode> {
        let handle = self.nodes.spawn(UiNode::new(kind));
        self.link(handle, parent);
        handle
    }

    pub fn try_get(&self, handle: Handle<UiNode>) -> Option<&UiNode> {
        self.nodes.try_borrow(handle)
    }

    pub fn try_get_mut(&mut self, handle: Handle<UiNode>) -> Option<&mut UiNode> {
        self.nodes.try_borrow_mut(handle)
    }

    /// # Panics
    ///
    /// Panics if the handle is invalid.
    pub fn node(&self, handle: Handle<UiNode>) -> &UiNode {
        self.nodes.borrow(handle)
    }

    pub fn is_valid_handle(&self, handle: Handle<UiNode>) -> bool {
        self.nodes.is_valid_handle(handle)
    }

    /// Moves the widget to a new parent. Linking to the current parent is a no-op.
    pub fn link(&mut self, child: Handle<UiNode>, parent: Handle<UiNode>) {
        let parent = if parent.is_some() { parent } else { self.root };
        if child == parent || !self.nodes.is_valid_handle(parent) {
            return;
        }
        let Some(old_parent) = self.nodes.try_borrow(child).map(|c| c.parent) else {
            return;
        };
        if old_parent == parent {
            return;
        }
        if let Some(old_parent) = self.nodes.try_borrow_mut(old_parent) {
            old_parent.children.retain(|c| *c != child);
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = parent;
    }

    /// Removes the widget with all its descendants.
    pub fn remove_node(&mut self, handle: Handle<UiNode>) {
        if handle == self.root {
            return;
        }
        let Some(parent) = self.nodes.try_borrow(handle).map(|n| n.parent) else {
            return;
        };
        if let Some(parent) = self.nodes.try_borrow_mut(parent) {
            parent.children.retain(|c| *c != handle);
        }
        let mut stack = vec![handle];
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.nodes.try_free(handle) {
                stack.extend(node.children);
            }
        }
    }

    /// Removes every descendant of the widget, keeping the widget itself.
    pub fn clear_children(&mut self, handle: Handle<UiNode>) {
        let children = match self.nodes.try_borrow(handle) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove_node(child);
        }
    }

    pub fn set_owner(&mut self, handle: Handle<UiNode>, owner: ErasedHandle) {
        if let Some(node) = self.nodes.try_borrow_mut(handle) {
            node.owner = owner;
        }
    }

    pub fn set_tooltip(&mut self, handle: Handle<UiNode>, tooltip: Option<String>) {
        if let Some(node) = self.nodes.try_borrow_mut(handle) {
            node.tooltip = tooltip;
        }
    }

    /// Messages to widgets are applied immediately, messages from widgets are queued until the
    /// host polls them.
    pub fn send_message(&mut self, message: UiMessage) {
        match message.direction {
            MessageDirection::ToWidget => {
                if let Some(node) = self.nodes.try_borrow_mut(message.destination) {
                    node.apply(&message.data);
                }
            }
            MessageDirection::FromWidget => {
                if self.nodes.is_valid_handle(message.destination) {
                    // The widget reflects user input right away, same as a real control would.
                    self.nodes[message.destination].apply(&message.data);
                    self.queue.push_back(message);
                }
            }
        }
    }

    pub fn poll_message(&mut self) -> Option<UiMessage> {
        self.queue.pop_front()
    }

    pub fn clipboard_mut(&self) -> Option<RefMut<Box<dyn ClipboardProvider>>> {
        self.clipboard.as_ref().map(|c| c.borrow_mut())
    }

    /// Scroll offset of a scroll viewer, zero for other widgets.
    pub fn scroll_offset(&self, handle: Handle<UiNode>) -> f32 {
        match self.try_get(handle).map(|n| &n.kind) {
            Some(WidgetKind::ScrollViewer { offset }) => *offset,
            _ => 0.0,
        }
    }

    pub fn set_scroll_offset(&mut self, handle: Handle<UiNode>, new_offset: f32) {
        if let Some(WidgetKind::ScrollViewer { offset }) = self.try_get_mut(handle).map(|n| &mut n.kind) {
            *offset = new_offset;
        }
    }

    /// Depth-first search in the subtree of the widget (including the widget itself).
    pub fn find(
        &self,
        root: Handle<UiNode>,
        func: &mut dyn FnMut(&UiNode) -> bool,
    ) -> Option<Handle<UiNode>> {
        let node = self.try_get(root)?;
        if func(node) {
            return Some(root);
        }
        node.children.iter().find_map(|c| self.find(*c, func))
    }

    pub fn alive_count(&self) -> u32 {
        self.nodes.alive_count()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        message::{MessageData, UiMessage},
        UserInterface, WidgetKind,
    };
    use kiln_core::pool::Handle;

    #[test]
    fn remove_node_removes_descendants() {
        let mut ui = UserInterface::with_clipboard(None);
        let panel = ui.add_node(WidgetKind::Panel, Handle::NONE);
        let label = ui.add_node(
            WidgetKind::Label {
                text: "Name".to_owned(),
            },
            panel,
        );
        assert_eq!(ui.node(panel).children(), &[label]);
        ui.remove_node(panel);
        assert!(!ui.is_valid_handle(label));
        assert!(ui.node(ui.root()).children().is_empty());
        assert_eq!(ui.alive_count(), 1);
    }

    #[test]
    fn messages_to_widgets_are_applied() {
        let mut ui = UserInterface::with_clipboard(None);
        let check_box = ui.add_node(WidgetKind::CheckBox { checked: None }, Handle::NONE);
        ui.send_message(UiMessage::to_widget(check_box, MessageData::Checked(Some(true))));
        assert_eq!(
            ui.node(check_box).kind(),
            &WidgetKind::CheckBox {
                checked: Some(true)
            }
        );
        assert!(ui.poll_message().is_none());

        ui.send_message(UiMessage::from_widget(check_box, MessageData::Checked(Some(false))));
        assert_eq!(ui.poll_message().map(|m| m.destination), Some(check_box));
    }
}
