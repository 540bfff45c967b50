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

//! Custom editor tree. Editors are stored in a [`Pool`] owned by [`EditorTree`] and reference each
//! other by handles. Editor-specific behavior is provided by [`CustomEditor`] implementations,
//! while the tree runs the shared value synchronization protocol:
//!
//! 1. A widget reports user input, the editor calls [`EditorContext::set_value`]. The request is
//!    offered to the editor and its ancestors ([`CustomEditor::on_dirty`]) until a sync point
//!    accepts or rejects it, the value is then queued on the editor.
//! 2. On the next [`EditorTree::refresh_internal`] pass the queued value is written into the
//!    editor's container and its parent. Modified value-type copies are written further up until
//!    the first ancestor that holds references, or right after writing into a sync point.
//! 3. Editors without queued values re-read their values from the parent, then update their
//!    widgets with writes blocked.

use crate::{
    core::{
        err,
        object::{find_prefab_instance, find_prefab_root},
        pool::{Handle, Pool},
        reflect::{json, ObjectRef, ReflectError, Value},
        warn,
    },
    inspector::{
        layout::{LayoutElement, LayoutElementsContainer},
        resolver::EditorDescriptor,
        values::ValueContainer,
        EditorEnvironment, InspectorError,
    },
    message::{MessageData, UiMessage},
    UiNode, UserInterface,
};
use std::{any::Any, rc::Rc};

/// How an editor is placed into the layout of its parent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisplayStyle {
    /// `name | editor` row.
    #[default]
    Inline,
    /// Collapsible group titled with the property name.
    Group,
    /// Elements are added directly to the parent layout, without a label.
    InlineIntoParent,
}

/// Decision of an editor about a modification of its descendant (or itself).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DirtyAction {
    /// Let the parent decide.
    Forward,
    Accept,
    Reject,
}

/// Modification of every target of an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Every target gets the value.
    Value(Value),
    /// JSON fields applied in place onto every target object. Targets keep their identity.
    Fields(serde_json::Value),
}

/// Modification queued by [`EditorTree::set_value`] or [`EditorTree::set_fields`], applied on
/// the next refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingValue {
    pub write: PendingWrite,
    /// Identifies a continuous edit (for example, a slider drag) so hosts can merge records.
    pub token: Option<String>,
}

/// Editor-specific behavior. Every hook receives an [`EditorContext`] with access to the whole
/// tree, so editors can add widgets, read values and request modifications.
pub trait CustomEditor: Any {
    fn style(&self) -> DisplayStyle {
        DisplayStyle::Inline
    }

    /// Sync points accept modifications of their subtree and are notified once the subtree was
    /// refreshed.
    fn is_sync_point(&self) -> bool {
        false
    }

    /// Creates widgets and child editors.
    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError>;

    /// Synchronizes widgets with current values. Value writes are blocked while this runs.
    fn refresh(&mut self, _ctx: &mut EditorContext) -> Result<(), InspectorError> {
        Ok(())
    }

    /// Releases editor state, the tree drops widgets and child editors on its own.
    fn deinitialize(&mut self, _ctx: &mut EditorContext) {}

    /// Handles a message from a widget owned by this editor.
    fn handle_ui_message(
        &mut self,
        _ctx: &mut EditorContext,
        _message: &UiMessage,
    ) -> Result<(), InspectorError> {
        Ok(())
    }

    /// Called for the editor and its ancestors when the `source` editor wants to modify its
    /// values.
    fn on_dirty(
        &mut self,
        _ctx: &mut EditorContext,
        _source: Handle<EditorNode>,
        _write: &PendingWrite,
        _token: Option<&str>,
    ) -> DirtyAction {
        DirtyAction::Forward
    }

    /// Called after a queued value of this editor was applied.
    fn on_un_dirty(&mut self, _ctx: &mut EditorContext) {}

    /// Called on sync points after their whole subtree was refreshed.
    fn on_subtree_refreshed(&mut self, _ctx: &mut EditorContext) {}

    /// Whether reverting the editor means reverting its children one by one. `None` falls back
    /// to "has children".
    fn revert_value_with_children(&self) -> Option<bool> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub struct EditorNode {
    pub(crate) behavior: Option<Box<dyn CustomEditor>>,
    pub(crate) name: Rc<str>,
    pub(crate) property_name: String,
    pub(crate) parent: Handle<EditorNode>,
    pub(crate) children: Vec<Handle<EditorNode>>,
    pub(crate) values: Option<ValueContainer>,
    pub(crate) layout: Handle<UiNode>,
    pub(crate) elements: Vec<LayoutElement>,
    pub(crate) linked_label: Handle<UiNode>,
    pub(crate) pending: Option<PendingValue>,
    pub(crate) is_set_blocked: bool,
    pub(crate) rebuild_on_refresh: bool,
    pub(crate) skip_children_refresh: bool,
    pub(crate) is_sync_point: bool,
    pub(crate) initialized: bool,
}

impl EditorNode {
    pub(crate) fn new(
        descriptor: &EditorDescriptor,
        property_name: String,
        values: ValueContainer,
        layout: Handle<UiNode>,
    ) -> Self {
        let behavior = descriptor.create();
        Self {
            is_sync_point: behavior.is_sync_point(),
            behavior: Some(behavior),
            name: descriptor.name_rc(),
            property_name,
            parent: Handle::NONE,
            children: Default::default(),
            values: Some(values),
            layout,
            elements: Default::default(),
            linked_label: Handle::NONE,
            pending: None,
            is_set_blocked: false,
            rebuild_on_refresh: false,
            skip_children_refresh: false,
            initialized: false,
        }
    }

    /// Name of the editor definition, for example `IntegerEditor`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the edited member (or the label text for synthetic properties), empty for
    /// editors that are not properties.
    #[inline]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    #[inline]
    pub fn parent(&self) -> Handle<EditorNode> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[Handle<EditorNode>] {
        &self.children
    }

    /// `None` after cleanup.
    #[inline]
    pub fn values(&self) -> Option<&ValueContainer> {
        self.values.as_ref()
    }

    /// Panel the editor adds its widgets to. May be shared with the parent.
    #[inline]
    pub fn layout(&self) -> Handle<UiNode> {
        self.layout
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    #[inline]
    pub fn linked_label(&self) -> Handle<UiNode> {
        self.linked_label
    }

    pub fn pending_value(&self) -> Option<&PendingValue> {
        self.pending.as_ref()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn is_set_blocked(&self) -> bool {
        self.is_set_blocked
    }

    #[inline]
    pub fn is_sync_point(&self) -> bool {
        self.is_sync_point
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn behavior(&self) -> Option<&dyn CustomEditor> {
        self.behavior.as_deref()
    }

    pub fn cast<T: CustomEditor>(&self) -> Option<&T> {
        self.behavior.as_ref().and_then(|b| b.as_any().downcast_ref())
    }
}

/// Access to the tree from inside of an editor hook.
pub struct EditorContext<'a> {
    pub tree: &'a mut EditorTree,
    pub ui: &'a mut UserInterface,
    pub handle: Handle<EditorNode>,
}

impl EditorContext<'_> {
    pub fn node(&self) -> Option<&EditorNode> {
        self.tree.node(self.handle)
    }

    pub fn values(&self) -> Result<&ValueContainer, InspectorError> {
        self.tree.values_of(self.handle)
    }

    pub fn env(&self) -> Rc<EditorEnvironment> {
        self.tree.env.clone()
    }

    /// Requests a modification, see [`EditorTree::set_value`].
    pub fn set_value(&mut self, value: Value) -> bool {
        self.tree.set_value(self.ui, self.handle, value, None)
    }

    pub fn set_value_with_token(&mut self, value: Value, token: &str) -> bool {
        self.tree
            .set_value(self.ui, self.handle, value, Some(token.to_owned()))
    }

    /// Rebuilds the editor at the end of the current refresh pass.
    pub fn rebuild_layout_on_refresh(&mut self) {
        if let Some(node) = self.tree.editors.try_borrow_mut(self.handle) {
            node.rebuild_on_refresh = true;
        }
    }

    /// Children of the editor will not be refreshed during the current pass.
    pub fn skip_children_refresh(&mut self) {
        if let Some(node) = self.tree.editors.try_borrow_mut(self.handle) {
            node.skip_children_refresh = true;
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.tree.read_only || self.values().map_or(true, |v| v.is_read_only())
    }

    pub fn children(&self) -> Vec<Handle<EditorNode>> {
        self.node().map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn send(&mut self, widget: Handle<UiNode>, data: MessageData) {
        self.ui.send_message(UiMessage::to_widget(widget, data));
    }
}

pub struct EditorTree {
    pub(crate) editors: Pool<EditorNode>,
    pub(crate) env: Rc<EditorEnvironment>,
    pub(crate) root: Handle<EditorNode>,
    pub(crate) read_only: bool,
    pub(crate) rebuild_requested: bool,
    pub(crate) override_editor: Option<EditorDescriptor>,
    pub(crate) scroll_viewer: Handle<UiNode>,
}

impl EditorTree {
    pub fn new(env: Rc<EditorEnvironment>, scroll_viewer: Handle<UiNode>) -> Self {
        Self {
            editors: Pool::new(),
            env,
            root: Handle::NONE,
            read_only: false,
            rebuild_requested: false,
            override_editor: None,
            scroll_viewer,
        }
    }

    #[inline]
    pub fn env(&self) -> &Rc<EditorEnvironment> {
        &self.env
    }

    #[inline]
    pub fn root(&self) -> Handle<EditorNode> {
        self.root
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Editor used for the child of the root editor instead of the resolved one.
    pub fn override_editor(&self) -> Option<&EditorDescriptor> {
        self.override_editor.as_ref()
    }

    /// Set when the root editor must be rebuilt by the presenter.
    #[inline]
    pub fn is_rebuild_requested(&self) -> bool {
        self.rebuild_requested
    }

    pub fn node(&self, handle: Handle<EditorNode>) -> Option<&EditorNode> {
        self.editors.try_borrow(handle)
    }

    pub fn is_valid_handle(&self, handle: Handle<EditorNode>) -> bool {
        self.editors.is_valid_handle(handle)
    }

    pub fn alive_count(&self) -> u32 {
        self.editors.alive_count()
    }

    pub fn values_of(&self, handle: Handle<EditorNode>) -> Result<&ValueContainer, InspectorError> {
        self.editors
            .try_borrow(handle)
            .and_then(|n| n.values.as_ref())
            .ok_or_else(|| {
                InspectorError::StructuralMismatch(format!("editor {handle} has no values"))
            })
    }

    /// Adds an uninitialized editor to the tree.
    pub(crate) fn add_editor(
        &mut self,
        mut node: EditorNode,
        parent: Handle<EditorNode>,
    ) -> Handle<EditorNode> {
        node.parent = parent;
        let handle = self.editors.spawn(node);
        if let Some(parent) = self.editors.try_borrow_mut(parent) {
            parent.children.push(handle);
        }
        handle
    }

    pub(crate) fn set_linked_label(&mut self, handle: Handle<EditorNode>, label: Handle<UiNode>) {
        if let Some(node) = self.editors.try_borrow_mut(handle) {
            node.linked_label = label;
        }
    }

    /// Temporarily takes the behavior out of the editor and runs the function on it.
    /// Returns `None` if the editor is invalid or is already running a hook.
    pub fn with_behavior<R>(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
        func: impl FnOnce(&mut dyn CustomEditor, &mut EditorContext) -> R,
    ) -> Option<R> {
        let mut behavior = self.editors.try_borrow_mut(handle)?.behavior.take()?;
        let result = {
            let mut ctx = EditorContext {
                tree: self,
                ui,
                handle,
            };
            func(&mut *behavior, &mut ctx)
        };
        if let Some(node) = self.editors.try_borrow_mut(handle) {
            if node.behavior.is_none() {
                node.behavior = Some(behavior);
            }
        }
        Some(result)
    }

    fn set_blocked(&mut self, handle: Handle<EditorNode>, blocked: bool) {
        if let Some(node) = self.editors.try_borrow_mut(handle) {
            node.is_set_blocked = blocked;
        }
    }

    fn refresh_behavior(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> Result<(), InspectorError> {
        self.with_behavior(ui, handle, |behavior, ctx| behavior.refresh(ctx))
            .unwrap_or(Ok(()))
    }

    /// Lets the editor build its layout, then runs the first refresh of its widgets.
    pub fn initialize(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> Result<(), InspectorError> {
        let Some(node) = self.editors.try_borrow_mut(handle) else {
            return Err(InspectorError::StructuralMismatch(format!(
                "editor {handle} does not exist"
            )));
        };
        let Some(mut behavior) = node.behavior.take() else {
            return Err(InspectorError::Custom(format!(
                "editor {handle} is busy and cannot be initialized"
            )));
        };
        node.is_set_blocked = true;
        let panel = node.layout;
        let mut elements = std::mem::take(&mut node.elements);

        let result = {
            let mut layout = LayoutElementsContainer::new(self, ui, handle, panel, &mut elements);
            behavior.initialize(&mut layout)
        };

        if let Some(node) = self.editors.try_borrow_mut(handle) {
            node.behavior = Some(behavior);
            node.elements = elements;
            node.initialized = true;
        }

        let result = result.and_then(|_| self.refresh_behavior(ui, handle));
        self.set_blocked(handle, false);
        result
    }

    /// Queues a new value for every target of the editor. Returns `false` if the editor is
    /// read-only, is refreshing its widgets, or the modification was rejected by a sync point.
    pub fn set_value(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
        value: Value,
        token: Option<String>,
    ) -> bool {
        self.queue_write(ui, handle, PendingWrite::Value(value), token)
    }

    /// Queues JSON fields that are applied onto every target object of the editor. Works like
    /// [`Self::set_value`], but targets are modified in place instead of being replaced.
    pub fn set_fields(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
        fields: serde_json::Value,
        token: Option<String>,
    ) -> bool {
        self.queue_write(ui, handle, PendingWrite::Fields(fields), token)
    }

    fn queue_write(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
        write: PendingWrite,
        token: Option<String>,
    ) -> bool {
        match self.editors.try_borrow(handle) {
            Some(node) if !node.is_set_blocked => match node.values.as_ref() {
                Some(values) if !values.is_read_only() && !self.read_only => (),
                _ => return false,
            },
            _ => return false,
        }

        let mut current = handle;
        loop {
            let action = self
                .with_behavior(ui, current, |behavior, ctx| {
                    behavior.on_dirty(ctx, handle, &write, token.as_deref())
                })
                .unwrap_or(DirtyAction::Forward);
            match action {
                DirtyAction::Accept => break,
                DirtyAction::Reject => return false,
                DirtyAction::Forward => {
                    let parent = self
                        .editors
                        .try_borrow(current)
                        .map(|n| n.parent)
                        .unwrap_or_default();
                    if parent.is_none() {
                        break;
                    }
                    current = parent;
                }
            }
        }

        match self.editors.try_borrow_mut(handle) {
            Some(node) => {
                node.pending = Some(PendingValue { write, token });
                true
            }
            None => false,
        }
    }

    /// Applies the queued value (or re-reads values from the parent), refreshes widgets and then
    /// every child. Children that fail because the data changed its shape make the editor
    /// rebuild its layout at the end of the pass.
    pub fn refresh_internal(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> Result<(), InspectorError> {
        let (parent, pending, is_sync_point) = match self.editors.try_borrow_mut(handle) {
            Some(node) if node.initialized && node.values.is_some() => {
                (node.parent, node.pending.take(), node.is_sync_point)
            }
            _ => return Ok(()),
        };

        if let Some(pending) = pending {
            match pending.write {
                PendingWrite::Value(value) => self.apply_value(handle, parent, value)?,
                PendingWrite::Fields(fields) => self.apply_fields(handle, &fields)?,
            }
            self.with_behavior(ui, handle, |behavior, ctx| behavior.on_un_dirty(ctx));
        } else if parent.is_some() {
            self.pull_values(handle, parent)?;
        }

        self.set_blocked(handle, true);
        let result = self.refresh_behavior(ui, handle);
        self.set_blocked(handle, false);
        result?;

        let children = match self.editors.try_borrow_mut(handle) {
            Some(node) => {
                if std::mem::take(&mut node.skip_children_refresh) {
                    Vec::new()
                } else {
                    node.children.clone()
                }
            }
            None => return Ok(()),
        };
        let mut children_result = Ok(());
        for child in children {
            if let Err(e) = self.refresh_internal(ui, child) {
                if e.is_structural_mismatch() {
                    warn!("Exception while updating the child editors: {e}. Rebuilding the layout.");
                    if let Some(node) = self.editors.try_borrow_mut(handle) {
                        node.rebuild_on_refresh = true;
                    }
                } else {
                    children_result = Err(e);
                }
                break;
            }
        }

        if is_sync_point {
            self.with_behavior(ui, handle, |behavior, ctx| behavior.on_subtree_refreshed(ctx));
        }
        children_result?;

        let rebuild = self
            .editors
            .try_borrow_mut(handle)
            .is_some_and(|n| std::mem::take(&mut n.rebuild_on_refresh));
        if rebuild {
            self.rebuild_layout(ui, handle)?;
        }
        Ok(())
    }

    fn apply_value(
        &mut self,
        handle: Handle<EditorNode>,
        parent: Handle<EditorNode>,
        value: Value,
    ) -> Result<(), InspectorError> {
        if parent.is_none() {
            if let Some(values) = self
                .editors
                .try_borrow_mut(handle)
                .and_then(|n| n.values.as_mut())
            {
                values.set(None, value)?;
            }
            return Ok(());
        }

        {
            let (node, parent_node) = self
                .editors
                .try_borrow_two_mut((handle, parent))
                .ok_or_else(|| broken_hierarchy(handle))?;
            let (Some(values), Some(parent_values)) =
                (node.values.as_mut(), parent_node.values.as_mut())
            else {
                return Err(broken_hierarchy(handle));
            };
            values.set(Some(parent_values), value)?;
        }

        self.propagate_upwards(parent)
    }

    /// Populates every target object. Fields are converted for all targets before any target is
    /// modified. Objects are shared with the parent, so nothing is written back.
    fn apply_fields(
        &mut self,
        handle: Handle<EditorNode>,
        fields: &serde_json::Value,
    ) -> Result<(), InspectorError> {
        let Some(values) = self.editors.try_borrow(handle).and_then(|n| n.values.as_ref()) else {
            return Ok(());
        };
        let env = self.env.clone();
        let mut converted = Vec::with_capacity(values.len());
        for value in values.values() {
            let Value::Object(object) = value else {
                return Err(InspectorError::StructuralMismatch(format!(
                    "fields cannot be applied onto {value:?}"
                )));
            };
            let object_fields =
                json::convert_fields(object, fields, &env.types, env.objects.as_ref())?;
            converted.push((object.clone(), object_fields));
        }
        for (object, object_fields) in converted {
            let mut object = object.try_borrow_mut().map_err(|_| ReflectError::ObjectBusy)?;
            for (name, value) in object_fields {
                object.insert_field(&name, value);
            }
        }
        Ok(())
    }

    /// Writes modified value-type copies into their parents. Stops at the first container that
    /// holds references and right after writing into a sync point.
    fn propagate_upwards(&mut self, mut current: Handle<EditorNode>) -> Result<(), InspectorError> {
        loop {
            let Some(node) = self.editors.try_borrow(current) else {
                return Ok(());
            };
            let is_value_type = node.values.as_ref().is_some_and(|v| v.is_value_type());
            if node.is_sync_point || !is_value_type || node.parent.is_none() {
                return Ok(());
            }
            let parent = node.parent;
            let (node, parent_node) = self
                .editors
                .try_borrow_two_mut((current, parent))
                .ok_or_else(|| broken_hierarchy(current))?;
            if let (Some(values), Some(parent_values)) =
                (node.values.as_ref(), parent_node.values.as_mut())
            {
                values.write_back(parent_values)?;
            }
            current = parent;
        }
    }

    fn pull_values(
        &mut self,
        handle: Handle<EditorNode>,
        parent: Handle<EditorNode>,
    ) -> Result<(), InspectorError> {
        let (node, parent_node) = self
            .editors
            .try_borrow_two_mut((handle, parent))
            .ok_or_else(|| broken_hierarchy(handle))?;
        if let (Some(values), Some(parent_values)) =
            (node.values.as_mut(), parent_node.values.as_ref())
        {
            values.refresh(parent_values)?;
        }
        Ok(())
    }

    /// Recreates widgets and children of the editor. Editors sharing their layout panel with
    /// another editor rebuild the parent instead, the root editor is rebuilt by the presenter.
    pub fn rebuild_layout(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> Result<(), InspectorError> {
        if handle == self.root {
            self.rebuild_requested = true;
            return Ok(());
        }
        let Some(node) = self.editors.try_borrow(handle) else {
            return Ok(());
        };
        let (layout, parent) = (node.layout, node.parent);
        let shared_with_parent = self
            .editors
            .try_borrow(parent)
            .is_some_and(|p| p.layout == layout);
        let shared_with_sibling = self
            .editors
            .pair_iter()
            .any(|(h, n)| h != handle && n.parent == parent && n.layout == layout);
        if parent.is_some() && (shared_with_parent || shared_with_sibling) {
            return self.rebuild_layout(ui, parent);
        }

        let scroll_offset = ui.scroll_offset(self.scroll_viewer);
        let (values, linked_label) = match self.editors.try_borrow_mut(handle) {
            Some(node) => (node.values.take(), node.linked_label),
            None => return Ok(()),
        };

        self.cleanup(ui, handle);
        ui.clear_children(layout);

        if let Some(node) = self.editors.try_borrow_mut(handle) {
            node.values = values;
            node.linked_label = linked_label;
        }
        let result = self.initialize(ui, handle);
        ui.set_scroll_offset(self.scroll_viewer, scroll_offset);
        result
    }

    /// Deinitializes the editor and destroys its children. Safe to call more than once.
    pub fn cleanup(&mut self, ui: &mut UserInterface, handle: Handle<EditorNode>) {
        let Some(node) = self.editors.try_borrow_mut(handle) else {
            return;
        };
        if std::mem::replace(&mut node.initialized, false) {
            self.with_behavior(ui, handle, |behavior, ctx| behavior.deinitialize(ctx));
        }

        let children = match self.editors.try_borrow_mut(handle) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.cleanup(ui, child);
            self.editors.try_free(child);
        }

        if let Some(node) = self.editors.try_borrow_mut(handle) {
            node.elements.clear();
            node.pending = None;
            node.values = None;
            node.linked_label = Handle::NONE;
            node.is_set_blocked = false;
            node.rebuild_on_refresh = false;
            node.skip_children_refresh = false;
        }
    }

    /// Cleans the editor up and removes it from the tree.
    pub fn remove(&mut self, ui: &mut UserInterface, handle: Handle<EditorNode>) {
        self.cleanup(ui, handle);
        if let Some(node) = self.editors.try_free(handle) {
            if let Some(parent) = self.editors.try_borrow_mut(node.parent) {
                parent.children.retain(|c| *c != handle);
            }
        }
        if handle == self.root {
            self.root = Handle::NONE;
        }
    }

    fn reverts_with_children(&self, node: &EditorNode) -> bool {
        node.behavior
            .as_ref()
            .and_then(|b| b.revert_value_with_children())
            .unwrap_or(!node.children.is_empty())
    }

    fn is_writable<'a>(&self, node: &'a EditorNode) -> Option<&'a ValueContainer> {
        node.values
            .as_ref()
            .filter(|v| !self.read_only && !v.is_read_only())
    }

    pub fn can_revert_default_value(&self, handle: Handle<EditorNode>) -> bool {
        self.editors
            .try_borrow(handle)
            .and_then(|n| self.is_writable(n))
            .is_some_and(|v| v.is_default_value_modified())
    }

    pub fn can_revert_reference_value(&self, handle: Handle<EditorNode>) -> bool {
        self.editors
            .try_borrow(handle)
            .and_then(|n| self.is_writable(n))
            .is_some_and(|v| v.is_reference_value_modified(self.env.objects.as_ref()))
    }

    /// Sets the default value. Composite editors revert every modified child instead, so
    /// unrelated members keep their values.
    pub fn revert_to_default_value(&mut self, ui: &mut UserInterface, handle: Handle<EditorNode>) {
        if !self.can_revert_default_value(handle) {
            return;
        }
        let Some(node) = self.editors.try_borrow(handle) else {
            return;
        };
        if self.reverts_with_children(node) {
            for child in node.children.clone() {
                if self.can_revert_default_value(child) {
                    self.revert_to_default_value(ui, child);
                }
            }
        } else if let Some(default) = node.values.as_ref().and_then(|v| v.default_value()).cloned()
        {
            self.set_value(ui, handle, default, None);
        }
    }

    pub fn revert_to_reference_value(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) {
        if !self.can_revert_reference_value(handle) {
            return;
        }
        let Some(node) = self.editors.try_borrow(handle) else {
            return;
        };
        if self.reverts_with_children(node) {
            for child in node.children.clone() {
                if self.can_revert_reference_value(child) {
                    self.revert_to_reference_value(ui, child);
                }
            }
        } else {
            self.set_value_to_reference(ui, handle);
        }
    }

    /// Sets the reference value. References to prefab objects are remapped to the matching
    /// object of the prefab instance the edited object belongs to.
    pub fn set_value_to_reference(
        &mut self,
        ui: &mut UserInterface,
        handle: Handle<EditorNode>,
    ) -> bool {
        let Some(values) = self.editors.try_borrow(handle).and_then(|n| n.values.as_ref()) else {
            return false;
        };
        let Some(reference) = values.reference_value().cloned() else {
            return false;
        };
        let env = self.env.clone();
        let is_engine_reference = matches!(reference, Value::Object(_))
            && reference
                .runtime_type()
                .is_some_and(|t| env.types.is_engine_object(&t));
        if !is_engine_reference {
            return self.set_value(ui, handle, reference, None);
        }

        if !values.is_single_object() {
            err!("Cannot revert a prefab object reference for multiple selected objects.");
            return false;
        }
        let Some(reference_id) = reference.object_id() else {
            return false;
        };
        let objects = env.objects.as_ref();
        let Some(prefab_root) = self
            .find_owning_actor(handle)
            .and_then(|actor| find_prefab_root(objects, &actor))
        else {
            warn!("Cannot revert to the prefab object reference. The edited object is not a part of a prefab instance.");
            return false;
        };
        match find_prefab_instance(objects, &prefab_root, reference_id) {
            Some(instance) => self.set_value(ui, handle, Value::Object(instance), None),
            None => {
                warn!("Missing prefab instance reference in the prefab instance. Cannot revert to it.");
                false
            }
        }
    }

    /// Actor that owns the value edited by the editor: the nearest actor among the edited
    /// objects of the ancestors, or the actor of the nearest script.
    fn find_owning_actor(&self, handle: Handle<EditorNode>) -> Option<ObjectRef> {
        let objects = self.env.objects.as_ref();
        let mut current = self.editors.try_borrow(handle)?.parent;
        while let Some(node) = self.editors.try_borrow(current) {
            if let Some(Value::Object(object)) = node.values.as_ref().and_then(|v| v.first()) {
                if objects.is_actor(object) {
                    return Some(object.clone());
                }
                if objects.is_script(object) {
                    return objects.parent(object);
                }
            }
            current = node.parent;
        }
        None
    }
}

fn broken_hierarchy(handle: Handle<EditorNode>) -> InspectorError {
    InspectorError::StructuralMismatch(format!("values of editor {handle} lost their parent"))
}

#[cfg(test)]
mod test {
    use crate::{
        core::{
            object::PrefabLink,
            pool::Handle,
            reflect::{
                builtin, Attribute, MemberInfo, Object, ObjectRef, StructValue, TypeInfo, Value,
            },
        },
        inspector::{
            editor::{CustomEditor, DirtyAction, EditorContext, EditorNode, PendingWrite},
            layout::LayoutElementsContainer,
            resolver::EditorDescriptor,
            values::{ValueBinding, ValueContainer},
            InspectorError,
        },
        test::{counter, TestEnvironment},
    };
    use std::{any::Any, cell::Cell, rc::Rc};

    #[test]
    fn dirty_value_is_applied_on_refresh() {
        let mut env = TestEnvironment::new();
        let object = counter(5);
        let mut presenter = env.presenter();
        presenter.select(object.clone().into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        assert_eq!(presenter.editor_name(count), Some("IntegerEditor"));
        assert!(presenter
            .tree_mut()
            .set_value(&mut env.ui, count, Value::Int(9), None));
        assert!(presenter.tree().node(count).unwrap().is_dirty());
        assert_eq!(object.borrow().field("Count"), Some(&Value::Int(5)));

        presenter.update(&mut env.ui);
        assert!(!presenter.tree().node(count).unwrap().is_dirty());
        assert_eq!(object.borrow().field("Count"), Some(&Value::Int(9)));
    }

    #[test]
    fn writes_are_blocked_during_refresh() {
        #[derive(Default)]
        struct Echo {
            accepted: Rc<Cell<Option<bool>>>,
        }

        impl CustomEditor for Echo {
            fn initialize(&mut self, _: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
                Ok(())
            }

            fn refresh(&mut self, ctx: &mut EditorContext) -> Result<(), InspectorError> {
                self.accepted.set(Some(ctx.set_value(Value::Int(1))));
                Ok(())
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let accepted = Rc::new(Cell::new(None));
        let descriptor = {
            let accepted = accepted.clone();
            EditorDescriptor::new("Echo", move || {
                Box::new(Echo {
                    accepted: accepted.clone(),
                })
            })
        };

        let mut env = TestEnvironment::new();
        let mut presenter = env.presenter();
        presenter.set_override_editor(Some(descriptor));
        presenter.select(counter(5).into());
        presenter.update(&mut env.ui);
        assert_eq!(accepted.get(), Some(false));
    }

    // A reference-type ancestor holds the edited data already, nothing above it must be written.
    #[test]
    fn value_type_propagation_stops_at_reference_ancestor() {
        let mut env = TestEnvironment::new();
        env.register(
            TypeInfo::structure("Point")
                .with_member(MemberInfo::new("X", builtin::FLOAT))
                .with_member(MemberInfo::new("Y", builtin::FLOAT)),
        );
        env.register(
            TypeInfo::class("Shape").with_member(MemberInfo::new("Origin", "Point")),
        );
        let shape = Object::new("Shape")
            .with_field(
                "Origin",
                StructValue::new("Point")
                    .with_field("X", Value::Float(1.0))
                    .with_field("Y", Value::Float(2.0))
                    .into(),
            )
            .into_ref();

        let mut presenter = env.presenter();
        presenter.select(Value::Object(shape.clone()));
        presenter.update(&mut env.ui);

        // Wrap the shape into a counting binding to detect writes above the shape.
        let root = presenter.tree().root();
        let writes = Rc::new(Cell::new(0));
        {
            let writes = writes.clone();
            let tree = presenter.tree_mut();
            let root_child = tree.node(root).unwrap().children()[0];
            let node = tree.editors.try_borrow_mut(root_child).unwrap();
            let values = node.values.as_ref().unwrap();
            let counted = ValueContainer::new(
                &ValueContainer::identity(values),
                ValueBinding::Custom {
                    getter: Rc::new(|v: &Value| Ok(v.clone())),
                    setter: Rc::new(move |target: &mut Value, value: Value| {
                        writes.set(writes.get() + 1);
                        *target = value;
                        Ok(())
                    }),
                },
                values.value_type().clone(),
            )
            .unwrap();
            node.values = Some(counted);
        }

        let x = presenter.find_editor("Origin.X").unwrap();
        assert!(presenter
            .tree_mut()
            .set_value(&mut env.ui, x, Value::Float(5.0), None));
        presenter.update(&mut env.ui);

        assert_eq!(
            shape.borrow().field("Origin").unwrap().member("X").unwrap(),
            Value::Float(5.0)
        );
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn struct_selection_is_written_into_root() {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::structure("Size").with_member(MemberInfo::new("W", builtin::INT)));
        let mut presenter = env.presenter();
        presenter.select(StructValue::new("Size").with_field("W", Value::Int(1)).into());
        presenter.update(&mut env.ui);

        let w = presenter.find_editor("W").unwrap();
        presenter
            .tree_mut()
            .set_value(&mut env.ui, w, Value::Int(4), None);
        presenter.update(&mut env.ui);
        assert_eq!(
            presenter.selection().values()[0].member("W").unwrap(),
            Value::Int(4)
        );
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut env = TestEnvironment::new();
        let mut presenter = env.presenter();
        presenter.select(counter(1).into());
        presenter.update(&mut env.ui);

        let root = presenter.tree().root();
        let child = presenter.tree().node(root).unwrap().children()[0];
        let tree = presenter.tree_mut();
        tree.cleanup(&mut env.ui, child);
        let alive = tree.alive_count();
        let snapshot = |node: &EditorNode| {
            (
                node.children().len(),
                node.values().is_none(),
                node.is_dirty(),
                node.elements().len(),
                node.linked_label(),
                node.is_initialized(),
            )
        };
        let first = snapshot(tree.node(child).unwrap());
        tree.cleanup(&mut env.ui, child);
        assert_eq!(snapshot(tree.node(child).unwrap()), first);
        assert_eq!(tree.alive_count(), alive);
        assert_eq!(first, (0, true, false, 0, Handle::NONE, false));
    }

    #[test]
    fn read_only_tree_rejects_modifications() {
        let mut env = TestEnvironment::new();
        let object = counter(5);
        let mut presenter = env.presenter();
        presenter.set_read_only(true);
        presenter.select(object.clone().into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        assert!(!presenter
            .tree_mut()
            .set_value(&mut env.ui, count, Value::Int(1), None));
        presenter.update(&mut env.ui);
        assert_eq!(object.borrow().field("Count"), Some(&Value::Int(5)));
    }

    #[test]
    fn revert_to_default_value() {
        let mut env = TestEnvironment::new();
        let object = counter(5);
        let mut presenter = env.presenter();
        presenter.select(object.clone().into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        let root = presenter.tree().root();
        assert!(presenter.tree().can_revert_default_value(count));
        assert!(!presenter.tree().can_revert_default_value(root));

        presenter.tree_mut().revert_to_default_value(&mut env.ui, count);
        presenter.update(&mut env.ui);
        assert_eq!(object.borrow().field("Count"), Some(&Value::Int(0)));
        assert!(!presenter.tree().can_revert_default_value(count));
    }

    #[test]
    fn composite_revert_reverts_each_child() {
        let mut env = TestEnvironment::new();
        env.register(
            TypeInfo::structure("Range")
                .with_member(
                    MemberInfo::new("Min", builtin::INT)
                        .with_attribute(Attribute::DefaultValue(Value::Int(0))),
                )
                .with_member(MemberInfo::new("Max", builtin::INT))
                .with_member(
                    MemberInfo::new("Step", builtin::INT)
                        .with_attribute(Attribute::DefaultValue(Value::Int(1))),
                ),
        );
        env.register(
            TypeInfo::class("Spawner").with_member(MemberInfo::new("Range", "Range")),
        );
        let spawner = Object::new("Spawner")
            .with_field(
                "Range",
                StructValue::new("Range")
                    .with_field("Min", Value::Int(3))
                    .with_field("Max", Value::Int(7))
                    .with_field("Step", Value::Int(1))
                    .into(),
            )
            .into_ref();
        let mut presenter = env.presenter();
        presenter.select(Value::Object(spawner.clone()));
        presenter.update(&mut env.ui);

        let range = presenter.find_editor("Range").unwrap();
        let defaults = StructValue::new("Range")
            .with_field("Min", Value::Int(0))
            .with_field("Max", Value::Int(0))
            .with_field("Step", Value::Int(1));
        presenter
            .tree_mut()
            .editors
            .try_borrow_mut(range)
            .and_then(|n| n.values.as_mut())
            .unwrap()
            .set_default_value(defaults.into());
        // Children read their baselines when they are built.
        presenter.tree_mut().rebuild_layout(&mut env.ui, range).unwrap();

        let step = presenter.find_editor("Range.Step").unwrap();
        assert!(!presenter.tree().can_revert_default_value(step));

        presenter.tree_mut().revert_to_default_value(&mut env.ui, range);
        // Only modified children are reverted.
        for (name, dirty) in [("Range.Min", true), ("Range.Max", true), ("Range.Step", false)] {
            let editor = presenter.find_editor(name).unwrap();
            assert_eq!(presenter.tree().node(editor).unwrap().is_dirty(), dirty, "{name}");
        }
        presenter.update(&mut env.ui);
        let range = spawner.borrow().field("Range").cloned().unwrap();
        assert_eq!(range.member("Min").unwrap(), Value::Int(0));
        assert_eq!(range.member("Max").unwrap(), Value::Int(0));
        assert_eq!(range.member("Step").unwrap(), Value::Int(1));
    }

    #[test]
    fn nested_struct_edit_is_written_through_every_level() {
        let mut env = TestEnvironment::new();
        env.register(
            TypeInfo::structure("Point")
                .with_member(MemberInfo::new("X", builtin::FLOAT))
                .with_member(MemberInfo::new("Y", builtin::FLOAT)),
        );
        env.register(
            TypeInfo::structure("Bounds")
                .with_member(MemberInfo::new("Min", "Point"))
                .with_member(MemberInfo::new("Max", "Point")),
        );
        env.register(TypeInfo::class("Body").with_member(MemberInfo::new("Bounds", "Bounds")));
        let point = |x: f64, y: f64| {
            Value::from(
                StructValue::new("Point")
                    .with_field("X", Value::Float(x))
                    .with_field("Y", Value::Float(y)),
            )
        };
        let body = Object::new("Body")
            .with_field(
                "Bounds",
                StructValue::new("Bounds")
                    .with_field("Min", point(0.0, 0.0))
                    .with_field("Max", point(2.0, 3.0))
                    .into(),
            )
            .into_ref();

        let mut presenter = env.presenter();
        presenter.select(Value::Object(body.clone()));
        presenter.update(&mut env.ui);

        let x = presenter.find_editor("Bounds.Min.X").unwrap();
        assert!(presenter
            .tree_mut()
            .set_value(&mut env.ui, x, Value::Float(-1.0), None));
        presenter.update(&mut env.ui);

        let bounds = body.borrow().field("Bounds").cloned().unwrap();
        assert_eq!(bounds.member("Min").unwrap(), point(-1.0, 0.0));
        assert_eq!(bounds.member("Max").unwrap(), point(2.0, 3.0));

        // The intermediate copies were refreshed from the object as well.
        let min = presenter.find_editor("Bounds.Min").unwrap();
        assert_eq!(
            presenter.tree().node(min).unwrap().values().unwrap().first(),
            Some(&point(-1.0, 0.0))
        );
    }

    struct PrefabScene {
        env: TestEnvironment,
        script: ObjectRef,
        target: ObjectRef,
        other: ObjectRef,
    }

    // Scene > Root > Target, with a `Follower` script on Root pointing at an actor outside of
    // the instance. The script and Target come from a prefab.
    fn prefab_scene(mark_root: bool, link_target: bool) -> PrefabScene {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::class("Follower").with_base(builtin::SCRIPT).with_member(
            MemberInfo::new("Target", builtin::ACTOR),
        ));

        let template_target = Object::new(builtin::ACTOR).into_ref();
        let template_script = Object::new("Follower")
            .with_field("Target", Value::Object(template_target.clone()))
            .into_ref();

        let scene = Object::new(builtin::ACTOR).into_ref();
        let root = Object::new(builtin::ACTOR).into_ref();
        let target = Object::new(builtin::ACTOR).into_ref();
        let other = Object::new(builtin::ACTOR).into_ref();
        let script = Object::new("Follower")
            .with_field("Target", Value::Object(other.clone()))
            .into_ref();

        let world = &mut env.world;
        let scene_id = world.add_scene(scene);
        let root_id = world.add_actor(root, Some(scene_id));
        let target_id = world.add_actor(target.clone(), Some(root_id));
        world.add_actor(other.clone(), Some(scene_id));
        let script_id = world.add_script(script.clone(), root_id).unwrap();
        if mark_root {
            world.link_prefab(
                root_id,
                PrefabLink {
                    prefab_object_id: uuid::Uuid::new_v4(),
                    is_root: true,
                    reference: None,
                },
            );
        }
        if link_target {
            world.link_prefab(
                target_id,
                PrefabLink {
                    prefab_object_id: template_target.borrow().id(),
                    is_root: false,
                    reference: Some(template_target.clone()),
                },
            );
        }
        let template_script_id = template_script.borrow().id();
        world.link_prefab(
            script_id,
            PrefabLink {
                prefab_object_id: template_script_id,
                is_root: false,
                reference: Some(template_script),
            },
        );

        PrefabScene {
            env,
            script,
            target,
            other,
        }
    }

    #[test]
    fn prefab_revert_remaps_to_instance() {
        let PrefabScene {
            mut env,
            script,
            target,
            ..
        } = prefab_scene(true, true);
        let mut presenter = env.presenter();
        presenter.select(Value::Object(script.clone()));
        presenter.update(&mut env.ui);

        let target_editor = presenter.find_editor("Target").unwrap();
        assert!(presenter.tree().can_revert_reference_value(target_editor));
        presenter
            .tree_mut()
            .revert_to_reference_value(&mut env.ui, target_editor);
        presenter.update(&mut env.ui);

        let value = script.borrow().field("Target").cloned().unwrap();
        assert_eq!(value, Value::Object(target));
        assert!(!presenter.tree().can_revert_reference_value(target_editor));
    }

    #[test]
    fn prefab_revert_without_match_changes_nothing() {
        // Target is not a prefab instance, then there is no prefab root below the scene.
        for (mark_root, link_target) in [(true, false), (false, true)] {
            let PrefabScene {
                mut env,
                script,
                other,
                ..
            } = prefab_scene(mark_root, link_target);
            let mut presenter = env.presenter();
            presenter.select(Value::Object(script.clone()));
            presenter.update(&mut env.ui);

            let target_editor = presenter.find_editor("Target").unwrap();
            assert!(!presenter
                .tree_mut()
                .set_value_to_reference(&mut env.ui, target_editor));
            assert!(!presenter.tree().node(target_editor).unwrap().is_dirty());
            presenter.update(&mut env.ui);
            assert_eq!(
                script.borrow().field("Target"),
                Some(&Value::Object(other))
            );
        }
    }

    #[test]
    fn prefab_revert_requires_single_object() {
        let mut env = TestEnvironment::new();
        let template = Object::new(builtin::ACTOR).into_ref();
        let mut presenter = env.presenter();
        presenter.select_many(vec![counter(1).into(), counter(2).into()]);
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        presenter
            .tree_mut()
            .editors
            .try_borrow_mut(count)
            .and_then(|n| n.values.as_mut())
            .unwrap()
            .set_reference_value(Value::Object(template));
        assert!(!presenter.tree_mut().set_value_to_reference(&mut env.ui, count));
        assert!(!presenter.tree().node(count).unwrap().is_dirty());
    }

    #[test]
    fn sync_point_can_reject() {
        #[derive(Default)]
        struct Locked;

        impl CustomEditor for Locked {
            fn is_sync_point(&self) -> bool {
                true
            }

            fn initialize(
                &mut self,
                layout: &mut LayoutElementsContainer,
            ) -> Result<(), InspectorError> {
                let values = layout.values()?.clone();
                let member = MemberInfo::new("Count", builtin::INT);
                layout.property("Count", ValueContainer::from_member(&values, &member)?)?;
                Ok(())
            }

            fn on_dirty(
                &mut self,
                _: &mut EditorContext,
                _: Handle<EditorNode>,
                _: &PendingWrite,
                _: Option<&str>,
            ) -> DirtyAction {
                DirtyAction::Reject
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let mut env = TestEnvironment::new();
        let mut presenter = env.presenter();
        presenter.set_override_editor(Some(EditorDescriptor::of::<Locked>("Locked")));
        presenter.select(counter(1).into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        assert!(!presenter
            .tree_mut()
            .set_value(&mut env.ui, count, Value::Int(2), None));
    }
}
