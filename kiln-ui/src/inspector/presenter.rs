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

//! Presenter of a selection: owns the editor tree, builds it for the selected values and runs
//! the per-frame refresh pass.

use crate::{
    core::{
        err,
        log::Log,
        pool::Handle,
        reflect::{TypeName, Value},
    },
    inspector::{
        clipboard::ContextAction,
        editor::{EditorNode, EditorTree},
        editors::RootEditor,
        resolver::EditorDescriptor,
        values::ValueContainer,
        EditorEnvironment,
    },
    message::{MessageData, MessageDirection, UiMessage},
    UiNode, UserInterface, WidgetKind,
};
use std::rc::Rc;

/// Values being inspected and their common declared type.
#[derive(Clone, Debug)]
pub struct Selection {
    values: Vec<Value>,
    value_type: TypeName,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            values: Default::default(),
            value_type: TypeName::any(),
        }
    }
}

impl Selection {
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct CustomEditorPresenter {
    tree: EditorTree,
    scroll_viewer: Handle<UiNode>,
    panel: Handle<UiNode>,
    selection: Selection,
    build_on_update: bool,
}

impl CustomEditorPresenter {
    pub const NO_SELECTION: &'static str = "No selection";

    /// Creates the presenter widgets. Link [`Self::root_widget`] into the host layout.
    pub fn new(ui: &mut UserInterface, env: Rc<EditorEnvironment>) -> Self {
        let scroll_viewer = ui.add_node(WidgetKind::ScrollViewer { offset: 0.0 }, Handle::NONE);
        let panel = ui.add_node(WidgetKind::Panel, scroll_viewer);
        Self {
            tree: EditorTree::new(env, scroll_viewer),
            scroll_viewer,
            panel,
            selection: Default::default(),
            build_on_update: true,
        }
    }

    #[inline]
    pub fn root_widget(&self) -> Handle<UiNode> {
        self.scroll_viewer
    }

    pub fn tree(&self) -> &EditorTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut EditorTree {
        &mut self.tree
    }

    pub fn env(&self) -> &Rc<EditorEnvironment> {
        self.tree.env()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Inspects a single value.
    pub fn select(&mut self, value: Value) {
        let value_type = value.runtime_type().unwrap_or_else(TypeName::any);
        self.select_with_type(vec![value], value_type);
    }

    /// Inspects several values at once. The declared type is the most derived type they share.
    pub fn select_many(&mut self, values: Vec<Value>) {
        let types = values
            .iter()
            .filter_map(Value::runtime_type)
            .collect::<Vec<_>>();
        let value_type = if types.len() == values.len() {
            self.tree.env().types.common_base(&types)
        } else {
            TypeName::any()
        };
        self.select_with_type(values, value_type);
    }

    pub fn select_with_type(&mut self, values: Vec<Value>, value_type: TypeName) {
        self.selection = Selection { values, value_type };
        self.build_layout_on_update();
    }

    /// Removes the value from the selection. Returns `false` if it was not selected.
    pub fn deselect(&mut self, value: &Value) -> bool {
        let count = self.selection.values.len();
        self.selection.values.retain(|v| v != value);
        if self.selection.values.len() == count {
            return false;
        }
        if self.selection.values.is_empty() {
            self.selection.value_type = TypeName::any();
        }
        self.build_layout_on_update();
        true
    }

    pub fn deselect_all(&mut self) {
        self.selection = Default::default();
        self.build_layout_on_update();
    }

    /// Editor used for the selection instead of the resolved one. Applied on the next build.
    pub fn set_override_editor(&mut self, editor: Option<EditorDescriptor>) {
        self.tree.override_editor = editor;
        self.build_layout_on_update();
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if self.tree.read_only != read_only {
            self.tree.read_only = read_only;
            self.build_layout_on_update();
        }
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.tree.read_only
    }

    pub fn build_layout_on_update(&mut self) {
        self.build_on_update = true;
    }

    /// Destroys the current editors and builds new ones for the selection.
    pub fn build_layout(&mut self, ui: &mut UserInterface) {
        self.build_on_update = false;
        self.tree.rebuild_requested = false;

        let scroll_offset = ui.scroll_offset(self.scroll_viewer);
        self.cleanup(ui);

        if self.selection.is_empty() {
            ui.add_node(
                WidgetKind::Label {
                    text: Self::NO_SELECTION.to_owned(),
                },
                self.panel,
            );
            return;
        }

        let mut values = ValueContainer::new_root(
            self.selection.values.clone(),
            self.selection.value_type.clone(),
        );
        values.set_read_only(self.tree.read_only);
        if let [Value::Object(object)] = self.selection.values.as_slice() {
            if let Some(reference) = self.tree.env().objects.prefab_reference(object) {
                values.set_reference_value(Value::Object(reference));
            }
        }

        let node = EditorNode::new(&RootEditor::descriptor(), String::new(), values, self.panel);
        let root = self.tree.add_editor(node, Handle::NONE);
        self.tree.root = root;
        if let Err(e) = self.tree.initialize(ui, root) {
            err!("Failed to build the inspector layout. {e}");
        }
        ui.set_scroll_offset(self.scroll_viewer, scroll_offset);
    }

    /// Per-frame pass: applies queued modifications and refreshes every editor. Errors that
    /// reach the root make the whole layout rebuild on the next update.
    pub fn update(&mut self, ui: &mut UserInterface) {
        if self.build_on_update {
            self.build_layout(ui);
            return;
        }
        let root = self.tree.root;
        if root.is_none() {
            return;
        }
        if let Err(e) = self.tree.refresh_internal(ui, root) {
            // The same failure comes back after every rebuild while the data stays broken.
            Log::err_once(
                self.panel.index() as usize,
                format!("Failed to refresh the inspector. The layout will be rebuilt. {e}"),
            );
            self.build_on_update = true;
        }
        if let Ok(values) = self.tree.values_of(root) {
            self.selection.values = values.values().to_vec();
        }
        if std::mem::take(&mut self.tree.rebuild_requested) {
            self.build_layout(ui);
        }
    }

    fn is_own_widget(&self, ui: &UserInterface, mut widget: Handle<UiNode>) -> bool {
        while let Some(node) = ui.try_get(widget) {
            if widget == self.scroll_viewer {
                return true;
            }
            widget = node.parent();
        }
        false
    }

    /// Routes a widget message to the editor owning the widget.
    pub fn handle_ui_message(&mut self, ui: &mut UserInterface, message: &UiMessage) {
        if message.direction() != MessageDirection::FromWidget
            || !self.is_own_widget(ui, message.destination())
        {
            return;
        }
        let Some(node) = ui.try_get(message.destination()) else {
            return;
        };
        if let (WidgetKind::Group { title, .. }, MessageData::Expand(expanded)) =
            (node.kind(), message.data())
        {
            self.tree
                .env()
                .settings
                .borrow_mut()
                .set_group_expanded(title, *expanded);
        }

        let editor = Handle::<EditorNode>::from(node.owner());
        if !self.tree.is_valid_handle(editor) {
            return;
        }
        if let MessageData::ContextAction(action) = message.data() {
            self.perform_context_action(ui, editor, *action);
            return;
        }
        let result = self
            .tree
            .with_behavior(ui, editor, |behavior, ctx| behavior.handle_ui_message(ctx, message));
        if let Some(Err(e)) = result {
            err!("Editor failed to handle a message. {e}");
        }
    }

    /// Context menu items that are applicable to the editor right now.
    pub fn context_actions(
        &self,
        ui: &UserInterface,
        editor: Handle<EditorNode>,
    ) -> Vec<ContextAction> {
        let mut actions = vec![ContextAction::Copy];
        if self.tree.can_paste(ui, editor) {
            actions.push(ContextAction::Paste);
        }
        if self.tree.can_revert_default_value(editor) {
            actions.push(ContextAction::ResetToDefault);
        }
        if self.tree.can_revert_reference_value(editor) {
            actions.push(ContextAction::RevertToReference);
        }
        actions
    }

    pub fn perform_context_action(
        &mut self,
        ui: &mut UserInterface,
        editor: Handle<EditorNode>,
        action: ContextAction,
    ) {
        // Clipboard failures are logged by the tree.
        match action {
            ContextAction::Copy => {
                let _ = self.tree.copy(ui, editor);
            }
            ContextAction::Paste => {
                let _ = self.tree.paste(ui, editor);
            }
            ContextAction::ResetToDefault => self.tree.revert_to_default_value(ui, editor),
            ContextAction::RevertToReference => self.tree.revert_to_reference_value(ui, editor),
        }
    }

    #[inline]
    pub fn root_editor(&self) -> Handle<EditorNode> {
        self.tree.root
    }

    pub fn root_values(&self) -> Option<&ValueContainer> {
        self.tree.values_of(self.tree.root).ok()
    }

    pub fn values(&self, editor: Handle<EditorNode>) -> Option<&ValueContainer> {
        self.tree.values_of(editor).ok()
    }

    pub fn editor_name(&self, editor: Handle<EditorNode>) -> Option<&str> {
        self.tree.node(editor).map(|n| n.name())
    }

    /// Finds an editor by a dot-separated path of property names, for example `Origin.X`.
    /// Editors without a property name (the root, inline object editors) are transparent.
    pub fn find_editor(&self, path: &str) -> Option<Handle<EditorNode>> {
        let segments = path.split('.').collect::<Vec<_>>();
        self.find_in(self.tree.root, &segments)
    }

    fn find_in(&self, parent: Handle<EditorNode>, segments: &[&str]) -> Option<Handle<EditorNode>> {
        let (first, rest) = segments.split_first()?;
        for child in self.tree.node(parent)?.children() {
            let Some(node) = self.tree.node(*child) else {
                continue;
            };
            let found = if node.property_name().is_empty() {
                self.find_in(*child, segments)
            } else if node.property_name() == *first {
                if rest.is_empty() {
                    Some(*child)
                } else {
                    self.find_in(*child, rest)
                }
            } else {
                None
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Destroys every editor and widget of the presenter content.
    pub fn cleanup(&mut self, ui: &mut UserInterface) {
        let root = self.tree.root;
        if root.is_some() {
            self.tree.remove(ui, root);
        }
        ui.clear_children(self.panel);
    }
}
