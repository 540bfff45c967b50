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
    core::pool::Handle,
    inspector::{
        editor::{CustomEditor, DirtyAction, EditorContext, EditorNode, PendingWrite},
        editors::GenericEditor,
        layout::LayoutElementsContainer,
        resolver::EditorDescriptor,
        values::ValueContainer,
        InspectorError,
    },
};
use std::any::Any;

/// Top of every editor tree. Holds the selection, accepts modifications of the whole tree and
/// wraps them into undo records.
#[derive(Default)]
pub struct RootEditor {
    recording: bool,
}

impl RootEditor {
    pub const NAME: &'static str = "RootEditor";

    pub fn descriptor() -> EditorDescriptor {
        EditorDescriptor::of::<Self>(Self::NAME)
    }

    /// True while an undo record is open.
    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

impl CustomEditor for RootEditor {
    fn is_sync_point(&self) -> bool {
        true
    }

    fn initialize(&mut self, layout: &mut LayoutElementsContainer) -> Result<(), InspectorError> {
        let values = layout.values()?;
        if values.is_empty() {
            return Ok(());
        }
        let env = layout.env();

        if values.has_different_types() {
            let child_values = ValueContainer::identity(values);
            layout.object_with_editor(child_values, GenericEditor::descriptor())?;
            return Ok(());
        }

        let child_values = match values.shared_runtime_type() {
            Some(runtime_type) if values.value_type().is_any() => {
                ValueContainer::identity_as(values, runtime_type)
            }
            _ => ValueContainer::identity(values),
        };
        let descriptor = match layout.tree().override_editor() {
            Some(descriptor) => descriptor.clone(),
            // The selection itself is edited, not picked.
            None => env.resolve(&child_values, None, false),
        };
        layout.object_with_editor(child_values, descriptor)?;
        Ok(())
    }

    fn deinitialize(&mut self, ctx: &mut EditorContext) {
        self.on_subtree_refreshed(ctx);
    }

    fn on_dirty(
        &mut self,
        ctx: &mut EditorContext,
        _source: Handle<EditorNode>,
        _write: &PendingWrite,
        _token: Option<&str>,
    ) -> DirtyAction {
        if ctx.tree.is_read_only() {
            return DirtyAction::Reject;
        }
        if !self.recording {
            if let (Some(undo), Ok(values)) = (ctx.env().active_undo(), ctx.values()) {
                undo.borrow_mut().begin_record(values.values(), "Edit properties");
                self.recording = true;
            }
        }
        DirtyAction::Accept
    }

    fn on_subtree_refreshed(&mut self, ctx: &mut EditorContext) {
        if !std::mem::take(&mut self.recording) {
            return;
        }
        if let (Some(undo), Ok(values)) = (ctx.env().active_undo(), ctx.values()) {
            undo.borrow_mut().end_record(values.values());
        }
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
        core::reflect::{builtin, Object, TypeInfo, Value},
        test::{counter, RecordingUndo, TestEnvironment},
    };
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn edits_are_wrapped_into_undo_records() {
        let undo = Rc::new(RefCell::new(RecordingUndo::default()));
        let mut env = TestEnvironment::new().with_undo(undo.clone());
        let object = counter(1);
        let mut presenter = env.presenter();
        presenter.select(object.clone().into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        presenter
            .tree_mut()
            .set_value(&mut env.ui, count, Value::Int(2), None);
        assert_eq!(undo.borrow().log, vec!["begin Edit properties"]);
        assert_eq!(undo.borrow().before[0].member("Count").unwrap(), Value::Int(1));

        presenter.update(&mut env.ui);
        assert_eq!(undo.borrow().log, vec!["begin Edit properties", "end"]);
        assert_eq!(undo.borrow().after[0].member("Count").unwrap(), Value::Int(2));

        // Nothing changed, nothing recorded.
        presenter.update(&mut env.ui);
        assert_eq!(undo.borrow().log.len(), 2);
    }

    #[test]
    fn disabled_undo_is_not_used() {
        let undo = Rc::new(RefCell::new(RecordingUndo::default()));
        let mut env = TestEnvironment::new().with_undo(undo.clone());
        env.settings.undo_enabled = false;
        let mut presenter = env.presenter();
        presenter.select(counter(1).into());
        presenter.update(&mut env.ui);

        let count = presenter.find_editor("Count").unwrap();
        presenter
            .tree_mut()
            .set_value(&mut env.ui, count, Value::Int(2), None);
        presenter.update(&mut env.ui);
        assert!(undo.borrow().log.is_empty());
    }

    #[test]
    fn mixed_types_use_generic_editor() {
        let mut env = TestEnvironment::new();
        env.register(TypeInfo::class("Light").with_base(builtin::ACTOR));
        env.register(TypeInfo::class("Camera").with_base(builtin::ACTOR));
        let mut presenter = env.presenter();
        presenter.select_many(vec![
            Object::new("Light").into(),
            Object::new("Camera").into(),
        ]);
        presenter.update(&mut env.ui);

        let root = presenter.tree().root();
        let child = presenter.tree().node(root).unwrap().children()[0];
        assert_eq!(presenter.editor_name(child), Some("GenericEditor"));
        assert_eq!(
            presenter.selection().value_type().as_str(),
            builtin::ACTOR
        );
    }
}
