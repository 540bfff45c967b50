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

//! Shared fixtures of the widget tests.

use crate::{
    core::{
        object::World,
        parking_lot::Mutex,
        reflect::{
            builtin, Attribute, MemberInfo, Object, ObjectRef, StructValue, TypeDatabase,
            TypeInfo, Value,
        },
    },
    inspector::{presenter::CustomEditorPresenter, undo::UndoLog, EditorEnvironment},
    settings::InspectorSettings,
    UserInterface,
};
use copypasta::ClipboardProvider;
use std::{cell::RefCell, error::Error, rc::Rc, sync::Arc};

/// In-memory clipboard, tests must not touch the system one.
#[derive(Clone, Default)]
pub struct LocalClipboard {
    contents: Arc<Mutex<String>>,
}

impl ClipboardProvider for LocalClipboard {
    fn get_contents(&mut self) -> Result<String, Box<dyn Error + Send + Sync + 'static>> {
        Ok(self.contents.lock().clone())
    }

    fn set_contents(
        &mut self,
        contents: String,
    ) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
        *self.contents.lock() = contents;
        Ok(())
    }
}

/// `Counter { Count: n }`, `Count` defaults to zero.
pub fn counter(count: i64) -> ObjectRef {
    Object::new("Counter")
        .with_field("Count", Value::Int(count))
        .into_ref()
}

/// Widgets, types and objects of a test. Types, objects and settings can be changed until the
/// first presenter is created, after that they are owned by the shared environment.
pub struct TestEnvironment {
    pub ui: UserInterface,
    pub types: TypeDatabase,
    pub world: World,
    pub settings: InspectorSettings,
    undo: Option<Rc<RefCell<dyn UndoLog>>>,
    clipboard: LocalClipboard,
    env: Option<Rc<EditorEnvironment>>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let clipboard = LocalClipboard::default();
        let mut types = TypeDatabase::new();
        types.register(
            TypeInfo::class("Counter").with_member(
                MemberInfo::new("Count", builtin::INT)
                    .with_attribute(Attribute::DefaultValue(Value::Int(0)))
                    .with_attribute(Attribute::Tooltip("Number of items".to_owned())),
            ),
        );
        Self {
            ui: UserInterface::with_clipboard(Some(Box::new(clipboard.clone()))),
            types,
            world: Default::default(),
            settings: Default::default(),
            undo: None,
            clipboard,
            env: None,
        }
    }

    pub fn with_undo(mut self, undo: Rc<RefCell<dyn UndoLog>>) -> Self {
        self.undo = Some(undo);
        self
    }

    pub fn register(&mut self, info: TypeInfo) {
        assert!(
            self.env.is_none(),
            "types must be registered before the first presenter is created"
        );
        self.types.register(info);
    }

    pub fn environment(&mut self) -> Rc<EditorEnvironment> {
        if let Some(env) = self.env.as_ref() {
            return env.clone();
        }
        let mut env = EditorEnvironment::new(
            Rc::new(std::mem::take(&mut self.types)),
            Rc::new(std::mem::take(&mut self.world)),
        )
        .with_settings(self.settings.clone());
        if let Some(undo) = self.undo.clone() {
            env = env.with_undo(undo);
        }
        let env = Rc::new(env);
        self.env = Some(env.clone());
        env
    }

    pub fn presenter(&mut self) -> CustomEditorPresenter {
        let env = self.environment();
        CustomEditorPresenter::new(&mut self.ui, env)
    }

    /// Delivers every queued widget message to the presenter.
    pub fn route(&mut self, presenter: &mut CustomEditorPresenter) {
        while let Some(message) = self.ui.poll_message() {
            presenter.handle_ui_message(&mut self.ui, &message);
        }
    }

    pub fn clipboard_text(&self) -> String {
        self.clipboard.contents.lock().clone()
    }

    pub fn set_clipboard_text(&self, text: &str) {
        *self.clipboard.contents.lock() = text.to_owned();
    }
}

/// Undo log that remembers what it was asked to do. Objects are snapshotted as structs, since
/// the objects themselves keep changing.
#[derive(Default)]
pub struct RecordingUndo {
    pub log: Vec<String>,
    pub before: Vec<Value>,
    pub after: Vec<Value>,
}

fn snapshot(values: &[Value]) -> Vec<Value> {
    values
        .iter()
        .map(|value| match value {
            Value::Object(object) => {
                let object = object.borrow();
                Value::Struct(StructValue {
                    type_name: object.type_name().clone(),
                    fields: object.fields().to_vec(),
                })
            }
            other => other.clone(),
        })
        .collect()
}

impl UndoLog for RecordingUndo {
    fn begin_record(&mut self, targets: &[Value], label: &str) {
        self.log.push(format!("begin {label}"));
        self.before = snapshot(targets);
    }

    fn end_record(&mut self, targets: &[Value]) {
        self.log.push("end".to_owned());
        self.after = snapshot(targets);
    }
}
