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

//! Reflection-driven property inspector. A [`presenter::CustomEditorPresenter`] owns a tree of
//! custom editors bound to the current selection. Every editor wraps a
//! [`values::ValueContainer`] that abstracts one property over all selected objects, declares its
//! UI through a [`layout::LayoutElementsContainer`] and creates child editors for nested
//! properties. Edits coming from widgets are queued on the editor and written into the model on
//! the next refresh pass, which runs top-down once per frame.

use crate::{
    core::{object::ObjectModel, reflect::ReflectError, reflect::TypeDatabase},
    settings::InspectorSettings,
};
use std::{
    cell::RefCell,
    fmt::{Display, Formatter},
    rc::Rc,
};

pub mod clipboard;
pub mod editor;
pub mod editors;
pub mod layout;
pub mod presenter;
pub mod resolver;
pub mod undo;
pub mod values;

use clipboard::ClipboardError;
use resolver::{EditorDescriptor, EditorRegistry, EditorResolver, ResolveContext};
use undo::UndoLog;
use values::ValueContainer;

/// An error that may be produced by an editor.
#[derive(Debug)]
pub enum InspectorError {
    /// The edited data no longer matches the shape the editor was built for (for example, a
    /// polymorphic member was reassigned to an instance of another type). Recovered by
    /// rebuilding the parent editor.
    StructuralMismatch(String),
    Reflect(ReflectError),
    Clipboard(ClipboardError),
    /// An error message produced by some editor with specialized details unique to that editor.
    Custom(String),
}

impl InspectorError {
    pub fn is_structural_mismatch(&self) -> bool {
        match self {
            InspectorError::StructuralMismatch(_) => true,
            InspectorError::Reflect(e) => matches!(
                e,
                ReflectError::MemberNotFound { .. }
                    | ReflectError::NullTarget { .. }
                    | ReflectError::NotAContainer { .. }
                    | ReflectError::IndexOutOfBounds { .. }
                    | ReflectError::KeyNotFound(_)
                    | ReflectError::TypeMismatch { .. }
            ),
            _ => false,
        }
    }
}

impl Display for InspectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectorError::StructuralMismatch(reason) => {
                write!(f, "editor is out of sync with the edited data: {reason}")
            }
            InspectorError::Reflect(e) => Display::fmt(e, f),
            InspectorError::Clipboard(e) => Display::fmt(e, f),
            InspectorError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for InspectorError {}

impl From<ReflectError> for InspectorError {
    fn from(e: ReflectError) -> Self {
        Self::Reflect(e)
    }
}

impl From<ClipboardError> for InspectorError {
    fn from(e: ClipboardError) -> Self {
        Self::Clipboard(e)
    }
}

/// Everything editors need from the host application. Created once by the host and shared by
/// every presenter.
pub struct EditorEnvironment {
    pub types: Rc<TypeDatabase>,
    pub registry: RefCell<EditorRegistry>,
    pub resolver: EditorResolver,
    pub objects: Rc<dyn ObjectModel>,
    pub undo: Option<Rc<RefCell<dyn UndoLog>>>,
    pub settings: RefCell<InspectorSettings>,
}

impl EditorEnvironment {
    /// Creates an environment with builtin editors registered, without undo.
    pub fn new(types: Rc<TypeDatabase>, objects: Rc<dyn ObjectModel>) -> Self {
        Self {
            types,
            registry: RefCell::new(EditorRegistry::with_builtins()),
            resolver: EditorResolver::new(),
            objects,
            undo: None,
            settings: Default::default(),
        }
    }

    pub fn with_undo(mut self, undo: Rc<RefCell<dyn UndoLog>>) -> Self {
        self.undo = Some(undo);
        self
    }

    pub fn with_settings(self, settings: InspectorSettings) -> Self {
        *self.settings.borrow_mut() = settings;
        self
    }

    /// Picks the editor for the values.
    pub fn resolve(
        &self,
        values: &ValueContainer,
        override_editor: Option<&EditorDescriptor>,
        allow_reference_picker: bool,
    ) -> EditorDescriptor {
        let registry = self.registry.borrow();
        self.resolver.resolve(&ResolveContext {
            value_type: values.value_type().clone(),
            values,
            types: &self.types,
            registry: &registry,
            override_editor,
            allow_reference_picker,
        })
    }

    /// Undo log, if undo is enabled both by the settings and by the log itself.
    pub fn active_undo(&self) -> Option<Rc<RefCell<dyn UndoLog>>> {
        self.undo
            .as_ref()
            .filter(|u| self.settings.borrow().undo_enabled && u.borrow().is_enabled())
            .cloned()
    }
}
