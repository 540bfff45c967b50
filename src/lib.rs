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

//! Kiln is the property-editing layer of a game engine editor: a reflection-driven inspector
//! that builds editors for whatever is selected, plus timeline widgets for keyframe tracks and
//! color gradients.
//!
//! A typical host creates a [`gui::inspector::EditorEnvironment`] with its type database and
//! object model, spawns a [`gui::inspector::presenter::CustomEditorPresenter`], links the
//! presenter's root widget into its layout and then, every frame, routes widget messages to the
//! presenter and calls `update`.

pub use kiln_core as core;
pub use kiln_ui as gui;

pub use kiln_ui::{
    gradient::{GradientEditor, GradientEvent},
    inspector::{presenter::CustomEditorPresenter, EditorEnvironment, InspectorError},
    keyframes::{KeyframesEditor, KeyframesEvent},
    settings::InspectorSettings,
};
