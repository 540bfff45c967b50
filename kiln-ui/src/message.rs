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

//! Message passing between widgets and their owners. Widgets never call back into editors:
//! user input produces [`MessageDirection::FromWidget`] messages that are polled by the host and
//! routed to the owner, while owners change widget state with [`MessageDirection::ToWidget`]
//! messages.

use crate::{core::color::Color, inspector::clipboard::ContextAction, UiNode};
use kiln_core::{algebra::Vector2, pool::Handle};
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageDirection {
    /// Used to indicate a request for action with a particular widget.
    ToWidget,
    /// Used to indicate response from widget.
    FromWidget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageData {
    Click,
    Checked(Option<bool>),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Selected item index of a combo box.
    Selection(Option<usize>),
    Color(Color),
    /// Object picked in an object field, `None` clears the reference.
    ObjectPicked(Option<Uuid>),
    Expand(bool),
    Enabled(bool),
    Visible(bool),
    /// An item of a label's context menu was clicked.
    ContextAction(ContextAction),
    /// Pointer interaction in widget local coordinates.
    MouseDown {
        position: Vector2<f32>,
        modifiers: KeyboardModifiers,
    },
    MouseMove(Vector2<f32>),
    MouseUp(Vector2<f32>),
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct KeyboardModifiers {
    pub control: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiMessage {
    pub destination: Handle<UiNode>,
    pub direction: MessageDirection,
    pub data: MessageData,
}

impl UiMessage {
    pub fn to_widget(destination: Handle<UiNode>, data: MessageData) -> Self {
        Self {
            destination,
            direction: MessageDirection::ToWidget,
            data,
        }
    }

    pub fn from_widget(destination: Handle<UiNode>, data: MessageData) -> Self {
        Self {
            destination,
            direction: MessageDirection::FromWidget,
            data,
        }
    }

    #[inline]
    pub fn destination(&self) -> Handle<UiNode> {
        self.destination
    }

    #[inline]
    pub fn direction(&self) -> MessageDirection {
        self.direction
    }

    #[inline]
    pub fn data(&self) -> &MessageData {
        &self.data
    }
}
