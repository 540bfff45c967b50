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

//! Gradient editor shows a [`ColorGradient`] as a strip with draggable color stops. A stop is
//! selected by clicking it, its color is edited in a color field below the strip. Ctrl-click on
//! free space adds a stop with the color the gradient has at that location.

use crate::{
    core::{
        color::Color,
        color_gradient::{ColorGradient, GradientPoint},
        err,
        pool::Handle,
        warn,
    },
    inspector::clipboard::ClipboardError,
    message::{KeyboardModifiers, MessageData, MessageDirection, UiMessage},
    UiNode, UserInterface, WidgetKind,
};
use kiln_core::algebra::Vector2;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum GradientEvent {
    Changed(ColorGradient),
}

pub struct GradientEditor {
    panel: Handle<UiNode>,
    canvas: Handle<UiNode>,
    color_field: Handle<UiNode>,
    remove_button: Handle<UiNode>,
    gradient: ColorGradient,
    selected: Option<usize>,
    dragging: bool,
    moved: bool,
    // Pick tolerance in pixels.
    stop_size: f32,
    events: VecDeque<GradientEvent>,
}

impl GradientEditor {
    pub fn new(ui: &mut UserInterface, gradient: ColorGradient, parent: Handle<UiNode>) -> Self {
        let panel = ui.add_node(WidgetKind::Panel, parent);
        let canvas = ui.add_node(
            WidgetKind::Canvas {
                size: Vector2::new(200.0, 20.0),
            },
            panel,
        );
        let color_field = ui.add_node(
            WidgetKind::ColorField {
                color: Color::WHITE,
            },
            panel,
        );
        let remove_button = ui.add_node(
            WidgetKind::Button {
                text: "Remove".to_owned(),
            },
            panel,
        );
        let editor = Self {
            panel,
            canvas,
            color_field,
            remove_button,
            gradient,
            selected: None,
            dragging: false,
            moved: false,
            stop_size: 6.0,
            events: Default::default(),
        };
        editor.sync_widgets(ui);
        editor
    }

    #[inline]
    pub fn root_widget(&self) -> Handle<UiNode> {
        self.panel
    }

    #[inline]
    pub fn canvas(&self) -> Handle<UiNode> {
        self.canvas
    }

    #[inline]
    pub fn color_field(&self) -> Handle<UiNode> {
        self.color_field
    }

    #[inline]
    pub fn remove_button(&self) -> Handle<UiNode> {
        self.remove_button
    }

    #[inline]
    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    #[inline]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_gradient(&mut self, ui: &mut UserInterface, gradient: ColorGradient) {
        self.gradient = gradient;
        self.selected = self.selected.filter(|i| *i < self.gradient.len());
        self.sync_widgets(ui);
    }

    pub fn select(&mut self, ui: &mut UserInterface, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.gradient.len());
        self.sync_widgets(ui);
    }

    pub fn poll_event(&mut self) -> Option<GradientEvent> {
        self.events.pop_front()
    }

    fn send_gradient(&mut self) {
        self.events
            .push_back(GradientEvent::Changed(self.gradient.clone()));
    }

    fn sync_widgets(&self, ui: &mut UserInterface) {
        let selected_color = self
            .selected
            .and_then(|i| self.gradient.points().get(i))
            .map(|p| p.color());
        if let Some(color) = selected_color {
            ui.send_message(UiMessage::to_widget(
                self.color_field,
                MessageData::Color(color),
            ));
        }
        ui.send_message(UiMessage::to_widget(
            self.color_field,
            MessageData::Enabled(selected_color.is_some()),
        ));
        ui.send_message(UiMessage::to_widget(
            self.remove_button,
            MessageData::Enabled(selected_color.is_some() && self.gradient.len() > 1),
        ));
    }

    fn width(&self, ui: &UserInterface) -> f32 {
        match ui.try_get(self.canvas).map(|n| n.kind()) {
            Some(WidgetKind::Canvas { size }) => size.x.max(1.0),
            _ => 1.0,
        }
    }

    /// Gradient location of a canvas position, clamped to `[0; 1]`.
    pub fn position_to_location(&self, ui: &UserInterface, position: f32) -> f32 {
        (position / self.width(ui)).clamp(0.0, 1.0)
    }

    /// Index of the stop under the canvas position.
    pub fn pick(&self, ui: &UserInterface, position: f32) -> Option<usize> {
        let width = self.width(ui);
        let half_size = self.stop_size * 0.5;
        self.gradient
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| (i, (p.location() * width - position).abs()))
            .filter(|(_, distance)| *distance <= half_size)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Adds a stop with the color the gradient currently has at the location. The new stop
    /// becomes selected.
    pub fn add_stop(&mut self, ui: &mut UserInterface, location: f32) -> usize {
        let location = location.clamp(0.0, 1.0);
        let color = self.gradient.get_color(location);
        let index = self.gradient.add_point(GradientPoint::new(location, color));
        self.selected = Some(index);
        self.sync_widgets(ui);
        self.send_gradient();
        index
    }

    /// Removes the selected stop. The last stop is never removed.
    pub fn remove_selected(&mut self, ui: &mut UserInterface) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        if self.gradient.len() <= 1 {
            warn!("Gradient must have at least one color stop.");
            return false;
        }
        self.gradient.remove_point(index);
        self.selected = None;
        self.sync_widgets(ui);
        self.send_gradient();
        true
    }

    pub fn set_selected_color(&mut self, ui: &mut UserInterface, color: Color) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        let unchanged = self
            .gradient
            .points()
            .get(index)
            .is_some_and(|p| p.color() == color);
        if unchanged || !self.gradient.set_point_color(index, color) {
            return false;
        }
        self.sync_widgets(ui);
        self.send_gradient();
        true
    }

    /// Moves the selected stop, the location is clamped to `[0; 1]`.
    pub fn move_selected(&mut self, location: f32) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        match self
            .gradient
            .set_point_location(index, location.clamp(0.0, 1.0))
        {
            Some(new_index) => {
                self.selected = Some(new_index);
                true
            }
            None => false,
        }
    }

    pub fn copy_text(&self) -> Result<String, ClipboardError> {
        Ok(serde_json::to_string(&self.gradient)?)
    }

    pub fn copy(&self, ui: &UserInterface) -> Result<(), ClipboardError> {
        let result = self.copy_text().and_then(|text| {
            ui.clipboard_mut()
                .ok_or(ClipboardError::Unavailable)?
                .set_contents(text)
                .map_err(|e| ClipboardError::Provider(e.to_string()))
        });
        if let Err(e) = result.as_ref() {
            err!("Cannot copy the gradient. {e}");
        }
        result
    }

    /// Replaces the gradient with the one from JSON. Stop locations are clamped and sorted,
    /// empty gradients are rejected.
    pub fn paste_text(&mut self, ui: &mut UserInterface, text: &str) -> Result<(), ClipboardError> {
        let pasted = serde_json::from_str::<ColorGradient>(text.trim())?;
        if pasted.is_empty() {
            return Err(ClipboardError::Malformed(text.to_owned()));
        }
        let points = pasted
            .points()
            .iter()
            .map(|p| GradientPoint::new(p.location().clamp(0.0, 1.0), p.color()))
            .collect::<Vec<_>>();
        self.gradient = ColorGradient::from(points);
        self.selected = None;
        self.sync_widgets(ui);
        self.send_gradient();
        Ok(())
    }

    pub fn paste(&mut self, ui: &mut UserInterface) -> Result<(), ClipboardError> {
        let text = ui
            .clipboard_mut()
            .ok_or(ClipboardError::Unavailable)
            .and_then(|mut c| {
                c.get_contents()
                    .map_err(|e| ClipboardError::Provider(e.to_string()))
            });
        let result = text.and_then(|text| self.paste_text(ui, &text));
        if let Err(e) = result.as_ref() {
            err!("Cannot paste the gradient. {e}");
        }
        result
    }

    pub fn handle_ui_message(&mut self, ui: &mut UserInterface, message: &UiMessage) {
        if message.direction() != MessageDirection::FromWidget {
            return;
        }

        if message.destination() == self.canvas {
            match message.data() {
                MessageData::MouseDown {
                    position,
                    modifiers,
                } => self.on_mouse_down(ui, *position, *modifiers),
                MessageData::MouseMove(position) => {
                    if self.dragging {
                        let location = self.position_to_location(ui, position.x);
                        self.moved |= self.move_selected(location);
                    }
                }
                MessageData::MouseUp(_) => {
                    self.dragging = false;
                    if std::mem::take(&mut self.moved) {
                        self.send_gradient();
                    }
                }
                _ => (),
            }
        } else if message.destination() == self.color_field {
            if let MessageData::Color(color) = message.data() {
                self.set_selected_color(ui, *color);
            }
        } else if message.destination() == self.remove_button
            && *message.data() == MessageData::Click
        {
            self.remove_selected(ui);
        }
    }

    fn on_mouse_down(
        &mut self,
        ui: &mut UserInterface,
        position: Vector2<f32>,
        modifiers: KeyboardModifiers,
    ) {
        match self.pick(ui, position.x) {
            Some(index) => {
                self.select(ui, Some(index));
                self.dragging = true;
                self.moved = false;
            }
            None if modifiers.control => {
                let location = self.position_to_location(ui, position.x);
                self.add_stop(ui, location);
            }
            None => self.select(ui, None),
        }
    }
}
