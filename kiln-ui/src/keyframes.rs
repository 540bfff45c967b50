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

//! Keyframes editor is a timeline widget for a [`KeyframeTrack`]. Keys are laid out
//! horizontally on a canvas, they can be selected (click, ctrl-click or box selection), dragged,
//! added, removed and copied. Values of selected keys are edited in a popup that hosts a nested
//! inspector.
//!
//! The editor never modifies anything outside of its own track: every edit produces
//! [`KeyframesEvent::Changed`] with a copy of the new track, it is up to the host to apply it.

use crate::{
    core::{
        err,
        fxhash::FxHashSet,
        keyframes::{Keyframe, KeyframeTrack},
        pool::Handle,
        reflect::json,
        uuid::Uuid,
        warn,
    },
    inspector::{clipboard::ClipboardError, presenter::CustomEditorPresenter, EditorEnvironment},
    message::{KeyboardModifiers, MessageData, MessageDirection, UiMessage},
    UiNode, UserInterface, WidgetKind,
};
use kiln_core::algebra::Vector2;
use std::{collections::VecDeque, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
pub enum KeyframesEvent {
    /// Keys were added, removed, moved or changed their values.
    Changed(KeyframeTrack),
}

#[derive(Clone, Debug)]
struct DragEntry {
    key: Uuid,
    initial_time: f32,
}

#[derive(Clone, Debug)]
enum OperationContext {
    DragKeys {
        initial_mouse_time: f32,
        entries: Vec<DragEntry>,
        moved: bool,
    },
    BoxSelection {
        // In canvas coordinates.
        initial_mouse_pos: f32,
        min: f32,
        max: f32,
        additive: bool,
    },
}

#[derive(Clone, Debug)]
struct PressState {
    position: Vector2<f32>,
    on_key: bool,
    additive: bool,
}

/// Popup with an inspector bound to the values of the selected keys.
struct ValuePopup {
    popup: Handle<UiNode>,
    presenter: CustomEditorPresenter,
    keys: Vec<Uuid>,
}

pub struct KeyframesEditor {
    env: Rc<EditorEnvironment>,
    canvas: Handle<UiNode>,
    track: KeyframeTrack,
    // Pixels per second.
    zoom: f32,
    // Canvas position of zero time.
    view_position: f32,
    min_zoom: f32,
    max_zoom: f32,
    fps: Option<u32>,
    key_size: f32,
    selection: FxHashSet<Uuid>,
    press: Option<PressState>,
    operation_context: Option<OperationContext>,
    value_popup: Option<ValuePopup>,
    events: VecDeque<KeyframesEvent>,
}

/// Rounds the time to the closest frame boundary.
pub fn snap_to_frame(time: f32, fps: u32) -> f32 {
    if fps == 0 {
        return time;
    }
    let fps = fps as f32;
    (time * fps).round() / fps
}

impl KeyframesEditor {
    pub const DEFAULT_ZOOM: f32 = 100.0;
    pub const DEFAULT_KEY_SIZE: f32 = 8.0;

    /// Creates the canvas of the editor as a child of `parent`.
    pub fn new(
        ui: &mut UserInterface,
        env: Rc<EditorEnvironment>,
        track: KeyframeTrack,
        parent: Handle<UiNode>,
    ) -> Self {
        let canvas = ui.add_node(
            WidgetKind::Canvas {
                size: Vector2::new(400.0, 60.0),
            },
            parent,
        );
        Self {
            env,
            canvas,
            track,
            zoom: Self::DEFAULT_ZOOM,
            view_position: 0.0,
            min_zoom: 1.0,
            max_zoom: 10000.0,
            fps: None,
            key_size: Self::DEFAULT_KEY_SIZE,
            selection: Default::default(),
            press: None,
            operation_context: None,
            value_popup: None,
            events: Default::default(),
        }
    }

    #[inline]
    pub fn canvas(&self) -> Handle<UiNode> {
        self.canvas
    }

    #[inline]
    pub fn track(&self) -> &KeyframeTrack {
        &self.track
    }

    /// Replaces the edited track. Selected keys that are gone are deselected, the value popup is
    /// closed if its keys are gone.
    pub fn set_track(&mut self, ui: &mut UserInterface, track: KeyframeTrack) {
        self.track = track;
        self.selection.retain(|id| self.track.key(*id).is_some());
        let stale_popup = self
            .value_popup
            .as_ref()
            .is_some_and(|p| p.keys.iter().any(|id| self.track.key(*id).is_none()));
        if stale_popup {
            self.close_value_popup(ui);
        }
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    #[inline]
    pub fn view_position(&self) -> f32 {
        self.view_position
    }

    pub fn set_view_position(&mut self, position: f32) {
        self.view_position = position;
    }

    #[inline]
    pub fn fps(&self) -> Option<u32> {
        self.fps
    }

    /// Enables snapping of key times to frames. `None` disables snapping.
    pub fn set_fps(&mut self, fps: Option<u32>) {
        self.fps = fps.filter(|fps| *fps > 0);
    }

    pub fn set_key_size(&mut self, size: f32) {
        self.key_size = size.max(1.0);
    }

    #[inline]
    pub fn selection(&self) -> &FxHashSet<Uuid> {
        &self.selection
    }

    pub fn is_selected(&self, key: Uuid) -> bool {
        self.selection.contains(&key)
    }

    /// Transforms a time to a canvas position.
    pub fn time_to_position(&self, time: f32) -> f32 {
        time * self.zoom + self.view_position
    }

    /// Transforms a canvas position to a time.
    pub fn position_to_time(&self, position: f32) -> f32 {
        (position - self.view_position) / self.zoom
    }

    fn snap(&self, time: f32) -> f32 {
        match self.fps {
            Some(fps) => snap_to_frame(time, fps),
            None => time,
        }
    }

    fn canvas_size(&self, ui: &UserInterface) -> Vector2<f32> {
        match ui.try_get(self.canvas).map(|n| n.kind()) {
            Some(WidgetKind::Canvas { size }) => *size,
            _ => Vector2::default(),
        }
    }

    /// Makes the whole track visible.
    pub fn zoom_to_fit(&mut self, ui: &UserInterface) {
        let width = self.canvas_size(ui).x;
        let (min, max) = match (self.track.keys().first(), self.track.keys().last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => (0.0, 1.0),
        };
        let span = (max - min).max(0.1);
        // Keys at both ends stay fully visible.
        let margin = self.key_size;
        self.set_zoom((width - 2.0 * margin).max(1.0) / span);
        self.view_position = margin - min * self.zoom;
    }

    /// Key under the canvas position, the closest one if several keys overlap.
    pub fn pick(&self, position: Vector2<f32>) -> Option<Uuid> {
        let half_size = self.key_size * 0.5;
        self.track
            .keys()
            .iter()
            .map(|k| (k.id, (self.time_to_position(k.time) - position.x).abs()))
            .filter(|(_, distance)| *distance <= half_size)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn set_selection(&mut self, selection: FxHashSet<Uuid>) {
        self.selection = selection
            .into_iter()
            .filter(|id| self.track.key(*id).is_some())
            .collect();
    }

    pub fn select_all(&mut self) {
        self.selection = self.track.keys().iter().map(|k| k.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn send_track(&mut self) {
        self.events
            .push_back(KeyframesEvent::Changed(self.track.clone()));
    }

    pub fn poll_event(&mut self) -> Option<KeyframesEvent> {
        self.events.pop_front()
    }

    /// Adds a key at the canvas position. The key gets the value the track has at that time, or
    /// the default value of the track type if the track is empty.
    pub fn add_key_at(&mut self, position: f32) -> Uuid {
        let time = self.snap(self.position_to_time(position));
        self.add_key(time)
    }

    pub fn add_key(&mut self, time: f32) -> Uuid {
        let value = self
            .track
            .sample(time)
            .cloned()
            .unwrap_or_else(|| self.env.types.default_value(self.track.value_type()));
        let key = Keyframe::new(time, value);
        let id = key.id;
        self.track.add_key(key);
        self.selection.clear();
        self.selection.insert(id);
        self.send_track();
        id
    }

    pub fn remove_selection(&mut self, ui: &mut UserInterface) {
        if self.selection.is_empty() {
            return;
        }
        for id in self.selection.drain() {
            self.track.remove_key(id);
        }
        let popup_keys_gone = self
            .value_popup
            .as_ref()
            .is_some_and(|p| p.keys.iter().any(|id| self.track.key(*id).is_none()));
        if popup_keys_gone {
            self.close_value_popup(ui);
        }
        self.send_track();
    }

    /// Selected keys in time order.
    fn selected_keys(&self) -> Vec<&Keyframe> {
        self.track
            .keys()
            .iter()
            .filter(|k| self.selection.contains(&k.id))
            .collect()
    }

    /// Selected keys as JSON. Times are stored relative to the earliest selected key.
    pub fn copy_text(&self) -> Result<String, ClipboardError> {
        let keys = self.selected_keys();
        let Some(origin) = keys.first().map(|k| k.time) else {
            return Err(ClipboardError::NoTarget);
        };
        let items = keys
            .iter()
            .map(|k| {
                serde_json::json!({
                    "time": k.time - origin,
                    "value": json::to_json(&k.value, &self.env.types),
                })
            })
            .collect::<Vec<_>>();
        Ok(serde_json::to_string(&items)?)
    }

    pub fn copy(&self, ui: &UserInterface) -> Result<(), ClipboardError> {
        let result = self.copy_text().and_then(|text| {
            ui.clipboard_mut()
                .ok_or(ClipboardError::Unavailable)?
                .set_contents(text)
                .map_err(|e| ClipboardError::Provider(e.to_string()))
        });
        if let Err(e) = result.as_ref() {
            err!("Cannot copy keyframes. {e}");
        }
        result
    }

    /// Inserts keys copied by [`Self::copy_text`] so that the earliest one lands at the time.
    /// Pasted keys become the selection.
    pub fn paste_text(&mut self, text: &str, time: f32) -> Result<(), ClipboardError> {
        let json = serde_json::from_str::<serde_json::Value>(text.trim())?;
        let Some(items) = json.as_array() else {
            return Err(ClipboardError::Malformed(text.to_owned()));
        };
        // Everything is parsed first, so a malformed item does not leave a half-pasted track.
        let mut keys = Vec::with_capacity(items.len());
        for item in items {
            let offset = item
                .get("time")
                .and_then(|t| t.as_f64())
                .ok_or_else(|| ClipboardError::Malformed(item.to_string()))?;
            let value = item
                .get("value")
                .ok_or_else(|| ClipboardError::Malformed(item.to_string()))?;
            let value = json::from_json(
                value,
                self.track.value_type(),
                &self.env.types,
                self.env.objects.as_ref(),
            )?;
            keys.push(Keyframe::new(self.snap(time + offset as f32), value));
        }
        if keys.is_empty() {
            return Ok(());
        }
        self.selection.clear();
        for key in keys {
            self.selection.insert(key.id);
            self.track.add_key(key);
        }
        self.send_track();
        Ok(())
    }

    pub fn paste(&mut self, ui: &UserInterface, time: f32) -> Result<(), ClipboardError> {
        let result = ui
            .clipboard_mut()
            .ok_or(ClipboardError::Unavailable)
            .and_then(|mut c| {
                c.get_contents()
                    .map_err(|e| ClipboardError::Provider(e.to_string()))
            })
            .and_then(|text| self.paste_text(&text, time));
        if let Err(e) = result.as_ref() {
            err!("Cannot paste keyframes. {e}");
        }
        result
    }

    /// Opens a popup with an inspector for the values of the selected keys. Does nothing if
    /// nothing is selected.
    pub fn open_value_popup(&mut self, ui: &mut UserInterface) {
        self.close_value_popup(ui);
        let keys = self
            .selected_keys()
            .iter()
            .map(|k| (k.id, k.value.clone()))
            .collect::<Vec<_>>();
        if keys.is_empty() {
            return;
        }
        let popup = ui.add_node(WidgetKind::Popup { open: true }, Handle::NONE);
        let mut presenter = CustomEditorPresenter::new(ui, self.env.clone());
        ui.link(presenter.root_widget(), popup);
        let (keys, values): (Vec<_>, Vec<_>) = keys.into_iter().unzip();
        presenter.select_with_type(values, self.track.value_type().clone());
        self.value_popup = Some(ValuePopup {
            popup,
            presenter,
            keys,
        });
    }

    pub fn close_value_popup(&mut self, ui: &mut UserInterface) {
        if let Some(mut popup) = self.value_popup.take() {
            popup.presenter.cleanup(ui);
            ui.remove_node(popup.popup);
        }
    }

    pub fn is_value_popup_open(&self) -> bool {
        self.value_popup.is_some()
    }

    pub fn value_presenter(&self) -> Option<&CustomEditorPresenter> {
        self.value_popup.as_ref().map(|p| &p.presenter)
    }

    pub fn value_presenter_mut(&mut self) -> Option<&mut CustomEditorPresenter> {
        self.value_popup.as_mut().map(|p| &mut p.presenter)
    }

    /// Per-frame update of the value popup. Values modified in the popup are written into the
    /// keys they were taken from.
    pub fn update(&mut self, ui: &mut UserInterface) {
        let Some(popup) = self.value_popup.as_mut() else {
            return;
        };
        popup.presenter.update(ui);
        let values = popup.presenter.selection().values();
        if values.len() != popup.keys.len() {
            warn!("Value popup lost its keys, closing it.");
            self.close_value_popup(ui);
            return;
        }
        let mut changed = false;
        for (id, value) in popup.keys.iter().zip(values) {
            if self.track.key(*id).is_some_and(|k| k.value != *value) {
                changed |= self.track.set_key_value(*id, value.clone());
            }
        }
        if changed {
            self.send_track();
        }
    }

    pub fn handle_ui_message(&mut self, ui: &mut UserInterface, message: &UiMessage) {
        if let Some(popup) = self.value_popup.as_mut() {
            popup.presenter.handle_ui_message(ui, message);
        }

        if message.destination() != self.canvas
            || message.direction() != MessageDirection::FromWidget
        {
            return;
        }

        match message.data() {
            MessageData::MouseDown {
                position,
                modifiers,
            } => self.on_mouse_down(*position, *modifiers),
            MessageData::MouseMove(position) => self.on_mouse_move(*position),
            MessageData::MouseUp(_) => self.on_mouse_up(),
            _ => (),
        }
    }

    fn on_mouse_down(&mut self, position: Vector2<f32>, modifiers: KeyboardModifiers) {
        let picked = self.pick(position);
        if let Some(picked) = picked {
            if modifiers.control {
                if !self.selection.remove(&picked) {
                    self.selection.insert(picked);
                }
            } else if !self.selection.contains(&picked) {
                self.selection.clear();
                self.selection.insert(picked);
            }
        } else if !modifiers.control {
            self.selection.clear();
        }
        self.press = Some(PressState {
            position,
            on_key: picked.is_some_and(|id| self.selection.contains(&id)),
            additive: modifiers.control,
        });
    }

    fn on_mouse_move(&mut self, position: Vector2<f32>) {
        let mouse_time = self.position_to_time(position.x);

        if self.operation_context.is_none() {
            let Some(press) = self.press.as_ref() else {
                return;
            };
            self.operation_context = Some(if press.on_key {
                OperationContext::DragKeys {
                    initial_mouse_time: self.position_to_time(press.position.x),
                    entries: self
                        .selected_keys()
                        .iter()
                        .map(|k| DragEntry {
                            key: k.id,
                            initial_time: k.time,
                        })
                        .collect(),
                    moved: false,
                }
            } else {
                OperationContext::BoxSelection {
                    initial_mouse_pos: press.position.x,
                    min: press.position.x,
                    max: press.position.x,
                    additive: press.additive,
                }
            });
        }

        let fps = self.fps;
        match self.operation_context.as_mut() {
            Some(OperationContext::DragKeys {
                initial_mouse_time,
                entries,
                moved,
            }) => {
                let delta = mouse_time - *initial_mouse_time;
                for entry in entries.iter() {
                    let time = entry.initial_time + delta;
                    let time = fps.map_or(time, |fps| snap_to_frame(time, fps));
                    *moved |= self.track.move_key(entry.key, time);
                }
            }
            Some(OperationContext::BoxSelection {
                initial_mouse_pos,
                min,
                max,
                ..
            }) => {
                *min = position.x.min(*initial_mouse_pos);
                *max = position.x.max(*initial_mouse_pos);
            }
            None => (),
        }
    }

    fn on_mouse_up(&mut self) {
        self.press = None;
        match self.operation_context.take() {
            Some(OperationContext::DragKeys { moved: true, .. }) => self.send_track(),
            Some(OperationContext::BoxSelection {
                min, max, additive, ..
            }) => {
                if !additive {
                    self.selection.clear();
                }
                let (min, max) = (self.position_to_time(min), self.position_to_time(max));
                for key in self.track.keys() {
                    if key.time >= min && key.time <= max {
                        self.selection.insert(key.id);
                    }
                }
            }
            _ => (),
        }
    }
}
