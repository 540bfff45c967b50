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

//! Keyframe track is a list of values placed on a timeline. Unlike curves, keyframe values can
//! be of any reflected type, so sampling is a step function: the value of the last key at or
//! before the sampled time.

use crate::reflect::{TypeName, Value};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub id: Uuid,
    pub time: f32,
    pub value: Value,
}

impl Keyframe {
    #[inline]
    pub fn new(time: f32, value: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            time,
            value,
        }
    }
}

fn sort_keys(keys: &mut [Keyframe]) {
    keys.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    value_type: TypeName,
    keys: Vec<Keyframe>,
}

impl KeyframeTrack {
    pub fn new(value_type: impl Into<TypeName>) -> Self {
        Self {
            value_type: value_type.into(),
            keys: Default::default(),
        }
    }

    pub fn from_keys(value_type: impl Into<TypeName>, mut keys: Vec<Keyframe>) -> Self {
        sort_keys(&mut keys);
        Self {
            value_type: value_type.into(),
            keys,
        }
    }

    #[inline]
    pub fn value_type(&self) -> &TypeName {
        &self.value_type
    }

    #[inline]
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.keys.clear()
    }

    /// Inserts the key after every key with the same time. Returns index of the key.
    pub fn add_key(&mut self, key: Keyframe) -> usize {
        let pos = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(pos, key);
        pos
    }

    pub fn remove_key(&mut self, id: Uuid) -> Option<Keyframe> {
        let index = self.keys.iter().position(|k| k.id == id)?;
        Some(self.keys.remove(index))
    }

    pub fn key(&self, id: Uuid) -> Option<&Keyframe> {
        self.keys.iter().find(|k| k.id == id)
    }

    pub fn key_mut(&mut self, id: Uuid) -> Option<&mut Keyframe> {
        self.keys.iter_mut().find(|k| k.id == id)
    }

    /// Moves the key to a new time keeping the list sorted.
    pub fn move_key(&mut self, id: Uuid, time: f32) -> bool {
        match self.key_mut(id) {
            Some(key) => {
                key.time = time;
                sort_keys(&mut self.keys);
                true
            }
            None => false,
        }
    }

    pub fn set_key_value(&mut self, id: Uuid, value: Value) -> bool {
        match self.key_mut(id) {
            Some(key) => {
                key.value = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn max_time(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or_default()
    }

    /// Value of the last key at or before the time. Times before the first key yield the value
    /// of the first key.
    pub fn sample(&self, time: f32) -> Option<&Value> {
        let first = self.keys.first()?;
        let pos = self.keys.partition_point(|k| k.time <= time);
        if pos == 0 {
            Some(&first.value)
        } else {
            self.keys.get(pos - 1).map(|k| &k.value)
        }
    }
}
