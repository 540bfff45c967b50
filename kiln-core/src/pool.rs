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

//! Generational pool. Objects are stored in a contiguous block of records and addressed by
//! [`Handle`]s, which carry an index and a generation. A handle becomes invalid as soon as the
//! object it points to is freed, even if the record gets reused later, so stale handles can be
//! detected instead of silently pointing to someone else's data.

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::{Index, IndexMut},
};

const INVALID_GENERATION: u32 = 0;

/// Handle is some sort of non-owning reference to content in a pool. It stores index of object
/// and additional information that allows to ensure that handle is still valid (points to the
/// same object as when handle was created).
pub struct Handle<T> {
    index: u32,
    generation: u32,
    type_marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const NONE: Handle<T> = Handle {
        index: 0,
        generation: INVALID_GENERATION,
        type_marker: PhantomData,
    };

    #[inline(always)]
    pub fn is_none(self) -> bool {
        self.generation == INVALID_GENERATION
    }

    #[inline(always)]
    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Handle {
            index,
            generation,
            type_marker: PhantomData,
        }
    }
}

impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> PartialOrd for Handle<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Default for Handle<T> {
    #[inline]
    fn default() -> Self {
        Self::NONE
    }
}

impl<T> Display for Handle<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

impl<T> Debug for Handle<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Idx: {}; Gen: {}]", self.index, self.generation)
    }
}

/// Type-erased handle. Used when a structure must refer to an object in a pool of a type it
/// does not know about (for example, a widget that remembers which editor owns it).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ErasedHandle {
    index: u32,
    generation: u32,
}

impl ErasedHandle {
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.generation != INVALID_GENERATION
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}

impl<T> From<Handle<T>> for ErasedHandle {
    #[inline]
    fn from(h: Handle<T>) -> Self {
        Self {
            index: h.index,
            generation: h.generation,
        }
    }
}

impl<T> From<ErasedHandle> for Handle<T> {
    #[inline]
    fn from(h: ErasedHandle) -> Self {
        Handle::new(h.index, h.generation)
    }
}

#[derive(Debug)]
struct PoolRecord<T> {
    generation: u32,
    payload: Option<T>,
}

/// See module docs.
#[derive(Debug)]
pub struct Pool<T> {
    records: Vec<PoolRecord<T>>,
    free_stack: Vec<u32>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    #[inline]
    pub fn new() -> Self {
        Pool {
            records: Vec::new(),
            free_stack: Vec::new(),
        }
    }

    /// Moves the object into the pool and returns a handle to it.
    #[inline]
    pub fn spawn(&mut self, payload: T) -> Handle<T> {
        self.spawn_with(|_| payload)
    }

    /// Same as [`Self::spawn`], but the object is constructed by the callback that receives the
    /// handle the object will have. Useful when an object must know its own handle.
    pub fn spawn_with<F: FnOnce(Handle<T>) -> T>(&mut self, callback: F) -> Handle<T> {
        if let Some(free_index) = self.free_stack.pop() {
            let record = &mut self.records[free_index as usize];
            debug_assert!(record.payload.is_none());
            let handle = Handle::new(free_index, record.generation);
            record.payload = Some(callback(handle));
            handle
        } else {
            let index = self.records.len() as u32;
            let handle = Handle::new(index, 1);
            self.records.push(PoolRecord {
                generation: 1,
                payload: Some(callback(handle)),
            });
            handle
        }
    }

    #[inline]
    fn record(&self, handle: Handle<T>) -> Option<&PoolRecord<T>> {
        self.records
            .get(handle.index as usize)
            .filter(|r| r.generation == handle.generation && r.payload.is_some())
    }

    #[inline]
    pub fn is_valid_handle(&self, handle: Handle<T>) -> bool {
        handle.is_some() && self.record(handle).is_some()
    }

    #[inline]
    pub fn try_borrow(&self, handle: Handle<T>) -> Option<&T> {
        self.record(handle).and_then(|r| r.payload.as_ref())
    }

    #[inline]
    pub fn try_borrow_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.records
            .get_mut(handle.index as usize)
            .filter(|r| r.generation == handle.generation)
            .and_then(|r| r.payload.as_mut())
    }

    /// Borrows shared reference to an object by its handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid.
    #[inline]
    pub fn borrow(&self, handle: Handle<T>) -> &T {
        match self.try_borrow(handle) {
            Some(payload) => payload,
            None => panic!("Attempt to borrow an object using invalid handle {handle}!"),
        }
    }

    /// Borrows mutable reference to an object by its handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid.
    #[inline]
    pub fn borrow_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.try_borrow_mut(handle) {
            Some(payload) => payload,
            None => panic!("Attempt to borrow an object using invalid handle {handle}!"),
        }
    }

    /// Borrows two distinct objects at once. Returns `None` if any of the handles is invalid or
    /// if both handles point to the same object.
    pub fn try_borrow_two_mut(
        &mut self,
        handles: (Handle<T>, Handle<T>),
    ) -> Option<(&mut T, &mut T)> {
        let (a, b) = handles;
        if a.index == b.index || !self.is_valid_handle(a) || !self.is_valid_handle(b) {
            return None;
        }
        let (first, second) = if a.index < b.index {
            let (left, right) = self.records.split_at_mut(b.index as usize);
            (&mut left[a.index as usize], &mut right[0])
        } else {
            let (left, right) = self.records.split_at_mut(a.index as usize);
            (&mut right[0], &mut left[b.index as usize])
        };
        Some((first.payload.as_mut()?, second.payload.as_mut()?))
    }

    /// Destroys the object and returns it. The record is reused by the next spawned object, but
    /// every handle to the freed object becomes invalid.
    pub fn try_free(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.is_valid_handle(handle) {
            return None;
        }
        let record = &mut self.records[handle.index as usize];
        let payload = record.payload.take();
        record.generation = record.generation.wrapping_add(1).max(1);
        self.free_stack.push(handle.index);
        payload
    }

    /// # Panics
    ///
    /// Panics if the handle is invalid.
    pub fn free(&mut self, handle: Handle<T>) -> T {
        match self.try_free(handle) {
            Some(payload) => payload,
            None => panic!("Attempt to free an object using invalid handle {handle}!"),
        }
    }

    #[inline]
    pub fn alive_count(&self) -> u32 {
        self.records.iter().filter(|r| r.payload.is_some()).count() as u32
    }

    #[inline]
    pub fn clear(&mut self) {
        self.records.clear();
        self.free_stack.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter().filter_map(|r| r.payload.as_ref())
    }

    pub fn pair_iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.records.iter().enumerate().filter_map(|(i, r)| {
            r.payload
                .as_ref()
                .map(|p| (Handle::new(i as u32, r.generation), p))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.records.iter_mut().filter_map(|r| r.payload.as_mut())
    }
}

impl<T> Index<Handle<T>> for Pool<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Handle<T>) -> &Self::Output {
        self.borrow(index)
    }
}

impl<T> IndexMut<Handle<T>> for Pool<T> {
    #[inline]
    fn index_mut(&mut self, index: Handle<T>) -> &mut Self::Output {
        self.borrow_mut(index)
    }
}

#[cfg(test)]
mod test {
    use super::{ErasedHandle, Handle, Pool};

    #[test]
    fn pool_sanity_tests() {
        let mut pool: Pool<String> = Pool::new();
        let foobar_handle = pool.spawn(String::from("Foobar"));
        assert_eq!(foobar_handle.index(), 0);
        assert_ne!(foobar_handle.generation(), 0);
        let baz_handle = pool.spawn(String::from("Baz"));
        assert_eq!(pool.borrow(foobar_handle), "Foobar");
        assert_eq!(pool[baz_handle], "Baz");
        assert_eq!(pool.alive_count(), 2);

        pool.free(foobar_handle);
        assert!(!pool.is_valid_handle(foobar_handle));
        assert!(pool.try_borrow(foobar_handle).is_none());

        // Freed record must be reused, but with a new generation.
        let new_handle = pool.spawn(String::from("Qux"));
        assert_eq!(new_handle.index(), foobar_handle.index());
        assert_ne!(new_handle.generation(), foobar_handle.generation());
        assert_eq!(pool.alive_count(), 2);
    }

    #[test]
    fn double_free_is_rejected() {
        let mut pool = Pool::new();
        let handle = pool.spawn(42);
        assert_eq!(pool.try_free(handle), Some(42));
        assert_eq!(pool.try_free(handle), None);
        assert!(!pool.is_valid_handle(Handle::NONE));
    }

    #[test]
    fn borrow_two_mut() {
        let mut pool = Pool::new();
        let a = pool.spawn(1);
        let b = pool.spawn(2);
        {
            let (x, y) = pool.try_borrow_two_mut((b, a)).unwrap();
            *x += 10;
            *y += 20;
        }
        assert_eq!(pool[a], 21);
        assert_eq!(pool[b], 12);
        assert!(pool.try_borrow_two_mut((a, a)).is_none());
    }

    #[test]
    fn erased_handle_round_trip() {
        let mut pool = Pool::new();
        let handle = pool.spawn(());
        let erased = ErasedHandle::from(handle);
        assert!(erased.is_some());
        assert_eq!(Handle::<()>::from(erased), handle);
        assert!(ErasedHandle::none().is_none());
    }
}
