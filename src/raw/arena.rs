use crate::error::{Error, Result};

use super::handle::Handle;

/// Slot arena that owns every node in the tree.
///
/// Freed slots are recycled through the free list before new slots are grown,
/// so merged-away nodes are reusable immediately. The arena never holds more
/// than `Handle::MAX` slots; that ceiling is the crate's model of memory
/// exhaustion.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live (allocated, not freed) elements.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails unless `extra` further `alloc` calls are guaranteed to succeed.
    ///
    /// Checks the `Handle::MAX` slot ceiling and grows the slot vector's
    /// capacity fallibly, without allocating any slot yet.
    pub(crate) fn try_reserve(&mut self, extra: usize) -> Result<()> {
        let new_slots = extra.saturating_sub(self.free.len());
        if self.slots.len() + new_slots > Handle::MAX {
            return Err(Error::OutOfMemory);
        }
        self.slots.try_reserve(new_slots).map_err(|_| Error::OutOfMemory)
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            // Reuse a free slot/handle.
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
