//! Handler Slot Table
//!
//! Fixed-size arena of owning callback slots, one per source. Each slot is
//! a single [`AtomicPtr`]: null when empty, otherwise a pointer obtained
//! from `Box::into_raw` that the table alone is responsible for freeing.
//!
//! Installing is a two step affair so callers can keep the hardware out of
//! the way:
//!
//! 1. [`PreparedHandler::new`] allocates. This is the only step that can
//!    fail, and it touches no shared state.
//! 2. [`HandlerSlotTable::install`] swaps the new pointer in and drops the
//!    previous callback.
//!
//! The table does not mask anything itself. Its owner must make sure the
//! hardware cannot fire a slot's trampoline while that slot is installed
//! into or freed.

use alloc::boxed::Box;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use drivers::hal::interrupt::InterruptVector;

use crate::callback::{self, Callback};
use crate::error::InterruptError;

/// A callback that has been allocated but not yet published.
///
/// Dropping it releases the allocation; no trampoline has ever seen it.
pub struct PreparedHandler(Box<Callback>);

impl PreparedHandler {
    pub fn new<F>(f: F) -> Result<Self, InterruptError>
    where
        F: FnMut() + Send + 'static,
    {
        callback::allocate(f).map(Self)
    }
}

pub struct HandlerSlotTable<const N: usize> {
    slots: [AtomicPtr<Callback>; N],
}

impl<const N: usize> HandlerSlotTable<N> {
    /// Table with every slot empty.
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; N],
        }
    }

    /// Publish `handler` in slot `index`, releasing whatever was there.
    ///
    /// Returns the vector to arm the hardware with. It stays valid until the
    /// slot is next installed into or freed.
    ///
    /// # Panics
    ///
    /// If `index >= N`.
    pub fn install(&self, index: usize, handler: PreparedHandler) -> InterruptVector {
        let new = Box::into_raw(handler.0);
        let old = self.slots[index].swap(new, Ordering::AcqRel);
        release(old);
        InterruptVector::new(callback::invoke_callback, new.cast())
    }

    /// Empty slot `index`. Returns whether a callback was released.
    pub fn free(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(slot) => release(slot.swap(ptr::null_mut(), Ordering::AcqRel)),
            None => false,
        }
    }

    /// Empty slot `index` without dropping its callback.
    ///
    /// For teardown when the hardware could not be disarmed and may still
    /// hold the pointer.
    pub fn leak(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(slot) => !slot.swap(ptr::null_mut(), Ordering::AcqRel).is_null(),
            None => false,
        }
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| !slot.load(Ordering::Acquire).is_null())
    }
}

impl<const N: usize> Default for HandlerSlotTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for HandlerSlotTable<N> {
    fn drop(&mut self) {
        for index in 0..N {
            self.free(index);
        }
    }
}

fn release(ptr: *mut Callback) -> bool {
    if ptr.is_null() {
        return false;
    }
    // SAFETY: non-null slot values only ever come from `Box::into_raw` in
    // `install`, and the swap that produced `ptr` removed it from the table.
    drop(unsafe { Box::from_raw(ptr) });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::AtomicUsize;

    struct DropCounter(Arc<AtomicUsize>);

    impl DropCounter {
        fn touch(&self) {}
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted(drops: &Arc<AtomicUsize>) -> PreparedHandler {
        let counter = DropCounter(drops.clone());
        PreparedHandler::new(move || counter.touch()).unwrap()
    }

    #[test]
    fn test_install_replaces_and_releases_once() {
        let table: HandlerSlotTable<4> = HandlerSlotTable::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        table.install(2, counted(&first));
        assert!(table.is_occupied(2));
        assert_eq!(first.load(Ordering::SeqCst), 0);

        table.install(2, counted(&second));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert!(!table.is_occupied(1) && !table.is_occupied(3));

        assert!(table.free(2));
        assert!(!table.free(2));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_vector_runs_installed_callback() {
        let table: HandlerSlotTable<2> = HandlerSlotTable::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let handler = PreparedHandler::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let vector = table.install(1, handler);
        unsafe {
            vector.fire();
            vector.fire();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let table: HandlerSlotTable<2> = HandlerSlotTable::new();
        assert!(!table.is_occupied(5));
        assert!(!table.free(5));
        assert!(!table.leak(5));
    }

    #[test]
    fn test_drop_releases_everything() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let table: HandlerSlotTable<3> = HandlerSlotTable::new();
            table.install(0, counted(&drops));
            table.install(2, counted(&drops));
        }
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_leak_skips_drop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let table: HandlerSlotTable<1> = HandlerSlotTable::new();
        table.install(0, counted(&drops));

        assert!(table.leak(0));
        assert!(!table.is_occupied(0));
        drop(table);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
    }
}
