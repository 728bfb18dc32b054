//! Callback representations and the trampolines that run them.
//!
//! Two kinds of callback reach the hardware:
//!
//! - [`Callback`]: an owned closure. It lives in a
//!   [`HandlerSlotTable`](crate::slot::HandlerSlotTable) and is run by
//!   [`invoke_callback`].
//! - [`RawCallback`]: a plain function, optionally with a caller-owned
//!   context. Nothing is allocated; [`invoke_raw`] runs it.

use alloc::boxed::Box;
use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::InterruptError;

/// Owned zero-argument interrupt callback.
pub type Callback = Box<dyn FnMut() + Send + 'static>;

/// Function called with the context of a [`RawCallback`].
pub type RawHandler = unsafe fn(*mut ());

#[derive(Debug, Copy, Clone)]
enum RawKind {
    Plain(fn()),
    WithContext(RawHandler, *mut ()),
}

/// Non-owning callback: a function, plus a context the caller keeps alive.
///
/// Attached by `&'static` reference. The reference itself is what the
/// hardware gets as context, so attaching one never allocates.
#[derive(Debug)]
pub struct RawCallback {
    kind: RawKind,
}

// SAFETY: the context pointer is only ever passed back to the handler the
// caller paired it with in `RawCallback::new`.
unsafe impl Send for RawCallback {}
unsafe impl Sync for RawCallback {}

impl RawCallback {
    /// Callback that runs `func` with no context.
    pub const fn from_fn(func: fn()) -> Self {
        Self {
            kind: RawKind::Plain(func),
        }
    }

    /// Callback that runs `func(context)`.
    ///
    /// # Safety
    ///
    /// `context` must be valid for `func`, from interrupt context, for as
    /// long as the callback stays attached.
    pub const unsafe fn new(func: RawHandler, context: *mut ()) -> Self {
        Self {
            kind: RawKind::WithContext(func, context),
        }
    }

    /// Run the callback directly.
    ///
    /// # Safety
    ///
    /// Same contract as the context supplied to [`RawCallback::new`].
    pub unsafe fn call(&self) {
        match self.kind {
            RawKind::Plain(func) => func(),
            RawKind::WithContext(func, context) => unsafe { func(context) },
        }
    }
}

/// Box `value`, reporting exhaustion instead of aborting.
fn try_box<T>(value: T) -> Result<Box<T>, InterruptError> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }

    // SAFETY: the layout has a non-zero size
    let ptr = unsafe { alloc::alloc::alloc(layout) }.cast::<T>();
    let ptr = NonNull::new(ptr).ok_or(InterruptError::AllocationFailed)?;

    // SAFETY: freshly allocated with `T`'s layout by the global allocator,
    // which is exactly what `Box::from_raw` expects.
    unsafe {
        ptr.as_ptr().write(value);
        Ok(Box::from_raw(ptr.as_ptr()))
    }
}

/// Move `f` to the heap as a [`Callback`], boxed once more so the hardware
/// can be handed a thin pointer.
pub(crate) fn allocate<F>(f: F) -> Result<Box<Callback>, InterruptError>
where
    F: FnMut() + Send + 'static,
{
    let callback: Callback = try_box(f)?;
    try_box(callback)
}

/// Trampoline for owned callbacks.
///
/// # Safety
///
/// `context` must come from a slot that is still occupied, and the hardware
/// must not run this trampoline for the same slot concurrently.
pub(crate) unsafe fn invoke_callback(context: *mut ()) {
    let callback = unsafe { &mut *context.cast::<Callback>() };
    callback();
}

/// Trampoline for raw callbacks. `context` is the `&'static RawCallback`.
///
/// # Safety
///
/// `context` must point to a [`RawCallback`].
pub(crate) unsafe fn invoke_raw(context: *mut ()) {
    let raw = unsafe { &*context.cast_const().cast::<RawCallback>() };
    unsafe { raw.call() };
}
