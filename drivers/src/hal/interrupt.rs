//! Interrupt Controller Hardware Abstraction Layer.
//!
//! This module defines the capabilities the interrupt registry consumes from
//! a platform: arming pin-change interrupts and installing handlers on
//! fixed system interrupt lines. Both deliver through an [`InterruptVector`],
//! a bare function pointer plus an opaque context, so the platform never
//! needs to know what the context points at.

use super::gpio::{InterruptMode, Pin};

/// Interrupt number type.
pub type IrqNumber = u32;

/// System interrupt line.
///
/// Numbered in the platform's IRQ space, which is unrelated to pin numbers.
pub type SystemIrq = IrqNumber;

/// Low-level entry point invoked by the platform when a source fires.
///
/// # Safety
///
/// Must only be called with the context it was registered alongside, while
/// that registration is still in place.
pub type Trampoline = unsafe fn(*mut ());

/// A trampoline together with the context it is invoked with.
#[derive(Debug, Copy, Clone)]
pub struct InterruptVector {
    pub trampoline: Trampoline,
    pub context: *mut (),
}

// SAFETY: the context is only dereferenced by the trampoline, and the
// registering side guarantees it stays valid until the vector is removed.
unsafe impl Send for InterruptVector {}

impl InterruptVector {
    pub const fn new(trampoline: Trampoline, context: *mut ()) -> Self {
        Self {
            trampoline,
            context,
        }
    }

    /// Invoke the trampoline with its context.
    ///
    /// # Safety
    ///
    /// The registration this vector came from must still be live.
    #[inline]
    pub unsafe fn fire(&self) {
        unsafe { (self.trampoline)(self.context) }
    }
}

/// Pin-change interrupt controller.
///
/// A pin is either detached or armed with exactly one vector. Arming an
/// already armed pin replaces its vector.
pub trait PinInterruptController {
    /// Error type for pin interrupt operations.
    type Error: core::fmt::Debug;

    /// Arm `pin` so that `vector` fires whenever `mode` is satisfied.
    fn attach(
        &mut self,
        pin: Pin,
        vector: InterruptVector,
        mode: InterruptMode,
    ) -> Result<(), Self::Error>;

    /// Disarm `pin`.
    ///
    /// Once this returns the previously attached vector is never fired
    /// again, so its context may be released.
    fn detach(&mut self, pin: Pin) -> Result<(), Self::Error>;

    /// Unmask delivery for every user-visible pin.
    fn enable_all(&mut self) -> Result<(), Self::Error>;

    /// Mask delivery for every user-visible pin.
    ///
    /// System interrupt lines are not affected.
    fn disable_all(&mut self) -> Result<(), Self::Error>;
}

/// Controller for fixed system interrupt lines.
pub trait SystemInterruptController {
    /// Error type for system interrupt operations.
    type Error: core::fmt::Debug;

    /// Install `vector` as the handler for `irq`, or remove the handler
    /// when `vector` is `None`.
    ///
    /// As with [`PinInterruptController::detach`], a removed vector is
    /// never fired once this returns.
    fn set_system_handler(
        &mut self,
        irq: SystemIrq,
        vector: Option<InterruptVector>,
    ) -> Result<(), Self::Error>;
}
