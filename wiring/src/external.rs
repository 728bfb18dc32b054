//! External Interrupt Controller
//!
//! Attach and detach callbacks on interrupt-capable pins, plus the global
//! gate over all of them.
//!
//! # Ordering
//!
//! Replacing a pin's callback always goes:
//!
//! 1. allocate the new callback (may fail; nothing else has happened yet)
//! 2. detach the pin from the hardware
//! 3. swap the new callback into the slot, dropping the old one
//! 4. arm the hardware with the new slot
//!
//! so the trampoline can only ever see a fully built callback.

use drivers::hal::gpio::{InterruptMode, Pin};
use drivers::hal::interrupt::{InterruptVector, PinInterruptController};

use crate::callback::{self, RawCallback};
use crate::config::InterruptConfig;
use crate::error::InterruptError;
use crate::slot::{HandlerSlotTable, PreparedHandler};

/// Pin count of the default table.
pub const MAX_EXTERNAL_INTERRUPTS: usize = 16;

/// Which trampoline a pin is armed with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// Owned closure in the slot table.
    Owned,
    /// Caller-owned [`RawCallback`].
    Raw,
    /// Arming failed and the hardware then refused to disarm, so the pin
    /// may still deliver. The callback is kept until a detach gets through.
    Stale,
}

/// What is currently attached to a pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub mode: InterruptMode,
}

/// Callback registry for pins `0..N`.
///
/// Mutating operations take `&mut self`: mainline code is the only writer,
/// and interrupt context only ever sees the slot pointers the hardware was
/// armed with.
pub struct ExternalInterrupts<H: PinInterruptController, const N: usize = MAX_EXTERNAL_INTERRUPTS>
{
    hal: H,
    config: InterruptConfig,
    slots: HandlerSlotTable<N>,
    bindings: [Option<Binding>; N],
}

impl<H: PinInterruptController, const N: usize> ExternalInterrupts<H, N> {
    /// Registry with nothing attached.
    pub const fn new(hal: H, config: InterruptConfig) -> Self {
        Self {
            hal,
            config,
            slots: HandlerSlotTable::new(),
            bindings: [None; N],
        }
    }

    /// Attach `callback` to `pin`, replacing any existing binding.
    ///
    /// Returns `false` if the pin is reserved or out of range, if the
    /// callback could not be allocated, or if the hardware refused.
    ///
    /// The callback is allocated before the hardware is touched, so when
    /// allocation fails the previous binding stays attached and armed.
    pub fn attach<F>(&mut self, pin: Pin, callback: F, mode: InterruptMode) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.try_attach(pin, callback, mode).is_ok()
    }

    pub fn try_attach<F>(
        &mut self,
        pin: Pin,
        callback: F,
        mode: InterruptMode,
    ) -> Result<(), InterruptError>
    where
        F: FnMut() + Send + 'static,
    {
        let index = self.check_pin(pin)?;
        let handler = PreparedHandler::new(callback).inspect_err(|_| {
            log::warn!("attach pin {}: out of memory, keeping previous binding", pin);
        })?;

        self.disarm(pin, index)?;
        let vector = self.slots.install(index, handler);
        self.arm(pin, index, vector, mode, BindingKind::Owned)
    }

    /// Attach a caller-owned callback to `pin`, replacing any existing
    /// binding. Nothing is allocated.
    pub fn attach_raw(&mut self, pin: Pin, callback: &'static RawCallback, mode: InterruptMode) -> bool {
        self.try_attach_raw(pin, callback, mode).is_ok()
    }

    pub fn try_attach_raw(
        &mut self,
        pin: Pin,
        callback: &'static RawCallback,
        mode: InterruptMode,
    ) -> Result<(), InterruptError> {
        let index = self.check_pin(pin)?;

        self.disarm(pin, index)?;
        // An owned callback left behind would outlive its binding.
        self.slots.free(index);

        let context = callback as *const RawCallback as *mut ();
        let vector = InterruptVector::new(callback::invoke_raw, context);
        self.arm(pin, index, vector, mode, BindingKind::Raw)
    }

    /// Detach whatever is bound to `pin` and release it.
    ///
    /// Reserved pins are left alone. Detaching an unbound pin does nothing.
    pub fn detach(&mut self, pin: Pin) {
        self.try_detach(pin).ok();
    }

    pub fn try_detach(&mut self, pin: Pin) -> Result<(), InterruptError> {
        let index = self.check_pin(pin)?;
        self.disarm(pin, index)?;
        if self.slots.free(index) {
            log::debug!("pin {}: callback released", pin);
        }
        Ok(())
    }

    /// Re-enable delivery on every pin.
    pub fn enable_all(&mut self) {
        match self.hal.enable_all() {
            Ok(()) => log::debug!("pin interrupts enabled"),
            Err(err) => log::warn!("enable all pin interrupts: {:?}", err),
        }
    }

    /// Suppress delivery on every pin. Bindings are kept.
    pub fn disable_all(&mut self) {
        match self.hal.disable_all() {
            Ok(()) => log::debug!("pin interrupts disabled"),
            Err(err) => log::warn!("disable all pin interrupts: {:?}", err),
        }
    }

    /// Whether anything is bound to `pin`, a [`BindingKind::Stale`]
    /// leftover included.
    pub fn is_attached(&self, pin: Pin) -> bool {
        self.binding(pin).is_some()
    }

    pub fn binding(&self, pin: Pin) -> Option<Binding> {
        self.bindings.get(pin as usize).copied().flatten()
    }

    pub fn attached_count(&self) -> usize {
        self.bindings.iter().flatten().count()
    }

    fn check_pin(&self, pin: Pin) -> Result<usize, InterruptError> {
        if self.config.is_reserved(pin) {
            log::warn!("pin {} is reserved", pin);
            return Err(InterruptError::ReservedPin(pin));
        }
        let index = pin as usize;
        if index >= N {
            log::warn!("pin {} is out of range (max {})", pin, N);
            return Err(InterruptError::InvalidPin(pin));
        }
        Ok(index)
    }

    /// Stop the hardware delivering to `pin`. No-op for an unbound pin.
    fn disarm(&mut self, pin: Pin, index: usize) -> Result<(), InterruptError> {
        if self.bindings[index].is_none() {
            return Ok(());
        }
        self.hal.detach(pin).map_err(|err| {
            log::warn!("detach pin {}: {:?}", pin, err);
            InterruptError::Hardware
        })?;
        self.bindings[index] = None;
        Ok(())
    }

    fn arm(
        &mut self,
        pin: Pin,
        index: usize,
        vector: InterruptVector,
        mode: InterruptMode,
        kind: BindingKind,
    ) -> Result<(), InterruptError> {
        if let Err(err) = self.hal.attach(pin, vector, mode) {
            log::warn!("attach pin {}: {:?}", pin, err);
            // A refused attach may still have latched the vector.
            if self.hal.detach(pin).is_ok() {
                self.slots.free(index);
            } else {
                log::warn!("pin {}: left armed after failed attach", pin);
                self.bindings[index] = Some(Binding {
                    kind: BindingKind::Stale,
                    mode,
                });
            }
            return Err(InterruptError::Hardware);
        }

        self.bindings[index] = Some(Binding { kind, mode });
        log::debug!("pin {}: attached {:?} callback ({:?})", pin, kind, mode);
        Ok(())
    }
}

impl<H: PinInterruptController, const N: usize> Drop for ExternalInterrupts<H, N> {
    fn drop(&mut self) {
        for index in 0..N {
            if self.bindings[index].take().is_some() && self.hal.detach(index as Pin).is_err() {
                self.slots.leak(index);
            }
        }
    }
}
