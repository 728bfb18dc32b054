//! System Interrupt Controller
//!
//! Same ownership model as the pin registry, over the platform's fixed
//! system interrupt lines. There are no reserved lines and the global pin
//! gate does not apply here.

use drivers::hal::interrupt::{SystemInterruptController, SystemIrq};

use crate::error::InterruptError;
use crate::slot::{HandlerSlotTable, PreparedHandler};

/// Line count of the default table.
pub const MAX_SYSTEM_INTERRUPTS: usize = 96;

/// Callback registry for system lines `0..N`.
pub struct SystemInterrupts<H: SystemInterruptController, const N: usize = MAX_SYSTEM_INTERRUPTS> {
    hal: H,
    slots: HandlerSlotTable<N>,
}

impl<H: SystemInterruptController, const N: usize> SystemInterrupts<H, N> {
    pub const fn new(hal: H) -> Self {
        Self {
            hal,
            slots: HandlerSlotTable::new(),
        }
    }

    /// Install `callback` as the handler for `irq`, replacing any previous
    /// one. Returns whether it was installed.
    ///
    /// If the controller refuses and then cannot confirm the line is
    /// unhooked, the callback stays in place until a later detach succeeds.
    pub fn attach_system<F>(&mut self, irq: SystemIrq, callback: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.try_attach_system(irq, callback).is_ok()
    }

    pub fn try_attach_system<F>(&mut self, irq: SystemIrq, callback: F) -> Result<(), InterruptError>
    where
        F: FnMut() + Send + 'static,
    {
        let index = self.check_irq(irq)?;
        let handler = PreparedHandler::new(callback).inspect_err(|_| {
            log::warn!("attach system irq {}: out of memory", irq);
        })?;

        if self.slots.is_occupied(index) {
            self.unhook(irq)?;
        }
        let vector = self.slots.install(index, handler);

        if let Err(err) = self.hal.set_system_handler(irq, Some(vector)) {
            log::warn!("attach system irq {}: {:?}", irq, err);
            // A refused install may still have taken the vector.
            if self.unhook(irq).is_ok() {
                self.slots.free(index);
            }
            return Err(InterruptError::Hardware);
        }
        log::debug!("system irq {}: attached", irq);
        Ok(())
    }

    /// Remove the handler for `irq`.
    ///
    /// Returns whether the controller accepted the removal. Removing from a
    /// line with no handler is accepted.
    pub fn detach_system(&mut self, irq: SystemIrq) -> bool {
        self.try_detach_system(irq).is_ok()
    }

    pub fn try_detach_system(&mut self, irq: SystemIrq) -> Result<(), InterruptError> {
        let index = self.check_irq(irq)?;
        self.unhook(irq)?;
        if self.slots.free(index) {
            log::debug!("system irq {}: callback released", irq);
        }
        Ok(())
    }

    pub fn is_attached_system(&self, irq: SystemIrq) -> bool {
        self.slots.is_occupied(irq as usize)
    }

    fn check_irq(&self, irq: SystemIrq) -> Result<usize, InterruptError> {
        let index = irq as usize;
        if index >= N {
            log::warn!("system irq {} is out of range (max {})", irq, N);
            return Err(InterruptError::InvalidIrq(irq));
        }
        Ok(index)
    }

    fn unhook(&mut self, irq: SystemIrq) -> Result<(), InterruptError> {
        self.hal.set_system_handler(irq, None).map_err(|err| {
            log::warn!("detach system irq {}: {:?}", irq, err);
            InterruptError::Hardware
        })
    }
}

impl<H: SystemInterruptController, const N: usize> Drop for SystemInterrupts<H, N> {
    fn drop(&mut self) {
        for index in 0..N {
            if self.slots.is_occupied(index) && self.unhook(index as SystemIrq).is_err() {
                self.slots.leak(index);
            }
        }
    }
}
