//! BCM2835 (Raspberry Pi 1/Zero) interrupt backend.
//!
//! Pin-change interrupts come in through two GPIO bank lines of the ARM
//! interrupt controller. [`dispatch_pending`] demultiplexes them into the
//! per-pin vectors installed through [`PinInterruptController`]; every other
//! line is looked up in the system vector table.

mod gpio;
mod interrupt;

pub use gpio::{GPIO_PIN_COUNT, GpioError};
pub use interrupt::{
    IRQ_AUX, IRQ_COUNT, IRQ_GPIO_BANK0, IRQ_GPIO_BANK1, IRQ_SYSTEM_TIMER_1, IRQ_SYSTEM_TIMER_3,
    IRQ_UART0,
};

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hal::gpio::{InterruptMode, Pin};
use crate::hal::interrupt::{
    InterruptVector, IrqNumber, PinInterruptController, SystemInterruptController, SystemIrq,
};
use common::sync::IrqSpinLock;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        use common::arch::arm::ArmIrq as CpuIrq;
    } else {
        use common::arch::host::HostIrq as CpuIrq;
    }
}

/// UART0 TX/RX, muxed to the console.
pub const CONSOLE_PINS: [Pin; 2] = [14, 15];

/// Reserved-pin predicate that keeps the console UART pins out of reach.
pub fn is_console_pin(pin: Pin) -> bool {
    CONSOLE_PINS.contains(&pin)
}

// ============================================================================
// Vector Tables
// ============================================================================

static PIN_VECTORS: IrqSpinLock<[Option<InterruptVector>; GPIO_PIN_COUNT], CpuIrq> =
    IrqSpinLock::new([None; GPIO_PIN_COUNT]);

static SYSTEM_VECTORS: IrqSpinLock<[Option<InterruptVector>; IRQ_COUNT], CpuIrq> =
    IrqSpinLock::new([None; IRQ_COUNT]);

/// Set once the handles have been handed out.
static TAKEN: AtomicBool = AtomicBool::new(false);

/// Cleared by `disable_all`. While clear, attaching a pin leaves its bank
/// line masked.
static GATE_OPEN: AtomicBool = AtomicBool::new(true);

/// Interrupt backend errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlatformIrqError {
    Gpio(GpioError),
    /// Outside the controller's IRQ numbering.
    InvalidIrq(IrqNumber),
    /// Owned by pin-change dispatch.
    GpioLine(IrqNumber),
}

impl From<GpioError> for PlatformIrqError {
    fn from(err: GpioError) -> Self {
        PlatformIrqError::Gpio(err)
    }
}

/// The BCM2835 interrupt backend, split into its two halves.
///
/// Both halves write process-wide vector tables, so the backend can only be
/// taken once: there is exactly one pin registry and one system registry
/// per SoC.
#[derive(Debug)]
pub struct Bcm2835Interrupts {
    pub pins: Bcm2835PinInterrupts,
    pub system: Bcm2835SystemInterrupts,
}

/// Pin-change half. Implements [`PinInterruptController`].
#[derive(Debug)]
pub struct Bcm2835PinInterrupts {
    _private: (),
}

/// System line half. Implements [`SystemInterruptController`].
#[derive(Debug)]
pub struct Bcm2835SystemInterrupts {
    _private: (),
}

impl Bcm2835Interrupts {
    /// Hand out the backend. Returns `None` after the first call.
    ///
    /// # Safety
    ///
    /// GPIO and interrupt controller registers must be mapped, and
    /// [`dispatch_pending`] must be wired to the IRQ exception vector.
    pub unsafe fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self {
            pins: Bcm2835PinInterrupts { _private: () },
            system: Bcm2835SystemInterrupts { _private: () },
        })
    }
}

impl PinInterruptController for Bcm2835PinInterrupts {
    type Error = PlatformIrqError;

    fn attach(
        &mut self,
        pin: Pin,
        vector: InterruptVector,
        mode: InterruptMode,
    ) -> Result<(), Self::Error> {
        gpio::check_pin(pin)?;
        PIN_VECTORS.with(|vectors| {
            vectors[pin as usize] = Some(vector);
            gpio::enable_detect(pin, mode)?;
            // The controller comes out of reset with every line masked.
            if GATE_OPEN.load(Ordering::Acquire) {
                interrupt::enable_irq(interrupt::gpio_bank_irq(pin));
            }
            Ok::<(), GpioError>(())
        })?;
        log::debug!("bcm2835: pin {} armed ({:?})", pin, mode);
        Ok(())
    }

    fn detach(&mut self, pin: Pin) -> Result<(), Self::Error> {
        gpio::check_pin(pin)?;
        PIN_VECTORS.with(|vectors| {
            gpio::disable_detect(pin)?;
            gpio::clear_event(pin)?;
            vectors[pin as usize] = None;
            Ok::<(), GpioError>(())
        })?;
        Ok(())
    }

    fn enable_all(&mut self) -> Result<(), Self::Error> {
        GATE_OPEN.store(true, Ordering::Release);
        for irq in interrupt::GPIO_BANK_IRQS {
            interrupt::enable_irq(irq);
        }
        Ok(())
    }

    fn disable_all(&mut self) -> Result<(), Self::Error> {
        GATE_OPEN.store(false, Ordering::Release);
        for irq in interrupt::GPIO_BANK_IRQS {
            interrupt::disable_irq(irq);
        }
        Ok(())
    }
}

impl SystemInterruptController for Bcm2835SystemInterrupts {
    type Error = PlatformIrqError;

    fn set_system_handler(
        &mut self,
        irq: SystemIrq,
        vector: Option<InterruptVector>,
    ) -> Result<(), Self::Error> {
        if irq as usize >= IRQ_COUNT {
            return Err(PlatformIrqError::InvalidIrq(irq));
        }
        if interrupt::is_gpio_irq(irq) {
            return Err(PlatformIrqError::GpioLine(irq));
        }

        SYSTEM_VECTORS.with(|vectors| {
            vectors[irq as usize] = vector;
            match vector {
                Some(_) => interrupt::enable_irq(irq),
                None => interrupt::disable_irq(irq),
            }
        });
        Ok(())
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Fire whatever is registered for `irq`.
///
/// Returns `false` when nothing is registered for the line.
pub fn handle_irq(irq: IrqNumber) -> bool {
    if let Some(bank) = interrupt::GPIO_BANK_IRQS.iter().position(|&line| line == irq) {
        dispatch_gpio_bank(bank);
        return true;
    }

    let vector = SYSTEM_VECTORS.with(|vectors| vectors.get(irq as usize).copied().flatten());
    match vector {
        Some(vector) => {
            // SAFETY: we run in IRQ context, so the mainline code that would
            // remove this vector cannot run before `fire` returns.
            unsafe { vector.fire() };
            true
        }
        None => false,
    }
}

fn dispatch_gpio_bank(bank: usize) {
    let mut events = gpio::pending_events(bank);

    while events != 0 {
        let bit = events.trailing_zeros() as usize;
        events &= events - 1;

        let pin = (bank * gpio::PINS_PER_BANK + bit) as Pin;
        // Cleared before firing so an edge during the callback latches again.
        gpio::clear_event(pin).ok();

        let vector = PIN_VECTORS.with(|vectors| vectors.get(pin as usize).copied().flatten());
        if let Some(vector) = vector {
            // SAFETY: see `handle_irq`
            unsafe { vector.fire() };
        }
    }
}

/// Drain every pending interrupt.
///
/// Called from the IRQ exception vector. A line with nothing registered is
/// masked so that it cannot storm.
pub fn dispatch_pending() {
    while let Some(irq) = interrupt::pending_irq() {
        if !handle_irq(irq) {
            log::warn!("bcm2835: unhandled IRQ {}, masking", irq);
            interrupt::disable_irq(irq);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr::null_mut;
    use core::sync::atomic::AtomicUsize;

    static HITS: AtomicUsize = AtomicUsize::new(0);

    unsafe fn count(_: *mut ()) {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    const fn line_bit(irq: IrqNumber) -> u32 {
        1 << (irq - 32)
    }

    // The backend is taken once per process and the register images are
    // shared, so the whole lifecycle runs in one test.
    #[test]
    fn test_backend_lifecycle() {
        let Bcm2835Interrupts { mut pins, mut system } =
            unsafe { Bcm2835Interrupts::take() }.unwrap();
        assert!(unsafe { Bcm2835Interrupts::take() }.is_none());
        let vector = InterruptVector::new(count, null_mut());

        // Attaching unmasks the pin's bank line, nothing else.
        interrupt::take_enable_writes();
        pins.attach(17, vector, InterruptMode::Falling).unwrap();
        assert_eq!(interrupt::take_enable_writes(), [0, line_bit(IRQ_GPIO_BANK0), 0]);
        pins.attach(40, vector, InterruptMode::Rising).unwrap();
        assert_eq!(interrupt::take_enable_writes(), [0, line_bit(IRQ_GPIO_BANK1), 0]);

        // Only the gate masks bank lines.
        interrupt::take_disable_writes();
        pins.detach(17).unwrap();
        assert_eq!(interrupt::take_disable_writes(), [0; 3]);

        pins.disable_all().unwrap();
        assert_ne!(interrupt::take_disable_writes(), [0; 3]);
        pins.attach(3, vector, InterruptMode::Rising).unwrap();
        assert_eq!(interrupt::take_enable_writes(), [0; 3]);
        pins.enable_all().unwrap();
        assert_ne!(interrupt::take_enable_writes(), [0; 3]);

        assert_eq!(
            pins.attach(60, vector, InterruptMode::Low),
            Err(PlatformIrqError::Gpio(GpioError::InvalidPin(60)))
        );

        // Pin 17 was detached, so only pin 3 runs.
        gpio::set_pending_events(0, (1 << 3) | (1 << 17));
        assert!(handle_irq(IRQ_GPIO_BANK0));
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        assert_eq!(
            system.set_system_handler(IRQ_GPIO_BANK1, Some(vector)),
            Err(PlatformIrqError::GpioLine(IRQ_GPIO_BANK1))
        );
        assert_eq!(
            system.set_system_handler(IRQ_COUNT as SystemIrq, Some(vector)),
            Err(PlatformIrqError::InvalidIrq(IRQ_COUNT as SystemIrq))
        );
        system.set_system_handler(IRQ_UART0, Some(vector)).unwrap();
        assert!(handle_irq(IRQ_UART0));
        assert_eq!(HITS.load(Ordering::SeqCst), 2);
        system.set_system_handler(IRQ_UART0, None).unwrap();
        assert!(!handle_irq(IRQ_UART0));
    }
}
