//! BCM2835 GPIO event detection.
//!
//! Raw register access for the parts of the GPIO block that raise
//! interrupts: the per-pin detect enables and the event status registers.

use crate::hal::gpio::{InterruptMode, Pin};
use core::ptr::{read_volatile, write_volatile};

#[cfg(test)]
use super::image::RegisterImage;

/// GPIO base address.
#[cfg_attr(test, allow(dead_code))]
pub const GPIO_BASE: usize = 0x2020_0000;

/// Number of GPIO pins on the SoC.
pub const GPIO_PIN_COUNT: usize = 54;

/// Pins per event status register.
pub const PINS_PER_BANK: usize = 32;

/// Detect enable registers, one pair per condition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Detect {
    Rising,
    Falling,
    High,
    Low,
}

const ALL_DETECTS: [Detect; 4] = [Detect::Rising, Detect::Falling, Detect::High, Detect::Low];

/// Memory-mapped register layout.
#[repr(C)]
struct Registers {
    gpfsel: [u32; 6],
    _r0: u32,
    gpset: [u32; 2],
    _r1: u32,
    gpclr: [u32; 2],
    _r2: u32,
    gplev: [u32; 2],
    _r3: u32,
    gped: [u32; 2],
    _r4: u32,
    gpren: [u32; 2],
    _r5: u32,
    gpfen: [u32; 2],
    _r6: u32,
    gphen: [u32; 2],
    _r7: u32,
    gplen: [u32; 2],
}

#[cfg(not(test))]
#[inline(always)]
fn regs() -> *mut Registers {
    GPIO_BASE as *mut Registers
}

#[cfg(test)]
fn regs() -> *mut Registers {
    static IMAGE: RegisterImage<Registers> = RegisterImage::new();
    IMAGE.as_ptr()
}

/// GPIO errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpioError {
    InvalidPin(Pin),
}

pub fn check_pin(pin: Pin) -> Result<(), GpioError> {
    if (pin as usize) < GPIO_PIN_COUNT {
        Ok(())
    } else {
        Err(GpioError::InvalidPin(pin))
    }
}

fn pin_reg_and_bit(pin: Pin) -> (usize, u32) {
    let pin = pin as usize;
    (pin / PINS_PER_BANK, 1u32 << (pin % PINS_PER_BANK))
}

fn set_detect(pin: Pin, detect: Detect, enable: bool) {
    let (reg, bit) = pin_reg_and_bit(pin);

    unsafe {
        let reg_ptr = match detect {
            Detect::Rising => &raw mut (*regs()).gpren[reg],
            Detect::Falling => &raw mut (*regs()).gpfen[reg],
            Detect::High => &raw mut (*regs()).gphen[reg],
            Detect::Low => &raw mut (*regs()).gplen[reg],
        };

        let mut val = read_volatile(reg_ptr);
        if enable {
            val |= bit;
        } else {
            val &= !bit;
        }
        write_volatile(reg_ptr, val);
    }
}

/// Arm event detection on `pin` for exactly `mode`.
///
/// Any detection left over from a previous mode is turned off first.
pub fn enable_detect(pin: Pin, mode: InterruptMode) -> Result<(), GpioError> {
    disable_detect(pin)?;

    match mode {
        InterruptMode::Rising => set_detect(pin, Detect::Rising, true),
        InterruptMode::Falling => set_detect(pin, Detect::Falling, true),
        InterruptMode::Change => {
            set_detect(pin, Detect::Rising, true);
            set_detect(pin, Detect::Falling, true);
        }
        InterruptMode::High => set_detect(pin, Detect::High, true),
        InterruptMode::Low => set_detect(pin, Detect::Low, true),
    }

    // A stale event would fire the new vector immediately.
    clear_event(pin)
}

/// Turn off every kind of event detection on `pin`.
pub fn disable_detect(pin: Pin) -> Result<(), GpioError> {
    check_pin(pin)?;
    for detect in ALL_DETECTS {
        set_detect(pin, detect, false);
    }
    Ok(())
}

/// Clear a pending event.
pub fn clear_event(pin: Pin) -> Result<(), GpioError> {
    check_pin(pin)?;
    let (reg, bit) = pin_reg_and_bit(pin);

    unsafe {
        write_volatile(&raw mut (*regs()).gped[reg], bit);
    }

    Ok(())
}

/// Event status bits for one bank of 32 pins.
pub fn pending_events(bank: usize) -> u32 {
    unsafe { read_volatile(&raw const (*regs()).gped[bank]) }
}

/// Overwrite a bank's event status, as if the pins had seen their edges.
#[cfg(test)]
pub fn set_pending_events(bank: usize, events: u32) {
    unsafe { write_volatile(&raw mut (*regs()).gped[bank], events) }
}
