//! BCM2835 ARM interrupt controller registers.

use super::gpio::PINS_PER_BANK;
use crate::hal::gpio::Pin;
use crate::hal::interrupt::IrqNumber;
use core::ptr::{read_volatile, write_volatile};

#[cfg(test)]
use super::image::RegisterImage;

/// Interrupt controller base address.
#[cfg_attr(test, allow(dead_code))]
pub const INT_CONTROLLER_BASE: usize = 0x2000_b000;

/// IRQ numbers 0-63 are the GPU peripheral lines, 64-71 the basic ARM lines.
pub const IRQ_COUNT: usize = 72;

pub const IRQ_SYSTEM_TIMER_1: IrqNumber = 1;
pub const IRQ_SYSTEM_TIMER_3: IrqNumber = 3;
pub const IRQ_AUX: IrqNumber = 29;
pub const IRQ_UART0: IrqNumber = 57;

/// GPIO bank 0 (pins 0-31).
pub const IRQ_GPIO_BANK0: IrqNumber = 49;
/// GPIO bank 1 (pins 32-53).
pub const IRQ_GPIO_BANK1: IrqNumber = 50;

/// Lines that carry pin-change events, indexed by bank.
pub const GPIO_BANK_IRQS: [IrqNumber; 2] = [IRQ_GPIO_BANK0, IRQ_GPIO_BANK1];

/// Line that carries the pin-change events of `pin`.
pub fn gpio_bank_irq(pin: Pin) -> IrqNumber {
    GPIO_BANK_IRQS[pin as usize / PINS_PER_BANK]
}

/// Every GPIO related line, including the two aggregate ones nothing here
/// enables. None of them may be claimed as a system line.
pub fn is_gpio_irq(irq: IrqNumber) -> bool {
    (49..=52).contains(&irq)
}

/// Memory-mapped interrupt controller registers.
#[repr(C)]
struct Registers {
    _padding: [u8; 0x200],
    irq_basic_pend: u32,
    irq_1_pend: u32,
    irq_2_pend: u32,
    fiq_ctrl: u32,
    enable_irqs_1: u32,
    enable_irqs_2: u32,
    enable_basic_irqs: u32,
    disable_irqs_1: u32,
    disable_irqs_2: u32,
    disable_basic_irqs: u32,
}

#[cfg(not(test))]
#[inline(always)]
fn regs() -> *mut Registers {
    INT_CONTROLLER_BASE as *mut Registers
}

#[cfg(test)]
fn regs() -> *mut Registers {
    static IMAGE: RegisterImage<Registers> = RegisterImage::new();
    IMAGE.as_ptr()
}

/// Interrupt line representation.
enum IrqLine {
    Irq1(u32),
    Irq2(u32),
    Basic(u32),
}

impl IrqLine {
    fn split(irq: IrqNumber) -> Self {
        match irq {
            0..=31 => IrqLine::Irq1(irq),
            32..=63 => IrqLine::Irq2(irq - 32),
            _ => IrqLine::Basic(irq - 64),
        }
    }
}

/// Query for a pending IRQ.
pub fn pending_irq() -> Option<IrqNumber> {
    unsafe {
        let r = regs();

        let irq1 = read_volatile(&raw const (*r).irq_1_pend);
        if irq1 != 0 {
            return Some(irq1.trailing_zeros());
        }

        let irq2 = read_volatile(&raw const (*r).irq_2_pend);
        if irq2 != 0 {
            return Some(32 + irq2.trailing_zeros());
        }

        // Bits 8 and up only mirror the two registers above.
        let basic = read_volatile(&raw const (*r).irq_basic_pend) & 0xff;
        if basic != 0 {
            return Some(64 + basic.trailing_zeros());
        }

        None
    }
}

/// Unmask an interrupt line.
pub fn enable_irq(irq: IrqNumber) {
    unsafe {
        let r = regs();
        match IrqLine::split(irq) {
            IrqLine::Irq1(bit) => write_volatile(&raw mut (*r).enable_irqs_1, 1 << bit),
            IrqLine::Irq2(bit) => write_volatile(&raw mut (*r).enable_irqs_2, 1 << bit),
            IrqLine::Basic(bit) => write_volatile(&raw mut (*r).enable_basic_irqs, 1 << bit),
        }
    }
}

/// Mask an interrupt line.
pub fn disable_irq(irq: IrqNumber) {
    unsafe {
        let r = regs();
        match IrqLine::split(irq) {
            IrqLine::Irq1(bit) => write_volatile(&raw mut (*r).disable_irqs_1, 1 << bit),
            IrqLine::Irq2(bit) => write_volatile(&raw mut (*r).disable_irqs_2, 1 << bit),
            IrqLine::Basic(bit) => write_volatile(&raw mut (*r).disable_basic_irqs, 1 << bit),
        }
    }
}

/// Last values written to the enable registers (1, 2, basic). Reading
/// zeroes them so a test sees only the writes that follow.
#[cfg(test)]
pub fn take_enable_writes() -> [u32; 3] {
    unsafe {
        let r = regs();
        [
            core::mem::take(&mut (*r).enable_irqs_1),
            core::mem::take(&mut (*r).enable_irqs_2),
            core::mem::take(&mut (*r).enable_basic_irqs),
        ]
    }
}

/// Same as [`take_enable_writes`] for the disable registers.
#[cfg(test)]
pub fn take_disable_writes() -> [u32; 3] {
    unsafe {
        let r = regs();
        [
            core::mem::take(&mut (*r).disable_irqs_1),
            core::mem::take(&mut (*r).disable_irqs_2),
            core::mem::take(&mut (*r).disable_basic_irqs),
        ]
    }
}
