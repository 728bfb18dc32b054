use core::fmt;

use crate::{Pin, SystemIrq};

/// Reasons an attach or detach did not happen.
///
/// The `bool` returning operations collapse these to `false`; the `try_`
/// variants hand them back.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptError {
    /// The pin is excluded by [`InterruptConfig`](crate::InterruptConfig).
    ReservedPin(Pin),
    /// The pin is beyond the registry's table.
    InvalidPin(Pin),
    /// The line is beyond the registry's table.
    InvalidIrq(SystemIrq),
    /// Callback storage could not be allocated. Nothing was changed.
    AllocationFailed,
    /// The interrupt controller refused the request.
    Hardware,
}

impl fmt::Display for InterruptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedPin(pin) => write!(f, "pin {pin} is reserved"),
            Self::InvalidPin(pin) => write!(f, "pin {pin} is out of range"),
            Self::InvalidIrq(irq) => write!(f, "system irq {irq} is out of range"),
            Self::AllocationFailed => write!(f, "no memory for interrupt callback"),
            Self::Hardware => write!(f, "interrupt controller rejected the request"),
        }
    }
}
