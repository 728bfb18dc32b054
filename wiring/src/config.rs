use crate::Pin;

/// Decides whether a pin is permanently off limits to the registry.
pub type ReservedPredicate = fn(Pin) -> bool;

/// Default predicate: every pin is available.
pub fn no_reserved_pins(_pin: Pin) -> bool {
    false
}

/// Registry configuration.
#[derive(Debug, Copy, Clone)]
pub struct InterruptConfig {
    /// Pins for which attach and detach are always rejected, typically
    /// lines shared with power management or a console.
    pub reserved: ReservedPredicate,
}

impl InterruptConfig {
    pub const fn new() -> Self {
        Self {
            reserved: no_reserved_pins,
        }
    }

    /// Replace the reserved-pin predicate.
    pub const fn reserved(mut self, reserved: ReservedPredicate) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn is_reserved(&self, pin: Pin) -> bool {
        (self.reserved)(pin)
    }
}

impl Default for InterruptConfig {
    /// No reserved pins.
    fn default() -> Self {
        Self::new()
    }
}
