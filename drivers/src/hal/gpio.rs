//! GPIO (General Purpose Input/Output) Hardware Abstraction Layer.
//!
//! Only the parts the interrupt registry needs: pin identifiers and the
//! trigger conditions a pin-change interrupt can be armed with.

/// Interrupt-capable pin identifier.
pub type Pin = u16;

/// Condition that makes a pin raise its interrupt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptMode {
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
    /// Any transition.
    Change,
    /// Pin is held high.
    High,
    /// Pin is held low.
    Low,
}
