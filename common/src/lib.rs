//! Primitives shared between the driver layer and the interrupt registry.
//!
//! - [`sync`]: interrupt-masking critical sections and an IRQ-safe spinlock
//! - [`arch`]: per-architecture implementations of [`sync::IrqControl`]

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod sync;
