//! Hardware Driver Subsystem
//!
//! # Module Organization
//!
//! - [`hal`]: Platform-independent trait definitions
//! - [`platform`]: Platform-specific backends (SoC level)
//!
//! Backends are selected with cargo features and only compiled for the
//! architecture they drive, so host builds see the HAL alone.

#![cfg_attr(not(test), no_std)]

pub mod hal;
pub mod platform;

// Re-export commonly used types
pub use hal::gpio::{InterruptMode, Pin};
pub use hal::interrupt::{
    InterruptVector, IrqNumber, PinInterruptController, SystemInterruptController, SystemIrq,
    Trampoline,
};
