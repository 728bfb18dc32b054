//! Pin-change and system interrupt registry.
//!
//! Binds callbacks to interrupt-capable pins ([`ExternalInterrupts`]) and
//! to fixed system interrupt lines ([`SystemInterrupts`]). Each source
//! holds at most one callback; attaching again replaces it and detaching
//! releases it. The hardware is always disarmed for a source before its
//! callback is swapped or freed, so a trampoline firing from interrupt
//! context never sees a callback that is being torn down.
//!
//! The hardware itself is consumed through the traits in
//! [`drivers::hal::interrupt`].
//!
//! # Usage
//!
//! ```ignore
//! use drivers::platform::bcm2835::{self, Bcm2835Interrupts};
//! use wiring::{ExternalInterrupts, InterruptConfig, InterruptMode};
//!
//! let backend = unsafe { Bcm2835Interrupts::take() }.expect("backend already taken");
//! let config = InterruptConfig::new().reserved(bcm2835::is_console_pin);
//! let mut pins: ExternalInterrupts<_, { bcm2835::GPIO_PIN_COUNT }> =
//!     ExternalInterrupts::new(backend.pins, config);
//!
//! pins.attach(17, move || led.toggle(), InterruptMode::Falling);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod callback;
pub mod config;
pub mod error;
pub mod external;
pub mod slot;
pub mod system;

#[cfg(test)]
mod fake;

pub use callback::{Callback, RawCallback};
pub use config::InterruptConfig;
pub use drivers::hal::gpio::{InterruptMode, Pin};
pub use drivers::hal::interrupt::SystemIrq;
pub use error::InterruptError;
pub use external::{Binding, BindingKind, ExternalInterrupts, MAX_EXTERNAL_INTERRUPTS};
pub use system::{MAX_SYSTEM_INTERRUPTS, SystemInterrupts};
