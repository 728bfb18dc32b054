//! Platform Backends
//!
//! Each backend implements the [`hal::interrupt`](crate::hal::interrupt)
//! traits for one SoC and exposes a dispatcher for the exception vector.
//!
//! # Usage
//!
//! ```ignore
//! use drivers::platform::CurrentPlatform;
//!
//! let backend = unsafe { CurrentPlatform::take() }.expect("backend already taken");
//!
//! // From the IRQ exception vector:
//! drivers::platform::bcm2835::dispatch_pending();
//! ```

// Platform selection based on Cargo features
cfg_if::cfg_if! {
    if #[cfg(all(feature = "bcm2835", any(target_arch = "arm", test)))] {
        pub mod bcm2835;
        pub use bcm2835::Bcm2835Interrupts as CurrentPlatform;
    } else if #[cfg(feature = "bcm2711")] {
        compile_error!("bcm2711 backend is not available yet; build with --features bcm2835");
    }
}

// Ensure only one platform is selected
#[cfg(all(feature = "bcm2835", feature = "bcm2711"))]
compile_error!("Multiple platforms selected! Choose only one: bcm2835 OR bcm2711");
