//! Hardware Abstraction Layer (HAL) - Platform-Independent Traits
//!
//! Platform backends implement these traits; the interrupt registry in the
//! `wiring` crate is written against them and never touches registers.
//!
//! # Available Interfaces
//!
//! - [`gpio`]: Pin identifiers and interrupt trigger modes
//! - [`interrupt`]: Pin-change and system interrupt controllers

pub mod gpio;
pub mod interrupt;
