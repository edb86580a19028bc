//! Aquaponics firmware library.
//!
//! Two nodes share this crate: the tank controller (`src/main.rs`) and the
//! ESP32-CAM plant monitor (`src/bin/camera.rs`).  Everything here builds on
//! the host as well; ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module, with simulation
//! stand-ins for integration tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;
pub mod timer;
