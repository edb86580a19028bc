//! Application core — pure domain logic, zero I/O.
//!
//! Two services, one per firmware image: [`controller::ControllerService`]
//! for the relay/sensor board and [`camera::CameraService`] for the
//! ESP32-CAM.  All interaction with hardware and the network happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod camera;
pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
pub mod status;
