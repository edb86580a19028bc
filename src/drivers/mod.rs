//! Actuator and camera drivers.

pub mod camera;
pub mod relay;
