// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! Drivers sit above the raw `hw/` layer and the `protocol/` codecs, and below the application
//! logic.
//!
//! ## Existing drivers
//!
//! - [`ak_motor`] – CubeMars AK-series actuator, servo and MIT modes
//! - [`registry`] – table of actuators on the bus and their last telemetry

pub mod ak_motor;
pub mod registry;

pub use ak_motor::AkMotor;
pub use registry::{Device, Handle, Registry};
