// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # AK Actuator Wire Protocol
//!
//! Pure encoding and decoding for CubeMars AK-series actuators. Nothing in here touches hardware:
//! encoders produce `bxcan::Frame`s, decoders consume raw payload bytes.
//!
//! ## Modules
//!
//! - [`fixed`] - Float <-> fixed-point range mapping and big-endian buffer appends.
//! - [`model`] - Actuator models and their MIT-mode velocity/torque limits.
//! - [`servo`] - Servo-mode command frames (extended identifiers).
//! - [`mit`] - MIT-mode command frames (standard identifiers).
//! - [`telemetry`] - Reply frame decoding for both modes.
//! - [`host`] - Line protocol spoken by the serial host tool.

use core::fmt;

pub mod fixed;
pub mod host;
pub mod mit;
pub mod model;
pub mod servo;
pub mod telemetry;

pub use fixed::FixedRange;
pub use host::{servo_request, HostCommand, LineParser, ServoRequest};
pub use mit::MitCommand;
pub use model::Model;
pub use servo::{OriginMode, ServoKind, ServoLimits};
pub use telemetry::{RawTelemetry, Telemetry, WireFormat};

/// Configuration errors raised while building codec parameters.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Range bounds are not finite, or `max <= min`.
    InvalidRange,
    /// Fixed-point width outside `1..=16` bits.
    InvalidBitWidth(u8),
    /// Model index not present in the model table.
    UnknownModel(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRange => f.write_str("fixed-point range must be finite with max > min"),
            Error::InvalidBitWidth(bits) => write!(f, "unsupported fixed-point width: {} bits", bits),
            Error::UnknownModel(index) => write!(f, "unknown actuator model index {}", index),
        }
    }
}
