// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Actuator reply decoding.
//!
//! Both modes reply with 8 data bytes. The identifier type tells them apart: standard frames are
//! MIT replies (source address in data byte 0), extended frames are servo replies (source address
//! in the low byte of the identifier).

use bxcan::{Frame, Id};

use super::mit::POSITION_RANGE;
use super::model::Model;

/// Which reply layout a frame uses.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Standard identifier, fixed-point fields.
    Mit,
    /// Extended identifier, scaled integer fields.
    Servo,
}

impl WireFormat {
    /// Layout implied by an identifier.
    #[inline]
    pub fn of(id: Id) -> Self {
        match id {
            Id::Standard(_) => WireFormat::Mit,
            Id::Extended(_) => WireFormat::Servo,
        }
    }
}

/// Last known actuator state.
///
/// Units depend on the mode the reply came from:
///
/// | field       | servo   | MIT   |
/// | ----------- | ------- | ----- |
/// | position    | deg     | rad   |
/// | velocity    | ERPM    | rad/s |
/// | current     | A       | N·m   |
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub position: f32,
    pub velocity: f32,
    /// Phase current in servo mode, torque in MIT mode.
    pub current: f32,
    /// Driver temperature [°C].
    pub temperature: i8,
    /// Actuator fault code, 0 when healthy.
    pub error_code: u8,
}

impl Telemetry {
    /// Decode a servo-mode reply.
    pub fn decode_servo(data: &[u8; 8]) -> Self {
        let position = i16::from_be_bytes([data[0], data[1]]);
        let velocity = i16::from_be_bytes([data[2], data[3]]);
        let current = i16::from_be_bytes([data[4], data[5]]);

        Self {
            position: f32::from(position) * 0.1,
            velocity: f32::from(velocity) * 10.0,
            current: f32::from(current) * 0.01,
            temperature: data[6] as i8,
            error_code: data[7],
        }
    }

    /// Decode an MIT-mode reply for an actuator of type `model`.
    pub fn decode_mit(data: &[u8; 8], model: Model) -> Self {
        let position = (u16::from(data[1]) << 8) | u16::from(data[2]);
        let velocity = (u16::from(data[3]) << 4) | u16::from(data[4] >> 4);
        let torque = (u16::from(data[4] & 0xF) << 8) | u16::from(data[5]);

        Self {
            position: POSITION_RANGE.decode(position),
            velocity: model.velocity_range().decode(velocity),
            current: model.torque_range().decode(torque),
            temperature: data[6] as i8,
            error_code: data[7],
        }
    }

    #[inline]
    pub fn decode(data: &[u8; 8], format: WireFormat, model: Model) -> Self {
        match format {
            WireFormat::Servo => Self::decode_servo(data),
            WireFormat::Mit => Self::decode_mit(data, model),
        }
    }
}

/// A received reply, not yet matched to a device.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTelemetry {
    pub address: u8,
    pub data: [u8; 8],
    pub format: WireFormat,
}

impl RawTelemetry {
    /// Extract the source address and payload from a received frame.
    ///
    /// Returns `None` for remote frames and frames shorter than 8 bytes.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let payload = frame.data()?;
        if payload.len() < 8 {
            return None;
        }

        let mut data = [0u8; 8];
        data.copy_from_slice(&payload[..8]);

        let format = WireFormat::of(frame.id());
        let address = match frame.id() {
            Id::Standard(_) => data[0],
            Id::Extended(id) => (id.as_raw() & 0xFF) as u8,
        };

        Some(Self {
            address,
            data,
            format,
        })
    }
}
