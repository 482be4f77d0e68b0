// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo-mode command frames.
//!
//! Servo mode uses 29-bit extended identifiers that carry both the target address and the command
//! kind:
//!
//! ```text
//! ExtID = address | kind << 8
//! ```
//!
//! Each command clamps its argument to [`ServoLimits`], scales it to an integer and appends it
//! big-endian to the payload.

use bxcan::{Data, ExtendedId, Frame};

use super::fixed::{append_i16, append_i32};

/// Command kind, encoded in bits 8.. of the extended identifier.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServoKind {
    Duty = 0,
    Current = 1,
    CurrentBrake = 2,
    Velocity = 3,
    Position = 4,
    SetOrigin = 5,
    PositionVelocity = 6,
}

/// Origin behavior requested from the actuator.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OriginMode {
    /// Temporary origin, lost on power-off.
    Temporary = 0,
    /// Permanent origin, saved by the actuator.
    Permanent = 1,
    /// Restore the factory origin, saved by the actuator.
    RestoreDefault = 2,
}

/// Duty cycle scale: 1.0 -> 100 000.
pub const DUTY_SCALE: f32 = 100_000.0;
/// Current scale: 1 mA -> 1000.
pub const CURRENT_SCALE: f32 = 1_000.0;
/// Position scale: 1° -> 10 000.
pub const POSITION_SCALE: f32 = 10_000.0;

/// Clamp ranges applied before scaling.
///
/// The default matches the current driver generation: duty in `[0, 1]` and a bidirectional
/// position window of ±36 000°.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoLimits {
    pub duty_min: f32,
    pub duty_max: f32,
    /// Symmetric current limit in mA.
    pub max_current_ma: f32,
    /// Symmetric velocity limit in ERPM.
    pub max_velocity_erpm: f32,
    /// Position window in degrees.
    pub position_min_deg: f32,
    pub position_max_deg: f32,
    /// Speed field of the position+velocity command.
    pub pv_speed_min: f32,
    pub pv_speed_max: f32,
    /// Upper bound of the acceleration field of the position+velocity command.
    pub max_acceleration: f32,
}

impl Default for ServoLimits {
    fn default() -> Self {
        Self {
            duty_min: 0.0,
            duty_max: 1.0,
            max_current_ma: 60_000.0,
            max_velocity_erpm: 100_000.0,
            position_min_deg: -36_000.0,
            position_max_deg: 36_000.0,
            pv_speed_min: -32_768.0,
            pv_speed_max: 32_767.0,
            max_acceleration: 32_767.0,
        }
    }
}

impl ServoLimits {
    /// Set the duty cycle window, e.g. `(-1.0, 1.0)` to allow reverse duty.
    pub fn with_duty_range(mut self, min: f32, max: f32) -> Self {
        self.duty_min = min;
        self.duty_max = max;
        self
    }

    /// Set the position window in degrees.
    pub fn with_position_range(mut self, min_deg: f32, max_deg: f32) -> Self {
        self.position_min_deg = min_deg;
        self.position_max_deg = max_deg;
        self
    }

    /// Set the symmetric current limit in mA.
    pub fn with_max_current(mut self, ma: f32) -> Self {
        self.max_current_ma = ma;
        self
    }

    /// Set the symmetric velocity limit in ERPM.
    pub fn with_max_velocity(mut self, erpm: f32) -> Self {
        self.max_velocity_erpm = erpm;
        self
    }
}

/// Clamp without panicking on NaN or inverted bounds.
#[inline]
fn limit(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Raw extended identifier for `kind` addressed to `address`.
#[inline]
pub fn identifier(address: u8, kind: ServoKind) -> u32 {
    u32::from(address) | (kind as u32) << 8
}

#[inline]
fn extended_id(address: u8, kind: ServoKind) -> ExtendedId {
    // An 8-bit address and a kind below 8 occupy at most 11 of the 29 identifier bits.
    ExtendedId::new(identifier(address, kind)).unwrap_or(ExtendedId::MAX)
}

/// 4-byte command carrying one big-endian `i32`.
fn scalar_frame(address: u8, kind: ServoKind, value: i32) -> Frame {
    let mut buffer = [0u8; 4];
    let mut index = 0;
    append_i32(&mut buffer, value, &mut index);
    Frame::new_data(extended_id(address, kind), Data::from(buffer))
}

/// Duty-cycle command. `duty` is a fraction, 1.0 = full duty.
pub fn duty(address: u8, duty: f32, limits: &ServoLimits) -> Frame {
    let duty = limit(duty, limits.duty_min, limits.duty_max);
    scalar_frame(address, ServoKind::Duty, (duty * DUTY_SCALE) as i32)
}

/// Current (torque) command in mA.
pub fn current(address: u8, current_ma: f32, limits: &ServoLimits) -> Frame {
    let max = limits.max_current_ma;
    let current = limit(current_ma, -max, max);
    scalar_frame(address, ServoKind::Current, (current * CURRENT_SCALE) as i32)
}

/// Brake current command in mA.
pub fn current_brake(address: u8, current_ma: f32, limits: &ServoLimits) -> Frame {
    let max = limits.max_current_ma;
    let current = limit(current_ma, -max, max);
    scalar_frame(address, ServoKind::CurrentBrake, (current * CURRENT_SCALE) as i32)
}

/// Velocity command in ERPM (mechanical RPM times pole pairs).
pub fn velocity(address: u8, erpm: f32, limits: &ServoLimits) -> Frame {
    let max = limits.max_velocity_erpm;
    let erpm = limit(erpm, -max, max);
    scalar_frame(address, ServoKind::Velocity, erpm as i32)
}

/// Position command in degrees.
pub fn position(address: u8, deg: f32, limits: &ServoLimits) -> Frame {
    let deg = limit(deg, limits.position_min_deg, limits.position_max_deg);
    scalar_frame(address, ServoKind::Position, (deg * POSITION_SCALE) as i32)
}

/// Set-origin command.
///
/// The frame has an empty payload; `mode` is not part of it. Actuator firmware that honors the
/// mode byte will treat this as a temporary origin.
pub fn set_origin(address: u8, _mode: OriginMode) -> Frame {
    Frame::new_data(extended_id(address, ServoKind::SetOrigin), Data::empty())
}

/// Position command with speed and acceleration limits.
///
/// Payload: position `i32` (x10 000), speed `i16`, acceleration `i16`.
pub fn position_velocity(
    address: u8,
    deg: f32,
    speed: f32,
    acceleration: f32,
    limits: &ServoLimits,
) -> Frame {
    let deg = limit(deg, limits.position_min_deg, limits.position_max_deg);
    let speed = limit(speed, limits.pv_speed_min, limits.pv_speed_max);
    let acceleration = limit(acceleration, 0.0, limits.max_acceleration);

    let mut buffer = [0u8; 8];
    let mut index = 0;
    append_i32(&mut buffer, (deg * POSITION_SCALE) as i32, &mut index);
    append_i16(&mut buffer, speed as i16, &mut index);
    append_i16(&mut buffer, acceleration as i16, &mut index);

    Frame::new_data(extended_id(address, ServoKind::PositionVelocity), Data::from(buffer))
}
