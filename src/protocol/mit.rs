// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MIT-mode command frames.
//!
//! MIT frames use the raw device address as an 11-bit standard identifier and always carry 8
//! bytes. Control is entered, re-zeroed and left with fixed sentinel payloads; while in control
//! each data frame carries five fixed-point fields:
//!
//! | field    | range            | bits |
//! | -------- | ---------------- | ---- |
//! | position | ±12.5 rad        | 16   |
//! | velocity | ±Vmax(model)     | 12   |
//! | kp       | 0 to 500         | 12   |
//! | kd       | 0 to 5           | 12   |
//! | torque   | ±Tmax(model)     | 12   |
//!
//! Layout, most significant bits first:
//!
//! ```text
//! byte  0        1        2        3         4        5        6         7
//!       pos[15:8] pos[7:0] vel[11:4] vel[3:0]|kp[11:8] kp[7:0] kd[11:4] kd[3:0]|t[11:8] t[7:0]
//! ```

use bxcan::{Data, Frame, StandardId};

use super::fixed::FixedRange;
use super::model::Model;

/// Enter motor control.
pub const ENTER_CONTROL: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC];
/// Zero the position at the current shaft angle.
pub const SET_ORIGIN: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE];
/// Leave motor control.
pub const EXIT_CONTROL: [u8; 8] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFD];

/// Position field, shared by every model.
pub const POSITION_RANGE: FixedRange = FixedRange::from_parts(-12.5, 12.5, 16);
/// Stiffness gain field.
pub const KP_RANGE: FixedRange = FixedRange::from_parts(0.0, 500.0, 12);
/// Damping gain field.
pub const KD_RANGE: FixedRange = FixedRange::from_parts(0.0, 5.0, 12);

/// One MIT control setpoint.
///
/// The actuator computes `torque + kp * (position - pos) + kd * (velocity - vel)`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MitCommand {
    /// Target position [rad].
    pub position: f32,
    /// Target velocity [rad/s].
    pub velocity: f32,
    /// Stiffness gain.
    pub kp: f32,
    /// Damping gain.
    pub kd: f32,
    /// Feed-forward torque [N·m].
    pub torque: f32,
}

impl MitCommand {
    pub fn new(position: f32, velocity: f32, kp: f32, kd: f32, torque: f32) -> Self {
        Self {
            position,
            velocity,
            kp,
            kd,
            torque,
        }
    }

    /// Pack into the 8-byte wire layout, clamping each field to its range.
    pub fn pack(&self, model: Model) -> [u8; 8] {
        let p = POSITION_RANGE.encode(self.position);
        let v = model.velocity_range().encode(self.velocity);
        let kp = KP_RANGE.encode(self.kp);
        let kd = KD_RANGE.encode(self.kd);
        let t = model.torque_range().encode(self.torque);

        [
            (p >> 8) as u8,
            (p & 0xFF) as u8,
            (v >> 4) as u8,
            (((v & 0xF) << 4) | (kp >> 8)) as u8,
            (kp & 0xFF) as u8,
            (kd >> 4) as u8,
            (((kd & 0xF) << 4) | (t >> 8)) as u8,
            (t & 0xFF) as u8,
        ]
    }

    /// Inverse of [`pack`](Self::pack), up to fixed-point resolution.
    pub fn unpack(data: &[u8; 8], model: Model) -> Self {
        let p = u16::from_be_bytes([data[0], data[1]]);
        let v = (u16::from(data[2]) << 4) | u16::from(data[3] >> 4);
        let kp = (u16::from(data[3] & 0xF) << 8) | u16::from(data[4]);
        let kd = (u16::from(data[5]) << 4) | u16::from(data[6] >> 4);
        let t = (u16::from(data[6] & 0xF) << 8) | u16::from(data[7]);

        Self {
            position: POSITION_RANGE.decode(p),
            velocity: model.velocity_range().decode(v),
            kp: KP_RANGE.decode(kp),
            kd: KD_RANGE.decode(kd),
            torque: model.torque_range().decode(t),
        }
    }
}

#[inline]
fn standard_id(address: u8) -> StandardId {
    // An 8-bit address always fits the 11-bit standard identifier.
    StandardId::new(u16::from(address)).unwrap_or(StandardId::MAX)
}

#[inline]
fn frame(address: u8, payload: [u8; 8]) -> Frame {
    Frame::new_data(standard_id(address), Data::from(payload))
}

/// Sentinel frame entering MIT control. Must precede any [`command`] frame.
pub fn enter_control(address: u8) -> Frame {
    frame(address, ENTER_CONTROL)
}

/// Sentinel frame setting the current position as origin.
pub fn set_origin(address: u8) -> Frame {
    frame(address, SET_ORIGIN)
}

/// Sentinel frame leaving MIT control.
pub fn exit_control(address: u8) -> Frame {
    frame(address, EXIT_CONTROL)
}

/// Data frame carrying `command` for an actuator of type `model`.
pub fn command(address: u8, model: Model, command: &MitCommand) -> Frame {
    frame(address, command.pack(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxcan::Id;

    #[test]
    fn shared_ranges_are_valid() {
        assert_eq!(FixedRange::new(-12.5, 12.5, 16), Ok(POSITION_RANGE));
        assert_eq!(FixedRange::new(0.0, 500.0, 12), Ok(KP_RANGE));
        assert_eq!(FixedRange::new(0.0, 5.0, 12), Ok(KD_RANGE));
    }

    #[test]
    fn lower_bounds_pack_to_zero() {
        for model in Model::ALL {
            let cmd = MitCommand::new(
                -12.5,
                -model.max_velocity(),
                0.0,
                0.0,
                -model.max_torque(),
            );
            assert_eq!(cmd.pack(model), [0u8; 8]);
        }
    }

    #[test]
    fn physical_zero_packs_to_midscale() {
        let cmd = MitCommand::default();
        assert_eq!(
            cmd.pack(Model::Ak80_8),
            [0x7F, 0xFF, 0x7F, 0xF0, 0x00, 0x00, 0x07, 0xFF]
        );
    }

    #[test]
    fn max_position_fills_position_bits() {
        let cmd = MitCommand {
            position: 12.5,
            ..MitCommand::default()
        };
        let data = cmd.pack(Model::Ak60_6);
        assert_eq!(u16::from_be_bytes([data[0], data[1]]), 0xFFFF);

        let cmd = MitCommand {
            position: 400.0,
            ..MitCommand::default()
        };
        let data = cmd.pack(Model::Ak60_6);
        assert_eq!(&data[..2], &[0xFF, 0xFF]);
    }

    #[test]
    fn gains_land_in_split_nibbles() {
        let model = Model::Ak80_9;
        let cmd = MitCommand::new(-12.5, -50.0, 500.0, 5.0, -18.0);
        assert_eq!(
            cmd.pack(model),
            [0x00, 0x00, 0x00, 0x0F, 0xFF, 0xFF, 0xF0, 0x00]
        );

        let cmd = MitCommand::new(-12.5, 50.0, 0.0, 0.0, 18.0);
        assert_eq!(
            cmd.pack(model),
            [0x00, 0x00, 0xFF, 0xF0, 0x00, 0x00, 0x0F, 0xFF]
        );
    }

    #[test]
    fn unpack_recovers_fields() {
        let model = Model::Ak70_10;
        let cmd = MitCommand::new(1.25, -10.0, 42.0, 1.5, 7.0);
        let back = MitCommand::unpack(&cmd.pack(model), model);

        assert!((back.position - cmd.position).abs() <= POSITION_RANGE.resolution());
        assert!((back.velocity - cmd.velocity).abs() <= model.velocity_range().resolution());
        assert!((back.kp - cmd.kp).abs() <= KP_RANGE.resolution());
        assert!((back.kd - cmd.kd).abs() <= KD_RANGE.resolution());
        assert!((back.torque - cmd.torque).abs() <= model.torque_range().resolution());
    }

    #[test]
    fn every_address_is_its_own_standard_id() {
        for address in 0..=u8::MAX {
            assert_eq!(standard_id(address).as_raw(), u16::from(address));
            match exit_control(address).id() {
                Id::Standard(id) => assert_eq!(id.as_raw(), u16::from(address)),
                Id::Extended(_) => panic!("MIT frames must use standard ids"),
            }
        }
    }

    #[test]
    fn frames_use_standard_address_id() {
        let frames = [
            (enter_control(0x21), ENTER_CONTROL),
            (set_origin(0x21), SET_ORIGIN),
            (exit_control(0x21), EXIT_CONTROL),
        ];
        for (frame, payload) in frames.iter() {
            match frame.id() {
                Id::Standard(id) => assert_eq!(id.as_raw(), 0x21),
                Id::Extended(_) => panic!("MIT frames must use standard ids"),
            }
            assert_eq!(frame.data().map(|d| &d[..]), Some(&payload[..]));
        }

        let cmd = MitCommand::default();
        let frame = command(0x21, Model::Ak80_8, &cmd);
        assert_eq!(frame.dlc(), 8);
        assert_eq!(
            frame.data().map(|d| &d[..]),
            Some(&cmd.pack(Model::Ak80_8)[..])
        );
    }
}
