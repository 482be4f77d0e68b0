// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AK actuator models.
//!
//! MIT-mode velocity and torque fields are scaled against per-model limits; every other field
//! range is shared by the whole family.

use core::convert::TryFrom;

use super::fixed::FixedRange;
use super::Error;

/// Supported CubeMars AK actuators, in the order of the vendor's model table.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Ak10_9 = 0,
    Ak60_6,
    Ak70_10,
    Ak80_6,
    Ak80_9,
    Ak80_80_64,
    Ak80_8,
}

/// `(max velocity [rad/s], max torque [N·m])`, indexed by `Model as usize`.
const MIT_LIMITS: [(f32, f32); 7] = [
    (50.0, 65.0),
    (45.0, 15.0),
    (50.0, 25.0),
    (76.0, 12.0),
    (50.0, 18.0),
    (8.0, 144.0),
    (37.5, 32.0),
];

/// Bit width of the MIT velocity and torque fields.
const MIT_FIELD_BITS: u8 = 12;

impl Model {
    /// All models, table order.
    pub const ALL: [Model; 7] = [
        Model::Ak10_9,
        Model::Ak60_6,
        Model::Ak70_10,
        Model::Ak80_6,
        Model::Ak80_9,
        Model::Ak80_80_64,
        Model::Ak80_8,
    ];

    /// MIT-mode velocity limit in rad/s (symmetric).
    #[inline]
    pub fn max_velocity(self) -> f32 {
        MIT_LIMITS[self as usize].0
    }

    /// MIT-mode torque limit in N·m (symmetric).
    #[inline]
    pub fn max_torque(self) -> f32 {
        MIT_LIMITS[self as usize].1
    }

    /// Fixed-point range of the MIT velocity field.
    #[inline]
    pub fn velocity_range(self) -> FixedRange {
        let v = self.max_velocity();
        FixedRange::from_parts(-v, v, MIT_FIELD_BITS)
    }

    /// Fixed-point range of the MIT torque field.
    #[inline]
    pub fn torque_range(self) -> FixedRange {
        let t = self.max_torque();
        FixedRange::from_parts(-t, t, MIT_FIELD_BITS)
    }
}

impl TryFrom<u8> for Model {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Error> {
        Model::ALL
            .get(index as usize)
            .copied()
            .ok_or(Error::UnknownModel(index))
    }
}

impl From<Model> for u8 {
    fn from(model: Model) -> Self {
        model as u8
    }
}
