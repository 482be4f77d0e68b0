// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-point helpers shared by the servo and MIT codecs.
//!
//! MIT frames carry every physical quantity as an unsigned code of a fixed bit width, linearly
//! mapped from a known range:
//!
//! ```text
//! code  = (clamp(x, min, max) - min) * (2^bits - 1) / (max - min)
//! value = code * (max - min) / (2^bits - 1) + min
//! ```
//!
//! Codes are truncated, so a round trip loses at most one LSB.
//!
//! Servo frames carry scaled integers instead; [`append_i16`] and [`append_i32`] write those into
//! the payload buffer most-significant byte first.

use super::Error;

/// Widest supported fixed-point field.
pub const MAX_BITS: u8 = 16;

/// A validated `[min, max]` range mapped onto `bits`-wide unsigned codes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRange {
    min: f32,
    max: f32,
    bits: u8,
}

impl FixedRange {
    /// Build a range, rejecting zero-width, inverted or non-finite bounds and unsupported widths.
    pub fn new(min: f32, max: f32, bits: u8) -> Result<Self, Error> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(Error::InvalidRange);
        }
        if bits == 0 || bits > MAX_BITS {
            return Err(Error::InvalidBitWidth(bits));
        }
        Ok(Self { min, max, bits })
    }

    /// Range `[-limit, +limit]`.
    #[inline]
    pub fn symmetric(limit: f32, bits: u8) -> Result<Self, Error> {
        Self::new(-limit, limit, bits)
    }

    /// Build a range from constants already known to be valid.
    ///
    /// Only used for the fixed protocol tables; those are checked against [`FixedRange::new`] in
    /// the unit tests.
    #[inline]
    pub(crate) const fn from_parts(min: f32, max: f32, bits: u8) -> Self {
        Self { min, max, bits }
    }

    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Largest code of this width, `2^bits - 1`.
    #[inline]
    pub fn max_code(&self) -> u16 {
        ((1u32 << self.bits) - 1) as u16
    }

    /// Physical size of one LSB.
    #[inline]
    pub fn resolution(&self) -> f32 {
        (self.max - self.min) / f32::from(self.max_code())
    }

    /// Clamp `value` into the range and convert it to a code.
    ///
    /// `min` maps to 0 and `max` to [`max_code`](Self::max_code) exactly. NaN maps to 0.
    pub fn encode(&self, value: f32) -> u16 {
        let max_code = self.max_code();

        if value.is_nan() || value <= self.min {
            return 0;
        }
        if value >= self.max {
            return max_code;
        }

        let scaled = (value - self.min) * f32::from(max_code) / (self.max - self.min);
        // `as` saturates, the `min` only guards float rounding just below `max`.
        (scaled as u16).min(max_code)
    }

    /// Convert a code back to a physical value. Bits above the field width are ignored.
    pub fn decode(&self, code: u16) -> f32 {
        let max_code = self.max_code();
        let code = code & max_code;
        f32::from(code) * (self.max - self.min) / f32::from(max_code) + self.min
    }
}

/// One-shot float -> code conversion.
///
/// Prefer building a [`FixedRange`] once when the same range is used repeatedly.
pub fn float_to_uint(value: f32, min: f32, max: f32, bits: u8) -> Result<u16, Error> {
    Ok(FixedRange::new(min, max, bits)?.encode(value))
}

/// One-shot code -> float conversion.
pub fn uint_to_float(code: u16, min: f32, max: f32, bits: u8) -> Result<f32, Error> {
    Ok(FixedRange::new(min, max, bits)?.decode(code))
}

/// Write `value` big-endian at `buffer[*index..]` and advance `index` by 2.
///
/// The caller keeps the total within the frame; overrunning `buffer` panics.
#[inline]
pub fn append_i16(buffer: &mut [u8], value: i16, index: &mut usize) {
    debug_assert!(*index + 2 <= buffer.len());
    buffer[*index..*index + 2].copy_from_slice(&value.to_be_bytes());
    *index += 2;
}

/// Write `value` big-endian at `buffer[*index..]` and advance `index` by 4.
///
/// The caller keeps the total within the frame; overrunning `buffer` panics.
#[inline]
pub fn append_i32(buffer: &mut [u8], value: i32, index: &mut usize) {
    debug_assert!(*index + 4 <= buffer.len());
    buffer[*index..*index + 4].copy_from_slice(&value.to_be_bytes());
    *index += 4;
}
