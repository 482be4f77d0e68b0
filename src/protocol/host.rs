// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line parser for the serial host protocol.
//!
//! The desktop tool sends one command per line, terminated by `\r\n`:
//!
//! ```text
//! origin\r\n
//! 1.50,0.00,20.00,0.50,0.00\r\n
//! ```
//!
//! `origin` re-zeroes the actuator. Any other line is up to five comma-separated numbers; missing
//! trailing fields read as 0. How the numbers are used depends on the active mode: MIT takes
//! `(position, velocity, kp, kd, torque)`, servo takes `(position, rpm, current)` and acts on the
//! first nonzero one (see [`servo_request`]).

use heapless::Vec;

/// Keyword requesting a new origin.
pub const ORIGIN_KEYWORD: &[u8] = b"origin";

/// Number of setpoint fields a line may carry.
pub const SETPOINT_FIELDS: usize = 5;

/// A complete host command.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCommand {
    SetOrigin,
    Setpoint([f32; SETPOINT_FIELDS]),
}

/// One servo-mode setpoint taken from a host line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServoRequest {
    /// Position [deg].
    Position(f32),
    /// Electrical speed [ERPM].
    Rpm(f32),
    /// Phase current [mA].
    Current(f32),
}

/// Read setpoint fields as `(position, rpm, current)`.
///
/// Position wins over rpm, rpm over current; the first nonzero field selects the command. An
/// all-zero line selects nothing and the actuator keeps its last command.
pub fn servo_request(values: &[f32; SETPOINT_FIELDS]) -> Option<ServoRequest> {
    let [position, rpm, current, ..] = *values;
    if position != 0.0 {
        Some(ServoRequest::Position(position))
    } else if rpm != 0.0 {
        Some(ServoRequest::Rpm(rpm))
    } else if current != 0.0 {
        Some(ServoRequest::Current(current))
    } else {
        None
    }
}

enum State {
    /// Collecting bytes of the current line.
    Line,
    /// Line overflowed; drop bytes until the next terminator.
    Discard,
}

/// Byte-at-a-time parser with an `N`-byte line buffer.
pub struct LineParser<const N: usize> {
    state: State,
    line: Vec<u8, N>,
}

impl<const N: usize> Default for LineParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineParser<N> {
    pub fn new() -> Self {
        Self {
            state: State::Line,
            line: Vec::new(),
        }
    }

    /// Process a single incoming byte. Returns `Some(HostCommand)` when a valid line completes.
    pub fn push(&mut self, byte: u8) -> Option<HostCommand> {
        match self.state {
            State::Line => {
                if byte == b'\n' {
                    let command = parse_line(&self.line);
                    self.line.clear();
                    return command;
                }
                if self.line.push(byte).is_err() {
                    debug!("host: line longer than {} bytes dropped", N);
                    self.line.clear();
                    self.state = State::Discard;
                }
            }
            State::Discard => {
                if byte == b'\n' {
                    self.state = State::Line;
                }
            }
        }
        None
    }
}

/// Parse one line without its `\n`. A trailing `\r` is ignored.
pub fn parse_line(line: &[u8]) -> Option<HostCommand> {
    let line = match line.split_last() {
        Some((&b'\r', rest)) => rest,
        _ => line,
    };

    if line == ORIGIN_KEYWORD {
        return Some(HostCommand::SetOrigin);
    }

    let text = core::str::from_utf8(line).ok()?;
    if text.trim().is_empty() {
        return None;
    }

    let mut values = [0.0f32; SETPOINT_FIELDS];
    for (i, field) in text.split(',').enumerate() {
        if i >= SETPOINT_FIELDS {
            debug!("host: too many fields");
            return None;
        }
        match field.trim().parse::<f32>() {
            Ok(v) => values[i] = v,
            Err(_) => {
                debug!("host: unparsable field {}", i);
                return None;
            }
        }
    }

    Some(HostCommand::Setpoint(values))
}
