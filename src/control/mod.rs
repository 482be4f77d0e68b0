// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! Reusable building blocks for closed-loop control on top of the actuator telemetry.
//!
//! ## Modules
//!
//! - [`pid`] - Positional and incremental PID controller.

pub mod pid;

pub use pid::{Pid, PidConfig, PidMode};
