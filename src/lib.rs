// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # AK Actuator Firmware
//!
//! Drive CubeMars AK-series actuators over CAN from an STM32F777 MCU, in servo mode or MIT mode,
//! and keep the last reported state of every actuator on the bus.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`protocol`] | Wire codecs: fixed-point mapping, servo/MIT frames, telemetry, host lines |
//! | [`hw`] | MCU-level wrappers around CAN and USART |
//! | [`drivers`] | AK actuator driver and the device registry |
//! | [`control`]   | Control algorithms (PID) |
//!
//! Everything except `hw::usart` and the binary builds on the host, so the codecs, the registry
//! and the controller are unit tested with plain `cargo test`.
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features firmware
//! ```
//!
//! With RTT logging:
//!
//! ```bash
//! cargo run --release --features firmware,defmt
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod control;
pub mod drivers;
pub mod hw;
pub mod protocol;
