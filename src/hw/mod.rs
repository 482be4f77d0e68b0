// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Hardware Abstraction Layer
//!
//! - [`can`] - bxcan bus wrapper and the [`Transport`] seam the drivers send through.
//! - `usart` - host serial link (firmware builds only).

pub mod can;
#[cfg(feature = "firmware")]
pub mod usart;

pub use can::{tx_code, BusConfig, CanBus, CanTx, Transport, TxError};
#[cfg(feature = "firmware")]
pub use usart::Usart;
