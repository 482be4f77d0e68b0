// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART link to the host tool.
//!
//! Receives command bytes for the [`LineParser`](crate::protocol::LineParser) and echoes
//! telemetry back, one line per sample:
//!
//! ```text
//! pos,vel,cur,temp,err\r\n
//! ```
//!
//! Floats are printed with two decimals.

use core::fmt::{self, Write};
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Rx, Serial, Tx},
};

use crate::protocol::Telemetry;

pub struct Usart<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        Self { tx, rx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Next received byte, if one is waiting. Receive errors drop the byte.
    pub fn read_byte(&mut self) -> Option<u8> {
        match self.rx.read() {
            Ok(b) => Some(b),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                trace!("usart: rx error");
                None
            }
        }
    }

    /// Write one telemetry echo line.
    pub fn write_telemetry(&mut self, t: &Telemetry) -> fmt::Result {
        write!(
            self,
            "{:.2},{:.2},{:.2},{},{}\r\n",
            t.position, t.velocity, t.current, t.temperature, t.error_code
        )
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}
