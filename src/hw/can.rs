// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Controller Area Network (CAN) abstraction layer.
//!
//! - [`Transport`] is the contract the actuator drivers send through.
//! - [`CanBus`] wraps a `bxcan::Can` instance and configures it from a [`BusConfig`].
//! - [`CanTx`] is the transmit half after [`CanBus::split`]; it implements [`Transport`] with a
//!   bounded wait for the mailboxes to drain.

use core::fmt;

use bxcan::{self, filter::Mask32, Fifo, Frame, Interrupt, OverrunError, Rx0, Tx};
use nb::block;

/// Transmit failure reported by a [`Transport`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    /// Every TX mailbox holds a frame of equal or higher priority.
    MailboxFull,
    /// The frame was queued but the mailboxes did not drain in time; the request was aborted.
    Timeout,
}

impl TxError {
    /// Numeric status: 1 = mailbox full, 2 = timeout.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            TxError::MailboxFull => 1,
            TxError::Timeout => 2,
        }
    }
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::MailboxFull => f.write_str("CAN TX mailboxes full"),
            TxError::Timeout => f.write_str("CAN TX timed out and was aborted"),
        }
    }
}

/// Numeric status of a transmit result: 0 = success, otherwise [`TxError::code`].
#[inline]
pub fn tx_code(result: &Result<(), TxError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => e.code(),
    }
}

/// Anything that can put a CAN frame on the bus.
///
/// Implementations must not retry; the result goes back to the caller unchanged.
pub trait Transport {
    fn transmit(&mut self, frame: &Frame) -> Result<(), TxError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    #[inline]
    fn transmit(&mut self, frame: &Frame) -> Result<(), TxError> {
        (**self).transmit(frame)
    }
}

/// Bus configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// CAN_BTR value (bit timing). Get this from the reference manual or the bxcan timing tables.
    pub btr: u32,
    /// Internal loopback.
    pub loopback: bool,
    /// Silent (listen-only) mode.
    pub silent: bool,
    /// Spin iterations to wait for the TX mailboxes to drain before aborting.
    pub tx_timeout_spins: u32,
}

impl Default for BusConfig {
    /// 1 Mbit/s with a 16 MHz APB1 clock: BRP = 1, TS1 = 13, TS2 = 2, SJW = 1.
    fn default() -> Self {
        Self {
            btr: 0x001C_0000,
            loopback: false,
            silent: false,
            tx_timeout_spins: 0xFFF,
        }
    }
}

impl BusConfig {
    pub fn with_btr(mut self, btr: u32) -> Self {
        self.btr = btr;
        self
    }

    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    pub fn with_tx_timeout(mut self, spins: u32) -> Self {
        self.tx_timeout_spins = spins;
        self
    }
}

/// Wrapper around a bxcan CAN instance.
pub struct CanBus<I: bxcan::Instance> {
    can: bxcan::Can<I>,
    tx_timeout_spins: u32,
}

impl<I: bxcan::Instance> CanBus<I> {
    /// Create and enable a bxcan instance.
    ///
    /// Blocks until the peripheral has synchronized to the bus.
    pub fn new(instance: I, config: &BusConfig) -> Self {
        let can = bxcan::Can::builder(instance)
            .set_bit_timing(config.btr)
            .set_loopback(config.loopback)
            .set_silent(config.silent)
            .enable();
        info!("can: enabled, btr {:#x}", config.btr);

        Self {
            can,
            tx_timeout_spins: config.tx_timeout_spins,
        }
    }

    /// Access the underlying bxcan instance for advanced configuration.
    pub fn inner(&mut self) -> &mut bxcan::Can<I> {
        &mut self.can
    }

    /// Consume the wrapper and get back the underlying peripheral.
    pub fn free(self) -> I {
        self.can.free()
    }

    /// Raise the RX0 interrupt whenever FIFO0 holds a frame.
    pub fn listen_fifo0(&mut self) {
        self.can.enable_interrupt(Interrupt::Fifo0MessagePending);
    }

    /// Blocking receive of a frame.
    pub fn receive(&mut self) -> Result<Frame, OverrunError> {
        block!(self.can.receive())
    }

    /// Split into a transmit half for the foreground loop and FIFO0 for the receive interrupt.
    pub fn split(self) -> (CanTx<I>, Rx0<I>) {
        let timeout_spins = self.tx_timeout_spins;
        let (tx, rx0, _rx1) = self.can.split();
        (CanTx { tx, timeout_spins }, rx0)
    }
}

impl<I> CanBus<I>
where
    I: bxcan::Instance + bxcan::FilterOwner,
{
    /// Route every frame, standard and extended, into FIFO0.
    pub fn accept_all(&mut self) {
        self.can
            .modify_filters()
            .enable_bank(0, Fifo::Fifo0, Mask32::accept_all());
    }
}

/// Transmit half of a split [`CanBus`].
pub struct CanTx<I: bxcan::Instance> {
    tx: Tx<I>,
    timeout_spins: u32,
}

impl<I: bxcan::Instance> Transport for CanTx<I> {
    /// Queue `frame`, then wait until all mailboxes are empty.
    fn transmit(&mut self, frame: &Frame) -> Result<(), TxError> {
        let status = match self.tx.transmit(frame) {
            Ok(status) => status,
            Err(nb::Error::WouldBlock) => return Err(TxError::MailboxFull),
            Err(nb::Error::Other(never)) => match never {},
        };

        if status.dequeued_frame().is_some() {
            warn!("can: lower priority frame displaced from mailbox");
        }

        let mut spins: u32 = 0;
        while !self.tx.is_idle() {
            spins += 1;
            if spins > self.timeout_spins {
                self.tx.abort(status.mailbox());
                warn!("can: tx timeout after {} spins", spins);
                return Err(TxError::Timeout);
            }
            core::hint::spin_loop();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxcan::{Data, StandardId};

    struct Recorder {
        result: Result<(), TxError>,
        sent: usize,
    }

    impl Transport for Recorder {
        fn transmit(&mut self, _frame: &Frame) -> Result<(), TxError> {
            self.sent += 1;
            self.result
        }
    }

    fn send_via<T: Transport>(mut t: T, frame: &Frame) -> Result<(), TxError> {
        t.transmit(frame)
    }

    #[test]
    fn status_codes() {
        assert_eq!(tx_code(&Ok(())), 0);
        assert_eq!(tx_code(&Err(TxError::MailboxFull)), 1);
        assert_eq!(tx_code(&Err(TxError::Timeout)), 2);
    }

    #[test]
    fn mutable_reference_forwards() {
        let frame = Frame::new_data(StandardId::new(1).unwrap(), Data::empty());
        let mut recorder = Recorder {
            result: Err(TxError::Timeout),
            sent: 0,
        };
        assert_eq!(send_via(&mut recorder, &frame), Err(TxError::Timeout));
        assert_eq!(send_via(&mut recorder, &frame), Err(TxError::Timeout));
        assert_eq!(recorder.sent, 2);
    }

    #[test]
    fn default_bit_timing() {
        let cfg = BusConfig::default();
        // SJW = 1, TS2 = 2, TS1 = 13, BRP = 1 (register fields hold value - 1).
        assert_eq!((cfg.btr >> 24) & 0x3, 0);
        assert_eq!((cfg.btr >> 20) & 0x7, 1);
        assert_eq!((cfg.btr >> 16) & 0xF, 12);
        assert_eq!(cfg.btr & 0x3FF, 0);
        assert_eq!(cfg.tx_timeout_spins, 0xFFF);
    }
}
