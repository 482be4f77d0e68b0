// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-capacity table of actuators sharing one bus.
//!
//! Every registered actuator owns one [`Device`] record holding its last decoded telemetry. The
//! receive path hands each frame to [`Registry::on_frame`], which finds the record by source
//! address and overwrites its telemetry.
//!
//! Each successful registration is stamped with a generation number. A [`Handle`] only removes
//! the record it was issued for, so a stale copy cannot unregister a later actuator that reused
//! the same address.

use core::fmt;

use bxcan::Frame;
use heapless::Vec;

use crate::protocol::{Model, RawTelemetry, Telemetry, WireFormat};

/// Error type for [`Registry`] operations.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No free slot left.
    Full,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Full => f.write_str("device registry full"),
        }
    }
}

/// One registered actuator and its last known state.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Device {
    pub address: u8,
    pub model: Model,
    pub telemetry: Telemetry,
}

/// Returned by [`Registry::register`].
///
/// A handle with [`id_conflict`](Handle::id_conflict) set was not inserted: another actuator
/// already uses the address.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    address: u8,
    model: Model,
    id_conflict: bool,
    generation: u32,
}

impl Handle {
    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[inline]
    pub fn model(&self) -> Model {
        self.model
    }

    #[inline]
    pub fn id_conflict(&self) -> bool {
        self.id_conflict
    }
}

struct Entry {
    device: Device,
    generation: u32,
}

/// Up to `N` actuators, unique by address.
pub struct Registry<const N: usize> {
    entries: Vec<Entry, N>,
    next_generation: u32,
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_generation: 0,
        }
    }

    /// Add an actuator with zeroed telemetry.
    pub fn register(&mut self, address: u8, model: Model) -> Result<Handle, Error> {
        if self.find(address).is_some() {
            warn!("registry: address {} already registered", address);
            return Ok(Handle {
                address,
                model,
                id_conflict: true,
                generation: 0,
            });
        }

        let generation = self.next_generation;
        self.entries
            .push(Entry {
                device: Device {
                    address,
                    model,
                    telemetry: Telemetry::default(),
                },
                generation,
            })
            .map_err(|_| Error::Full)?;
        self.next_generation = generation.wrapping_add(1);

        Ok(Handle {
            address,
            model,
            id_conflict: false,
            generation,
        })
    }

    /// Remove the record behind `handle`.
    ///
    /// Conflicting handles never owned a record and remove nothing. Neither does a handle whose
    /// record was already removed, even if the address has been registered again since.
    pub fn unregister(&mut self, handle: Handle) -> Option<Device> {
        if handle.id_conflict {
            return None;
        }
        let index = self.entries.iter().position(|e| {
            e.device.address == handle.address && e.generation == handle.generation
        })?;
        Some(self.entries.swap_remove(index).device)
    }

    pub fn find(&self, address: u8) -> Option<&Device> {
        self.iter().find(|d| d.address == address)
    }

    pub fn find_mut(&mut self, address: u8) -> Option<&mut Device> {
        self.entries
            .iter_mut()
            .map(|e| &mut e.device)
            .find(|d| d.address == address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.entries.iter().map(|e| &e.device)
    }

    /// Decode a reply from `address` into its record. Returns `false` if nobody owns `address`.
    pub fn decode(&mut self, address: u8, data: &[u8; 8], format: WireFormat) -> bool {
        match self.find_mut(address) {
            Some(device) => {
                device.telemetry = Telemetry::decode(data, format, device.model);
                true
            }
            None => {
                trace!("registry: reply from unknown address {}", address);
                false
            }
        }
    }

    /// Entry point for the receive path. Remote and short frames are ignored.
    pub fn on_frame(&mut self, frame: &Frame) -> bool {
        match RawTelemetry::from_frame(frame) {
            Some(raw) => self.decode(raw.address, &raw.data, raw.format),
            None => {
                warn!("registry: malformed reply dropped (dlc {})", frame.dlc());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxcan::{Data, ExtendedId, StandardId};

    #[test]
    fn register_and_find() {
        let mut reg = Registry::<4>::new();
        assert!(reg.is_empty());

        let h = reg.register(0x68, Model::Ak80_8).unwrap();
        assert!(!h.id_conflict());
        assert_eq!(h.address(), 0x68);
        assert_eq!(reg.len(), 1);

        let dev = reg.find(0x68).unwrap();
        assert_eq!(dev.model, Model::Ak80_8);
        assert_eq!(dev.telemetry, Telemetry::default());
        assert!(reg.find(0x69).is_none());
    }

    #[test]
    fn conflict_is_flagged_not_inserted() {
        let mut reg = Registry::<4>::new();
        reg.register(3, Model::Ak60_6).unwrap();
        let dup = reg.register(3, Model::Ak10_9).unwrap();
        assert!(dup.id_conflict());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find(3).unwrap().model, Model::Ak60_6);

        // Dropping the conflicting handle leaves the first registration alone.
        assert_eq!(reg.unregister(dup), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn full_registry() {
        let mut reg = Registry::<2>::new();
        reg.register(1, Model::Ak80_9).unwrap();
        reg.register(2, Model::Ak80_9).unwrap();
        assert_eq!(reg.register(3, Model::Ak80_9), Err(Error::Full));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn unregister_frees_slot() {
        let mut reg = Registry::<2>::new();
        let a = reg.register(1, Model::Ak80_9).unwrap();
        reg.register(2, Model::Ak80_9).unwrap();

        let removed = reg.unregister(a).unwrap();
        assert_eq!(removed.address, 1);
        assert!(reg.find(1).is_none());
        assert_eq!(reg.unregister(a), None);

        assert!(reg.register(5, Model::Ak70_10).is_ok());
        let mut addresses: [u8; 2] = [0; 2];
        for (slot, dev) in addresses.iter_mut().zip(reg.iter()) {
            *slot = dev.address;
        }
        addresses.sort_unstable();
        assert_eq!(addresses, [2, 5]);
    }

    #[test]
    fn stale_handle_leaves_reused_address_alone() {
        let mut reg = Registry::<2>::new();
        let old = reg.register(7, Model::Ak80_9).unwrap();
        assert!(reg.unregister(old).is_some());

        let new = reg.register(7, Model::Ak60_6).unwrap();
        assert!(!new.id_conflict());
        assert_ne!(old, new);

        assert_eq!(reg.unregister(old), None);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find(7).unwrap().model, Model::Ak60_6);

        let removed = reg.unregister(new).unwrap();
        assert_eq!(removed.model, Model::Ak60_6);
        assert!(reg.is_empty());
    }

    #[test]
    fn servo_frame_updates_matching_record() {
        let mut reg = Registry::<4>::new();
        reg.register(0x68, Model::Ak80_8).unwrap();
        reg.register(0x10, Model::Ak80_8).unwrap();

        let payload = [0x03, 0x84, 0x00, 0x0A, 0x00, 0x64, 35, 0];
        let frame = Frame::new_data(ExtendedId::new(0x2968).unwrap(), Data::from(payload));
        assert!(reg.on_frame(&frame));

        let t = reg.find(0x68).unwrap().telemetry;
        assert!((t.position - 90.0).abs() < 1e-3);
        assert!((t.velocity - 100.0).abs() < 1e-3);
        assert!((t.current - 1.0).abs() < 1e-3);
        assert_eq!(t.temperature, 35);
        assert_eq!(reg.find(0x10).unwrap().telemetry, Telemetry::default());
    }

    #[test]
    fn mit_frame_uses_device_model() {
        let mut reg = Registry::<4>::new();
        reg.register(0x01, Model::Ak80_80_64).unwrap();

        let payload = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 20, 0];
        let frame = Frame::new_data(StandardId::new(0x000).unwrap(), Data::from(payload));
        assert!(reg.on_frame(&frame));

        let t = reg.find(0x01).unwrap().telemetry;
        assert!((t.position - 12.5).abs() < 1e-3);
        assert!((t.velocity - 8.0).abs() < 1e-3);
        assert!((t.current - 144.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_and_malformed_frames_are_dropped() {
        let mut reg = Registry::<4>::new();
        reg.register(0x01, Model::Ak80_8).unwrap();

        let stranger = Frame::new_data(StandardId::new(0x2).unwrap(), Data::from([0x02; 8]));
        assert!(!reg.on_frame(&stranger));

        let short = Frame::new_data(StandardId::new(0x1).unwrap(), Data::from([0x01, 0, 0]));
        assert!(!reg.on_frame(&short));

        let remote = Frame::new_remote(StandardId::new(0x1).unwrap(), 8);
        assert!(!reg.on_frame(&remote));

        assert_eq!(reg.find(0x01).unwrap().telemetry, Telemetry::default());
    }
}
