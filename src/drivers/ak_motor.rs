// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CubeMars AK-series actuator over CAN.
//!
//! One [`AkMotor`] per actuator. Servo-mode and MIT-mode commands go out through any
//! [`Transport`]; replies are decoded separately by the
//! [`Registry`](crate::drivers::Registry), so nothing here waits for a response.
//!
//! ```text
//! servo: ExtID = kind << 8 | address   payload 0, 4 or 8 bytes
//! MIT:   StdID = address               payload 8 bytes
//! ```

use crate::hw::can::{Transport, TxError};
use crate::protocol::{mit, servo, MitCommand, Model, OriginMode, ServoLimits, ServoRequest};

use super::registry::Handle;

/// Command side of a single actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AkMotor {
    address: u8,
    model: Model,
    limits: ServoLimits,
}

impl AkMotor {
    /// Create a handle for the actuator at `address` with default servo limits.
    pub fn new(address: u8, model: Model) -> Self {
        Self {
            address,
            model,
            limits: ServoLimits::default(),
        }
    }

    /// Create from a registry handle.
    pub fn from_handle(handle: &Handle) -> Self {
        Self::new(handle.address(), handle.model())
    }

    /// Replace the servo-mode clamp limits.
    pub fn with_limits(mut self, limits: ServoLimits) -> Self {
        self.limits = limits;
        self
    }

    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    #[inline]
    pub fn model(&self) -> Model {
        self.model
    }

    #[inline]
    pub fn limits(&self) -> &ServoLimits {
        &self.limits
    }

    /// Servo mode: PWM duty cycle.
    pub fn set_duty<T: Transport>(&self, bus: &mut T, duty: f32) -> Result<(), TxError> {
        bus.transmit(&servo::duty(self.address, duty, &self.limits))
    }

    /// Servo mode: phase current [mA].
    pub fn set_current<T: Transport>(&self, bus: &mut T, current_ma: f32) -> Result<(), TxError> {
        bus.transmit(&servo::current(self.address, current_ma, &self.limits))
    }

    /// Servo mode: braking current [mA].
    pub fn set_current_brake<T: Transport>(
        &self,
        bus: &mut T,
        current_ma: f32,
    ) -> Result<(), TxError> {
        bus.transmit(&servo::current_brake(self.address, current_ma, &self.limits))
    }

    /// Servo mode: electrical speed [ERPM].
    pub fn set_rpm<T: Transport>(&self, bus: &mut T, erpm: f32) -> Result<(), TxError> {
        bus.transmit(&servo::velocity(self.address, erpm, &self.limits))
    }

    /// Servo mode: position [deg].
    pub fn set_position<T: Transport>(&self, bus: &mut T, deg: f32) -> Result<(), TxError> {
        bus.transmit(&servo::position(self.address, deg, &self.limits))
    }

    /// Servo mode: zero the position at the current shaft angle.
    ///
    /// The driver applies its own origin behavior; `mode` is not carried on the wire.
    pub fn set_origin<T: Transport>(&self, bus: &mut T, mode: OriginMode) -> Result<(), TxError> {
        debug!("ak {}: set origin ({})", self.address, mode as u8);
        bus.transmit(&servo::set_origin(self.address, mode))
    }

    /// Servo mode: position [deg] with speed and acceleration limits.
    pub fn set_position_velocity<T: Transport>(
        &self,
        bus: &mut T,
        deg: f32,
        speed: f32,
        acceleration: f32,
    ) -> Result<(), TxError> {
        bus.transmit(&servo::position_velocity(
            self.address,
            deg,
            speed,
            acceleration,
            &self.limits,
        ))
    }

    /// Servo mode: send whichever setpoint `request` carries.
    pub fn servo_send<T: Transport>(
        &self,
        bus: &mut T,
        request: ServoRequest,
    ) -> Result<(), TxError> {
        match request {
            ServoRequest::Position(deg) => self.set_position(bus, deg),
            ServoRequest::Rpm(erpm) => self.set_rpm(bus, erpm),
            ServoRequest::Current(current_ma) => self.set_current(bus, current_ma),
        }
    }

    /// MIT mode: enter motor control. Required before [`mit_send`](Self::mit_send).
    pub fn mit_enter<T: Transport>(&self, bus: &mut T) -> Result<(), TxError> {
        debug!("ak {}: enter MIT control", self.address);
        bus.transmit(&mit::enter_control(self.address))
    }

    /// MIT mode: zero the position at the current shaft angle.
    pub fn mit_set_origin<T: Transport>(&self, bus: &mut T) -> Result<(), TxError> {
        debug!("ak {}: MIT set origin", self.address);
        bus.transmit(&mit::set_origin(self.address))
    }

    /// MIT mode: send one setpoint.
    pub fn mit_send<T: Transport>(&self, bus: &mut T, command: &MitCommand) -> Result<(), TxError> {
        trace!("ak {}: MIT command", self.address);
        bus.transmit(&mit::command(self.address, self.model, command))
    }

    /// MIT mode: leave motor control.
    pub fn mit_exit<T: Transport>(&self, bus: &mut T) -> Result<(), TxError> {
        debug!("ak {}: exit MIT control", self.address);
        bus.transmit(&mit::exit_control(self.address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxcan::{Frame, Id};
    use heapless::Vec;

    struct MockBus {
        sent: Vec<Frame, 8>,
        fail: Option<TxError>,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                fail: None,
            }
        }

        fn last(&self) -> &Frame {
            self.sent.last().unwrap()
        }
    }

    impl Transport for MockBus {
        fn transmit(&mut self, frame: &Frame) -> Result<(), TxError> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            self.sent.push(frame.clone()).unwrap();
            Ok(())
        }
    }

    fn payload(frame: &Frame) -> &[u8] {
        frame.data().map(|d| &d[..]).unwrap_or(&[])
    }

    fn raw_id(frame: &Frame) -> u32 {
        match frame.id() {
            Id::Standard(id) => u32::from(id.as_raw()),
            Id::Extended(id) => id.as_raw(),
        }
    }

    #[test]
    fn servo_commands_use_extended_ids() {
        let motor = AkMotor::new(0x68, Model::Ak80_8);
        let mut bus = MockBus::new();

        motor.set_duty(&mut bus, 0.5).unwrap();
        assert_eq!(raw_id(bus.last()), 0x068);
        assert_eq!(payload(bus.last()), &50_000i32.to_be_bytes());

        motor.set_current(&mut bus, -1500.0).unwrap();
        assert_eq!(raw_id(bus.last()), 0x168);
        assert_eq!(payload(bus.last()), &(-1_500_000i32).to_be_bytes());

        motor.set_current_brake(&mut bus, 2000.0).unwrap();
        assert_eq!(raw_id(bus.last()), 0x268);

        motor.set_rpm(&mut bus, 5000.0).unwrap();
        assert_eq!(raw_id(bus.last()), 0x368);
        assert_eq!(payload(bus.last()), &5000i32.to_be_bytes());

        motor.set_position(&mut bus, 90.0).unwrap();
        assert_eq!(raw_id(bus.last()), 0x468);
        assert_eq!(payload(bus.last()), &900_000i32.to_be_bytes());

        motor
            .set_origin(&mut bus, OriginMode::Permanent)
            .unwrap();
        assert_eq!(raw_id(bus.last()), 0x568);
        assert!(payload(bus.last()).is_empty());

        motor
            .set_position_velocity(&mut bus, 10.0, 1000.0, 500.0)
            .unwrap();
        assert_eq!(raw_id(bus.last()), 0x668);
        assert_eq!(
            payload(bus.last()),
            &[0x00, 0x01, 0x86, 0xA0, 0x03, 0xE8, 0x01, 0xF4]
        );

        assert!(bus.sent.iter().all(|f| matches!(f.id(), Id::Extended(_))));
    }

    #[test]
    fn custom_limits_clamp() {
        let limits = ServoLimits::default().with_max_current(1000.0);
        let motor = AkMotor::new(1, Model::Ak60_6).with_limits(limits);
        let mut bus = MockBus::new();

        motor.set_current(&mut bus, 50_000.0).unwrap();
        assert_eq!(payload(bus.last()), &1_000_000i32.to_be_bytes());
    }

    #[test]
    fn servo_request_selects_command_kind() {
        let motor = AkMotor::new(0x68, Model::Ak80_8);
        let mut bus = MockBus::new();

        motor.servo_send(&mut bus, ServoRequest::Position(90.0)).unwrap();
        assert_eq!(raw_id(bus.last()), 0x468);
        assert_eq!(payload(bus.last()), &900_000i32.to_be_bytes());

        motor.servo_send(&mut bus, ServoRequest::Rpm(5000.0)).unwrap();
        assert_eq!(raw_id(bus.last()), 0x368);

        motor.servo_send(&mut bus, ServoRequest::Current(-1500.0)).unwrap();
        assert_eq!(raw_id(bus.last()), 0x168);
        assert_eq!(payload(bus.last()), &(-1_500_000i32).to_be_bytes());
    }

    #[test]
    fn mit_sequence() {
        let motor = AkMotor::new(0x01, Model::Ak80_8);
        let mut bus = MockBus::new();

        motor.mit_enter(&mut bus).unwrap();
        motor.mit_set_origin(&mut bus).unwrap();
        motor.mit_send(&mut bus, &MitCommand::default()).unwrap();
        motor.mit_exit(&mut bus).unwrap();

        assert_eq!(bus.sent.len(), 4);
        assert!(bus.sent.iter().all(|f| raw_id(f) == 0x01));
        assert!(bus.sent.iter().all(|f| matches!(f.id(), Id::Standard(_))));
        assert_eq!(payload(&bus.sent[0]), &mit::ENTER_CONTROL);
        assert_eq!(payload(&bus.sent[1]), &mit::SET_ORIGIN);
        assert_eq!(
            payload(&bus.sent[2]),
            &[0x7F, 0xFF, 0x7F, 0xF0, 0x00, 0x00, 0x07, 0xFF]
        );
        assert_eq!(payload(&bus.sent[3]), &mit::EXIT_CONTROL);
    }

    #[test]
    fn transport_errors_pass_through() {
        let motor = AkMotor::new(0x01, Model::Ak80_8);
        let mut bus = MockBus::new();

        bus.fail = Some(TxError::MailboxFull);
        assert_eq!(motor.set_rpm(&mut bus, 100.0), Err(TxError::MailboxFull));

        bus.fail = Some(TxError::Timeout);
        assert_eq!(
            motor.mit_send(&mut bus, &MitCommand::default()),
            Err(TxError::Timeout)
        );
        assert!(bus.sent.is_empty());
    }
}
