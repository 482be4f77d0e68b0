// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Control loop for a single AK80-8 on CAN1, in MIT or servo mode (see [`MODE`]).
//!
//! - CAN1 on PA12/PA11, 1 Mbit/s. Replies are drained in the RX0 interrupt into the registry.
//! - USART1 on PA9/PA10, 115200 baud. Host lines set the setpoint or re-zero the actuator
//!   (`origin`). MIT reads `position,velocity,kp,kd,torque`; servo reads `position,rpm,current`
//!   and sends the first nonzero field.
//! - Every 25 ms the current setpoint is sent and the latest telemetry is echoed back.

#![no_main]
#![no_std]

#[macro_use]
#[path = "fmt.rs"]
mod fmt;

use core::cell::RefCell;

use cortex_m::interrupt::{free, Mutex};
use cortex_m_rt::entry;

#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};
#[cfg(not(feature = "defmt"))]
use panic_halt as _;

use hal::{
    can::Can,
    pac::{self, interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use ak_actuator::{
    drivers::{AkMotor, Registry},
    hw::{tx_code, BusConfig, CanBus, Usart},
    protocol::{servo_request, HostCommand, LineParser, MitCommand, Model, OriginMode, Telemetry},
};

#[allow(dead_code)]
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Mit,
    Servo,
}

const MODE: Mode = Mode::Mit;
const MOTOR_ADDRESS: u8 = match MODE {
    Mode::Mit => 0x01,
    Mode::Servo => 0x68,
};
const MOTOR_MODEL: Model = Model::Ak80_8;
const LOOP_PERIOD_MS: u32 = 25;

struct RxState {
    rx: bxcan::Rx0<Can<pac::CAN1>>,
    registry: Registry<4>,
}

static RX_STATE: Mutex<RefCell<Option<RxState>>> = Mutex::new(RefCell::new(None));

#[interrupt]
fn CAN1_RX0() {
    free(|cs| {
        if let Some(state) = RX_STATE.borrow(cs).borrow_mut().as_mut() {
            loop {
                match state.rx.receive() {
                    Ok(frame) => {
                        state.registry.on_frame(&frame);
                    }
                    Err(nb::Error::WouldBlock) => break,
                    Err(nb::Error::Other(_)) => warn!("can: rx fifo overrun"),
                }
            }
        }
    });
}

fn snapshot(address: u8) -> Option<Telemetry> {
    free(|cs| {
        RX_STATE
            .borrow(cs)
            .borrow()
            .as_ref()
            .and_then(|state| state.registry.find(address))
            .map(|device| device.telemetry)
    })
}

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks (HSI, 16 MHz on APB1)
    let mut rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();
    let mut delay = cortex_m::delay::Delay::new(cp.SYST, clocks.sysclk().raw());

    // GPIO
    let gpioa = dp.GPIOA.split();

    // USART1 (host link)
    let tx = gpioa.pa9.into_alternate::<7>();
    let rx = gpioa.pa10.into_alternate::<7>();
    let usart_cfg = Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART1, (tx, rx), &clocks, usart_cfg);
    let mut usart = Usart::new(serial);

    // CAN1
    let can_tx = gpioa.pa12.into_alternate::<9>();
    let can_rx = gpioa.pa11.into_alternate::<9>();
    let can1 = Can::new(dp.CAN1, &mut rcc.apb1, (can_tx, can_rx));
    let mut bus = CanBus::new(can1, &BusConfig::default());
    bus.accept_all();
    bus.listen_fifo0();
    let (mut can_tx, can_rx) = bus.split();

    // Registry
    let mut registry = Registry::<4>::new();
    let motor = match registry.register(MOTOR_ADDRESS, MOTOR_MODEL) {
        Ok(handle) => {
            if handle.id_conflict() {
                warn!("address {} already registered", MOTOR_ADDRESS);
            }
            AkMotor::from_handle(&handle)
        }
        Err(e) => {
            error!("register {} failed: {}, telemetry disabled", MOTOR_ADDRESS, e);
            AkMotor::new(MOTOR_ADDRESS, MOTOR_MODEL)
        }
    };

    free(|cs| {
        RX_STATE.borrow(cs).replace(Some(RxState {
            rx: can_rx,
            registry,
        }));
    });
    // SAFETY: the shared state is initialized before the interrupt is unmasked.
    unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::CAN1_RX0) };

    let mut parser = LineParser::<64>::new();
    let mut setpoint = [0.0f32; 5];

    if MODE == Mode::Mit {
        let status = tx_code(&motor.mit_enter(&mut can_tx));
        if status != 0 {
            warn!("mit enter failed: {}", status);
        }
    }

    loop {
        while let Some(byte) = usart.read_byte() {
            match parser.push(byte) {
                Some(HostCommand::SetOrigin) => {
                    let result = match MODE {
                        Mode::Mit => motor.mit_set_origin(&mut can_tx),
                        Mode::Servo => motor.set_origin(&mut can_tx, OriginMode::Temporary),
                    };
                    let status = tx_code(&result);
                    if status != 0 {
                        warn!("set origin failed: {}", status);
                    }
                }
                Some(HostCommand::Setpoint(values)) => setpoint = values,
                None => {}
            }
        }

        let result = match MODE {
            Mode::Mit => {
                let [position, velocity, kp, kd, torque] = setpoint;
                let command = MitCommand::new(position, velocity, kp, kd, torque);
                motor.mit_send(&mut can_tx, &command)
            }
            Mode::Servo => match servo_request(&setpoint) {
                Some(request) => motor.servo_send(&mut can_tx, request),
                None => Ok(()),
            },
        };
        let status = tx_code(&result);
        if status != 0 {
            warn!("setpoint send failed: {}", status);
        }

        if let Some(telemetry) = snapshot(MOTOR_ADDRESS) {
            let _ = usart.write_telemetry(&telemetry);
        }

        delay.delay_ms(LOOP_PERIOD_MS);
    }
}
