// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Discrete PID controller, positional or incremental.
//!
//! Works in `no_std` and does not allocate memory. The controller is sampled once per call to
//! [`Pid::calc`]; gains absorb the sample period.

use micromath::F32Ext;

/// Which form of the PID law [`Pid::calc`] evaluates.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidMode {
    /// `u = kp*e + Σ ki*e + kd*(e - e₋₁)`
    Positional,
    /// `u += kp*(e - e₋₁) + ki*e + kd*(e - 2e₋₁ + e₋₂)`
    Incremental,
}

/// Limits and gates. A limit of `0.0` clamps to zero; use `f32::INFINITY` for none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    /// Output clamp, symmetric.
    pub max_output: f32,
    /// Integral term clamp, symmetric.
    pub integral_limit: f32,
    /// Errors smaller than this produce no output. `0.0` disables the gate.
    pub dead_band: f32,
    /// Errors larger than this produce no output. `0.0` disables the gate.
    pub max_error: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            max_output: f32::INFINITY,
            integral_limit: f32::INFINITY,
            dead_band: 0.0,
            max_error: 0.0,
        }
    }
}

impl PidConfig {
    pub fn with_max_output(mut self, limit: f32) -> Self {
        self.max_output = limit;
        self
    }

    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    pub fn with_dead_band(mut self, band: f32) -> Self {
        self.dead_band = band;
        self
    }

    pub fn with_max_error(mut self, max: f32) -> Self {
        self.max_error = max;
        self
    }
}

/// Current, previous and second previous sample of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct History {
    pub now: f32,
    pub last: f32,
    pub llast: f32,
}

impl History {
    #[inline]
    fn shift(&mut self) {
        self.llast = self.last;
        self.last = self.now;
    }
}

#[inline]
fn clamp_abs(value: f32, limit: f32) -> f32 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// PID controller with gated input and clamped integral and output.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    mode: PidMode,
    config: PidConfig,

    set: History,
    get: History,
    err: History,

    pout: f32,
    iout: f32,
    dout: f32,

    pos_out: f32,
    delta_u: f32,
    delta_out: f32,
}

impl Pid {
    /// Create a controller with unlimited output and no gates.
    pub fn new(mode: PidMode, kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            mode,
            config: PidConfig::default(),
            set: History::default(),
            get: History::default(),
            err: History::default(),
            pout: 0.0,
            iout: 0.0,
            dout: 0.0,
            pos_out: 0.0,
            delta_u: 0.0,
            delta_out: 0.0,
        }
    }

    pub fn with_config(mut self, config: PidConfig) -> Self {
        self.config = config;
        self
    }

    /// Set output limits.
    pub fn with_output_limit(mut self, limit: f32) -> Self {
        self.config.max_output = limit;
        self
    }

    /// Set integral limits for anti-windup.
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.config.integral_limit = limit;
        self
    }

    /// Replace the gains. State is kept.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn gains(&self) -> (f32, f32, f32) {
        (self.kp, self.ki, self.kd)
    }

    pub fn mode(&self) -> PidMode {
        self.mode
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Zero history, terms and outputs. Gains and configuration are kept.
    pub fn clear(&mut self) {
        self.set = History::default();
        self.get = History::default();
        self.err = History::default();
        self.pout = 0.0;
        self.iout = 0.0;
        self.dout = 0.0;
        self.pos_out = 0.0;
        self.delta_u = 0.0;
        self.delta_out = 0.0;
    }

    /// Run one step and return the controller output.
    ///
    /// When a gate trips the result is `0.0` and the history is not shifted, so the next
    /// derivative is taken against the last sample that passed.
    pub fn calc(&mut self, target: f32, measured: f32) -> f32 {
        self.set.now = target;
        self.get.now = measured;
        self.err.now = target - measured;

        let e = self.err.now;
        if self.config.max_error != 0.0 && e.abs() > self.config.max_error {
            return 0.0;
        }
        if self.config.dead_band != 0.0 && e.abs() < self.config.dead_band {
            return 0.0;
        }

        match self.mode {
            PidMode::Positional => {
                self.pout = self.kp * e;
                self.iout += self.ki * e;
                self.dout = self.kd * (e - self.err.last);
                self.iout = clamp_abs(self.iout, self.config.integral_limit);
                self.pos_out =
                    clamp_abs(self.pout + self.iout + self.dout, self.config.max_output);
            }
            PidMode::Incremental => {
                self.pout = self.kp * (e - self.err.last);
                self.iout = clamp_abs(self.ki * e, self.config.integral_limit);
                self.dout = self.kd * (e - 2.0 * self.err.last + self.err.llast);
                self.delta_u = self.pout + self.iout + self.dout;
                self.delta_out = clamp_abs(self.delta_out + self.delta_u, self.config.max_output);
            }
        }

        self.err.shift();
        self.get.shift();
        self.set.shift();

        self.output()
    }

    /// Last output of the configured mode.
    pub fn output(&self) -> f32 {
        match self.mode {
            PidMode::Positional => self.pos_out,
            PidMode::Incremental => self.delta_out,
        }
    }

    pub fn error(&self) -> &History {
        &self.err
    }

    pub fn setpoint(&self) -> &History {
        &self.set
    }

    pub fn measurement(&self) -> &History {
        &self.get
    }

    /// Proportional, integral and derivative terms of the last step.
    pub fn terms(&self) -> (f32, f32, f32) {
        (self.pout, self.iout, self.dout)
    }
}
