//! Sensor subsystem: the accelerometer and thermometer drivers and the
//! aggregating [`SensorHub`].
//!
//! The hub owns both collaborators behind their port traits and produces a
//! [`SensorSample`] per supervisor poll.  Drivers never fail a read: bus
//! errors are logged and the previous good value is returned.

pub mod adxl345;
pub mod tmp102;

use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::{AccelerometerPort, ThermometerPort};
use crate::config::{Axis, IdentityPolicy};
use crate::error::{Error, Result};

/// Three-axis acceleration in g.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// One poll's worth of sensor data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSample {
    pub accel: Acceleration,
    pub temperature_c: f32,
}

/// Owns both sensor collaborators.
pub struct SensorHub<A, T> {
    pub accel: A,
    pub thermo: T,
}

impl<A: AccelerometerPort, T: ThermometerPort> SensorHub<A, T> {
    pub fn new(accel: A, thermo: T) -> Self {
        Self { accel, thermo }
    }

    /// Initialise both sensors.  An accelerometer identity failure is
    /// logged and, under [`IdentityPolicy::Halt`], turned into an error.
    pub fn bring_up(&mut self, policy: IdentityPolicy) -> Result<()> {
        let accel_ok = self.accel.initialize();
        self.thermo.configure();

        if accel_ok {
            info!("sensors: up");
            return Ok(());
        }
        match policy {
            IdentityPolicy::FailOpen => {
                warn!("sensors: accelerometer not verified, continuing");
                Ok(())
            }
            IdentityPolicy::Halt => {
                error!("sensors: accelerometer not verified, halting supervision");
                Err(Error::Init("accelerometer identity check failed"))
            }
        }
    }

    pub fn read_all(&mut self) -> SensorSample {
        SensorSample {
            accel: self.accel.read(),
            temperature_c: self.thermo.read(),
        }
    }

    /// Move both sensors into (or out of) their low-power mode.
    pub fn set_low_power(&mut self, low_power: bool) {
        self.accel.set_low_power(low_power);
        self.thermo.set_low_power(low_power);
    }
}
