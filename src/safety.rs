//! Anomaly detection for the sensor supervisor.
//!
//! The detector runs on **every awake poll** and recomputes an anomaly
//! bitmask from the latest [`SensorSample`].  The supervisor turns a
//! non-zero mask into an alert pulse; the mask itself is not latched, so
//! a condition that clears on the next poll simply stops extending the
//! pulse.
//!
//! ## Predicates
//!
//! | Anomaly       | Condition                                        |
//! |---------------|--------------------------------------------------|
//! | `Tamper`      | `|accel[tamper_axis]| > tamper_threshold_g`      |
//! | `Temperature` | temperature outside `[temp_low_c, temp_high_c]`  |
//!
//! Implausible values (including NaN) are not a separate fault class:
//! they fail the comparisons above and raise the anomaly like any real
//! excursion.
//!
//! The same thresholds feed [`AnomalyDetector::is_at_rest`], the sleep
//! eligibility predicate.

use core::fmt;

use log::{info, warn};

use crate::config::{Axis, LockerConfig};
use crate::sensors::SensorSample;

/// Individual anomaly bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    Tamper,
    Temperature,
}

impl Anomaly {
    pub const fn mask(self) -> u8 {
        match self {
            Self::Tamper => 1 << 0,
            Self::Temperature => 1 << 1,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tamper => write!(f, "tamper"),
            Self::Temperature => write!(f, "temperature out of range"),
        }
    }
}

/// Threshold predicates over one sensor sample.
pub struct AnomalyDetector {
    tamper_axis: Axis,
    tamper_threshold_g: f32,
    temp_low_c: f32,
    temp_high_c: f32,
    sleep_xy_max_g: f32,
    sleep_z_min_g: f32,
    sleep_z_max_g: f32,
    /// Mask from the previous evaluation, used only for edge logging.
    active: u8,
}

impl AnomalyDetector {
    pub fn new(config: &LockerConfig) -> Self {
        Self {
            tamper_axis: config.tamper_axis,
            tamper_threshold_g: config.tamper_threshold_g,
            temp_low_c: config.temp_low_c,
            temp_high_c: config.temp_high_c,
            sleep_xy_max_g: config.sleep_xy_max_g,
            sleep_z_min_g: config.sleep_z_min_g,
            sleep_z_max_g: config.sleep_z_max_g,
            active: 0,
        }
    }

    /// Evaluate every anomaly predicate against `sample`.
    /// Returns the anomaly bitmask for this sample.
    pub fn evaluate(&mut self, sample: &SensorSample) -> u8 {
        let mut mask = 0;

        // ── Tamper ────────────────────────────────────────────────
        let lateral = sample.accel.axis(self.tamper_axis).abs();
        if !(lateral <= self.tamper_threshold_g) {
            mask |= Anomaly::Tamper.mask();
        }

        // ── Temperature ───────────────────────────────────────────
        if !self.temperature_in_band(sample.temperature_c) {
            mask |= Anomaly::Temperature.mask();
        }

        for anomaly in [Anomaly::Tamper, Anomaly::Temperature] {
            self.log_edge(anomaly, mask);
        }
        self.active = mask;
        mask
    }

    /// Device is lying flat and inside the temperature band.
    pub fn is_at_rest(&self, sample: &SensorSample) -> bool {
        let a = &sample.accel;
        self.temperature_in_band(sample.temperature_c)
            && a.x.abs() <= self.sleep_xy_max_g
            && a.y.abs() <= self.sleep_xy_max_g
            && (self.sleep_z_min_g..=self.sleep_z_max_g).contains(&a.z)
    }

    /// Mask from the most recent [`evaluate`](Self::evaluate).
    pub fn active(&self) -> u8 {
        self.active
    }

    pub fn has(&self, anomaly: Anomaly) -> bool {
        self.active & anomaly.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    fn temperature_in_band(&self, celsius: f32) -> bool {
        (self.temp_low_c..=self.temp_high_c).contains(&celsius)
    }

    fn log_edge(&self, anomaly: Anomaly, mask: u8) {
        let was = self.active & anomaly.mask() != 0;
        let is = mask & anomaly.mask() != 0;
        match (was, is) {
            (false, true) => warn!("ANOMALY: {anomaly}"),
            (true, false) => info!("anomaly cleared: {anomaly}"),
            _ => {}
        }
    }
}
