//! System configuration parameters
//!
//! All tunable parameters for the LockGuard locker.  Defaults match the
//! shipped hardware; a build-time JSON override can replace them (see
//! [`LockerConfig::from_json`]).  Nothing here is persisted at runtime.

use embassy_time::Duration;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Longest passcode the keypad accepts.
pub const MAX_PASSCODE_LEN: usize = 8;

/// Fixed-capacity passcode digit sequence (each digit 0 or 1).
pub type Passcode = Vec<u8, MAX_PASSCODE_LEN>;

/// What the password loop does with presses that arrive while a
/// success/failure feedback hold is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldInputPolicy {
    /// Drain and drop them; the hold runs to its deadline.
    Discard,
    /// End the hold early and process the press.
    Preempt,
}

/// What start-up does when the accelerometer identity check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityPolicy {
    /// Log the mismatch and keep running.
    FailOpen,
    /// Refuse to start the sensor supervisor.
    Halt,
}

/// Accelerometer axis used for the tamper predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Core locker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerConfig {
    // --- Keypad ---
    /// Target digit sequence
    pub passcode: Passcode,
    /// Minimum spacing between accepted edges on one button (milliseconds)
    pub debounce_ms: u32,

    // --- Password feedback ---
    /// How long the "password correct" indicator stays lit (milliseconds)
    pub success_hold_ms: u32,
    /// How long the "password incorrect" indicator and buzzer stay on (milliseconds)
    pub failure_hold_ms: u32,
    /// Consecutive incorrect digits before the attempt counter resets
    pub lockout_threshold: u8,
    /// Input blackout after the threshold is reached (0 = none)
    pub lockout_delay_ms: u32,
    /// Handling of presses during a feedback hold
    pub input_during_hold: HoldInputPolicy,

    // --- Sensor supervision ---
    /// Sensor poll period (milliseconds)
    pub poll_interval_ms: u32,
    /// Axis whose lateral acceleration signals tampering
    pub tamper_axis: Axis,
    /// Tamper threshold on |acceleration| of `tamper_axis` (g)
    pub tamper_threshold_g: f32,
    /// Lower bound of the normal temperature band (Celsius)
    pub temp_low_c: f32,
    /// Upper bound of the normal temperature band (Celsius)
    pub temp_high_c: f32,
    /// Alert indicator/buzzer pulse length (milliseconds)
    pub alert_pulse_ms: u32,

    // --- Sleep ---
    /// Max |x| and |y| for the device to count as at rest (g)
    pub sleep_xy_max_g: f32,
    /// Min z for the device to count as at rest (g)
    pub sleep_z_min_g: f32,
    /// Max z for the device to count as at rest (g)
    pub sleep_z_max_g: f32,
    /// Continuous at-rest time before the sensors are put to sleep (seconds)
    pub sleep_stability_secs: u32,

    // --- Start-up ---
    /// Behaviour on accelerometer identity mismatch
    pub identity_policy: IdentityPolicy,
}

impl Default for LockerConfig {
    fn default() -> Self {
        let mut passcode = Passcode::new();
        // Capacity is MAX_PASSCODE_LEN, five digits always fit.
        let _ = passcode.extend_from_slice(&[1, 0, 1, 1, 0]);

        Self {
            // Keypad
            passcode,
            debounce_ms: 200,

            // Password feedback
            success_hold_ms: 2000,
            failure_hold_ms: 1000,
            lockout_threshold: 3,
            lockout_delay_ms: 0,
            input_during_hold: HoldInputPolicy::Discard,

            // Sensor supervision
            poll_interval_ms: 500, // 2 Hz
            tamper_axis: Axis::Y,
            tamper_threshold_g: 0.1,
            temp_low_c: 10.0,
            temp_high_c: 30.0,
            alert_pulse_ms: 1000,

            // Sleep
            sleep_xy_max_g: 1.0,
            sleep_z_min_g: 0.8,
            sleep_z_max_g: 1.2,
            sleep_stability_secs: 30,

            // Start-up
            identity_policy: IdentityPolicy::FailOpen,
        }
    }
}

impl LockerConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the state machines' invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passcode.is_empty() {
            return Err(ConfigError::ValidationFailed("passcode must not be empty"));
        }
        if self.passcode.iter().any(|&d| d > 1) {
            return Err(ConfigError::ValidationFailed("passcode digits must be 0 or 1"));
        }
        if self.lockout_threshold == 0 {
            return Err(ConfigError::ValidationFailed("lockout_threshold must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be non-zero"));
        }
        if !(self.temp_low_c < self.temp_high_c) {
            return Err(ConfigError::ValidationFailed("temp_low_c must be below temp_high_c"));
        }
        if !(self.sleep_z_min_g <= self.sleep_z_max_g) {
            return Err(ConfigError::ValidationFailed("sleep_z_min_g must not exceed sleep_z_max_g"));
        }
        if !(self.tamper_threshold_g >= 0.0 && self.sleep_xy_max_g >= 0.0) {
            return Err(ConfigError::ValidationFailed("acceleration thresholds must be non-negative"));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms as u64)
    }

    pub fn success_hold(&self) -> Duration {
        Duration::from_millis(self.success_hold_ms as u64)
    }

    pub fn failure_hold(&self) -> Duration {
        Duration::from_millis(self.failure_hold_ms as u64)
    }

    pub fn lockout_delay(&self) -> Option<Duration> {
        (self.lockout_delay_ms > 0).then(|| Duration::from_millis(self.lockout_delay_ms as u64))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms as u64)
    }

    pub fn alert_pulse(&self) -> Duration {
        Duration::from_millis(self.alert_pulse_ms as u64)
    }

    pub fn sleep_stability(&self) -> Duration {
        Duration::from_secs(self.sleep_stability_secs as u64)
    }
}
