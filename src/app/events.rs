//! Outbound diagnostic events.
//!
//! The password service and the sensor supervisor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  They carry the diagnostic
//! text stream (lock state, masked progress, readings, sleep transitions)
//! and are informational only: nothing in the core reacts to them.

use heapless::String;

use crate::config::MAX_PASSCODE_LEN;
use crate::fsm::lock::LockState;
use crate::sensors::SensorSample;

/// Structured events emitted by the locker core.
#[derive(Debug, Clone, PartialEq)]
pub enum LockerEvent {
    /// The password service has started (carries initial state).
    Started(LockState),

    /// A correct digit was entered; `masked` shows the prefix, e.g. `10***`.
    DigitAccepted { masked: String<MAX_PASSCODE_LEN> },

    /// The full passcode was entered and the locker unlocked.
    PasswordCorrect,

    /// A wrong digit at 1-based `position`.
    PasswordIncorrect { position: usize, attempts: u8 },

    /// The attempt counter reached the threshold and was reset.
    AttemptsReset,

    /// Input is ignored until the timed lockout ends.
    LockoutStarted { millis: u64 },

    /// The locker was re-locked from the keypad.
    Relocked,

    /// One supervisor poll.
    SensorReading { sample: SensorSample, lock: LockState },

    /// Lateral acceleration above the tamper threshold.
    TamperDetected { lateral_g: f32 },

    /// Temperature outside the normal band.
    TemperatureAnomaly { celsius: f32 },

    /// Sensors were put into low-power mode.
    SleepEntered,

    /// A wake request restored the sensors.
    Woken,
}
