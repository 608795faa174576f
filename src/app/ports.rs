//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PasswordService / SensorSupervisor (domain)
//! ```
//!
//! Driven adapters (sensors, indicator pins, event sinks) implement these
//! traits.  The domain services consume them via generics or `dyn`, so the
//! state machines never touch hardware directly and run unchanged against
//! the mocks in `tests/integration/mock_hw.rs`.

use crate::app::events::LockerEvent;
use crate::app::feedback::{FeedbackCommand, FeedbackQueue, FeedbackState};
use crate::sensors::Acceleration;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait AccelerometerPort {
    /// Configure the device and check its identity.  `false` means the
    /// identity check failed; the device may still be usable.
    fn initialize(&mut self) -> bool;

    /// Latest acceleration in g.  Returns the last good value on error.
    fn read(&mut self) -> Acceleration;

    fn set_low_power(&mut self, low_power: bool);
}

pub trait ThermometerPort {
    fn configure(&mut self);

    /// Latest temperature in Celsius.  Returns the last good value on error.
    fn read(&mut self) -> f32;

    fn set_low_power(&mut self, low_power: bool);
}

// ───────────────────────────────────────────────────────────────
// Feedback ports (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The six feedback outputs, written as one unit by the feedback actor.
pub trait FeedbackPort {
    fn write(&mut self, state: &FeedbackState);
}

/// Producer side of the feedback actor's mailbox.  Each task sends only
/// the facts it owns.
pub trait FeedbackSender {
    fn send(&mut self, command: FeedbackCommand);
}

impl FeedbackSender for &FeedbackQueue {
    fn send(&mut self, command: FeedbackCommand) {
        FeedbackQueue::send(*self, command);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`LockerEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &LockerEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from loading a [`LockerConfig`](crate::config::LockerConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be deserialized.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
