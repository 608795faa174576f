//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing locker events to the `log` facade
//! (the ESP-IDF logger on target, which goes to UART / USB-CDC).

use log::{info, warn};

use crate::app::events::LockerEvent;
use crate::app::ports::EventSink;
use crate::fsm::lock::LockState;

/// Adapter that logs every [`LockerEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn lock_label(state: LockState) -> &'static str {
    match state {
        LockState::Locked => "LOCKED",
        LockState::Unlocked => "UNLOCKED",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LockerEvent) {
        match event {
            LockerEvent::Started(state) => {
                info!("START | locker {}", lock_label(*state));
            }
            LockerEvent::DigitAccepted { masked } => {
                info!("PASS  | {}", masked);
            }
            LockerEvent::PasswordCorrect => {
                info!("PASS  | correct, locker UNLOCKED");
            }
            LockerEvent::PasswordIncorrect { position, attempts } => {
                warn!("PASS  | incorrect digit at position {} (attempt {})", position, attempts);
            }
            LockerEvent::AttemptsReset => {
                warn!("PASS  | too many attempts, counter reset");
            }
            LockerEvent::LockoutStarted { millis } => {
                warn!("PASS  | input locked out for {} ms", millis);
            }
            LockerEvent::Relocked => {
                info!("LOCK  | locker LOCKED");
            }
            LockerEvent::SensorReading { sample, lock } => {
                info!(
                    "SENSE | {} | accel x={:.3} y={:.3} z={:.3} g | T={:.2}\u{00b0}C",
                    lock_label(*lock),
                    sample.accel.x,
                    sample.accel.y,
                    sample.accel.z,
                    sample.temperature_c,
                );
            }
            LockerEvent::TamperDetected { lateral_g } => {
                warn!("ALERT | tamper detected ({:.3} g)", lateral_g);
            }
            LockerEvent::TemperatureAnomaly { celsius } => {
                warn!("ALERT | temperature anomaly ({:.2}\u{00b0}C)", celsius);
            }
            LockerEvent::SleepEntered => {
                info!("POWER | sensors sleeping");
            }
            LockerEvent::Woken => {
                info!("POWER | sensors awake");
            }
        }
    }
}
