//! Sensor supervisor scenarios: anomaly alerts, sleep and wake.

use lockguard::app::events::LockerEvent;
use lockguard::app::supervisor::{self, SensorSupervisor};
use lockguard::config::{IdentityPolicy, LockerConfig};
use lockguard::error::Error;
use lockguard::fsm::lock::{LockState, SharedLockState};
use lockguard::fsm::power::PowerState;
use lockguard::sensors::Acceleration;

use crate::mock_hw::{MockHub, RecordingFeedback, RecordingSink, ms, resting_hub};

const POLL_MS: u64 = 500;

struct Rig<'a> {
    supervisor: SensorSupervisor<'a>,
    hub: MockHub,
    feedback: RecordingFeedback,
    sink: RecordingSink,
}

impl<'a> Rig<'a> {
    fn new(config: &LockerConfig, lock: &'a SharedLockState) -> Self {
        let mut supervisor = SensorSupervisor::new(config, lock);
        supervisor.start();
        Self {
            supervisor,
            hub: resting_hub(),
            feedback: RecordingFeedback::new(),
            sink: RecordingSink::new(),
        }
    }

    fn poll(&mut self, at: u64, wake: bool) -> bool {
        self.supervisor
            .poll(ms(at), wake, &mut self.hub, &mut self.feedback, &mut self.sink)
            .is_some()
    }

    /// Poll every interval in `[from, to]` without wake requests.
    fn poll_range(&mut self, from: u64, to: u64) {
        let mut t = from;
        while t <= to {
            self.poll(t, false);
            t += POLL_MS;
        }
    }

    fn sleep_count(&self) -> usize {
        self.sink.count(|e| *e == LockerEvent::SleepEntered)
    }
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn bring_up_fail_open_continues() {
    let mut hub = resting_hub();
    hub.accel.identity_ok = false;
    assert!(supervisor::bring_up(&mut hub, &LockerConfig::default()).is_ok());
    assert!(hub.thermo.configured);
}

#[test]
fn bring_up_halt_reports_identity_failure() {
    let config = LockerConfig {
        identity_policy: IdentityPolicy::Halt,
        ..LockerConfig::default()
    };
    let mut hub = resting_hub();
    hub.accel.identity_ok = false;
    assert!(matches!(supervisor::bring_up(&mut hub, &config), Err(Error::Init(_))));

    hub.accel.identity_ok = true;
    assert!(supervisor::bring_up(&mut hub, &config).is_ok());
}

// ── Readings ──────────────────────────────────────────────────

#[test]
fn reading_carries_current_lock_state() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.poll(0, false);
    lock.set(LockState::Unlocked);
    rig.poll(500, false);

    let locks: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            LockerEvent::SensorReading { lock, .. } => Some(*lock),
            _ => None,
        })
        .collect();
    assert_eq!(locks, vec![LockState::Locked, LockState::Unlocked]);
    assert!(rig.feedback.commands.is_empty(), "quiet readings send nothing");
}

// ── Anomalies ─────────────────────────────────────────────────

#[test]
fn over_temperature_pulses_alert_once() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);
    rig.hub.thermo.celsius = 35.0;

    rig.poll(0, false);
    assert!(rig.supervisor.alert_active());
    assert_eq!(rig.feedback.alert_edges(), vec![true]);
    assert!(rig.sink.contains(&LockerEvent::TemperatureAnomaly { celsius: 35.0 }));

    // Still hot: the pulse is extended, not restarted.
    rig.poll(500, false);
    assert_eq!(rig.feedback.alert_edges(), vec![true]);

    // Back in band: the pulse ends 1 s after the last anomaly.
    rig.hub.thermo.celsius = 22.0;
    rig.poll(1000, false);
    assert!(rig.supervisor.alert_active());
    rig.poll(1500, false);
    assert!(!rig.supervisor.alert_active());
    assert_eq!(rig.feedback.alert_edges(), vec![true, false]);
}

#[test]
fn temperature_at_band_edges_is_normal() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.hub.thermo.celsius = 10.0;
    rig.poll(0, false);
    rig.hub.thermo.celsius = 30.0;
    rig.poll(500, false);
    assert!(rig.feedback.alert_edges().is_empty());
}

#[test]
fn lateral_tamper_raises_alert() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);
    rig.hub.accel.value = Acceleration::new(0.0, 0.15, 1.0);

    rig.poll(0, false);

    assert_eq!(rig.feedback.alert_edges(), vec![true]);
    assert_eq!(rig.sink.count(|e| matches!(e, LockerEvent::TamperDetected { .. })), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, LockerEvent::TemperatureAnomaly { .. })),
        0
    );
}

#[test]
fn negative_lateral_tamper_also_counts() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);
    rig.hub.accel.value = Acceleration::new(0.0, -0.2, 1.0);

    rig.poll(0, false);
    assert!(rig.supervisor.alert_active());
}

// ── Sleep ─────────────────────────────────────────────────────

#[test]
fn sleeps_after_thirty_seconds_at_rest_exactly_once() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.poll_range(0, 29_500);
    assert_eq!(rig.supervisor.power_state(), PowerState::Awake);
    assert_eq!(rig.sleep_count(), 0);

    rig.poll(30_000, false);
    assert_eq!(rig.supervisor.power_state(), PowerState::Sleeping);
    assert_eq!(rig.hub.accel.power_calls, vec![true]);
    assert_eq!(rig.hub.thermo.power_calls, vec![true]);

    let reads = rig.hub.accel.reads;
    rig.poll_range(30_500, 40_000);
    assert_eq!(rig.sleep_count(), 1);
    assert_eq!(rig.hub.accel.reads, reads, "no polling while asleep");
    assert_eq!(rig.hub.accel.power_calls, vec![true]);
}

#[test]
fn temperature_violation_restarts_window() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.poll_range(0, 10_000);
    assert_eq!(rig.supervisor.stability_elapsed(ms(10_000)).as_millis(), 10_000);

    rig.hub.thermo.celsius = 35.0;
    rig.poll(10_500, false);
    assert_eq!(rig.supervisor.stability_elapsed(ms(10_500)).as_millis(), 0);

    rig.hub.thermo.celsius = 22.0;
    rig.poll_range(11_000, 40_500);
    assert_eq!(rig.sleep_count(), 0);
    rig.poll(41_000, false);
    assert_eq!(rig.sleep_count(), 1);
}

#[test]
fn motion_restarts_window() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.poll_range(0, 20_000);
    rig.hub.accel.value = Acceleration::new(0.0, 0.0, 1.5);
    rig.poll(20_500, false);
    rig.hub.accel.value = Acceleration::new(0.0, 0.0, 1.0);
    rig.poll_range(21_000, 50_500);
    assert_eq!(rig.sleep_count(), 0);
    rig.poll(51_000, false);
    assert_eq!(rig.sleep_count(), 1);
}

#[test]
fn wake_request_while_awake_restarts_window() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);

    rig.poll_range(0, 20_000);
    rig.poll(20_500, true);
    assert_eq!(rig.supervisor.stability_elapsed(ms(20_500)).as_millis(), 0);
    assert_eq!(rig.sink.count(|e| *e == LockerEvent::Woken), 0);
}

// ── Wake ──────────────────────────────────────────────────────

#[test]
fn wake_request_restores_sensors_before_next_poll() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&LockerConfig::default(), &lock);
    rig.poll_range(0, 30_000);
    assert_eq!(rig.supervisor.power_state(), PowerState::Sleeping);

    let reads = rig.hub.accel.reads;
    let polled = rig.poll(31_000, true);

    assert!(!polled, "the waking cycle does not read the sensors");
    assert_eq!(rig.hub.accel.reads, reads);
    assert_eq!(rig.supervisor.power_state(), PowerState::Awake);
    assert_eq!(rig.hub.accel.power_calls, vec![true, false]);
    assert_eq!(rig.hub.thermo.power_calls, vec![true, false]);
    assert!(rig.sink.contains(&LockerEvent::Woken));

    assert!(rig.poll(31_500, false));
    assert_eq!(rig.hub.accel.reads, reads + 1);

    // A full new window is needed before the next sleep.
    rig.poll_range(32_000, 61_000);
    assert_eq!(rig.sleep_count(), 1);
    rig.poll(61_500, false);
    assert_eq!(rig.sleep_count(), 2);
}

#[test]
fn alert_pulse_ends_while_sleeping() {
    let config = LockerConfig {
        alert_pulse_ms: 5000,
        sleep_stability_secs: 1,
        ..LockerConfig::default()
    };
    let lock = SharedLockState::new();
    let mut rig = Rig::new(&config, &lock);

    // Tamper does not break the at-rest predicate.
    rig.hub.accel.value = Acceleration::new(0.0, 0.5, 1.0);
    rig.poll(0, false);
    rig.hub.accel.value = Acceleration::new(0.0, 0.0, 1.0);
    rig.poll(500, false);
    rig.poll(1000, false);
    assert_eq!(rig.supervisor.power_state(), PowerState::Sleeping);
    assert!(rig.supervisor.alert_active());

    rig.poll(5000, false);
    assert!(!rig.supervisor.alert_active());
    assert_eq!(rig.feedback.alert_edges(), vec![true, false]);
}
