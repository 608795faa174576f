//! Sensor supervisor: periodic poll → anomaly alerts and sensor sleep.
//!
//! One [`SensorSupervisor::poll`] per tick of the poll interval:
//!
//! 1. End the alert pulse if its deadline has passed.
//! 2. SLEEPING: only a wake request is looked at.  If set, the sensors
//!    are restored and the cycle ends without a poll.
//! 3. AWAKE: read a sample, raise or extend the alert pulse for any
//!    anomaly, then feed the at-rest predicate to the power FSM.  A wake
//!    request while awake restarts the stability window.
//!
//! ```text
//!  SensorHub ──▶ ┌──────────────────┐ ──▶ FeedbackSender (SetAlert)
//!                │ SensorSupervisor │
//!  WakeSignal ──▶│ Anomaly · Power  │ ──▶ EventSink
//!                └──────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};
use log::info;

use crate::config::{Axis, LockerConfig};
use crate::error::Result;
use crate::fsm::lock::SharedLockState;
use crate::fsm::power::{PowerCommand, PowerMachine, PowerState};
use crate::safety::{Anomaly, AnomalyDetector};
use crate::sensors::{SensorHub, SensorSample};

use super::events::LockerEvent;
use super::feedback::FeedbackCommand;
use super::ports::{AccelerometerPort, EventSink, FeedbackSender, ThermometerPort};

/// Wake requests from the wake button.  Repeated requests before the next
/// poll collapse into one.
pub type WakeSignal = Signal<CriticalSectionRawMutex, ()>;

/// Initialise the sensors, applying the configured identity policy.
pub fn bring_up<A, T>(hub: &mut SensorHub<A, T>, config: &LockerConfig) -> Result<()>
where
    A: AccelerometerPort,
    T: ThermometerPort,
{
    hub.bring_up(config.identity_policy)
}

pub struct SensorSupervisor<'a> {
    detector: AnomalyDetector,
    power: PowerMachine,
    lock_state: &'a SharedLockState,
    tamper_axis: Axis,
    poll_interval: Duration,
    alert_pulse: Duration,
    alert_until: Option<Instant>,
}

impl<'a> SensorSupervisor<'a> {
    pub fn new(config: &LockerConfig, lock_state: &'a SharedLockState) -> Self {
        Self {
            detector: AnomalyDetector::new(config),
            power: PowerMachine::new(config.sleep_stability()),
            lock_state,
            tamper_axis: config.tamper_axis,
            poll_interval: config.poll_interval(),
            alert_pulse: config.alert_pulse(),
            alert_until: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self) {
        self.power.start();
        info!("SensorSupervisor started, polling every {} ms", self.poll_interval.as_millis());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one supervisor cycle at `now`.  Returns the sample if the
    /// sensors were polled.
    pub fn poll<A, T>(
        &mut self,
        now: Instant,
        wake_requested: bool,
        hub: &mut SensorHub<A, T>,
        feedback: &mut impl FeedbackSender,
        sink: &mut impl EventSink,
    ) -> Option<SensorSample>
    where
        A: AccelerometerPort,
        T: ThermometerPort,
    {
        // 1. Alert pulse deadline
        if self.alert_until.is_some_and(|until| until <= now) {
            self.alert_until = None;
            feedback.send(FeedbackCommand::SetAlert(false));
        }

        // 2. Sleeping: wake request only
        if self.power.state() == PowerState::Sleeping {
            if let Some(command) = self.power.tick(now, false, wake_requested) {
                self.apply_power(command, hub, sink);
            }
            return None;
        }

        // 3. Awake: poll
        let sample = hub.read_all();
        sink.emit(&LockerEvent::SensorReading {
            sample,
            lock: self.lock_state.get(),
        });

        let anomalies = self.detector.evaluate(&sample);
        if anomalies & Anomaly::Tamper.mask() != 0 {
            sink.emit(&LockerEvent::TamperDetected {
                lateral_g: sample.accel.axis(self.tamper_axis),
            });
        }
        if anomalies & Anomaly::Temperature.mask() != 0 {
            sink.emit(&LockerEvent::TemperatureAnomaly {
                celsius: sample.temperature_c,
            });
        }
        if anomalies != 0 {
            self.raise_alert(now, feedback);
        }

        let at_rest = self.detector.is_at_rest(&sample);
        if let Some(command) = self.power.tick(now, at_rest, wake_requested) {
            self.apply_power(command, hub, sink);
        }

        Some(sample)
    }

    // ── Task loop ─────────────────────────────────────────────

    /// Poll at the configured interval.  Never returns.
    pub async fn run<A, T>(
        &mut self,
        hub: &mut SensorHub<A, T>,
        wake: &WakeSignal,
        feedback: &mut impl FeedbackSender,
        sink: &mut impl EventSink,
    )
    where
        A: AccelerometerPort,
        T: ThermometerPort,
    {
        self.start();
        let mut ticker = Ticker::every(self.poll_interval);
        loop {
            ticker.next().await;
            let wake_requested = wake.try_take().is_some();
            self.poll(Instant::now(), wake_requested, hub, feedback, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    pub fn alert_active(&self) -> bool {
        self.alert_until.is_some()
    }

    /// How long the at-rest predicate has held so far.
    pub fn stability_elapsed(&self, now: Instant) -> Duration {
        self.power.stability().elapsed(now)
    }

    // ── Internal ──────────────────────────────────────────────

    /// Start a pulse, or push the end of the running one out.
    fn raise_alert(&mut self, now: Instant, feedback: &mut impl FeedbackSender) {
        let rising = self.alert_until.is_none();
        self.alert_until = Some(now + self.alert_pulse);
        if rising {
            feedback.send(FeedbackCommand::SetAlert(true));
        }
    }

    fn apply_power<A, T>(
        &mut self,
        command: PowerCommand,
        hub: &mut SensorHub<A, T>,
        sink: &mut impl EventSink,
    ) where
        A: AccelerometerPort,
        T: ThermometerPort,
    {
        match command {
            PowerCommand::LowPower => {
                hub.set_low_power(true);
                sink.emit(&LockerEvent::SleepEntered);
            }
            PowerCommand::Active => {
                hub.set_low_power(false);
                sink.emit(&LockerEvent::Woken);
            }
        }
    }
}
