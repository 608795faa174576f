//! Feedback actuator: the only writer of the six feedback outputs.
//!
//! ```text
//! ┌──────────────────┐  SetLock / SetVerdict  ┌───────────────┐   write   ┌──────────────┐
//! │ PasswordService  │──────────────┐         │               │──────────▶│ FeedbackPort │
//! └──────────────────┘              ├────────▶│ FeedbackQueue │           └──────────────┘
//! ┌──────────────────┐  SetAlert    │         │  → Actuator   │
//! │ SensorSupervisor │──────────────┘         └───────────────┘
//! └──────────────────┘
//! ```
//!
//! Each producer sends only the fact it owns.  The actor keeps the latest
//! lock and alert facts and re-derives the outputs through
//! [`FeedbackState::apply`], so a supervisor alert can never clobber a
//! password-failure buzzer pulse and vice versa.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::app::ports::FeedbackPort;
use crate::fsm::lock::LockState;

/// Outcome of a password entry, shown on the correct/incorrect indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// Levels of the six feedback outputs (`true` = on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackState {
    pub locked_led: bool,
    pub unlocked_led: bool,
    pub alert_led: bool,
    pub correct_led: bool,
    pub incorrect_led: bool,
    pub buzzer: bool,
}

impl FeedbackState {
    /// Power-on outputs: locked, everything else off.
    pub const fn initial() -> Self {
        Self {
            locked_led: true,
            unlocked_led: false,
            alert_led: false,
            correct_led: false,
            incorrect_led: false,
            buzzer: false,
        }
    }

    /// Map the lock indicator and alert onto the outputs.  The buzzer is
    /// forced on by an alert, and only turned off when the incorrect
    /// indicator is not lit.
    pub fn apply(&mut self, lock_indicator: bool, alert: bool) {
        self.locked_led = lock_indicator;
        self.unlocked_led = !lock_indicator;
        self.alert_led = alert;
        if alert {
            self.buzzer = true;
        } else if !self.incorrect_led {
            self.buzzer = false;
        }
    }

    /// Show (or clear) a password verdict.  `alert` is the current alert
    /// fact; it keeps the buzzer on when the verdict clears.
    pub fn set_verdict(&mut self, verdict: Option<Verdict>, alert: bool) {
        match verdict {
            Some(Verdict::Correct) => {
                self.correct_led = true;
                self.incorrect_led = false;
                self.buzzer = alert;
            }
            Some(Verdict::Incorrect) => {
                self.correct_led = false;
                self.incorrect_led = true;
                self.buzzer = true;
            }
            None => {
                self.correct_led = false;
                self.incorrect_led = false;
                self.buzzer = alert;
            }
        }
    }
}

impl Default for FeedbackState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A fact sent to the feedback actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCommand {
    /// Lock state changed (password service).
    SetLock(LockState),
    /// Alert pulse started or ended (sensor supervisor).
    SetAlert(bool),
    /// Verdict hold started or ended (password service).
    SetVerdict(Option<Verdict>),
}

/// Mailbox depth.  Producers send at most a few commands per event.
const FEEDBACK_DEPTH: usize = 8;

/// Bounded MPSC mailbox in front of the [`FeedbackActuator`].
pub struct FeedbackQueue {
    channel: Channel<CriticalSectionRawMutex, FeedbackCommand, FEEDBACK_DEPTH>,
}

impl FeedbackQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Non-blocking send.  A full queue drops the command with a warning.
    pub fn send(&self, command: FeedbackCommand) {
        if self.channel.try_send(command).is_err() {
            warn!("feedback: queue full, dropping {:?}", command);
        }
    }

    pub async fn receive(&self) -> FeedbackCommand {
        self.channel.receive().await
    }

    pub fn try_receive(&self) -> Option<FeedbackCommand> {
        self.channel.try_receive().ok()
    }
}

impl Default for FeedbackQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-writer actor owning the feedback port.
pub struct FeedbackActuator<P> {
    port: P,
    locked: bool,
    alert: bool,
    state: FeedbackState,
}

impl<P: FeedbackPort> FeedbackActuator<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            locked: true,
            alert: false,
            state: FeedbackState::initial(),
        }
    }

    /// Drive the power-on outputs.
    pub fn start(&mut self) {
        self.port.write(&self.state);
    }

    /// Merge one fact and rewrite the outputs.
    pub fn handle(&mut self, command: FeedbackCommand) {
        debug!("feedback: {:?}", command);
        match command {
            FeedbackCommand::SetLock(state) => {
                self.locked = state.is_locked();
                self.state.apply(self.locked, self.alert);
            }
            FeedbackCommand::SetAlert(alert) => {
                self.alert = alert;
                self.state.apply(self.locked, self.alert);
            }
            FeedbackCommand::SetVerdict(verdict) => {
                self.state.set_verdict(verdict, self.alert);
            }
        }
        self.port.write(&self.state);
    }

    /// Apply every command already queued, without waiting.
    pub fn drain(&mut self, queue: &FeedbackQueue) {
        while let Some(command) = queue.try_receive() {
            self.handle(command);
        }
    }

    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Actor loop: receive and apply commands.  Never returns.
    pub async fn run(&mut self, queue: &FeedbackQueue) {
        self.start();
        loop {
            let command = queue.receive().await;
            self.handle(command);
        }
    }
}
