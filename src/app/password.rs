//! Password service: keypad input → lock FSM → feedback.
//!
//! [`PasswordService`] owns the [`LockMachine`] and the timed sub-states
//! that follow an entry:
//!
//! | Sub-state     | Entered on            | Ends at                       |
//! |---------------|-----------------------|-------------------------------|
//! | success hold  | full passcode entered | `now + success_hold_ms`       |
//! | failure hold  | wrong digit           | `now + failure_hold_ms`       |
//! | lockout       | threshold reached     | `now + lockout_delay_ms` (opt)|
//!
//! Holds are deadlines, not sleeps: the task loop waits for input *or*
//! the nearest deadline, so the verdict indicator is cleared on time even
//! when nobody touches the keypad.
//!
//! ```text
//!  Debouncer ──drain──▶ ┌─────────────────┐ ──▶ FeedbackSender
//!                       │ PasswordService │
//!                       │  LockMachine    │ ──▶ EventSink
//!                       └─────────────────┘ ──▶ SharedLockState
//! ```

use embassy_time::{Duration, Instant, with_deadline};
use log::{debug, info};

use crate::config::{HoldInputPolicy, LockerConfig};
use crate::drivers::button::{Debouncer, Presses};
use crate::fsm::lock::{EntryOutcome, LockMachine, LockState, SharedLockState};

use super::events::LockerEvent;
use super::feedback::{FeedbackCommand, Verdict};
use super::ports::{EventSink, FeedbackSender};

/// A verdict indicator that is lit until `until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hold {
    pub verdict: Verdict,
    pub until: Instant,
}

pub struct PasswordService<'a> {
    machine: LockMachine,
    lock_state: &'a SharedLockState,
    success_hold: Duration,
    failure_hold: Duration,
    lockout_delay: Option<Duration>,
    input_during_hold: HoldInputPolicy,
    hold: Option<Hold>,
    lockout_until: Option<Instant>,
}

impl<'a> PasswordService<'a> {
    pub fn new(config: &LockerConfig, lock_state: &'a SharedLockState) -> Self {
        Self {
            machine: LockMachine::new(config),
            lock_state,
            success_hold: config.success_hold(),
            failure_hold: config.failure_hold(),
            lockout_delay: config.lockout_delay(),
            input_during_hold: config.input_during_hold,
            hold: None,
            lockout_until: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter LOCKED and publish the initial state.
    pub fn start(&mut self, feedback: &mut impl FeedbackSender, sink: &mut impl EventSink) {
        self.machine.start();
        let state = self.machine.state();
        self.lock_state.set(state);
        feedback.send(FeedbackCommand::SetLock(state));
        sink.emit(&LockerEvent::Started(state));
        info!("PasswordService started in {:?}", state);
    }

    // ── Per-wake handling ─────────────────────────────────────

    /// Earliest instant at which a hold or lockout ends.
    pub fn deadline(&self) -> Option<Instant> {
        let hold = self.hold.map(|h| h.until);
        match (hold, self.lockout_until) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// End any hold or lockout whose deadline has passed.
    pub fn expire(&mut self, now: Instant, feedback: &mut impl FeedbackSender) {
        if let Some(hold) = self.hold.filter(|h| h.until <= now) {
            debug!("password: {:?} hold ended", hold.verdict);
            self.end_hold(feedback);
        }
        if self.lockout_until.is_some_and(|until| until <= now) {
            info!("password: lockout ended");
            self.lockout_until = None;
        }
    }

    /// Process one drained batch of presses at `now`.
    pub fn handle_presses(
        &mut self,
        now: Instant,
        presses: Presses,
        feedback: &mut impl FeedbackSender,
        sink: &mut impl EventSink,
    ) -> EntryOutcome {
        self.expire(now, feedback);
        if presses.is_empty() {
            return EntryOutcome::Idle;
        }

        if self.lockout_until.is_some() {
            debug!("password: {:?} dropped during lockout", presses);
            return EntryOutcome::Ignored;
        }
        if self.hold.is_some() {
            match self.input_during_hold {
                HoldInputPolicy::Discard => {
                    debug!("password: {:?} dropped during hold", presses);
                    return EntryOutcome::Ignored;
                }
                HoldInputPolicy::Preempt => self.end_hold(feedback),
            }
        }

        let outcome = self.machine.press(presses);
        match outcome {
            EntryOutcome::Idle | EntryOutcome::Ignored => {}
            EntryOutcome::DigitAccepted { .. } => {
                sink.emit(&LockerEvent::DigitAccepted {
                    masked: self.machine.masked_progress(),
                });
            }
            EntryOutcome::Unlocked => {
                self.publish_lock(LockState::Unlocked, feedback);
                self.begin_hold(Verdict::Correct, now + self.success_hold, feedback);
                sink.emit(&LockerEvent::PasswordCorrect);
            }
            EntryOutcome::Mismatch {
                position,
                attempts,
                lockout,
            } => {
                self.begin_hold(Verdict::Incorrect, now + self.failure_hold, feedback);
                sink.emit(&LockerEvent::PasswordIncorrect { position, attempts });
                if lockout {
                    sink.emit(&LockerEvent::AttemptsReset);
                    if let Some(delay) = self.lockout_delay {
                        self.lockout_until = Some(now + delay);
                        sink.emit(&LockerEvent::LockoutStarted {
                            millis: delay.as_millis(),
                        });
                    }
                }
            }
            EntryOutcome::Relocked => {
                self.publish_lock(LockState::Locked, feedback);
                sink.emit(&LockerEvent::Relocked);
            }
        }
        outcome
    }

    // ── Task loop ─────────────────────────────────────────────

    /// Block on keypad input (or the next hold deadline).  Never returns.
    pub async fn run(
        &mut self,
        debouncer: &Debouncer,
        feedback: &mut impl FeedbackSender,
        sink: &mut impl EventSink,
    ) {
        self.start(feedback, sink);
        loop {
            match self.deadline() {
                // A timeout just means a hold or lockout is due.
                Some(deadline) => {
                    let _ = with_deadline(deadline, debouncer.wait_ready()).await;
                }
                None => debouncer.wait_ready().await,
            }
            let presses = debouncer.drain();
            self.handle_presses(Instant::now(), presses, feedback, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LockState {
        self.machine.state()
    }

    pub fn progress(&self) -> usize {
        self.machine.progress()
    }

    pub fn attempts(&self) -> u8 {
        self.machine.attempts()
    }

    pub fn hold(&self) -> Option<Hold> {
        self.hold
    }

    pub fn in_lockout(&self) -> bool {
        self.lockout_until.is_some()
    }

    // ── Internal ──────────────────────────────────────────────

    fn publish_lock(&self, state: LockState, feedback: &mut impl FeedbackSender) {
        self.lock_state.set(state);
        feedback.send(FeedbackCommand::SetLock(state));
    }

    fn begin_hold(&mut self, verdict: Verdict, until: Instant, feedback: &mut impl FeedbackSender) {
        self.hold = Some(Hold { verdict, until });
        feedback.send(FeedbackCommand::SetVerdict(Some(verdict)));
    }

    fn end_hold(&mut self, feedback: &mut impl FeedbackSender) {
        self.hold = None;
        feedback.send(FeedbackCommand::SetVerdict(None));
    }
}
