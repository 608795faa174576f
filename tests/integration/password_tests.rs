//! Password service scenarios: entry, verdict holds, lockout and relock.
//!
//! Drives [`PasswordService`] directly with drained press batches and
//! explicit timestamps, recording every feedback command and event.

use lockguard::app::events::LockerEvent;
use lockguard::app::feedback::{FeedbackActuator, FeedbackCommand, FeedbackQueue, Verdict};
use lockguard::app::password::PasswordService;
use lockguard::app::supervisor::SensorSupervisor;
use lockguard::config::{HoldInputPolicy, LockerConfig};
use lockguard::drivers::button::Presses;
use lockguard::fsm::lock::{EntryOutcome, LockState, SharedLockState};

use crate::mock_hw::{RecordingFeedback, RecordingPins, RecordingSink, ms, press, resting_hub};

struct Rig {
    feedback: RecordingFeedback,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        Self {
            feedback: RecordingFeedback::new(),
            sink: RecordingSink::new(),
        }
    }

    fn press(&mut self, svc: &mut PasswordService<'_>, digit: u8, at: u64) -> EntryOutcome {
        svc.handle_presses(ms(at), press(digit, at), &mut self.feedback, &mut self.sink)
    }

    /// Enter `digits`, one every `step` ms starting at `from`.
    fn enter(&mut self, svc: &mut PasswordService<'_>, digits: &[u8], from: u64, step: u64) -> EntryOutcome {
        let mut outcome = EntryOutcome::Idle;
        for (i, &d) in digits.iter().enumerate() {
            outcome = self.press(svc, d, from + i as u64 * step);
        }
        outcome
    }
}

fn started<'a>(config: &LockerConfig, lock: &'a SharedLockState, rig: &mut Rig) -> PasswordService<'a> {
    let mut svc = PasswordService::new(config, lock);
    svc.start(&mut rig.feedback, &mut rig.sink);
    svc
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_publishes_locked_state() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let svc = started(&LockerConfig::default(), &lock, &mut rig);

    assert_eq!(svc.state(), LockState::Locked);
    assert_eq!(lock.get(), LockState::Locked);
    assert_eq!(rig.feedback.commands, vec![FeedbackCommand::SetLock(LockState::Locked)]);
    assert_eq!(rig.sink.events, vec![LockerEvent::Started(LockState::Locked)]);
}

#[test]
fn empty_batch_is_idle() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    let outcome = svc.handle_presses(ms(10), Presses::default(), &mut rig.feedback, &mut rig.sink);
    assert_eq!(outcome, EntryOutcome::Idle);
    assert_eq!(svc.progress(), 0);
}

// ── Correct entry ─────────────────────────────────────────────

#[test]
fn correct_sequence_unlocks() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    let outcome = rig.enter(&mut svc, &[1, 0, 1, 1, 0], 0, 300);

    assert_eq!(outcome, EntryOutcome::Unlocked);
    assert_eq!(svc.state(), LockState::Unlocked);
    assert_eq!(lock.get(), LockState::Unlocked);
    assert_eq!(svc.attempts(), 0);
    assert!(rig.feedback.commands.contains(&FeedbackCommand::SetLock(LockState::Unlocked)));
    assert_eq!(rig.feedback.last_verdict(), Some(Some(Verdict::Correct)));
    assert!(rig.sink.contains(&LockerEvent::PasswordCorrect));

    let hold = svc.hold().expect("success hold");
    assert_eq!(hold.verdict, Verdict::Correct);
    assert_eq!(hold.until, ms(1200 + 2000));
}

#[test]
fn partial_entry_reports_masked_progress() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    rig.enter(&mut svc, &[1, 0], 0, 300);

    assert_eq!(svc.progress(), 2);
    let masked: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            LockerEvent::DigitAccepted { masked } => Some(masked.as_str().to_owned()),
            _ => None,
        })
        .collect();
    assert_eq!(masked, vec!["1****", "10***"]);
}

// ── Incorrect entry ───────────────────────────────────────────

#[test]
fn wrong_second_digit_counts_one_attempt() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    let outcome = rig.enter(&mut svc, &[1, 1], 0, 300);

    assert_eq!(
        outcome,
        EntryOutcome::Mismatch {
            position: 2,
            attempts: 1,
            lockout: false
        }
    );
    assert_eq!(svc.progress(), 0);
    assert_eq!(svc.attempts(), 1);
    assert_eq!(svc.state(), LockState::Locked);
    assert_eq!(rig.feedback.last_verdict(), Some(Some(Verdict::Incorrect)));
    assert!(rig.sink.contains(&LockerEvent::PasswordIncorrect { position: 2, attempts: 1 }));
}

#[test]
fn third_failure_resets_counter() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    // Each failure lands after the previous failure hold has ended.
    assert!(matches!(rig.press(&mut svc, 0, 0), EntryOutcome::Mismatch { attempts: 1, .. }));
    assert!(matches!(rig.press(&mut svc, 0, 2000), EntryOutcome::Mismatch { attempts: 2, .. }));
    let third = rig.press(&mut svc, 0, 4000);

    assert_eq!(
        third,
        EntryOutcome::Mismatch {
            position: 1,
            attempts: 3,
            lockout: true
        }
    );
    assert_eq!(svc.attempts(), 0);
    assert!(!svc.in_lockout(), "no delay configured");
    assert_eq!(rig.sink.count(|e| *e == LockerEvent::AttemptsReset), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, LockerEvent::LockoutStarted { .. })), 0);
}

#[test]
fn correct_entry_clears_attempts() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    rig.press(&mut svc, 0, 0);
    assert_eq!(svc.attempts(), 1);
    rig.enter(&mut svc, &[1, 0, 1, 1, 0], 2000, 300);
    assert_eq!(svc.state(), LockState::Unlocked);
    assert_eq!(svc.attempts(), 0);
}

// ── Verdict holds ─────────────────────────────────────────────

#[test]
fn input_during_failure_hold_is_discarded() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    rig.press(&mut svc, 0, 0);
    assert_eq!(rig.press(&mut svc, 1, 500), EntryOutcome::Ignored);
    assert_eq!(svc.progress(), 0);
    assert_eq!(svc.attempts(), 1);

    // Hold ended at 1000 ms; the same press is now taken.
    assert_eq!(rig.press(&mut svc, 1, 1000), EntryOutcome::DigitAccepted { progress: 1 });
}

#[test]
fn preempt_policy_ends_hold_on_input() {
    let config = LockerConfig {
        input_during_hold: HoldInputPolicy::Preempt,
        ..LockerConfig::default()
    };
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&config, &lock, &mut rig);

    rig.press(&mut svc, 0, 0);
    rig.feedback.clear();

    let outcome = rig.press(&mut svc, 1, 300);
    assert_eq!(outcome, EntryOutcome::DigitAccepted { progress: 1 });
    assert!(svc.hold().is_none());
    assert_eq!(rig.feedback.commands, vec![FeedbackCommand::SetVerdict(None)]);
}

#[test]
fn hold_expiry_clears_verdict_without_input() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    rig.press(&mut svc, 0, 0);
    assert_eq!(svc.deadline(), Some(ms(1000)));

    svc.expire(ms(999), &mut rig.feedback);
    assert_eq!(rig.feedback.last_verdict(), Some(Some(Verdict::Incorrect)));

    svc.expire(ms(1000), &mut rig.feedback);
    assert_eq!(rig.feedback.last_verdict(), Some(None));
    assert!(svc.hold().is_none());
    assert_eq!(svc.deadline(), None);
}

// ── Lockout delay ─────────────────────────────────────────────

#[test]
fn lockout_delay_ignores_input_until_deadline() {
    let config = LockerConfig {
        lockout_delay_ms: 5000,
        ..LockerConfig::default()
    };
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&config, &lock, &mut rig);

    for at in [0, 2000, 4000] {
        rig.press(&mut svc, 0, at);
    }
    assert!(svc.in_lockout());
    assert!(rig.sink.contains(&LockerEvent::LockoutStarted { millis: 5000 }));
    assert_eq!(svc.deadline(), Some(ms(5000)), "failure hold ends first");

    assert_eq!(rig.press(&mut svc, 1, 6000), EntryOutcome::Ignored);
    assert_eq!(svc.deadline(), Some(ms(9000)));

    assert_eq!(rig.press(&mut svc, 1, 9000), EntryOutcome::DigitAccepted { progress: 1 });
    assert!(!svc.in_lockout());
}

// ── Relock ────────────────────────────────────────────────────

#[test]
fn button_one_relocks_and_zero_is_ignored() {
    let lock = SharedLockState::new();
    let mut rig = Rig::new();
    let mut svc = started(&LockerConfig::default(), &lock, &mut rig);

    rig.enter(&mut svc, &[1, 0, 1, 1, 0], 0, 300);
    assert_eq!(svc.state(), LockState::Unlocked);

    // Past the 2 s success hold.
    assert_eq!(rig.press(&mut svc, 0, 4000), EntryOutcome::Ignored);
    assert_eq!(svc.state(), LockState::Unlocked);

    rig.feedback.clear();
    assert_eq!(rig.press(&mut svc, 1, 4500), EntryOutcome::Relocked);
    assert_eq!(svc.state(), LockState::Locked);
    assert_eq!(lock.get(), LockState::Locked);
    assert_eq!(rig.feedback.commands, vec![FeedbackCommand::SetLock(LockState::Locked)]);
    assert!(rig.sink.contains(&LockerEvent::Relocked));

    // A fresh entry starts from the first digit.
    assert_eq!(rig.press(&mut svc, 1, 5000), EntryOutcome::DigitAccepted { progress: 1 });
}

// ── Feedback actor ────────────────────────────────────────────

#[test]
fn alert_end_keeps_failure_buzzer_through_actor() {
    let config = LockerConfig {
        failure_hold_ms: 5000,
        ..LockerConfig::default()
    };
    let lock = SharedLockState::new();
    let queue = FeedbackQueue::new();
    let mut actuator = FeedbackActuator::new(RecordingPins::default());
    actuator.start();

    let mut sink = RecordingSink::new();
    let mut password = PasswordService::new(&config, &lock);
    let mut supervisor = SensorSupervisor::new(&config, &lock);
    let mut hub = resting_hub();
    let mut producer = &queue;

    password.start(&mut producer, &mut sink);
    supervisor.start();

    // Wrong digit, then an over-temperature poll.
    password.handle_presses(ms(0), press(0, 0), &mut producer, &mut sink);
    hub.thermo.celsius = 35.0;
    supervisor.poll(ms(0), false, &mut hub, &mut producer, &mut sink);
    actuator.drain(&queue);
    let s = *actuator.state();
    assert!(s.incorrect_led && s.alert_led && s.buzzer && s.locked_led);

    // Alert pulse ends while the failure hold is still running.
    hub.thermo.celsius = 22.0;
    supervisor.poll(ms(1000), false, &mut hub, &mut producer, &mut sink);
    actuator.drain(&queue);
    let s = *actuator.state();
    assert!(!s.alert_led);
    assert!(s.buzzer, "failure buzzer must survive the alert ending");

    // Failure hold ends.
    password.expire(ms(5000), &mut producer);
    actuator.drain(&queue);
    let s = *actuator.state();
    assert!(!s.incorrect_led && !s.buzzer);
    assert!(s.locked_led && !s.unlocked_led);

    let last = actuator.port().last().copied().expect("writes");
    assert_eq!(last, s);
}
