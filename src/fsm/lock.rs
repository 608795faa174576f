//! Password state machine: LOCKED / UNLOCKED tables and passcode accounting.
//!
//! ```text
//!  LOCKED ──[last digit matches]──▶ UNLOCKED
//!    ▲                                 │
//!    └──────────[button "1"]───────────┘
//!
//!  LOCKED, digit matches, not last  → progress += 1
//!  LOCKED, digit mismatches         → progress = 0, attempts += 1
//!                                     (attempts reaching the threshold
//!                                      are reported, then reset to 0)
//!  UNLOCKED, button "0"             → ignored
//! ```
//!
//! One tick consumes one drained [`Presses`] batch.  The handlers only
//! update counters and report an [`EntryOutcome`]; holds, feedback and
//! events are the password service's job.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::String;
use log::debug;

use super::{Fsm, StateDescriptor, StateId};
use crate::config::{LockerConfig, MAX_PASSCODE_LEN, Passcode};
use crate::drivers::button::Presses;

// ---------------------------------------------------------------------------
// Lock state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
}

impl StateId for LockState {
    fn index(self) -> usize {
        match self {
            Self::Locked => 0,
            Self::Unlocked => 1,
        }
    }
}

impl LockState {
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Lock state published for readers on other tasks.  The password
/// service is the only writer.
pub struct SharedLockState(AtomicBool);

impl SharedLockState {
    /// Starts locked.
    pub const fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn get(&self) -> LockState {
        if self.0.load(Ordering::Acquire) {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    pub fn set(&self, state: LockState) {
        self.0.store(state.is_locked(), Ordering::Release);
    }
}

impl Default for SharedLockState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What one tick did with its presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// No press in the batch.
    Idle,
    /// Correct digit, sequence not yet complete.
    DigitAccepted { progress: usize },
    /// Full sequence entered.
    Unlocked,
    /// Wrong digit.  `position` is 1-based.  `lockout` is set on the
    /// attempt that reached the threshold; the counter is already reset.
    Mismatch {
        position: usize,
        attempts: u8,
        lockout: bool,
    },
    /// Re-lock button pressed while unlocked.
    Relocked,
    /// Press with no effect in the current state.
    Ignored,
}

pub struct LockContext {
    pub passcode: Passcode,
    pub lockout_threshold: u8,
    /// Digits of `passcode` matched so far.
    pub progress: usize,
    /// Consecutive incorrect digits.
    pub attempts: u8,
    /// Input for the current tick.
    pub presses: Presses,
    /// Output of the current tick.
    pub outcome: EntryOutcome,
}

impl LockContext {
    pub fn new(config: &LockerConfig) -> Self {
        Self {
            passcode: config.passcode.clone(),
            lockout_threshold: config.lockout_threshold,
            progress: 0,
            attempts: 0,
            presses: Presses::default(),
            outcome: EntryOutcome::Idle,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor<LockState, LockContext>; 2] {
    [
        // Index 0: Locked
        StateDescriptor {
            id: LockState::Locked,
            name: "Locked",
            on_enter: Some(locked_enter),
            on_exit: None,
            on_update: locked_update,
        },
        // Index 1: Unlocked
        StateDescriptor {
            id: LockState::Unlocked,
            name: "Unlocked",
            on_enter: Some(unlocked_enter),
            on_exit: None,
            on_update: unlocked_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOCKED state
// ═══════════════════════════════════════════════════════════════════════════

fn locked_enter(ctx: &mut LockContext) {
    ctx.progress = 0;
}

fn locked_update(ctx: &mut LockContext) -> Option<LockState> {
    let Some(digit) = ctx.presses.digit() else {
        ctx.outcome = EntryOutcome::Idle;
        return None;
    };

    let expected = ctx.passcode.get(ctx.progress).copied();
    if Some(digit) == expected {
        ctx.progress += 1;
        if ctx.progress == ctx.passcode.len() {
            ctx.outcome = EntryOutcome::Unlocked;
            return Some(LockState::Unlocked);
        }
        ctx.outcome = EntryOutcome::DigitAccepted {
            progress: ctx.progress,
        };
        return None;
    }

    let position = ctx.progress + 1;
    ctx.progress = 0;
    ctx.attempts = ctx.attempts.saturating_add(1);
    let attempts = ctx.attempts;
    let lockout = attempts >= ctx.lockout_threshold;
    if lockout {
        ctx.attempts = 0;
    }
    ctx.outcome = EntryOutcome::Mismatch {
        position,
        attempts,
        lockout,
    };
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  UNLOCKED state
// ═══════════════════════════════════════════════════════════════════════════

fn unlocked_enter(ctx: &mut LockContext) {
    ctx.progress = 0;
    ctx.attempts = 0;
}

fn unlocked_update(ctx: &mut LockContext) -> Option<LockState> {
    if ctx.presses.one.is_some() {
        ctx.outcome = EntryOutcome::Relocked;
        Some(LockState::Locked)
    } else if ctx.presses.zero.is_some() {
        debug!("lock: '0' ignored while unlocked");
        ctx.outcome = EntryOutcome::Ignored;
        None
    } else {
        ctx.outcome = EntryOutcome::Idle;
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Machine wrapper
// ═══════════════════════════════════════════════════════════════════════════

/// The lock FSM together with its context.
pub struct LockMachine {
    fsm: Fsm<LockState, LockContext, 2>,
    ctx: LockContext,
}

impl LockMachine {
    pub fn new(config: &LockerConfig) -> Self {
        Self {
            fsm: Fsm::new("lock", build_state_table(), LockState::Locked),
            ctx: LockContext::new(config),
        }
    }

    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
    }

    /// Feed one drained batch of presses.
    pub fn press(&mut self, presses: Presses) -> EntryOutcome {
        self.ctx.presses = presses;
        self.fsm.tick(&mut self.ctx);
        self.ctx.presses = Presses::default();
        self.ctx.outcome
    }

    pub fn state(&self) -> LockState {
        self.fsm.current_state()
    }

    pub fn progress(&self) -> usize {
        self.ctx.progress
    }

    pub fn attempts(&self) -> u8 {
        self.ctx.attempts
    }

    pub fn passcode_len(&self) -> usize {
        self.ctx.passcode.len()
    }

    /// Entered prefix followed by one `*` per remaining digit, e.g. `10***`.
    pub fn masked_progress(&self) -> String<MAX_PASSCODE_LEN> {
        mask_progress(&self.ctx.passcode, self.ctx.progress)
    }
}

pub fn mask_progress(passcode: &[u8], progress: usize) -> String<MAX_PASSCODE_LEN> {
    let mut out = String::new();
    for (i, &digit) in passcode.iter().enumerate() {
        let c = if i < progress {
            char::from(b'0' + digit)
        } else {
            '*'
        };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
