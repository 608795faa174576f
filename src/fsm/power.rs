//! Sensor power state machine: AWAKE / SLEEPING and the stability window.
//!
//! ```text
//!  AWAKE ──[at rest continuously ≥ required]──▶ SLEEPING
//!    ▲                                            │
//!    └──────────────[wake request]────────────────┘
//! ```
//!
//! Entering either state resets the stability window and leaves a
//! [`PowerCommand`] for the supervisor to apply to the collaborators.

use embassy_time::{Duration, Instant};

use super::{Fsm, StateDescriptor, StateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Awake,
    Sleeping,
}

impl StateId for PowerState {
    fn index(self) -> usize {
        match self {
            Self::Awake => 0,
            Self::Sleeping => 1,
        }
    }
}

/// Power mode the sensor collaborators must be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    LowPower,
    Active,
}

// ---------------------------------------------------------------------------
// Stability window
// ---------------------------------------------------------------------------

/// Tracks how long a predicate has held without interruption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityWindow {
    started: Option<Instant>,
}

impl StabilityWindow {
    pub const fn new() -> Self {
        Self { started: None }
    }

    /// Record one sample.  A violating sample resets the window; the first
    /// eligible sample after a reset starts it.  Returns `true` once the
    /// predicate has held for at least `required`.
    pub fn observe(&mut self, eligible: bool, now: Instant, required: Duration) -> bool {
        if !eligible {
            self.started = None;
            return false;
        }
        let started = *self.started.get_or_insert(now);
        now.saturating_duration_since(started) >= required
    }

    pub fn reset(&mut self) {
        self.started = None;
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Time the predicate has held so far (zero when not running).
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started
            .map(|s| now.saturating_duration_since(s))
            .unwrap_or(Duration::from_ticks(0))
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

pub struct PowerContext {
    /// Continuous rest time before sleeping.
    pub required: Duration,
    pub stability: StabilityWindow,
    // --- per-tick inputs ---
    pub now: Instant,
    pub at_rest: bool,
    pub wake_requested: bool,
    // --- output ---
    pub command: Option<PowerCommand>,
}

impl PowerContext {
    pub fn new(required: Duration) -> Self {
        Self {
            required,
            stability: StabilityWindow::new(),
            now: Instant::from_ticks(0),
            at_rest: false,
            wake_requested: false,
            command: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor<PowerState, PowerContext>; 2] {
    [
        StateDescriptor {
            id: PowerState::Awake,
            name: "Awake",
            on_enter: Some(awake_enter),
            on_exit: None,
            on_update: awake_update,
        },
        StateDescriptor {
            id: PowerState::Sleeping,
            name: "Sleeping",
            on_enter: Some(sleeping_enter),
            on_exit: None,
            on_update: sleeping_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAKE state
// ═══════════════════════════════════════════════════════════════════════════

fn awake_enter(ctx: &mut PowerContext) {
    ctx.stability.reset();
    ctx.command = Some(PowerCommand::Active);
}

fn awake_update(ctx: &mut PowerContext) -> Option<PowerState> {
    if ctx.wake_requested {
        // Restart the window from this sample.
        ctx.stability.reset();
    }
    ctx.stability
        .observe(ctx.at_rest, ctx.now, ctx.required)
        .then_some(PowerState::Sleeping)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING state
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_enter(ctx: &mut PowerContext) {
    ctx.stability.reset();
    ctx.command = Some(PowerCommand::LowPower);
}

fn sleeping_update(ctx: &mut PowerContext) -> Option<PowerState> {
    ctx.wake_requested.then_some(PowerState::Awake)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Machine wrapper
// ═══════════════════════════════════════════════════════════════════════════

/// The power FSM together with its context.
pub struct PowerMachine {
    fsm: Fsm<PowerState, PowerContext, 2>,
    ctx: PowerContext,
}

impl PowerMachine {
    pub fn new(required: Duration) -> Self {
        Self {
            fsm: Fsm::new("power", build_state_table(), PowerState::Awake),
            ctx: PowerContext::new(required),
        }
    }

    /// Enter AWAKE.  Collaborators are already active after bring-up, so
    /// the initial command is dropped.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
        self.ctx.command = None;
    }

    /// Advance one supervisor cycle.  `at_rest` is ignored while sleeping.
    /// Returns the power command to apply, if the state changed.
    pub fn tick(&mut self, now: Instant, at_rest: bool, wake_requested: bool) -> Option<PowerCommand> {
        self.ctx.now = now;
        self.ctx.at_rest = at_rest;
        self.ctx.wake_requested = wake_requested;
        self.fsm.tick(&mut self.ctx);
        self.ctx.command.take()
    }

    pub fn state(&self) -> PowerState {
        self.fsm.current_state()
    }

    pub fn stability(&self) -> &StabilityWindow {
        &self.ctx.stability
    }
}
