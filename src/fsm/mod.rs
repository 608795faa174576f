//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern, generic over the state set and the
//! context type so the lock and power machines share one engine:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable<S, C>                                             │
//! │  ┌──────────┬────────────┬────────────┬───────────────────┐   │
//! │  │ S        │ on_enter   │ on_exit    │ on_update         │   │
//! │  ├──────────┼────────────┼────────────┼───────────────────┤   │
//! │  │ Locked   │ fn(&mut C) │ fn(&mut C) │ fn(&mut C)->Opt<S>│   │
//! │  │ Unlocked │ fn(&mut C) │ fn(&mut C) │ fn(&mut C)->Opt<S>│   │
//! │  └──────────┴────────────┴────────────┴───────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Inputs for the tick are written into the context
//! before the call; handlers leave their outputs there too.

pub mod lock;
pub mod power;

use core::fmt::Debug;

use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// A closed set of states usable as table indices.
pub trait StateId: Copy + Eq + Debug {
    /// Position of this state's row in the table.
    fn index(self) -> usize;
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<S, C> = fn(&mut C) -> Option<S>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap, no `dyn`.
pub struct StateDescriptor<S, C> {
    pub id: S,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<S, C>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table.  The context is owned by the caller and threaded
/// through every handler call.
pub struct Fsm<S: StateId, C, const N: usize> {
    /// Label used in transition logs.
    label: &'static str,
    /// Fixed-size table indexed by `S::index()`.
    table: [StateDescriptor<S, C>; N],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl<S: StateId, C, const N: usize> Fsm<S, C, N> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(label: &'static str, table: [StateDescriptor<S, C>; N], initial: S) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id.index() == i),
            "{label}: state table rows out of order"
        );
        Self {
            label,
            table,
            current: initial.index(),
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut C) {
        info!("{} FSM starting in state: {}", self.label, self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    ///
    /// Returns the state entered, if any.
    pub fn tick(&mut self, ctx: &mut C) -> Option<S> {
        self.tick_count += 1;

        let next = (self.table[self.current].on_update)(ctx)?;
        self.transition(next, ctx);
        Some(next)
    }

    /// Force an immediate transition regardless of what `on_update` would
    /// return.  No-op if already in `next`.
    pub fn force_transition(&mut self, next: S, ctx: &mut C) {
        if next.index() != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> S {
        self.table[self.current].id
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: S, ctx: &mut C) {
        let next_idx = next.index();

        info!(
            "{} FSM transition: {} -> {}",
            self.label, self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
