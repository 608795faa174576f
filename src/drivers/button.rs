//! Debounced two-button keypad input.
//!
//! ## Hardware
//!
//! Two active-low momentary switches with pull-ups.  Each falling edge
//! calls [`Debouncer::on_edge`] from the edge handler; the password task
//! blocks in [`Debouncer::wait_ready`] and then takes everything pending
//! with [`Debouncer::drain`].
//!
//! ## Semantics
//!
//! | Rule              | Behaviour                                              |
//! |-------------------|--------------------------------------------------------|
//! | Debounce          | Edge accepted iff > window since last accepted edge    |
//! | Per-source timers | Button one and button zero never suppress each other   |
//! | Single slot       | Accepted edge overwrites an undrained one (no queue)   |
//! | Drain             | Both slots snapshotted and cleared in one critical section |
//!
//! The edge path only touches a critical-section mutex and a signal, so it
//! is safe to call from interrupt context and never blocks.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use log::debug;

/// Physical keypad button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSource {
    /// Enters digit 1; re-locks while unlocked.
    One,
    /// Enters digit 0.
    Zero,
}

impl ButtonSource {
    pub const ALL: [ButtonSource; 2] = [ButtonSource::One, ButtonSource::Zero];

    /// Passcode digit this button enters.
    pub const fn digit(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Zero => 0,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Zero => 1,
        }
    }
}

/// A debounced logical press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub source: ButtonSource,
    /// Time the edge was accepted.
    pub at: Instant,
}

/// Everything pending at one consumer wake-up, at most one per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presses {
    pub one: Option<ButtonEvent>,
    pub zero: Option<ButtonEvent>,
}

impl Presses {
    pub fn is_empty(&self) -> bool {
        self.one.is_none() && self.zero.is_none()
    }

    pub fn contains(&self, source: ButtonSource) -> bool {
        match source {
            ButtonSource::One => self.one.is_some(),
            ButtonSource::Zero => self.zero.is_some(),
        }
    }

    /// Digit entered by this batch.  When both buttons are pending the
    /// "1" button wins.
    pub fn digit(&self) -> Option<u8> {
        if self.one.is_some() {
            Some(ButtonSource::One.digit())
        } else if self.zero.is_some() {
            Some(ButtonSource::Zero.digit())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SourceSlot {
    last_accepted: Option<Instant>,
    pending: Option<ButtonEvent>,
}

impl SourceSlot {
    const fn new() -> Self {
        Self {
            last_accepted: None,
            pending: None,
        }
    }
}

/// Per-source debounce filter feeding a single-slot-per-source mailbox.
pub struct Debouncer {
    window: Duration,
    slots: Mutex<CriticalSectionRawMutex, RefCell<[SourceSlot; 2]>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl Debouncer {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            slots: Mutex::new(RefCell::new([SourceSlot::new(), SourceSlot::new()])),
            ready: Signal::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Feed a raw falling edge.  Returns `true` if it was accepted as a
    /// press, `false` if it fell inside the debounce window.
    pub fn on_edge(&self, source: ButtonSource, now: Instant) -> bool {
        let accepted = self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = &mut slots[source.index()];

            let outside_window = slot
                .last_accepted
                .is_none_or(|last| now.saturating_duration_since(last) > self.window);
            if !outside_window {
                return false;
            }

            slot.last_accepted = Some(now);
            slot.pending = Some(ButtonEvent { source, at: now });
            true
        });

        if accepted {
            self.ready.signal(());
        }
        accepted
    }

    /// Take both pending slots at once, leaving them empty.
    pub fn drain(&self) -> Presses {
        let presses = self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            Presses {
                one: slots[ButtonSource::One.index()].pending.take(),
                zero: slots[ButtonSource::Zero.index()].pending.take(),
            }
        });
        if !presses.is_empty() {
            debug!("keypad: drained {:?}", presses);
        }
        presses
    }

    /// Whether either source has an undrained press.
    pub fn has_pending(&self) -> bool {
        self.slots
            .lock(|slots| slots.borrow().iter().any(|s| s.pending.is_some()))
    }

    /// Block until at least one press has been accepted since the last
    /// wake-up.  The slots may already be empty when this returns if a
    /// previous drain raced the signal; callers handle an empty drain.
    pub async fn wait_ready(&self) {
        self.ready.wait().await;
    }
}
