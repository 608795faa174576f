//! Keypad input and feedback output drivers.

pub mod button;
pub mod indicators;
