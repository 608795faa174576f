//! LockGuard locker firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  ESP-IDF-specific code lives in the `espidf`-gated binary;
//! everything here runs on the host against `embedded-hal` mocks.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod sensors;
