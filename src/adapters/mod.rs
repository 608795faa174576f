//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `log_sink`     | EventSink          | Serial log output        |
//!
//! The sensor and indicator adapters live with their drivers in
//! [`crate::sensors`] and [`crate::drivers`].

pub mod log_sink;
