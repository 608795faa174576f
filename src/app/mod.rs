//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the locker: the password
//! service, the sensor supervisor and the feedback actuator they share.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod feedback;
pub mod password;
pub mod ports;
pub mod supervisor;
