//! Tendril W1 - access to the 1-Wire bus
//!
//! The kernel w1 subsystem exposes the bus through sysfs; this crate wraps
//! that surface behind the `W1Bus` trait so the polling core can be driven
//! by a fake bus in tests.

pub mod bus;
pub mod sysfs;

pub use bus::{BusDevice, W1Bus};
pub use sysfs::SysfsBus;
