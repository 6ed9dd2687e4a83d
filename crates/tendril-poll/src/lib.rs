//! Tendril Poll - the reconciliation and polling loop
//!
//! Each cycle scans the bus, classifies every configured device as present
//! or missing (and every unknown bus device as not configured), publishes
//! one state message per classification, and emits throttled Home Assistant
//! discovery metadata. A drift-compensated sleep keeps cycles on period.

pub mod discovery;
pub mod publisher;
pub mod reconcile;
pub mod schedule;

pub use discovery::build_discovery;
pub use publisher::Publisher;
pub use reconcile::{CycleSummary, PollSettings, Poller};
pub use schedule::{remaining, DiscoveryThrottle};
