//! Byzantine Generals with the Oral Messages algorithm OM(m).
//!
//! A commander sends an order to `n - 1` lieutenants. Every lieutenant runs
//! OM concurrently: at each level it relays what it received, tagged with
//! its own id, to every general not yet on the message's path, then recurses
//! on what the others relay back. At level 0 the designated reporter records
//! the paths it received. Traitors lie by a fixed parity rule, and the run is
//! only allowed when `n > 3m` for `m` traitors.

pub mod config;
pub mod error;
pub mod message;
pub mod order;
pub mod report;
pub mod session;

mod completion;
mod lieutenant;
mod mailbox;

pub use crate::config::{Config, MAX_GENERALS};
pub use crate::error::{Error, Result};
pub use crate::message::PathMessage;
pub use crate::order::Order;
pub use crate::report::{ReportSink, StdoutSink, Transcript};
pub use crate::session::Session;

pub type NodeId = usize;

/// Remaining OM recursion depth. Level `m` carries the commander's order,
/// level 0 is where the reporter records what it received.
pub type Level = usize;
