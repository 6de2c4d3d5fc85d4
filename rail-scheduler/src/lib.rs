//! Model railway scheduling engine.
//!
//! Decides whether a train run can use the shared station/segment network
//! without overlapping another run's use of the same track in time, and
//! reports and resolves stations scheduled over their track capacity.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod network;
pub mod schedule;
