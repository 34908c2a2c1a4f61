//! Drive-by-wire bridge agent: library crate behind the `dbw-agent` binary.
//!
//! Re-exports all modules so external crates (e.g. `dbw-e2e-tests`) can
//! drive a `Session` against a mock bus.

pub mod config;
pub mod control;
pub mod events;
pub mod intent;
pub mod scheduler;
pub mod session;
pub mod slot;
pub mod status_report;
