//! Core monitoring logic: evaluation, alert hysteresis and the refresh cycle.

pub mod alert;
pub mod breach;
pub mod monitor;
pub mod runner;
