//! # Taskboard Worker
//!
//! Background process that sends the daily task reminder emails.
//!
//! - `config`: Environment configuration
//! - `scheduler`: Daily wall-clock trigger and the [`scheduler::Job`] seam

pub mod config;
pub mod scheduler;
