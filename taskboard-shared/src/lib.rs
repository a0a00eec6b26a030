//! # Taskboard Shared Library
//!
//! This crate contains the types and business logic shared by the Taskboard
//! API server and the reminder worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks)
//! - `auth`: Password hashing, session tokens, Google sign-in
//! - `db`: Connection pool and migrations
//! - `redis`: Redis client and the task read cache
//! - `email`: Outgoing mail (SendGrid)
//! - `calendar`: Day boundaries for a UTC offset
//! - `analytics`: Completion statistics and streaks
//! - `board`: Kanban column grouping
//! - `query`: Search, filter and sort over a task list
//! - `reminders`: Due-date classification and the reminder email job

pub mod analytics;
pub mod auth;
pub mod board;
pub mod calendar;
pub mod db;
pub mod email;
pub mod models;
pub mod query;
pub mod redis;
pub mod reminders;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
