//! Core domain types
//!
//! This module contains the structures the dashboard holds in memory.
//! They are built from the wire DTOs in [`crate::dto`] and are the only
//! shapes the reconciler, renderer and poller operate on.

pub mod job;
pub mod log;
