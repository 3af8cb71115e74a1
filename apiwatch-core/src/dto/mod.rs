//! Data Transfer Objects for the dashboard API
//!
//! This module contains the JSON shapes exchanged with the API server.
//! DTOs mirror the wire format field for field; conversion into the
//! domain types in [`crate::domain`] is where state invariants are checked.

pub mod job;
pub mod log;
