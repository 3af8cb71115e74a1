//! apiwatch Core
//!
//! Core types shared by the apiwatch dashboard crates.
//!
//! This crate contains:
//! - Domain types: request log entries, background jobs and their log lines
//! - DTOs: wire representations exchanged with the API server
//! - Timestamp helpers tolerant of the formats the server emits

pub mod domain;
pub mod dto;
pub mod error;
pub mod timestamp;

pub use error::ModelError;
