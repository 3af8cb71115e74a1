//! Live log stream
//!
//! The connection state machine lives in [`connection`]; [`client`] runs it
//! against a [`LogRepository`](crate::repository::LogRepository) and turns
//! raw event payloads into [`StreamMessage`]s.

pub mod client;
pub mod connection;

pub use client::{StreamClient, StreamHandle, StreamMessage, classify};
pub use connection::{Connection, ConnectionState};
