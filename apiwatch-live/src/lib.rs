//! apiwatch Live
//!
//! Client-side state for the live observability views of the dashboard:
//!
//! - `stream`: push connection to the request log stream, with reconnect
//! - `reconcile`: snapshot replacement and partial-update merging
//! - `render`: pure rendering of logs, jobs and job log pages
//! - `scheduler`: single-flight fixed-interval polling
//! - `viewer`: transient job log viewer
//! - `view`: per-view owners tying the above together
//!
//! Every view owns its own connection, timers and collections; nothing is
//! shared between views.

pub mod config;
pub mod reconcile;
pub mod render;
pub mod repository;
pub mod scheduler;
pub mod stream;
pub mod view;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use view::{JobsView, LogsView, Notice, NoticeKind};
pub use viewer::JobLogViewer;
