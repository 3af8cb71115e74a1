//! Repository layer
//!
//! Repositories abstract the dashboard API behind small traits so the views,
//! stream client and pollers can be driven by in-memory fakes in tests.
//! The HTTP implementations delegate to [`DashboardClient`].
//!
//! [`DashboardClient`]: apiwatch_client::DashboardClient

mod jobs;
mod logs;

pub use jobs::JobRepository;
pub use logs::LogRepository;
