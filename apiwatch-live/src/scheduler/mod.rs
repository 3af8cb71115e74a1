//! Fixed-interval refresh
//!
//! Views that have no push source (the job list, and the request log list
//! when the stream endpoint is not used) refresh through a poller that
//! refetches the whole collection on every tick.

pub mod poller;

pub use poller::{Poller, PollerHandle};
