//! Connection state machine for the live log stream
//!
//! ```text
//! Disconnected --begin_connect--> Connecting --opened--> Open
//!      ^                              |                    |
//!      +-------------failed-----------+--------------------+
//! ```
//!
//! A failure parks the machine in `Disconnected` with one reconnect timer
//! armed. Further failures while the timer is pending do not arm another.

use std::time::Duration;

use tokio::time::Instant;

/// Observable state of the push connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

/// Single-slot reconnect timer
#[derive(Debug, Default)]
struct ReconnectTimer {
    due: Option<Instant>,
}

/// Connection lifecycle with its reconnect timer
#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    timer: ReconnectTimer,
    delay: Duration,
    closed: bool,
}

impl Connection {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            timer: ReconnectTimer::default(),
            delay,
            closed: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Instant at which the pending reconnect fires
    pub fn reconnect_due(&self) -> Option<Instant> {
        self.timer.due
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Start a connection attempt
    ///
    /// Only allowed from `Disconnected` with no reconnect pending. Returns
    /// whether the transition happened.
    pub fn begin_connect(&mut self) -> bool {
        if self.closed || self.state != ConnectionState::Disconnected || self.timer.due.is_some() {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// The server accepted the connection
    pub fn opened(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
        }
    }

    /// Transport error or unexpected close
    ///
    /// Returns the reconnect deadline when this call armed the timer, or
    /// `None` if a reconnect was already pending or the connection is closed.
    pub fn failed(&mut self, now: Instant) -> Option<Instant> {
        self.state = ConnectionState::Disconnected;
        if self.closed || self.timer.due.is_some() {
            return None;
        }
        let due = now + self.delay;
        self.timer.due = Some(due);
        Some(due)
    }

    /// Disarm the timer once its deadline has passed
    ///
    /// Returns whether a reconnect attempt should now be made.
    pub fn timer_fired(&mut self, now: Instant) -> bool {
        match self.timer.due {
            Some(due) if due <= now && !self.closed => {
                self.timer.due = None;
                true
            }
            _ => false,
        }
    }

    /// Explicit teardown: cancels any pending reconnect for good
    pub fn close(&mut self) {
        self.closed = true;
        self.timer.due = None;
        self.state = ConnectionState::Disconnected;
    }
}
