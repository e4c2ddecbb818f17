//! Data source abstraction for talking to the backend.
//!
//! The app never awaits the network. It submits ticketed [`Request`]s and
//! polls for [`Reply`]s once per frame, so the UI stays responsive while
//! requests are in flight.

mod channel;
mod http;
mod request;

pub use channel::{ChannelBackend, ChannelSource};
pub use http::HttpSource;
pub use request::{Payload, Reply, Request, Ticket};

use std::fmt::Debug;

/// Trait for exchanging requests and replies with a backend.
///
/// Implementations forward requests to the HTTP API, or to an in-memory
/// channel for embedding and tests.
pub trait DataSource: Send + Debug {
    /// Queue a request. Never blocks; the reply arrives through [`poll`].
    ///
    /// [`poll`]: DataSource::poll
    fn submit(&mut self, ticket: Ticket, request: Request);

    /// Take the next available reply.
    ///
    /// Returns `Some(reply)` if one is ready, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Reply>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns the error of the most recent failed request, if the source has
    /// not succeeded since.
    fn error(&self) -> Option<&str>;
}
