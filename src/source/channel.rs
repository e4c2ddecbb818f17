//! Channel-based data source.
//!
//! Hands requests to whoever holds the other end of a channel pair and
//! returns the replies they push back. Useful for embedding the dashboard
//! behind a different transport, and for driving the app in tests.

use tokio::sync::mpsc;

use super::request::{Reply, Request, Ticket};
use super::DataSource;

/// The far end of a [`ChannelSource`].
#[derive(Debug)]
pub struct ChannelBackend {
    pub requests: mpsc::UnboundedReceiver<(Ticket, Request)>,
    pub replies: mpsc::UnboundedSender<Reply>,
}

impl ChannelBackend {
    /// Take every request submitted so far.
    pub fn drain(&mut self) -> Vec<(Ticket, Request)> {
        let mut out = Vec::new();
        while let Ok(item) = self.requests.try_recv() {
            out.push(item);
        }
        out
    }

    /// Push a reply back to the source. Returns false once the source is gone.
    pub fn reply(&self, reply: Reply) -> bool {
        self.replies.send(reply).is_ok()
    }
}

/// A data source that forwards requests over a channel.
///
/// # Example
///
/// ```
/// use landslide_watch::source::{ChannelSource, DataSource, Request};
///
/// let (mut backend, mut source) = ChannelSource::create("in-memory");
/// source.submit(1, Request::CheckSession);
/// assert_eq!(backend.drain(), vec![(1, Request::CheckSession)]);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    requests: mpsc::UnboundedSender<(Ticket, Request)>,
    replies: mpsc::UnboundedReceiver<Reply>,
    description: String,
    error: Option<String>,
}

impl ChannelSource {
    /// Create a connected backend/source pair.
    pub fn create(source_description: &str) -> (ChannelBackend, Self) {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let backend = ChannelBackend {
            requests: request_rx,
            replies: reply_tx,
        };
        let source = Self {
            requests: request_tx,
            replies: reply_rx,
            description: format!("channel: {}", source_description),
            error: None,
        };
        (backend, source)
    }
}

impl DataSource for ChannelSource {
    fn submit(&mut self, ticket: Ticket, request: Request) {
        if self.requests.send((ticket, request)).is_err() {
            self.error = Some("Channel closed".to_string());
        }
    }

    fn poll(&mut self) -> Option<Reply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.error = Some("Channel closed".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
