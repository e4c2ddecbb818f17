//! HTTP data source backed by [`ApiClient`].
//!
//! A background worker owns the client. Session requests (login, logout) run
//! in order on the worker because they change the credential every later
//! request carries. Everything else runs on its own task, so a slow listing
//! never holds up the risk map.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::request::{execute, Payload, Reply, Request, Ticket};
use super::DataSource;
use crate::api::{ApiClient, ApiError, SessionStore};

/// A data source that talks to the backend over HTTP.
///
/// # Example
///
/// ```no_run
/// use landslide_watch::api::ApiClient;
/// use landslide_watch::source::{DataSource, HttpSource, Request};
///
/// # tokio_test::block_on(async {
/// let client = ApiClient::builder().base_url("http://localhost:8000").build().unwrap();
/// let mut source = HttpSource::spawn(client, None);
/// source.submit(1, Request::CheckSession);
/// # });
/// ```
#[derive(Debug)]
pub struct HttpSource {
    requests: mpsc::UnboundedSender<(Ticket, Request)>,
    replies: mpsc::UnboundedReceiver<Reply>,
    description: String,
    shared_error: Arc<Mutex<Option<String>>>,
    last_error: Option<String>,
}

impl HttpSource {
    /// Spawn the worker. Must be called from within a tokio runtime.
    ///
    /// With a `store`, a successful login persists the credential and a
    /// logout removes it.
    pub fn spawn(client: ApiClient, store: Option<SessionStore>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let shared_error = Arc::new(Mutex::new(None));
        let description = format!("api: {}", client.base_url());

        tokio::spawn(run(client, store, request_rx, reply_tx, shared_error.clone()));

        Self {
            requests: request_tx,
            replies: reply_rx,
            description,
            shared_error,
            last_error: None,
        }
    }
}

impl DataSource for HttpSource {
    fn submit(&mut self, ticket: Ticket, request: Request) {
        debug!(ticket, request = request.name(), "Submitting request");
        if self.requests.send((ticket, request)).is_err() {
            *self.shared_error.lock() = Some("Request worker stopped".to_string());
        }
    }

    fn poll(&mut self) -> Option<Reply> {
        let reply = match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                *self.shared_error.lock() = Some("Request worker stopped".to_string());
                None
            }
        };
        self.last_error = self.shared_error.lock().clone();
        reply
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Record the error of a failed request. A 401 is a session state, not a
/// connectivity problem, so it clears nothing and sets nothing.
fn record(shared_error: &Mutex<Option<String>>, outcome: &Result<Payload, ApiError>) {
    match outcome {
        Ok(_) => *shared_error.lock() = None,
        Err(e) if e.is_unauthorized() => {}
        Err(e) => *shared_error.lock() = Some(e.to_string()),
    }
}

async fn run(
    mut client: ApiClient,
    store: Option<SessionStore>,
    mut requests: mpsc::UnboundedReceiver<(Ticket, Request)>,
    replies: mpsc::UnboundedSender<Reply>,
    shared_error: Arc<Mutex<Option<String>>>,
) {
    while let Some((ticket, request)) = requests.recv().await {
        match request {
            Request::Login { username, password } => {
                let outcome = client.login(&username, &password).await.map(Payload::Session);
                if outcome.is_ok() {
                    if let (Some(store), Some(credential)) = (&store, client.credential()) {
                        if let Err(e) = store.save(credential) {
                            warn!("Failed to save session to {}: {}", store.path().display(), e);
                        }
                    }
                }
                record(&shared_error, &outcome);
                if replies.send(Reply { ticket, outcome }).is_err() {
                    break;
                }
            }
            Request::Logout => {
                // The local session ends whatever the backend says.
                if let Err(e) = client.logout().await {
                    warn!("Logout request failed: {}", e);
                }
                if let Some(store) = &store {
                    if let Err(e) = store.clear() {
                        warn!("Failed to remove session file {}: {}", store.path().display(), e);
                    }
                }
                info!("Logged out");
                if replies.send(Reply::ok(ticket, Payload::LoggedOut)).is_err() {
                    break;
                }
            }
            request => {
                let client = client.clone();
                let replies = replies.clone();
                let shared_error = shared_error.clone();
                tokio::spawn(async move {
                    let name = request.name();
                    let outcome = execute(&client, request).await;
                    if let Err(ref e) = outcome {
                        debug!(ticket, request = name, "Request failed: {}", e);
                    }
                    record(&shared_error, &outcome);
                    let _ = replies.send(Reply { ticket, outcome });
                });
            }
        }
    }
    debug!("Request worker stopped");
}
