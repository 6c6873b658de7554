use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::UserServiceClient;
use crate::error::Result;

/// Quiet period after the last keystroke before a username is looked up.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameStatus {
    Initial,
    Checking,
    Available,
    Taken,
}

/// Answers whether a username is already in use.
#[async_trait]
pub trait UsernameLookup: Send + Sync {
    async fn exists(&self, username: &str) -> Result<bool>;
}

/// [`UsernameLookup`] against the user-service, as the signed-in user.
pub struct RemoteUsernames {
    client: UserServiceClient,
    token: String,
}

impl RemoteUsernames {
    pub fn new(client: UserServiceClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl UsernameLookup for RemoteUsernames {
    async fn exists(&self, username: &str) -> Result<bool> {
        self.client.username_exists(&self.token, username).await
    }
}

/// Debounced availability check for a username field. Every [`input`] call
/// restarts the timer and discards any check still in flight.
///
/// [`input`]: UsernameChecker::input
pub struct UsernameChecker {
    lookup: Arc<dyn UsernameLookup>,
    original: String,
    delay: Duration,
    status: Arc<watch::Sender<UsernameStatus>>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl UsernameChecker {
    /// `original` is the username the profile already has; it is never checked.
    pub fn new(lookup: Arc<dyn UsernameLookup>, original: impl Into<String>) -> Self {
        Self::with_delay(lookup, original, DEFAULT_DELAY)
    }

    pub fn with_delay(lookup: Arc<dyn UsernameLookup>, original: impl Into<String>, delay: Duration) -> Self {
        Self {
            lookup,
            original: original.into(),
            delay,
            status: Arc::new(watch::Sender::new(UsernameStatus::Initial)),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    pub fn status(&self) -> UsernameStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UsernameStatus> {
        self.status.subscribe()
    }

    /// Feeds the current field value. Must be called inside a tokio runtime.
    pub fn input(&self, value: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_pending();

        // Any earlier verdict was about a different value.
        self.status.send_replace(UsernameStatus::Initial);
        if value.is_empty() || value == self.original {
            return;
        }

        let lookup = self.lookup.clone();
        let status = self.status.clone();
        let current = self.generation.clone();
        let delay = self.delay;
        let value = value.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            status.send_replace(UsernameStatus::Checking);

            let result = match lookup.exists(&value).await {
                Ok(true) => UsernameStatus::Taken,
                Ok(false) => UsernameStatus::Available,
                Err(e) => {
                    warn!("Username check for '{}' failed: {}", value, e);
                    UsernameStatus::Available
                }
            };

            // A newer keystroke owns the status now.
            if current.load(Ordering::SeqCst) == generation {
                debug!("Username '{}' is {:?}", value, result);
                status.send_replace(result);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(handle);
        }
    }

    fn cancel_pending(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for UsernameChecker {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
