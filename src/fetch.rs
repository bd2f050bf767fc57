//! Request/loading/error bookkeeping around a single backend GET.
//!
//! A [`Fetch`] is created against a source key (normally the endpoint path) and a loader.
//! It starts loading immediately, re-runs when the source key changes and on
//! [`Fetch::refetch`]. Every invocation is a detached tokio task; superseded requests are
//! not cancelled, so a slow response for an old source can still land after a newer one.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Message used when a failure carries nothing readable.
pub const UNKNOWN_ERROR: &str = "Unknown error";

pub type LoadFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;
pub type Loader<T> = Arc<dyn Fn() -> LoadFuture<T> + Send + Sync>;
/// Resolves on the next state change of a fetch, independent of its value type.
pub type Changed = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Wrap an async closure as a [`Loader`].
pub fn loader<T, F, Fut>(f: F) -> Loader<T>
where
    T: 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as LoadFuture<T>)
}

/// Snapshot of a fetch as seen by a page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    Error,
}

impl<T> FetchState<T> {
    pub fn phase(&self) -> FetchPhase {
        if self.loading {
            FetchPhase::Loading
        } else if self.error.is_some() {
            FetchPhase::Error
        } else if self.data.is_some() {
            FetchPhase::Success
        } else {
            FetchPhase::Idle
        }
    }
}

/// Reduce any loader failure to the single line shown in place of page content.
pub fn error_message(err: &anyhow::Error) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        msg
    }
}

pub struct Fetch<T> {
    source: String,
    loader: Loader<T>,
    state: Arc<watch::Sender<FetchState<T>>>,
    generation: Arc<AtomicU64>,
}

impl<T> Fetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create the fetch and issue the first request. Must be called inside a tokio runtime.
    pub fn new(source: impl Into<String>, loader: Loader<T>) -> Self {
        let (tx, _rx) = watch::channel(FetchState::default());
        let fetch = Self {
            source: source.into(),
            loader,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        };
        fetch.trigger();
        fetch
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Point the fetch at another source. Only a changed key issues a new request.
    pub fn set_source(&mut self, source: impl Into<String>, loader: Loader<T>) {
        let source = source.into();
        if source == self.source {
            return;
        }
        self.source = source;
        self.loader = loader;
        self.trigger();
    }

    /// Re-issue the request for the current source.
    pub fn refetch(&self) {
        self.trigger();
    }

    pub fn snapshot(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }

    /// Subscribe now and resolve on the next state change. Never resolves once the fetch is dropped.
    pub fn changed(&self) -> Changed {
        let mut rx = self.state.subscribe();
        Box::pin(async move {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
    }

    /// Wait until no request is loading and return that state.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.state.subscribe();
        let settled = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.snapshot(),
        }
    }

    fn trigger(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let request = (self.loader)();
        let state = self.state.clone();
        let latest = self.generation.clone();
        let source = self.source.clone();
        debug!(%source, generation, "fetch started");

        tokio::spawn(async move {
            // The inner task turns a panicking loader into a JoinError instead of
            // leaving the fetch stuck in loading.
            let outcome = tokio::spawn(request).await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!(%source, generation, "applying response from a superseded request");
            }
            state.send_modify(|s| {
                match outcome {
                    Ok(Ok(data)) => {
                        s.data = Some(data);
                        s.error = None;
                    }
                    Ok(Err(err)) => {
                        debug!(%source, "fetch failed: {err:#}");
                        s.error = Some(error_message(&err));
                    }
                    Err(join_err) => {
                        debug!(%source, "fetch task aborted: {join_err}");
                        s.error = Some(UNKNOWN_ERROR.to_string());
                    }
                }
                s.loading = false;
            });
        });
    }
}
