//! Context implementation for request-scoped cancellation
//!
//! A Context carries an optional deadline and a cancel signal across async
//! boundaries. Children created with [`Context::with_timeout`] are cancelled
//! when their parent is. Only network calls are wrapped with [`Context::run`];
//! the reconciliation steps are synchronous and run to completion.

use crate::error::{PfplugError, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

/// Context carries request-scoped cancellation signals and timeouts
/// Pass this as first parameter to all async trait methods
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done_tx: watch::Sender<bool>,
    parent: Option<Context>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done_tx,
                parent: None,
            }),
        }
    }

    /// Child context that is cancelled after `timeout`, or earlier if the
    /// parent is cancelled. The earlier of the two deadlines wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut deadline = Instant::now() + timeout;
        if let Some(parent_deadline) = self.deadline() {
            deadline = deadline.min(parent_deadline);
        }

        let (done_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                done_tx,
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if *self.inner.done_tx.borrow() {
            return true;
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.inner
            .parent
            .as_ref()
            .is_some_and(|parent| parent.is_cancelled())
    }

    pub fn cancel(&self) {
        self.inner.done_tx.send_replace(true);
    }

    /// Resolves once this context is cancelled or its deadline passes
    pub fn cancelled(&self) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        let mut rx = self.inner.done_tx.subscribe();
        let deadline = self.inner.deadline;
        let parent = self.inner.parent.clone();

        Box::pin(async move {
            let signal = async move {
                loop {
                    let done = *rx.borrow_and_update();
                    if done {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        // Sender dropped with the context; nothing can cancel us anymore
                        std::future::pending::<()>().await;
                    }
                }
            };

            let expiry = async move {
                match deadline {
                    Some(d) => time::sleep_until(d.into()).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let upstream = async move {
                match parent {
                    Some(p) => p.cancelled().await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = signal => {}
                _ = expiry => {}
                _ = upstream => {}
            }
        })
    }

    /// Run `fut` unless the context is cancelled first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(PfplugError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => {
                tracing::debug!("operation cancelled");
                Err(PfplugError::Cancelled)
            }
            out = fut => Ok(out),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
