//! Cooperative cancellation for in-flight application sessions

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Result;

/// Error carried through anyhow chains when a token fires
///
/// Gateways return this from between-attempt checks so the engine can
/// tell an abort apart from an infrastructure failure by downcasting.
#[derive(Debug, Clone)]
pub struct Cancelled {
    pub reason: String,
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cancelled: {}", self.reason)
    }
}

impl std::error::Error for Cancelled {}

#[derive(Default)]
struct CancelInner {
    fired: AtomicBool,
    reason: OnceLock<String>,
}

/// Shared abort flag checked at step boundaries and between remote
/// retry attempts
///
/// Clones share state. The first `cancel()` wins; its reason is what
/// the session records (e.g. "rate limit detected"). An HTTP attempt
/// already on the wire is allowed to finish; no further attempts are
/// issued once the token has fired.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Later calls keep the original reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        let _ = self.inner.reason.set(reason.into());
        self.inner.fired.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Reason given to the first `cancel()`, if the token has fired
    pub fn reason(&self) -> Option<&str> {
        if self.is_cancelled() {
            Some(
                self.inner
                    .reason
                    .get()
                    .map(String::as_str)
                    .unwrap_or("cancelled"),
            )
        } else {
            None
        }
    }

    /// Bail with a downcastable `Cancelled` if the token has fired
    pub fn check(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(Cancelled {
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// True when an anyhow chain bottoms out in a fired token
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.is::<Cancelled>()
}
