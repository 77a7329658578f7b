//! Session probe for the cart engine.
//!
//! The cart engine decides between its guest and authenticated paths by
//! asking the probe at every operation - the answer is never cached, so a
//! login or logout between two operations takes effect immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "is the current session authenticated?".
pub trait SessionProbe {
    /// Whether a user is currently signed in.
    fn is_authenticated(&self) -> bool;
}

/// A cheap, cloneable probe backed by a shared flag.
///
/// The host flips the flag from its auth layer; every clone observes the
/// change on the next operation.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    authenticated: Arc<AtomicBool>,
}

impl SharedSession {
    /// Create a probe in the signed-out state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the authentication state.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}

impl SessionProbe for SharedSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

impl<T: SessionProbe + ?Sized> SessionProbe for &T {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}
