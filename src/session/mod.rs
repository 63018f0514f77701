use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::auth::Identity;

type Callback = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: Option<Identity>,
    next_id: u64,
    subscribers: HashMap<u64, Callback>,
}

/// Reactive view of the authentication state. Subscribers are invoked with
/// the new identity (or None) once per genuine transition; setting the same
/// identity again fires nothing. There are no timers and no polling.
///
/// Consumers must re-derive the role from the delivered identity on every
/// transition instead of caching it across transitions.
#[derive(Clone, Default)]
pub struct SessionEvents {
    inner: Arc<Mutex<Inner>>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Identity> {
        self.inner.lock().expect("session lock poisoned").current.clone()
    }

    /// Register a callback for authentication-state transitions. Dropping
    /// the returned `Subscription` (or calling `unsubscribe`) deregisters it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Identity>) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().expect("session lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Record a new authentication state. Only a genuine transition (a
    /// different user id, sign-in, or sign-out) notifies subscribers.
    pub fn set_identity(&self, identity: Option<Identity>) {
        let listeners: Vec<Callback> = {
            let mut inner = self.inner.lock().expect("session lock poisoned");
            if inner.current.as_ref().map(|i| i.id) == identity.as_ref().map(|i| i.id) {
                return;
            }
            inner.current = identity.clone();
            inner.subscribers.values().cloned().collect()
        };

        debug!(
            "Session transition: {}",
            identity.as_ref().map(|i| i.id.to_string()).unwrap_or_else(|| "signed out".into())
        );

        // Invoke outside the lock so a callback may subscribe or unsubscribe.
        for listener in listeners {
            listener(identity.as_ref());
        }
    }
}

/// Handle to an active session subscription.
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                inner.subscribers.remove(&self.id);
            }
        }
    }
}
