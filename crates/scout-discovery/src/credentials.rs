//! Sticky credential rotation.
//!
//! A small state machine over {primary, fallback(i)}: the active index
//! only moves forward when a fallback actually succeeds, so a request that
//! fails on every key leaves the ring where it started and the next
//! request retries from the same place.

use std::sync::Mutex;

/// Ordered credential set with a mutex-guarded active index.
pub struct CredentialRing {
    keys: Vec<String>,
    active: Mutex<usize>,
}

impl CredentialRing {
    /// Build a ring from a primary key plus ordered fallbacks.
    #[must_use]
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>) -> Self {
        let mut keys = vec![primary.into()];
        keys.extend(fallbacks);
        Self {
            keys,
            active: Mutex::new(0),
        }
    }

    /// Number of credentials, primary included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no key is configured at all (empty primary, no fallbacks).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.iter().all(String::is_empty)
    }

    /// Index of the currently active credential.
    #[must_use]
    pub fn active_index(&self) -> usize {
        *self.active.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The key at `index`, if any.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Record a success on `index`: that credential becomes the active one
    /// for the rest of the client's lifetime.
    pub fn commit(&self, index: usize) {
        if index >= self.keys.len() {
            return;
        }
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *active != index {
            tracing::info!("Switched to Moralis {} key", Self::label(index));
            *active = index;
        }
    }

    /// Human-readable name for log lines: "primary" or "fallback #N".
    #[must_use]
    pub fn label(index: usize) -> String {
        if index == 0 {
            "primary".to_string()
        } else {
            format!("fallback #{index}")
        }
    }
}
