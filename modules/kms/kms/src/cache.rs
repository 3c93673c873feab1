use kms_sdk::{KmsError, Result};
use parking_lot::RwLock;

/// Holds at most one secret for the lifetime of its owner.
///
/// The slot starts empty and is only ever overwritten, never cleared or
/// expired. Concurrent stores are last-write-wins.
#[derive(Debug)]
pub struct SecretCache<S> {
    slot: RwLock<Option<S>>,
}

impl<S> Default for SecretCache<S> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<S: Clone> SecretCache<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents and hand the stored value back.
    pub fn store(&self, secret: S) -> S {
        *self.slot.write() = Some(secret.clone());
        secret
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Return the stored secret.
    ///
    /// # Errors
    /// Returns `KmsError::NotStored` if nothing has been stored yet.
    pub fn read(&self) -> Result<S> {
        self.slot.read().clone().ok_or(KmsError::NotStored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Creds {
        user: String,
    }

    fn creds(user: &str) -> Creds {
        Creds { user: user.into() }
    }

    #[test]
    fn test_starts_empty() {
        let cache = SecretCache::<Creds>::new();
        assert!(!cache.is_cached());
        assert!(matches!(cache.read(), Err(KmsError::NotStored)));
    }

    #[test]
    fn test_store_returns_value_and_marks_cached() {
        let cache = SecretCache::new();

        let returned = cache.store(creds("alice"));

        assert_eq!(returned, creds("alice"));
        assert!(cache.is_cached());
        assert_eq!(cache.read().unwrap(), creds("alice"));
    }

    #[test]
    fn test_storing_same_value_twice() {
        let cache = SecretCache::new();
        cache.store(creds("alice"));
        cache.store(creds("alice"));

        assert_eq!(cache.read().unwrap(), creds("alice"));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = SecretCache::new();
        cache.store(creds("alice"));
        cache.store(creds("bob"));

        assert_eq!(cache.read().unwrap(), creds("bob"));
    }

    #[test]
    fn test_read_does_not_drain_slot() {
        let cache = SecretCache::new();
        cache.store(creds("alice"));

        assert_eq!(cache.read().unwrap(), creds("alice"));
        assert_eq!(cache.read().unwrap(), creds("alice"));
        assert!(cache.is_cached());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(SecretCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                cache.store(creds("alice"));
            })
        };
        writer.join().unwrap();

        assert_eq!(cache.read().unwrap(), creds("alice"));
    }
}
