use std::sync::Arc;

use kms_sdk::{Result, Secret};

use crate::cache::SecretCache;
use crate::config::KmsConfig;
use crate::fetcher::SecretFetcher;
use crate::transport::{ReqwestTransport, SecretTransport};

/// Composition root of the kms module.
///
/// Owns the fetcher and the cache slot. Build it once at startup and hand the
/// cache (or the module) to whoever needs the secret.
pub struct KmsModule<S, T = ReqwestTransport> {
    fetcher: SecretFetcher<T>,
    cache: Arc<SecretCache<S>>,
}

impl<S: Secret + Clone> KmsModule<S, ReqwestTransport> {
    /// Wire the module from configuration.
    ///
    /// Returns `Ok(None)` when the module is disabled.
    ///
    /// # Errors
    /// Returns `KmsError::Config` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &KmsConfig) -> Result<Option<Self>> {
        if !config.enabled {
            tracing::info!("KMS module disabled by configuration");
            return Ok(None);
        }
        config.validate()?;

        let fetcher = SecretFetcher::from_config(config)?;
        Ok(Some(Self::new(fetcher, Arc::new(SecretCache::new()))))
    }
}

impl<S: Secret + Clone, T: SecretTransport> KmsModule<S, T> {
    #[must_use]
    pub fn new(fetcher: SecretFetcher<T>, cache: Arc<SecretCache<S>>) -> Self {
        Self { fetcher, cache }
    }

    /// Return the cached secret, fetching and storing it on first use.
    ///
    /// # Errors
    /// Propagates any error of [`SecretFetcher::get_secret`]. Nothing is
    /// stored when the fetch fails.
    pub fn secret(&self) -> Result<S> {
        if self.cache.is_cached() {
            return self.cache.read();
        }

        let secret = self.fetcher.get_secret::<S>()?;
        tracing::info!("Secret fetched from KMS and cached");
        Ok(self.cache.store(secret))
    }

    #[must_use]
    pub fn fetcher(&self) -> &SecretFetcher<T> {
        &self.fetcher
    }

    #[must_use]
    pub fn cache(&self) -> Arc<SecretCache<S>> {
        Arc::clone(&self.cache)
    }
}
