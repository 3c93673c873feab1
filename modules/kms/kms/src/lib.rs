//! KMS Module
//!
//! Retrieves one typed secret from a key-management HTTP endpoint and keeps
//! it for the lifetime of the process:
//!
//! 1. [`SecretFetcher`] issues a single blocking GET with the API token in the
//!    `x-api-key` header
//! 2. the first record of the first envelope's `secrets` array is
//!    deserialized into the caller's [`Secret`] type
//! 3. [`SecretCache`] holds the result; [`KmsModule`] wires both together
//!
//! # Example
//!
//! ```no_run
//! use kms::{KmsConfig, KmsModule, Secret};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct DatabaseCredentials {
//!     username: String,
//!     password: String,
//! }
//!
//! impl Secret for DatabaseCredentials {}
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KmsConfig::load(None)?;
//! if let Some(module) = KmsModule::<DatabaseCredentials>::from_config(&config)? {
//!     let creds = module.secret()?;
//!     println!("connecting as {}", creds.username);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod fetcher;
pub mod module;
pub mod transport;

pub use cache::SecretCache;
pub use config::KmsConfig;
pub use fetcher::{
    API_KEY_HEADER, PassthroughDecoder, SecretDecoder, SecretFetcher, extract_secret_record,
};
pub use module::KmsModule;
pub use transport::{ReqwestTransport, SecretRequest, SecretTransport, TransportResponse};

pub use kms_sdk::{KmsError, KmsResponse, NotFoundReason, Result, Secret};
