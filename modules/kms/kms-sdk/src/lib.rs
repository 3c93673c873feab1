//! KMS SDK
//!
//! Contract types shared by the kms module and its consumers:
//!
//! - [`Secret`]: marker for caller-defined secret shapes
//! - [`KmsResponse`]: the documented wire envelope
//! - [`KmsError`]: the error taxonomy of fetching and caching a secret

pub mod error;
pub mod models;

pub use error::{KmsError, NotFoundReason, Result};
pub use models::{KmsResponse, Secret};
