//! Store error types for `nopassword-store`.

use nopassword_crypto::CryptoError;
use thiserror::Error;

/// Errors produced by the salt store and its persisted document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Hashing or encoding failed (delegated from `nopassword-crypto`).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A service has more than one live credential; the store is corrupt.
    #[error("service {service} has {count} live credentials, expected at most one")]
    MultipleLiveCredentials {
        /// Service whose credentials conflict.
        service: String,
        /// Number of non-obsolete entries found.
        count: usize,
    },

    /// A salt map key has no registered service.
    #[error("no service registered under {0}")]
    UnknownService(String),

    /// More than one service is registered under the same name.
    #[error("service {0} is registered more than once")]
    DuplicateService(String),

    /// A new salt was about to overwrite an existing salt map entry.
    #[error("service {0} already has bound salts")]
    SaltAlreadyBound(String),

    /// The JSON document could not be read or written.
    #[error("salt document error: {0}")]
    Document(String),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` when the store's own state is inconsistent, as opposed
    /// to a crypto, document or filesystem failure.
    #[must_use]
    pub const fn is_consistency_violation(&self) -> bool {
        matches!(
            self,
            Self::MultipleLiveCredentials { .. }
                | Self::UnknownService(_)
                | Self::DuplicateService(_)
                | Self::SaltAlreadyBound(_)
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Document(err.to_string())
    }
}
