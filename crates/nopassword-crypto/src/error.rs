//! Cryptographic error types for `nopassword-crypto`.

use thiserror::Error;

/// Errors produced by hashing, tuning and output encoding.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A salt handed to a strategy does not have the length it requires.
    #[error("{strategy} salt must be {expected} bytes, got {actual}")]
    SaltLength {
        /// Strategy that rejected the salt (`"bcrypt"`, `"scrypt"`, `"argon2"`).
        strategy: &'static str,
        /// Length the strategy requires.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// Strategy parameters are outside what the algorithm accepts.
    #[error("invalid {strategy} parameters: {reason}")]
    InvalidParameters {
        /// Strategy whose parameters were rejected.
        strategy: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A stored radix-64 salt could not be decoded.
    #[error("salt encoding error: {0}")]
    SaltEncoding(String),

    /// The underlying hash primitive failed.
    #[error("hash derivation failed: {0}")]
    Derivation(String),

    /// The operating system CSPRNG could not be read.
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),

    /// Output encoding configuration or input is invalid.
    #[error("output encoding error: {0}")]
    OutputEncoding(String),

    /// Argon2 auto-tuning could not produce a candidate.
    #[error("calibration failed: {0}")]
    Calibration(String),
}

impl CryptoError {
    /// Returns `true` for errors caused by caller-supplied input or
    /// configuration, as opposed to environment or primitive failures.
    #[must_use]
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::SaltLength { .. }
                | Self::InvalidParameters { .. }
                | Self::SaltEncoding(_)
                | Self::OutputEncoding(_)
        )
    }
}
