//! Argon2 strategy with raw output.
//!
//! Fields follow the `argon2` crate conventions: memory in KiB, time cost in
//! passes, parallelism in lanes.

use super::HashOutput;
use crate::error::CryptoError;
use crate::memory::random_bytes;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Default memory cost, 64 MiB.
pub const DEFAULT_ARGON2_MEMORY_COST_KB: u32 = 65_536;

/// Default number of passes.
pub const DEFAULT_ARGON2_TIME_COST: u32 = 3;

/// Default number of lanes.
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 4;

/// Default salt length in bytes.
pub const DEFAULT_ARGON2_SALT_LENGTH: usize = 16;

/// Default hash length in bytes.
pub const DEFAULT_ARGON2_HASH_LENGTH: usize = 32;

/// Argon2 flavour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Argon2Variant {
    /// Data-dependent addressing.
    Argon2d,
    /// Data-independent addressing.
    Argon2i,
    /// Hybrid of the two.
    #[default]
    Argon2id,
}

impl Argon2Variant {
    const fn algorithm(self) -> ::argon2::Algorithm {
        match self {
            Self::Argon2d => ::argon2::Algorithm::Argon2d,
            Self::Argon2i => ::argon2::Algorithm::Argon2i,
            Self::Argon2id => ::argon2::Algorithm::Argon2id,
        }
    }
}

/// Argon2 parameter set.
///
/// Construct with named fields over [`Default`]:
///
/// ```
/// use nopassword_crypto::Argon2Strategy;
///
/// let strategy = Argon2Strategy {
///     time_cost: 4,
///     ..Argon2Strategy::default()
/// };
/// assert_eq!(strategy.memory_cost_kb, 65_536);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Argon2Strategy {
    /// Argon2 flavour.
    pub variant: Argon2Variant,
    /// Memory cost in KiB.
    pub memory_cost_kb: u32,
    /// Number of passes.
    pub time_cost: u32,
    /// Number of lanes.
    pub parallelism: u32,
    /// Required salt length; existing salts of any other length are rejected.
    pub salt_length: usize,
    /// Output length.
    pub hash_length: usize,
}

impl Default for Argon2Strategy {
    fn default() -> Self {
        Self {
            variant: Argon2Variant::default(),
            memory_cost_kb: DEFAULT_ARGON2_MEMORY_COST_KB,
            time_cost: DEFAULT_ARGON2_TIME_COST,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
            salt_length: DEFAULT_ARGON2_SALT_LENGTH,
            hash_length: DEFAULT_ARGON2_HASH_LENGTH,
        }
    }
}

impl Argon2Strategy {
    pub(crate) fn generate_hash_with_new_salt(
        &self,
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        let salt = random_bytes(self.salt_length)?;
        self.generate_hash_with_existing_salt(&salt, password)
    }

    pub(crate) fn generate_hash_with_existing_salt(
        &self,
        salt: &[u8],
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        if salt.len() != self.salt_length {
            return Err(CryptoError::SaltLength {
                strategy: "argon2",
                expected: self.salt_length,
                actual: salt.len(),
            });
        }

        let params = ::argon2::Params::new(
            self.memory_cost_kb,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length),
        )
        .map_err(|e| CryptoError::InvalidParameters {
            strategy: "argon2",
            reason: e.to_string(),
        })?;
        let argon2 =
            ::argon2::Argon2::new(self.variant.algorithm(), ::argon2::Version::V0x13, params);

        let mut hash = Zeroizing::new(vec![0u8; self.hash_length]);
        argon2
            .hash_password_into(password, salt, &mut hash)
            .map_err(|e| CryptoError::Derivation(format!("argon2: {e}")))?;

        Ok(HashOutput::new(salt.to_vec(), std::mem::take(&mut *hash)))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
