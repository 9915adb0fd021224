//! Pluggable password hashing strategies.
//!
//! A [`HashingStrategy`] turns a master password and a salt into a
//! [`HashOutput`]. Three algorithms are supported, each with its own
//! parameters and output encoding:
//!
//! | Variant | Output `salt` | Output `password` |
//! |---------|---------------|-------------------|
//! | [`BcryptStrategy`] | 22-char bcrypt radix-64 salt | 31-char bcrypt hash field |
//! | [`ScryptStrategy`] | raw salt bytes | `$s0$<params>$<salt>$<key>` string |
//! | [`Argon2Strategy`] | raw salt bytes | raw hash bytes |
//!
//! The existing-salt path is deterministic: the same strategy, salt and
//! password always produce byte-identical output.

mod argon2;
mod bcrypt;
mod scrypt;

pub use self::argon2::{
    Argon2Strategy, Argon2Variant, DEFAULT_ARGON2_HASH_LENGTH, DEFAULT_ARGON2_MEMORY_COST_KB,
    DEFAULT_ARGON2_PARALLELISM, DEFAULT_ARGON2_SALT_LENGTH, DEFAULT_ARGON2_TIME_COST,
};
pub use self::bcrypt::{
    BcryptStrategy, BCRYPT_HASH_FIELD_LEN, BCRYPT_SALT_FIELD_LEN, DEFAULT_BCRYPT_COST,
};
pub use self::scrypt::{
    ScryptStrategy, DEFAULT_SCRYPT_BLOCK_SIZE_FACTOR, DEFAULT_SCRYPT_COST,
    DEFAULT_SCRYPT_PARALLELIZATION, SCRYPT_KEY_LEN, SCRYPT_SALT_LEN,
};

use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use base64::alphabet;
use base64::engine::{general_purpose, GeneralPurpose};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Radix-64 codec used by bcrypt (`./A-Za-z0-9`, unpadded).
///
/// Also used for the salt and key fields of the scrypt output string.
pub(crate) const RADIX64: GeneralPurpose =
    GeneralPurpose::new(&alphabet::BCRYPT, general_purpose::NO_PAD);

// ---------------------------------------------------------------------------
// HashOutput
// ---------------------------------------------------------------------------

/// Salt and derived password produced by one strategy invocation.
///
/// Both buffers are zeroed when the value is dropped. Only the salt is ever
/// persisted.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct HashOutput {
    salt: Vec<u8>,
    password: Vec<u8>,
}

impl HashOutput {
    pub(crate) fn new(salt: Vec<u8>, password: Vec<u8>) -> Self {
        Self { salt, password }
    }

    /// The salt, in the form the strategy expects back on the existing-salt path.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The derived password bytes.
    #[must_use]
    pub fn password(&self) -> &[u8] {
        &self.password
    }

    /// Copy the derived password into a [`SecretBuffer`] that outlives `self`.
    #[must_use]
    pub fn password_buffer(&self) -> SecretBuffer {
        SecretBuffer::new(&self.password)
    }
}

impl fmt::Debug for HashOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashOutput")
            .field("salt_len", &self.salt.len())
            .field("password", &"***")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// HashingStrategy
// ---------------------------------------------------------------------------

/// The closed set of supported hashing strategies.
///
/// Serialized as an internally tagged object, e.g.
/// `{"type":"scrypt","cost":16384,"blockSizeFactor":8,"parallelization":1}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HashingStrategy {
    /// bcrypt, Modular Crypt Format output.
    Bcrypt(BcryptStrategy),
    /// scrypt, `$s0$` PHC-style output.
    Scrypt(ScryptStrategy),
    /// Argon2, raw output.
    Argon2(Argon2Strategy),
}

impl HashingStrategy {
    /// Hash `password` with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomSource`] if no salt can be drawn, or a
    /// parameter/derivation error from the underlying algorithm.
    pub fn generate_hash_with_new_salt(&self, password: &[u8]) -> Result<HashOutput, CryptoError> {
        match self {
            Self::Bcrypt(s) => s.generate_hash_with_new_salt(password),
            Self::Scrypt(s) => s.generate_hash_with_new_salt(password),
            Self::Argon2(s) => s.generate_hash_with_new_salt(password),
        }
    }

    /// Hash `password` with a salt previously returned in [`HashOutput::salt`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SaltLength`] or [`CryptoError::SaltEncoding`]
    /// if the salt does not fit the strategy, or a parameter/derivation error
    /// from the underlying algorithm.
    pub fn generate_hash_with_existing_salt(
        &self,
        salt: &[u8],
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        match self {
            Self::Bcrypt(s) => s.generate_hash_with_existing_salt(salt, password),
            Self::Scrypt(s) => s.generate_hash_with_existing_salt(salt, password),
            Self::Argon2(s) => s.generate_hash_with_existing_salt(salt, password),
        }
    }

    /// Short algorithm name, matching the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bcrypt(_) => "bcrypt",
            Self::Scrypt(_) => "scrypt",
            Self::Argon2(_) => "argon2",
        }
    }
}

impl Default for HashingStrategy {
    fn default() -> Self {
        Self::Bcrypt(BcryptStrategy::default())
    }
}

impl From<BcryptStrategy> for HashingStrategy {
    fn from(strategy: BcryptStrategy) -> Self {
        Self::Bcrypt(strategy)
    }
}

impl From<ScryptStrategy> for HashingStrategy {
    fn from(strategy: ScryptStrategy) -> Self {
        Self::Scrypt(strategy)
    }
}

impl From<Argon2Strategy> for HashingStrategy {
    fn from(strategy: Argon2Strategy) -> Self {
        Self::Argon2(strategy)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_strategies() -> Vec<HashingStrategy> {
        vec![
            BcryptStrategy { cost: 4 }.into(),
            ScryptStrategy::new(16, 8, 1).expect("valid params").into(),
            Argon2Strategy {
                memory_cost_kb: 32,
                time_cost: 1,
                parallelism: 1,
                ..Argon2Strategy::default()
            }
            .into(),
        ]
    }

    #[test]
    fn every_strategy_is_deterministic_on_existing_salt() {
        for strategy in fast_strategies() {
            let first = strategy
                .generate_hash_with_new_salt(b"password")
                .expect("new salt should succeed");
            let second = strategy
                .generate_hash_with_existing_salt(first.salt(), b"password")
                .expect("existing salt should succeed");
            assert_eq!(first, second, "{} is not deterministic", strategy.name());
        }
    }

    #[test]
    fn every_strategy_draws_fresh_salts() {
        for strategy in fast_strategies() {
            let a = strategy.generate_hash_with_new_salt(b"password").unwrap();
            let b = strategy.generate_hash_with_new_salt(b"password").unwrap();
            assert_ne!(a.salt(), b.salt(), "{} reused a salt", strategy.name());
        }
    }

    #[test]
    fn different_passwords_differ_on_same_salt() {
        for strategy in fast_strategies() {
            let a = strategy.generate_hash_with_new_salt(b"password_a").unwrap();
            let b = strategy
                .generate_hash_with_existing_salt(a.salt(), b"password_b")
                .unwrap();
            assert_ne!(a.password(), b.password());
        }
    }

    #[test]
    fn hash_output_debug_is_masked() {
        let output = HashOutput::new(vec![1; 16], b"secret".to_vec());
        let debug = format!("{output:?}");
        assert!(debug.contains("salt_len: 16"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn password_buffer_copies_password() {
        let output = HashOutput::new(vec![1; 16], b"secret".to_vec());
        assert_eq!(output.password_buffer().expose(), b"secret");
    }

    #[test]
    fn strategy_serde_uses_type_tag() {
        let strategy: HashingStrategy = BcryptStrategy { cost: 7 }.into();
        let json = serde_json::to_value(&strategy).expect("serialize should succeed");
        assert_eq!(json["type"], "bcrypt");
        assert_eq!(json["cost"], 7);

        for strategy in fast_strategies() {
            let json = serde_json::to_string(&strategy).expect("serialize should succeed");
            let back: HashingStrategy =
                serde_json::from_str(&json).expect("deserialize should succeed");
            assert_eq!(strategy, back);
        }
    }

    #[test]
    fn strategy_names_match_tags() {
        for strategy in fast_strategies() {
            let json = serde_json::to_value(&strategy).unwrap();
            assert_eq!(json["type"], strategy.name());
        }
    }

    #[test]
    fn default_strategy_is_bcrypt_cost_6() {
        assert_eq!(
            HashingStrategy::default(),
            HashingStrategy::Bcrypt(BcryptStrategy { cost: 6 })
        );
    }
}
