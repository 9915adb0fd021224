//! bcrypt strategy with Modular Crypt Format slicing.
//!
//! A bcrypt MCF string has fixed-width fields:
//!
//! ```text
//! $2a$06$Xj6qWTDv.Jbhk8Z44PHolewAq4uwZrBjwUplueEk0ns1kstNsCWri
//! |   |  |                     |
//! |   |  salt (22)             hash (31)
//! |   cost (2)
//! version prefix
//! ```

use super::{HashOutput, RADIX64};
use crate::error::CryptoError;
use crate::memory::random_bytes;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

/// Default bcrypt cost (log2 of the number of rounds).
pub const DEFAULT_BCRYPT_COST: u32 = 6;

/// Length of the radix-64 salt field of an MCF string.
pub const BCRYPT_SALT_FIELD_LEN: usize = 22;

/// Length of the radix-64 hash field of an MCF string.
pub const BCRYPT_HASH_FIELD_LEN: usize = 31;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;
const RAW_SALT_LEN: usize = 16;

/// `$` + `2a` + `$` + two cost digits + `$`.
const LENGTH_BEFORE_SALT: usize = 7;
const SALT_END: usize = LENGTH_BEFORE_SALT + BCRYPT_SALT_FIELD_LEN;
const HASH_END: usize = SALT_END + BCRYPT_HASH_FIELD_LEN;

/// bcrypt hashing with a fixed cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BcryptStrategy {
    /// Work factor, 4..=31.
    #[serde(default = "default_cost")]
    pub cost: u32,
}

const fn default_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

impl Default for BcryptStrategy {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl BcryptStrategy {
    pub(crate) fn generate_hash_with_new_salt(
        &self,
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        let fresh = random_bytes(RAW_SALT_LEN)?;
        let mut raw = [0u8; RAW_SALT_LEN];
        raw.copy_from_slice(&fresh);
        self.hash_raw(raw, password)
    }

    /// `salt` is the 22-char radix-64 salt field from a previous output.
    pub(crate) fn generate_hash_with_existing_salt(
        &self,
        salt: &[u8],
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        if salt.len() != BCRYPT_SALT_FIELD_LEN {
            return Err(CryptoError::SaltLength {
                strategy: "bcrypt",
                expected: BCRYPT_SALT_FIELD_LEN,
                actual: salt.len(),
            });
        }

        let decoded = Zeroizing::new(
            RADIX64
                .decode(salt)
                .map_err(|e| CryptoError::SaltEncoding(format!("bcrypt salt: {e}")))?,
        );
        let raw: [u8; RAW_SALT_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::SaltEncoding(format!(
                "bcrypt salt decodes to {} bytes, expected {RAW_SALT_LEN}",
                decoded.len()
            ))
        })?;
        self.hash_raw(raw, password)
    }

    fn hash_raw(
        &self,
        mut raw: [u8; RAW_SALT_LEN],
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        if !(MIN_COST..=MAX_COST).contains(&self.cost) {
            raw.zeroize();
            return Err(CryptoError::InvalidParameters {
                strategy: "bcrypt",
                reason: format!(
                    "cost must be between {MIN_COST} and {MAX_COST}, got {}",
                    self.cost
                ),
            });
        }

        let parts = ::bcrypt::hash_with_salt(password, self.cost, raw);
        raw.zeroize();
        let parts = parts.map_err(|e| CryptoError::Derivation(format!("bcrypt: {e}")))?;

        let mcf = Zeroizing::new(parts.format_for_version(::bcrypt::Version::TwoA));
        split_mcf(mcf.as_bytes())
    }
}

/// Slice the salt and hash fields out of an MCF string.
fn split_mcf(mcf: &[u8]) -> Result<HashOutput, CryptoError> {
    let (Some(salt), Some(hash)) = (
        mcf.get(LENGTH_BEFORE_SALT..SALT_END),
        mcf.get(SALT_END..HASH_END),
    ) else {
        return Err(CryptoError::Derivation(format!(
            "bcrypt produced a {}-byte MCF string, expected {HASH_END}",
            mcf.len()
        )));
    };
    Ok(HashOutput::new(salt.to_vec(), hash.to_vec()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: BcryptStrategy = BcryptStrategy { cost: 4 };

    #[test]
    fn output_fields_have_fixed_width() {
        let output = FAST.generate_hash_with_new_salt(b"password").unwrap();
        assert_eq!(output.salt().len(), BCRYPT_SALT_FIELD_LEN);
        assert_eq!(output.password().len(), BCRYPT_HASH_FIELD_LEN);
    }

    #[test]
    fn two_digit_cost_keeps_field_offsets() {
        let strategy = BcryptStrategy { cost: 10 };
        assert_eq!(LENGTH_BEFORE_SALT, "$2a$10$".len());
        let output = strategy.generate_hash_with_new_salt(b"pw").unwrap();
        assert_eq!(output.salt().len(), BCRYPT_SALT_FIELD_LEN);
        assert_eq!(output.password().len(), BCRYPT_HASH_FIELD_LEN);
    }

    #[test]
    fn existing_salt_reproduces_output() {
        let first = FAST.generate_hash_with_new_salt(b"password").unwrap();
        let second = FAST
            .generate_hash_with_existing_salt(first.salt(), b"password")
            .unwrap();
        assert_eq!(first.salt(), second.salt());
        assert_eq!(first.password(), second.password());
    }

    #[test]
    fn matches_reference_mcf_string() {
        // Slicing must agree with the crate's own MCF rendering.
        let raw = [7u8; RAW_SALT_LEN];
        let salt_field = RADIX64.encode(raw);
        let output = FAST
            .generate_hash_with_existing_salt(salt_field.as_bytes(), b"password")
            .unwrap();
        let mcf = ::bcrypt::hash_with_salt(b"password", 4, raw)
            .unwrap()
            .format_for_version(::bcrypt::Version::TwoA);
        assert_eq!(&mcf[..7], "$2a$04$");
        assert_eq!(output.salt(), mcf[7..29].as_bytes());
        assert_eq!(output.password(), mcf[29..].as_bytes());
    }

    #[test]
    fn rejects_wrong_salt_length() {
        let err = FAST
            .generate_hash_with_existing_salt(b"tooshort", b"password")
            .unwrap_err();
        assert!(matches!(
            err,
            CryptoError::SaltLength {
                strategy: "bcrypt",
                expected: 22,
                actual: 8
            }
        ));
    }

    #[test]
    fn rejects_undecodable_salt() {
        let err = FAST
            .generate_hash_with_existing_salt(b"!!!!!!!!!!!!!!!!!!!!!!", b"password")
            .unwrap_err();
        assert!(matches!(err, CryptoError::SaltEncoding(_)));
    }

    #[test]
    fn rejects_cost_out_of_range() {
        for cost in [0, 3, 32] {
            let err = BcryptStrategy { cost }
                .generate_hash_with_new_salt(b"password")
                .unwrap_err();
            assert!(matches!(err, CryptoError::InvalidParameters { .. }));
            assert!(err.is_precondition_violation());
        }
    }

    #[test]
    fn default_cost_is_6() {
        assert_eq!(BcryptStrategy::default().cost, 6);
    }

    #[test]
    fn missing_cost_deserializes_to_default() {
        let strategy: BcryptStrategy = serde_json::from_str("{}").unwrap();
        assert_eq!(strategy, BcryptStrategy::default());
    }
}
