//! scrypt strategy producing `$s0$` strings.
//!
//! Output layout: `$s0$<params>$<salt>$<key>`, where `params` is
//! `(log2(N) << 16) | (r << 8) | p` in lowercase hex and `salt`/`key` use the
//! bcrypt radix-64 alphabet.

use super::{HashOutput, RADIX64};
use crate::error::CryptoError;
use crate::memory::random_bytes;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Default CPU/memory cost `N`.
pub const DEFAULT_SCRYPT_COST: u32 = 16_384;

/// Default block size factor `r`.
pub const DEFAULT_SCRYPT_BLOCK_SIZE_FACTOR: u32 = 8;

/// Default parallelization factor `p`.
pub const DEFAULT_SCRYPT_PARALLELIZATION: u32 = 1;

/// Length of a freshly generated salt.
pub const SCRYPT_SALT_LEN: usize = 16;

/// Length of the derived key before encoding.
pub const SCRYPT_KEY_LEN: usize = 32;

const ALGORITHM_ID: &str = "s0";

/// scrypt parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScryptStrategy {
    /// CPU/memory cost `N`; must be a power of two greater than 1.
    pub cost: u32,
    /// Block size factor `r`.
    pub block_size_factor: u32,
    /// Parallelization factor `p`.
    pub parallelization: u32,
}

impl Default for ScryptStrategy {
    fn default() -> Self {
        Self {
            cost: DEFAULT_SCRYPT_COST,
            block_size_factor: DEFAULT_SCRYPT_BLOCK_SIZE_FACTOR,
            parallelization: DEFAULT_SCRYPT_PARALLELIZATION,
        }
    }
}

impl ScryptStrategy {
    /// Build a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameters`] if `cost` is not a power of
    /// two or the combination is rejected by scrypt.
    pub fn new(
        cost: u32,
        block_size_factor: u32,
        parallelization: u32,
    ) -> Result<Self, CryptoError> {
        let strategy = Self {
            cost,
            block_size_factor,
            parallelization,
        };
        strategy.params()?;
        Ok(strategy)
    }

    /// Exact base-2 logarithm of `cost`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameters`] unless `cost` is a power of
    /// two greater than 1.
    pub fn log2_cost(&self) -> Result<u8, CryptoError> {
        if self.cost < 2 || !self.cost.is_power_of_two() {
            return Err(CryptoError::InvalidParameters {
                strategy: "scrypt",
                reason: format!("cost must be a power of two greater than 1, got {}", self.cost),
            });
        }
        // trailing_zeros of a u32 is at most 31.
        u8::try_from(self.cost.trailing_zeros()).map_err(|e| CryptoError::InvalidParameters {
            strategy: "scrypt",
            reason: e.to_string(),
        })
    }

    fn params(&self) -> Result<::scrypt::Params, CryptoError> {
        ::scrypt::Params::new(
            self.log2_cost()?,
            self.block_size_factor,
            self.parallelization,
            SCRYPT_KEY_LEN,
        )
        .map_err(|e| CryptoError::InvalidParameters {
            strategy: "scrypt",
            reason: e.to_string(),
        })
    }

    pub(crate) fn generate_hash_with_new_salt(
        &self,
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        let salt = random_bytes(SCRYPT_SALT_LEN)?;
        self.generate_hash_with_existing_salt(&salt, password)
    }

    /// `salt` is the raw salt from a previous output.
    pub(crate) fn generate_hash_with_existing_salt(
        &self,
        salt: &[u8],
        password: &[u8],
    ) -> Result<HashOutput, CryptoError> {
        if salt.is_empty() {
            return Err(CryptoError::SaltLength {
                strategy: "scrypt",
                expected: SCRYPT_SALT_LEN,
                actual: 0,
            });
        }
        let params = self.params()?;

        let mut key = Zeroizing::new([0u8; SCRYPT_KEY_LEN]);
        ::scrypt::scrypt(password, salt, &params, key.as_mut_slice())
            .map_err(|e| CryptoError::Derivation(format!("scrypt: {e}")))?;

        let encoded_key = Zeroizing::new(RADIX64.encode(key.as_slice()));
        let formatted = Zeroizing::new(format!(
            "${ALGORITHM_ID}${:x}${}${}",
            self.packed_params()?,
            RADIX64.encode(salt),
            encoded_key.as_str(),
        ));
        Ok(HashOutput::new(salt.to_vec(), formatted.as_bytes().to_vec()))
    }

    /// `(log2(N) << 16) | (r << 8) | p`.
    fn packed_params(&self) -> Result<u64, CryptoError> {
        let log_n = u64::from(self.log2_cost()?);
        let r = u64::from(self.block_size_factor);
        let p = u64::from(self.parallelization);
        // r and p are u32, so the shifted fields cannot overflow a u64.
        #[allow(clippy::arithmetic_side_effects)]
        let packed = (log_n << 16) | (r << 8) | p;
        Ok(packed)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> ScryptStrategy {
        ScryptStrategy::new(16, 8, 1).expect("valid params")
    }

    #[test]
    fn output_has_s0_prefix_and_four_fields() {
        let output = fast().generate_hash_with_new_salt(b"password").unwrap();
        let text = std::str::from_utf8(output.password()).unwrap();
        assert!(text.starts_with("$s0$"));
        let fields: Vec<&str> = text.split('$').collect();
        // Leading empty field, then s0, params, salt, key.
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "");
        assert_eq!(fields[1], "s0");
        assert_eq!(fields[2], "40801");
        assert_eq!(fields[3], RADIX64.encode(output.salt()));
        assert_eq!(RADIX64.decode(fields[4]).unwrap().len(), SCRYPT_KEY_LEN);
    }

    #[test]
    fn default_params_pack_to_e0801() {
        let strategy = ScryptStrategy::default();
        assert_eq!(strategy.log2_cost().unwrap(), 14);
        assert_eq!(format!("{:x}", strategy.packed_params().unwrap()), "e0801");
    }

    #[test]
    fn fresh_salt_is_16_bytes() {
        let output = fast().generate_hash_with_new_salt(b"password").unwrap();
        assert_eq!(output.salt().len(), SCRYPT_SALT_LEN);
    }

    #[test]
    fn existing_salt_is_deterministic() {
        let first = fast().generate_hash_with_new_salt(b"password").unwrap();
        let second = fast()
            .generate_hash_with_existing_salt(first.salt(), b"password")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn default_params_are_deterministic() {
        let strategy = ScryptStrategy::default();
        let first = strategy.generate_hash_with_new_salt(b"password").unwrap();
        let second = strategy
            .generate_hash_with_existing_salt(first.salt(), b"password")
            .unwrap();
        assert_eq!(first.password(), second.password());
    }

    #[test]
    fn key_matches_raw_scrypt() {
        let salt = b"0123456789abcdef";
        let output = fast()
            .generate_hash_with_existing_salt(salt, b"password")
            .unwrap();
        let params = ::scrypt::Params::new(4, 8, 1, SCRYPT_KEY_LEN).unwrap();
        let mut expected = [0u8; SCRYPT_KEY_LEN];
        ::scrypt::scrypt(b"password", salt, &params, &mut expected).unwrap();
        let text = std::str::from_utf8(output.password()).unwrap();
        assert!(text.ends_with(&RADIX64.encode(expected)));
    }

    #[test]
    fn log2_rejects_non_powers_of_two() {
        for cost in [0, 1, 3, 1000, 16_385] {
            let err = ScryptStrategy::new(cost, 8, 1).unwrap_err();
            assert!(matches!(err, CryptoError::InvalidParameters { .. }));
        }
    }

    #[test]
    fn log2_is_exact_for_powers_of_two() {
        for exp in 1..31u32 {
            let strategy = ScryptStrategy {
                cost: 1 << exp,
                ..ScryptStrategy::default()
            };
            assert_eq!(u32::from(strategy.log2_cost().unwrap()), exp);
        }
    }

    #[test]
    fn deserialized_bad_cost_is_rejected_at_hash_time() {
        let strategy: ScryptStrategy =
            serde_json::from_str(r#"{"cost":1000,"blockSizeFactor":8,"parallelization":1}"#)
                .unwrap();
        let err = strategy.generate_hash_with_new_salt(b"password").unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn rejects_empty_salt() {
        let err = fast()
            .generate_hash_with_existing_salt(b"", b"password")
            .unwrap_err();
        assert!(matches!(err, CryptoError::SaltLength { actual: 0, .. }));
    }
}
