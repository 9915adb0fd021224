//! `nopassword-crypto`: derivation primitives for NoPassword.
//!
//! Pure computation with no file or network access. Three pieces:
//!
//! - [`hashing`]: bcrypt, scrypt and Argon2 strategies behind [`HashingStrategy`]
//! - [`tuner`]: latency-driven Argon2 parameter search
//! - [`encoding`]: character-class remapping of derived passwords
//!
//! Secret intermediates live in [`SecretBuffer`] or `zeroize::Zeroizing`
//! guards and are scrubbed on drop.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod hashing;

pub mod tuner;

pub mod encoding;

pub use encoding::{canonical_encode, CharClass, ClassCounts, OutputEncoding, OutputEncodingBuilder};
pub use error::CryptoError;
pub use hashing::{
    Argon2Strategy, Argon2Variant, BcryptStrategy, HashOutput, HashingStrategy, ScryptStrategy,
};
pub use memory::{random_bytes, SecretBuffer};
pub use tuner::{ArgonAutoTuner, TunedArgon2};
