#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for the hashing strategies.

use nopassword_crypto::hashing::{BCRYPT_HASH_FIELD_LEN, BCRYPT_SALT_FIELD_LEN};
use nopassword_crypto::{Argon2Strategy, BcryptStrategy, HashingStrategy, ScryptStrategy};
use proptest::prelude::*;

fn fast_bcrypt() -> HashingStrategy {
    BcryptStrategy { cost: 4 }.into()
}

fn fast_scrypt() -> HashingStrategy {
    ScryptStrategy::new(16, 8, 1)
        .expect("valid params")
        .into()
}

fn fast_argon2() -> HashingStrategy {
    Argon2Strategy {
        memory_cost_kb: 32,
        time_cost: 1,
        parallelism: 1,
        ..Argon2Strategy::default()
    }
    .into()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// bcrypt always yields a 22-char salt and a 31-char hash field.
    #[test]
    fn bcrypt_fields_have_fixed_width(
        password in proptest::collection::vec(1u8..=255, 1..96),
    ) {
        let output = fast_bcrypt()
            .generate_hash_with_new_salt(&password)
            .expect("bcrypt should succeed");
        prop_assert_eq!(output.salt().len(), BCRYPT_SALT_FIELD_LEN);
        prop_assert_eq!(output.password().len(), BCRYPT_HASH_FIELD_LEN);
    }

    /// Replaying a stored salt reproduces the derived password.
    #[test]
    fn existing_salt_replays_output(
        password in proptest::collection::vec(1u8..=255, 1..64),
    ) {
        for strategy in [fast_bcrypt(), fast_scrypt(), fast_argon2()] {
            let first = strategy
                .generate_hash_with_new_salt(&password)
                .expect("new salt should succeed");
            let second = strategy
                .generate_hash_with_existing_salt(first.salt(), &password)
                .expect("existing salt should succeed");
            prop_assert_eq!(first.password(), second.password());
        }
    }

    /// scrypt output is ASCII and always carries the `$s0$` header.
    #[test]
    fn scrypt_output_is_ascii(
        password in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let output = fast_scrypt()
            .generate_hash_with_new_salt(&password)
            .expect("scrypt should succeed");
        prop_assert!(output.password().is_ascii());
        prop_assert!(output.password().starts_with(b"$s0$40801$"));
    }

    /// Argon2 rejects any salt whose length differs from the configured one.
    #[test]
    fn argon2_rejects_wrong_salt_length(len in 0usize..64) {
        prop_assume!(len != 16);
        let salt = vec![0x11u8; len];
        let err = fast_argon2()
            .generate_hash_with_existing_salt(&salt, b"password")
            .unwrap_err();
        prop_assert!(err.is_precondition_violation());
    }
}

#[test]
fn strategies_disagree_on_the_same_password() {
    let bcrypt = fast_bcrypt().generate_hash_with_new_salt(b"password").unwrap();
    let scrypt = fast_scrypt().generate_hash_with_new_salt(b"password").unwrap();
    let argon2 = fast_argon2().generate_hash_with_new_salt(b"password").unwrap();
    assert_ne!(bcrypt.password(), scrypt.password());
    assert_ne!(scrypt.password(), argon2.password());
}
