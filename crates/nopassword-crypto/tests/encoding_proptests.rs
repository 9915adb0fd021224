#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for output encoding.

use nopassword_crypto::encoding::CANONICAL_ALPHABET;
use nopassword_crypto::{canonical_encode, CharClass, OutputEncodingBuilder};
use proptest::prelude::*;
use std::collections::HashSet;

fn distinct_in(bytes: &[u8], class: CharClass) -> usize {
    bytes
        .iter()
        .filter(|&&b| class.contains(b))
        .collect::<HashSet<_>>()
        .len()
}

fn canonical_byte() -> impl Strategy<Value = u8> {
    proptest::sample::select(CANONICAL_ALPHABET.to_vec())
}

proptest! {
    /// Any sample with enough distinct symbols meets every minimum once remapped.
    #[test]
    fn remapped_sample_meets_minimums(
        upper in 0usize..4,
        lower in 0usize..4,
        number in 0usize..4,
        symbol in 0usize..4,
        raw in proptest::collection::vec(any::<u8>(), 24..48),
    ) {
        prop_assume!(upper + lower + number + symbol > 0);
        let sample = canonical_encode(&raw);
        let builder = OutputEncodingBuilder::new()
            .uppercase_count(upper)
            .lowercase_count(lower)
            .number_count(number)
            .symbol_count(symbol);

        let distinct: HashSet<u8> = sample.bytes().collect();
        prop_assume!(distinct.len() >= upper + lower + number + symbol);

        let encoding = builder.build_for(sample.as_bytes()).expect("build should succeed");
        let remapped = encoding.remap(sample.as_bytes()).expect("remap should succeed");

        prop_assert!(distinct_in(remapped.expose(), CharClass::Uppercase) >= upper);
        prop_assert!(distinct_in(remapped.expose(), CharClass::Lowercase) >= lower);
        prop_assert!(distinct_in(remapped.expose(), CharClass::Number) >= number);
        prop_assert!(distinct_in(remapped.expose(), CharClass::Symbol) >= symbol);
    }

    /// Every table maps the 64 canonical symbols to 64 distinct targets.
    #[test]
    fn every_table_is_injective(
        sample in proptest::collection::vec(canonical_byte(), 8..64),
    ) {
        let encoding = OutputEncodingBuilder::new()
            .build_for(&sample)
            .expect("build should succeed");
        let image = encoding.remap(CANONICAL_ALPHABET).expect("remap should succeed");
        let distinct: HashSet<u8> = image.expose().iter().copied().collect();
        prop_assert_eq!(distinct.len(), 64);
    }

    /// Distinct inputs never collide under the same table.
    #[test]
    fn distinct_inputs_stay_distinct(
        a in proptest::collection::vec(canonical_byte(), 1..32),
        b in proptest::collection::vec(canonical_byte(), 1..32),
    ) {
        prop_assume!(a != b);
        let encoding = OutputEncodingBuilder::new()
            .uppercase_count(1)
            .symbol_count(1)
            .build_for(CANONICAL_ALPHABET)
            .expect("build should succeed");
        prop_assert_ne!(encoding.remap(&a).unwrap(), encoding.remap(&b).unwrap());
    }
}
