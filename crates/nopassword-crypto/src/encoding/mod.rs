//! Character-class output encoding.
//!
//! Derived passwords come out of the hashing strategies in a radix-64 style
//! alphabet, which many sites refuse because it lacks symbols or because
//! their rules demand a digit. An [`OutputEncoding`] is a fixed substitution
//! table over the 64 standard Base64 symbols. It is built against a sample
//! password so that remapping that sample yields at least the requested
//! number of distinct uppercase, lowercase, digit and symbol characters.
//!
//! The table is injective: two different inputs never remap to the same
//! output, so no entropy is lost beyond what the target alphabet imposes.
//!
//! ```
//! use nopassword_crypto::encoding::{OutputEncodingBuilder, CharClass};
//!
//! let encoding = OutputEncodingBuilder::new()
//!     .uppercase_count(1)
//!     .lowercase_count(1)
//!     .number_count(1)
//!     .symbol_count(1)
//!     .build_for(b"password")
//!     .unwrap();
//!
//! let remapped = encoding.remap(b"password").unwrap();
//! assert!(remapped.expose().iter().any(|&b| CharClass::Symbol.contains(b)));
//! ```

mod alphabet;

pub use self::alphabet::{CharClass, ClassCounts, CANONICAL_ALPHABET};

use self::alphabet::canonical_index;
use crate::error::CryptoError;
use crate::memory::SecretBuffer;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Encode raw hash bytes into the canonical alphabet so they can be remapped.
#[must_use]
pub fn canonical_encode(raw: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(STANDARD_NO_PAD.encode(raw))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent configuration for an [`OutputEncoding`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputEncodingBuilder {
    counts: ClassCounts,
}

impl OutputEncodingBuilder {
    /// Builder with the default counts (one lowercase letter, one digit).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder starting from explicit counts.
    #[must_use]
    pub const fn from_counts(counts: ClassCounts) -> Self {
        Self { counts }
    }

    /// Minimum distinct uppercase letters.
    #[must_use]
    pub const fn uppercase_count(mut self, count: usize) -> Self {
        self.counts.uppercase_count = count;
        self
    }

    /// Minimum distinct lowercase letters.
    #[must_use]
    pub const fn lowercase_count(mut self, count: usize) -> Self {
        self.counts.lowercase_count = count;
        self
    }

    /// Minimum distinct digits.
    #[must_use]
    pub const fn number_count(mut self, count: usize) -> Self {
        self.counts.number_count = count;
        self
    }

    /// Minimum distinct symbols.
    #[must_use]
    pub const fn symbol_count(mut self, count: usize) -> Self {
        self.counts.symbol_count = count;
        self
    }

    /// Build a table that satisfies the class minimums for `sample`.
    ///
    /// `sample` must be written in [`CANONICAL_ALPHABET`], typically the
    /// output of [`canonical_encode`] or a bcrypt hash field with `.`
    /// translated.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OutputEncoding`] if a count exceeds its class
    /// alphabet, no class is active, `sample` contains a byte outside the
    /// canonical alphabet, or `sample` has too few distinct symbols to meet
    /// the minimums.
    pub fn build_for(&self, sample: &[u8]) -> Result<OutputEncoding, CryptoError> {
        let minimums = Zeroizing::new(self.counts.validated()?);

        let mut uniques = Zeroizing::new(Vec::with_capacity(CANONICAL_ALPHABET.len()));
        for (offset, &byte) in sample.iter().enumerate() {
            if canonical_index(byte).is_none() {
                return Err(CryptoError::OutputEncoding(format!(
                    "sample byte at offset {offset} is outside the canonical alphabet"
                )));
            }
            if !uniques.contains(&byte) {
                uniques.push(byte);
            }
        }

        let required = Zeroizing::new(self.counts.required_alphabet());
        let budget = uniques.len().min(required.len());
        let needed: usize = minimums.iter().sum();
        if needed > budget {
            return Err(CryptoError::OutputEncoding(format!(
                "class minimums need {needed} distinct symbols but the sample offers {budget}"
            )));
        }

        let quotas = allocate_quotas(&minimums, budget)?;

        let mut rng = OsRng;
        let mut shuffled_uniques = Zeroizing::new(Vec::with_capacity(budget));
        for class in CharClass::PRIORITY {
            draw_distinct(
                class.alphabet(),
                quotas[class.index()],
                &mut rng,
                &mut shuffled_uniques,
            );
        }
        shuffled_uniques.shuffle(&mut rng);

        let sources = uniques.get(..budget).unwrap_or_default();
        let unpicked = Zeroizing::new(
            CANONICAL_ALPHABET
                .iter()
                .copied()
                .filter(|b| !sources.contains(b))
                .collect::<Vec<u8>>(),
        );

        let mut unmapped = Zeroizing::new(
            required
                .iter()
                .copied()
                .filter(|b| !shuffled_uniques.contains(b))
                .collect::<Vec<u8>>(),
        );
        unmapped.shuffle(&mut rng);
        let mut filler = Zeroizing::new(
            CANONICAL_ALPHABET
                .iter()
                .copied()
                .filter(|b| !required.contains(b))
                .collect::<Vec<u8>>(),
        );
        filler.shuffle(&mut rng);
        unmapped.extend_from_slice(&filler);

        if unpicked.len() > unmapped.len() {
            return Err(CryptoError::OutputEncoding(format!(
                "{} source symbols left for {} target symbols",
                unpicked.len(),
                unmapped.len()
            )));
        }

        let mut table = Zeroizing::new([0u8; 64]);
        let pairs = sources
            .iter()
            .zip(shuffled_uniques.iter())
            .chain(unpicked.iter().zip(unmapped.iter()));
        for (&from, &to) in pairs {
            let slot = canonical_index(from).ok_or_else(|| {
                CryptoError::OutputEncoding("source symbol outside the canonical alphabet".into())
            })?;
            table[slot] = to;
        }

        tracing::debug!(
            distinct = uniques.len(),
            budget,
            required = required.len(),
            "output encoding built"
        );

        Ok(OutputEncoding {
            counts: self.counts,
            table,
        })
    }
}

/// Split `budget` across the active classes.
///
/// The split starts even, hands the remainder out in [`CharClass::PRIORITY`]
/// order, caps each class at its alphabet size, then tops up any class still
/// under its minimum from the class with the largest surplus. The returned
/// quotas always sum to `budget`.
// Every quantity here is at most 77 (the size of all four alphabets).
#[allow(clippy::arithmetic_side_effects)]
fn allocate_quotas(
    minimums: &[usize; 4],
    budget: usize,
) -> Result<Zeroizing<[usize; 4]>, CryptoError> {
    let active: Vec<CharClass> = CharClass::PRIORITY
        .into_iter()
        .filter(|c| minimums[c.index()] > 0)
        .collect();
    if active.is_empty() {
        return Err(CryptoError::OutputEncoding(
            "at least one character class must be required".into(),
        ));
    }

    let mut quotas = Zeroizing::new([0usize; 4]);
    let per_set = budget / active.len();
    let mut remainder = budget % active.len();
    for class in &active {
        quotas[class.index()] = per_set;
        if remainder > 0 {
            quotas[class.index()] += 1;
            remainder -= 1;
        }
    }

    let mut overflow = 0;
    for class in &active {
        let cap = class.alphabet().len();
        let quota = &mut quotas[class.index()];
        if *quota > cap {
            overflow += *quota - cap;
            *quota = cap;
        }
    }
    while overflow > 0 {
        let mut placed = false;
        for class in &active {
            let quota = &mut quotas[class.index()];
            if overflow > 0 && *quota < class.alphabet().len() {
                *quota += 1;
                overflow -= 1;
                placed = true;
            }
        }
        if !placed {
            return Err(CryptoError::OutputEncoding(
                "budget exceeds the required alphabet".into(),
            ));
        }
    }

    for class in &active {
        let short = class.index();
        while quotas[short] < minimums[short] {
            let lender = active
                .iter()
                .map(|c| c.index())
                .filter(|&i| quotas[i] > minimums[i])
                .max_by_key(|&i| quotas[i] - minimums[i]);
            let Some(lender) = lender else {
                return Err(CryptoError::OutputEncoding(
                    "class minimums exceed the budget".into(),
                ));
            };
            quotas[lender] -= 1;
            quotas[short] += 1;
        }
    }

    Ok(quotas)
}

/// Append `count` distinct symbols of `alphabet` to `out`, chosen uniformly by
/// picking an index and swapping the pick past the shrinking end.
fn draw_distinct(alphabet: &[u8], count: usize, rng: &mut OsRng, out: &mut Vec<u8>) {
    let mut pool = Zeroizing::new(alphabet.to_vec());
    let mut end = pool.len();
    for _ in 0..count.min(alphabet.len()) {
        let pick = rng.gen_range(0..end);
        end = end.saturating_sub(1);
        pool.swap(pick, end);
        out.push(pool[end]);
    }
}

// ---------------------------------------------------------------------------
// OutputEncoding
// ---------------------------------------------------------------------------

/// An immutable substitution table over [`CANONICAL_ALPHABET`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OutputEncodingDocument", into = "OutputEncodingDocument")]
pub struct OutputEncoding {
    counts: ClassCounts,
    table: Zeroizing<[u8; 64]>,
}

impl OutputEncoding {
    /// The class minimums this table was built for.
    #[must_use]
    pub const fn counts(&self) -> &ClassCounts {
        &self.counts
    }

    /// Substitute every byte of `input` through the table.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OutputEncoding`] if `input` contains a byte
    /// outside [`CANONICAL_ALPHABET`].
    pub fn remap(&self, input: &[u8]) -> Result<SecretBuffer, CryptoError> {
        let mut out = Zeroizing::new(Vec::with_capacity(input.len()));
        for (offset, &byte) in input.iter().enumerate() {
            let slot = canonical_index(byte).ok_or_else(|| {
                CryptoError::OutputEncoding(format!(
                    "input byte at offset {offset} is outside the canonical alphabet"
                ))
            })?;
            out.push(self.table[slot]);
        }
        Ok(SecretBuffer::new(&out))
    }

    /// [`canonical_encode`] followed by [`remap`](Self::remap).
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature mirrors [`remap`](Self::remap).
    pub fn encode(&self, raw: &[u8]) -> Result<SecretBuffer, CryptoError> {
        let canonical = canonical_encode(raw);
        self.remap(canonical.as_bytes())
    }
}

impl fmt::Debug for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputEncoding")
            .field("counts", &self.counts)
            .field("table", &"***")
            .finish()
    }
}

/// Persisted form: the counts plus the table as a 64-character string.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputEncodingDocument {
    #[serde(flatten)]
    counts: ClassCounts,
    mapping: String,
}

impl From<OutputEncoding> for OutputEncodingDocument {
    fn from(encoding: OutputEncoding) -> Self {
        Self {
            counts: encoding.counts,
            mapping: encoding.table.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

impl TryFrom<OutputEncodingDocument> for OutputEncoding {
    type Error = CryptoError;

    fn try_from(document: OutputEncodingDocument) -> Result<Self, Self::Error> {
        document.counts.validated()?;

        let bytes = document.mapping.as_bytes();
        let mut table = Zeroizing::new([0u8; 64]);
        if bytes.len() != table.len() {
            return Err(CryptoError::OutputEncoding(format!(
                "mapping must be 64 symbols, got {}",
                bytes.len()
            )));
        }
        table.copy_from_slice(bytes);

        let mut sorted = Zeroizing::new(*table);
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(CryptoError::OutputEncoding(
                "mapping contains a repeated symbol".into(),
            ));
        }

        Ok(Self {
            counts: document.counts,
            table,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
