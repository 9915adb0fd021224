//! Character classes and the canonical working alphabet.

use crate::error::CryptoError;
use serde::{Deserialize, Serialize};

/// Standard Base64 symbols. Every remap table has one entry per symbol.
pub const CANONICAL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const NUMBERS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!\"#$%&'()*+,-./";

/// Position of `byte` in [`CANONICAL_ALPHABET`].
pub(crate) fn canonical_index(byte: u8) -> Option<usize> {
    CANONICAL_ALPHABET.iter().position(|&c| c == byte)
}

/// A character class with a minimum representation count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// `A-Z`
    Uppercase,
    /// `a-z`
    Lowercase,
    /// `0-9`
    Number,
    /// `` !"#$%&'()*+,-./ ``
    Symbol,
}

impl CharClass {
    /// Classes in alphabet concatenation order.
    pub const ALL: [Self; 4] = [Self::Uppercase, Self::Lowercase, Self::Number, Self::Symbol];

    /// Order in which leftover quota is handed out.
    pub(crate) const PRIORITY: [Self; 4] =
        [Self::Symbol, Self::Number, Self::Uppercase, Self::Lowercase];

    /// The symbols belonging to this class.
    #[must_use]
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Uppercase => UPPERCASE,
            Self::Lowercase => LOWERCASE,
            Self::Number => NUMBERS,
            Self::Symbol => SYMBOLS,
        }
    }

    /// Whether `byte` belongs to this class.
    #[must_use]
    pub fn contains(self, byte: u8) -> bool {
        self.alphabet().contains(&byte)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Uppercase => 0,
            Self::Lowercase => 1,
            Self::Number => 2,
            Self::Symbol => 3,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Number => "number",
            Self::Symbol => "symbol",
        }
    }
}

/// Minimum number of distinct symbols required from each class.
///
/// A class with a count of zero is inactive and contributes nothing to the
/// output alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassCounts {
    /// Minimum distinct uppercase letters.
    pub uppercase_count: usize,
    /// Minimum distinct lowercase letters.
    pub lowercase_count: usize,
    /// Minimum distinct digits.
    pub number_count: usize,
    /// Minimum distinct symbols.
    pub symbol_count: usize,
}

impl Default for ClassCounts {
    fn default() -> Self {
        Self {
            uppercase_count: 0,
            lowercase_count: 1,
            number_count: 1,
            symbol_count: 0,
        }
    }
}

impl ClassCounts {
    /// Minimum for `class`.
    #[must_use]
    pub const fn get(&self, class: CharClass) -> usize {
        match class {
            CharClass::Uppercase => self.uppercase_count,
            CharClass::Lowercase => self.lowercase_count,
            CharClass::Number => self.number_count,
            CharClass::Symbol => self.symbol_count,
        }
    }

    /// Whether `class` takes part in the output alphabet.
    #[must_use]
    pub const fn is_active(&self, class: CharClass) -> bool {
        self.get(class) > 0
    }

    /// Counts as an array indexed by [`CharClass::index`], after checking
    /// that every count fits its class and at least one class is active.
    pub(crate) fn validated(&self) -> Result<[usize; 4], CryptoError> {
        let mut minimums = [0usize; 4];
        for class in CharClass::ALL {
            let count = self.get(class);
            if count > class.alphabet().len() {
                return Err(CryptoError::OutputEncoding(format!(
                    "{} count {count} exceeds the {} available symbols",
                    class.name(),
                    class.alphabet().len()
                )));
            }
            minimums[class.index()] = count;
        }
        if minimums.iter().all(|&m| m == 0) {
            return Err(CryptoError::OutputEncoding(
                "at least one character class must be required".into(),
            ));
        }
        Ok(minimums)
    }

    /// Concatenated alphabets of the active classes.
    pub(crate) fn required_alphabet(&self) -> Vec<u8> {
        CharClass::ALL
            .into_iter()
            .filter(|&class| self.is_active(class))
            .flat_map(|class| class.alphabet().iter().copied())
            .collect()
    }
}
