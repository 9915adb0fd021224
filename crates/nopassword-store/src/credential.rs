//! Persisted salt records.

use nopassword_crypto::HashingStrategy;
use serde::{Deserialize, Serialize};

/// One salt generation bound to a service.
///
/// Only the salt is stored, never the derived password. An obsolete record is
/// kept for history but ignored when deriving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    #[serde(with = "base64_salt")]
    salt: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hashing_strategy: Option<HashingStrategy>,
    #[serde(default)]
    obsolete: bool,
}

impl CredentialMetadata {
    /// Live record for `salt`, created by `hashing_strategy`.
    #[must_use]
    pub fn new(salt: impl Into<Vec<u8>>, hashing_strategy: HashingStrategy) -> Self {
        Self {
            salt: salt.into(),
            hashing_strategy: Some(hashing_strategy),
            obsolete: false,
        }
    }

    /// The salt, in the form the creating strategy accepts back.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Strategy that created the salt, if recorded.
    #[must_use]
    pub const fn hashing_strategy(&self) -> Option<&HashingStrategy> {
        self.hashing_strategy.as_ref()
    }

    /// Whether the record has been retired.
    #[must_use]
    pub const fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// Retire the record. It stays in the store but is skipped on lookup.
    pub fn mark_obsolete(&mut self) {
        self.obsolete = true;
    }
}

/// Salts travel as standard padded Base64 strings.
mod base64_salt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(salt: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(salt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
