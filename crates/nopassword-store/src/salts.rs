//! The salt store: services, their salt records, and derivation.
//!
//! [`Salts`] maps each service name to the ordered list of salt records ever
//! bound to it. At most one record per service may be live. Deriving a
//! password for a service with no live record draws a fresh salt and binds
//! it; later derivations replay that salt, so the same master password always
//! yields the same service password.
//!
//! Consistency is checked lazily: a document with dangling keys or duplicate
//! service names loads fine and only fails when the affected service is
//! queried.

use crate::credential::CredentialMetadata;
use crate::error::StoreError;
use crate::service::Service;
use nopassword_crypto::SecretBuffer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Services plus every salt record bound to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salts {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    salt_map: BTreeMap<String, Vec<CredentialMetadata>>,
}

impl Salts {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Names are not checked for uniqueness here.
    pub fn add_service(&mut self, service: Service) {
        tracing::debug!(service = %service.name(), "service registered");
        self.services.push(service);
    }

    /// Registered services in insertion order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// The service registered under `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownService`] if none is, [`StoreError::DuplicateService`]
    /// if several are.
    pub fn service(&self, name: &str) -> Result<&Service, StoreError> {
        NameIndex::new(&self.services).resolve(name)
    }

    /// Every salt record bound to `name`, live or obsolete, oldest first.
    #[must_use]
    pub fn credentials(&self, name: &str) -> &[CredentialMetadata] {
        self.salt_map.get(name).map_or(&[], Vec::as_slice)
    }

    /// Derive the password for `service` from `password`.
    ///
    /// Replays the live salt if one exists, otherwise generates and binds a
    /// new one using the service's strategy.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MultipleLiveCredentials`] if the service has more than
    ///   one live record
    /// - [`StoreError::SaltAlreadyBound`] if the service has only obsolete
    ///   records
    /// - [`StoreError::Crypto`] if hashing fails
    pub fn get_password_for_service(
        &mut self,
        service: &Service,
        password: &[u8],
    ) -> Result<SecretBuffer, StoreError> {
        let name = service.name();

        if let Some(record) = self.live_credential(name)? {
            let strategy = record
                .hashing_strategy()
                .unwrap_or_else(|| service.hashing_strategy());
            let output = strategy.generate_hash_with_existing_salt(record.salt(), password)?;
            tracing::debug!(service = %name, strategy = strategy.name(), "reused existing salt");
            return Ok(output.password_buffer());
        }

        let strategy = service.hashing_strategy();
        let output = strategy.generate_hash_with_new_salt(password)?;
        self.bind(name, CredentialMetadata::new(output.salt(), strategy.clone()))?;
        tracing::info!(service = %name, strategy = strategy.name(), "bound new salt");
        Ok(output.password_buffer())
    }

    /// Every bound service with its records, ordered by service name.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownService`] if a salt map key has no registered
    /// service, [`StoreError::DuplicateService`] if it has several.
    pub fn data(&self) -> Result<Vec<(&Service, &[CredentialMetadata])>, StoreError> {
        let index = NameIndex::new(&self.services);
        self.salt_map
            .iter()
            .map(|(name, records)| {
                index
                    .resolve(name)
                    .map(|service| (service, records.as_slice()))
            })
            .collect()
    }

    /// The single non-obsolete record for `name`, if any.
    fn live_credential(&self, name: &str) -> Result<Option<&CredentialMetadata>, StoreError> {
        let live: Vec<&CredentialMetadata> = self
            .credentials(name)
            .iter()
            .filter(|record| !record.is_obsolete())
            .collect();

        match live.as_slice() {
            [] => Ok(None),
            [record] => Ok(Some(*record)),
            _ => Err(StoreError::MultipleLiveCredentials {
                service: name.to_owned(),
                count: live.len(),
            }),
        }
    }

    fn bind(&mut self, name: &str, record: CredentialMetadata) -> Result<(), StoreError> {
        if self.salt_map.contains_key(name) {
            return Err(StoreError::SaltAlreadyBound(name.to_owned()));
        }
        self.salt_map.insert(name.to_owned(), vec![record]);
        Ok(())
    }
}

/// Services grouped by name for lookup.
struct NameIndex<'a> {
    by_name: HashMap<&'a str, Vec<&'a Service>>,
}

impl<'a> NameIndex<'a> {
    fn new(services: &'a [Service]) -> Self {
        let mut by_name: HashMap<&str, Vec<&Service>> = HashMap::new();
        for service in services {
            by_name.entry(service.name()).or_default().push(service);
        }
        Self { by_name }
    }

    fn resolve(&self, name: &str) -> Result<&'a Service, StoreError> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(StoreError::UnknownService(name.to_owned())),
            Some([service]) => Ok(*service),
            Some(_) => Err(StoreError::DuplicateService(name.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
