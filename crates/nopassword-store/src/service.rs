//! Services and their descriptive sub-services.
//!
//! A service is the unit a derived password belongs to; its name is the key
//! into the salt map. Sub-services only describe where the credential is
//! used (an application, a domain) and never affect derivation.

use nopassword_crypto::HashingStrategy;
use serde::{Deserialize, Serialize};

/// A named credential target bound to one hashing strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    name: String,
    #[serde(default)]
    hashing_strategy: HashingStrategy,
    #[serde(default)]
    sub_services: Vec<SubService>,
}

impl Service {
    /// Service with no sub-services.
    #[must_use]
    pub fn new(name: impl Into<String>, hashing_strategy: impl Into<HashingStrategy>) -> Self {
        Self {
            name: name.into(),
            hashing_strategy: hashing_strategy.into(),
            sub_services: Vec::new(),
        }
    }

    /// The salt map key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strategy used for new salts.
    #[must_use]
    pub const fn hashing_strategy(&self) -> &HashingStrategy {
        &self.hashing_strategy
    }

    /// Sub-services in insertion order.
    #[must_use]
    pub fn sub_services(&self) -> &[SubService] {
        &self.sub_services
    }

    /// Append a sub-service.
    pub fn add_sub_service(&mut self, sub_service: SubService) {
        self.sub_services.push(sub_service);
    }
}

/// Where a service's credential is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubService {
    /// An application or anything else identified by name.
    Named {
        /// Display name.
        name: String,
    },
    /// A website, e.g. `github.com`.
    Domain {
        /// Domain name.
        domain: String,
    },
}

impl SubService {
    /// Human-readable label.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Named { name } => name,
            Self::Domain { domain } => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nopassword_crypto::BcryptStrategy;

    #[test]
    fn sub_services_keep_insertion_order() {
        let mut steam = Service::new("Steam", BcryptStrategy::default());
        steam.add_sub_service(SubService::Named {
            name: "Steam client".into(),
        });
        steam.add_sub_service(SubService::Domain {
            domain: "steampowered.com".into(),
        });

        let labels: Vec<&str> = steam.sub_services().iter().map(SubService::description).collect();
        assert_eq!(labels, ["Steam client", "steampowered.com"]);
    }

    #[test]
    fn sub_service_serde_uses_type_tag() {
        let json = serde_json::to_value(SubService::Domain {
            domain: "github.com".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "domain");
        assert_eq!(json["domain"], "github.com");
    }

    #[test]
    fn missing_strategy_defaults_to_bcrypt() {
        let service: Service = serde_json::from_str(r#"{"name":"mail"}"#).unwrap();
        assert_eq!(service.name(), "mail");
        assert_eq!(service.hashing_strategy().name(), "bcrypt");
        assert!(service.sub_services().is_empty());
    }
}
