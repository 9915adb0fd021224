//! `nopassword-store`: service registry and salt store for NoPassword.
//!
//! Keeps one live salt per service, derives service passwords through
//! `nopassword-crypto`, and persists everything except derived passwords
//! as a JSON document.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod credential;
pub mod document;
pub mod error;
pub mod salts;
pub mod service;

pub use credential::CredentialMetadata;
pub use error::StoreError;
pub use salts::Salts;
pub use service::{Service, SubService};
