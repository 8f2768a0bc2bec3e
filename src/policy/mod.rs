//! Policy plugins, turning a consent configuration and the user's decisions into
//! persisted consent strings.
//!
//! A plugin is created for a given [`Configuration`] and is only valid if the configuration
//! is subject to the plugin's regulation. Each time the user's decisions change, calling
//! [`ConsentProtocolPlugin::consent_changed`] encodes the new consent string and writes it
//! to the injected [`ConsentStore`].
//!
//! # Example
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use std::sync::Arc;
//! use iab_consent::config::{Configuration, ConsentStatus};
//! use iab_consent::policy::ConsentProtocolPlugin;
//! use iab_consent::store::{keys, ConsentStore, InMemoryStore, StoreValue};
//!
//! let configuration = Configuration {
//!     regulations: vec!["ccpaca".to_string()],
//!     ..Default::default()
//! };
//! let store = Arc::new(InMemoryStore::new());
//!
//! let plugins = ConsentProtocolPlugin::applicable(&configuration, 128, store.clone());
//! for plugin in &plugins {
//!     plugin.consent_changed(&ConsentStatus::default())?;
//! }
//!
//! assert_eq!(
//!     store.get(keys::US_PRIVACY_STRING),
//!     Some(StoreValue::String("1NNN".to_string()))
//! );
//! # Ok(())
//! # }
//! ```
use crate::config::{Configuration, ConsentStatus, Regulation};
use crate::sections::EncodeError;
use crate::store::ConsentStore;
use std::sync::Arc;
use thiserror::Error;

pub mod ccpa;
pub mod tcf;

pub use ccpa::{encode_ccpa, Ccpa};
pub use tcf::{encode_tcf, encode_tcf_with, Tcf, TcfSettings};

/// The error type for policy plugin operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PolicyError {
    /// The configuration is not subject to the regulation handled by the plugin.
    #[error("configuration is not subject to regulation {regulation}")]
    NotApplicableToConfig { regulation: Regulation },
    #[error("unable to encode consent string: {0}")]
    Encode(#[from] EncodeError),
}

pub(crate) fn ensure_applicable(
    configuration: &Configuration,
    regulation: Regulation,
) -> Result<(), PolicyError> {
    if configuration.applies(regulation) {
        Ok(())
    } else {
        Err(PolicyError::NotApplicableToConfig { regulation })
    }
}

/// A consent protocol bound to a configuration snapshot.
pub enum ConsentProtocolPlugin {
    Tcf(Tcf),
    Ccpa(Ccpa),
}

impl ConsentProtocolPlugin {
    /// Creates a plugin with default settings for every regulation listed in the configuration.
    pub fn applicable(
        configuration: &Configuration,
        vendor_list_version: u16,
        store: Arc<dyn ConsentStore>,
    ) -> Vec<Self> {
        let tcf = Tcf::new(configuration.clone(), vendor_list_version, store.clone())
            .ok()
            .map(Self::Tcf);
        let ccpa = Ccpa::new(configuration.clone(), store).ok().map(Self::Ccpa);

        tcf.into_iter().chain(ccpa).collect()
    }

    pub fn regulation(&self) -> Regulation {
        match self {
            Self::Tcf(_) => Regulation::GdprEu,
            Self::Ccpa(_) => Regulation::CcpaCa,
        }
    }

    /// Encodes and persists the consent string for the given decisions.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] if the string cannot be encoded. Nothing is persisted
    /// in this case.
    pub fn consent_changed(&self, status: &ConsentStatus) -> Result<String, PolicyError> {
        match self {
            Self::Tcf(tcf) => tcf.consent_changed(status),
            Self::Ccpa(ccpa) => Ok(ccpa.consent_changed(status)),
        }
    }
}
