//! This crate encodes the consent strings expected by the ad-tech ecosystem from a user's
//! privacy decisions: the IAB Europe [Transparency & Consent Framework v2](https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework)
//! TC String, and the IAB CCPA [US Privacy String](https://github.com/InteractiveAdvertisingBureau/USPrivacy).
//!
//! NOTE: This is not an official IAB library.
//!
//! # Encoding consent strings
//!
//! The [`encode_tcf`] and [`encode_ccpa`] functions take a consent [configuration](config::Configuration),
//! listing the applicable regulations, purposes and vendors, and the user's
//! [decisions](config::ConsentStatus).
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_consent::config::{Configuration, ConsentStatus, PurposeRecord, VendorRecord};
//! use iab_consent::{encode_ccpa, encode_tcf};
//!
//! let configuration = Configuration {
//!     regulations: vec!["gdpreu".to_string(), "ccpaca".to_string()],
//!     purposes: vec![PurposeRecord {
//!         code: "tcf.purpose_1".to_string(),
//!         tcf_type: Some("purpose".to_string()),
//!         tcf_id: Some("1".to_string()),
//!         legal_basis_code: "consent_optin".to_string(),
//!         ..Default::default()
//!     }],
//!     vendors: Some(vec![VendorRecord {
//!         id: "755".to_string(),
//!         ..Default::default()
//!     }]),
//! };
//!
//! let status = ConsentStatus {
//!     purposes: [("tcf.purpose_1".to_string(), false)].into_iter().collect(),
//!     vendors: Some(vec!["755".to_string()]),
//! };
//!
//! let tc_string = encode_tcf(&configuration, &status, 128)?;
//! assert!(tc_string.starts_with('C'));
//!
//! let us_privacy = encode_ccpa(&configuration, &status, true, false);
//! assert_eq!(us_privacy, "1YYN");
//! # Ok(())
//! # }
//! ```
//!
//! Lower level encoders for each string are available in the [`sections`] module, and the
//! [`policy`] module provides plugins which persist the encoded strings to a
//! [`ConsentStore`](store::ConsentStore) whenever the user's decisions change.
//!
//! # Error handling
//!
//! A value which does not fit in its field is an error, it is never truncated. Nothing is
//! written to the store when encoding fails.
//!
pub(crate) mod core;
pub mod config;
pub mod policy;
pub mod sections;
pub mod store;

pub use policy::{encode_ccpa, encode_tcf};
