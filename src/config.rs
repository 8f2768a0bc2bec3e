//! Consent configuration and user decisions, as consumed by the policy plugins.
//!
//! These types mirror the catalog fetched from the consent management backend. They are
//! read-only inputs: nothing in this crate mutates them.
//!
//! With the `serde` feature enabled, they can be deserialized from their camelCase JSON
//! representation.
use fnv::FnvHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A privacy regulation, identified in configurations by its code.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq, Hash)]
pub enum Regulation {
    #[strum(serialize = "gdpreu")]
    GdprEu,
    #[strum(serialize = "ccpaca")]
    CcpaCa,
}

/// The TCF classification of a purpose.
#[derive(Clone, Debug, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
pub enum TcfType {
    Purpose,
    SpecialPurpose,
    Feature,
    SpecialFeature,
    #[strum(default)]
    Other(String),
}

/// The legal basis under which a purpose is processed.
#[derive(Clone, Debug, EnumString, Eq, PartialEq)]
pub enum LegalBasis {
    #[strum(serialize = "disclosure")]
    Disclosure,
    #[strum(serialize = "consent_optin")]
    ConsentOptIn,
    #[strum(serialize = "consent_optout")]
    ConsentOptOut,
    #[strum(serialize = "legitimateinterest")]
    LegitimateInterest,
    #[strum(serialize = "legitimateinterest_objectable")]
    LegitimateInterestObjectable,
    #[strum(serialize = "legitimateinterest_non_objectable")]
    LegitimateInterestNonObjectable,
    #[strum(default)]
    Other(String),
}

impl LegalBasis {
    pub fn is_consent(&self) -> bool {
        matches!(self, Self::ConsentOptIn | Self::ConsentOptOut)
    }

    pub fn is_legitimate_interest(&self) -> bool {
        matches!(
            self,
            Self::LegitimateInterest
                | Self::LegitimateInterestObjectable
                | Self::LegitimateInterestNonObjectable
        )
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PurposeRecord {
    pub code: String,
    pub name: String,
    pub tcf_type: Option<String>,
    /// Numeric TCF id, as found in the catalog.
    #[cfg_attr(feature = "serde", serde(rename = "tcfID"))]
    pub tcf_id: Option<String>,
    pub legal_basis_code: String,
    pub categories: Vec<String>,
}

impl PurposeRecord {
    pub fn tcf_type(&self) -> Option<TcfType> {
        self.tcf_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// Returns the TCF id of this purpose, if it has a valid, non-empty one.
    pub fn tcf_id(&self) -> Option<u16> {
        self.tcf_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .and_then(|id| id.parse().ok())
    }

    pub fn legal_basis(&self) -> Option<LegalBasis> {
        self.legal_basis_code.parse().ok()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct VendorRecord {
    pub id: String,
    pub name: String,
    pub purposes: Vec<String>,
    pub special_purposes: Vec<String>,
    pub features: Vec<String>,
    pub special_features: Vec<String>,
    pub policy_url: Option<String>,
    pub uses_cookies: bool,
    pub cookie_max_age_seconds: Option<u64>,
}

impl VendorRecord {
    /// Returns the numeric id of this vendor, if it is a valid TCF vendor id.
    ///
    /// TCF ids start at 1 and fit in 16 bits.
    pub fn vendor_id(&self) -> Option<u16> {
        self.id.parse().ok().filter(|&id| id != 0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Configuration {
    pub regulations: Vec<String>,
    pub purposes: Vec<PurposeRecord>,
    pub vendors: Option<Vec<VendorRecord>>,
}

impl Configuration {
    /// Returns whether the given regulation is listed in this configuration.
    pub fn applies(&self, regulation: Regulation) -> bool {
        self.regulations
            .iter()
            .any(|r| r.parse::<Regulation>().is_ok_and(|r| r == regulation))
    }
}

/// The user's decisions, per purpose code and per vendor id.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConsentStatus {
    pub purposes: FnvHashMap<String, bool>,
    pub vendors: Option<Vec<String>>,
}

impl ConsentStatus {
    pub fn is_allowed(&self, purpose_code: &str) -> bool {
        self.purposes.get(purpose_code).copied().unwrap_or(false)
    }

    pub fn is_denied(&self, purpose_code: &str) -> bool {
        self.purposes.get(purpose_code) == Some(&false)
    }
}
