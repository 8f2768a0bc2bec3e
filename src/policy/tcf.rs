use crate::config::{Configuration, ConsentStatus, Regulation, TcfType};
use crate::policy::{ensure_applicable, PolicyError};
use crate::sections::tcfeuv2::{Core, PublisherPurposes, PublisherRestriction, TcfEuV2};
use crate::sections::IdSet;
use crate::store::{keys, ConsentStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// CMP parameters written in the core segment, along with optional publisher data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TcfSettings {
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub publisher_country_code: String,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_stacks: bool,
    pub purpose_one_treatment: bool,
    /// Lists every vendor of the catalog in a disclosed vendors segment.
    pub disclose_vendors: bool,
    pub publisher_restrictions: Vec<PublisherRestriction>,
    pub publisher_purposes: Option<PublisherPurposes>,
}

impl Default for TcfSettings {
    fn default() -> Self {
        Self {
            cmp_id: 2,
            cmp_version: 1,
            consent_screen: 0,
            consent_language: "EN".to_string(),
            publisher_country_code: "US".to_string(),
            policy_version: 0,
            is_service_specific: true,
            use_non_standard_stacks: false,
            purpose_one_treatment: false,
            disclose_vendors: false,
            publisher_restrictions: vec![],
            publisher_purposes: None,
        }
    }
}

/// The purpose ids the user agreed to, split by the field they are encoded in.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct PurposeSets {
    pub special_feature_optins: IdSet,
    pub purpose_consents: IdSet,
    pub purpose_legitimate_interests: IdSet,
}

impl PurposeSets {
    pub(crate) fn new(configuration: &Configuration, status: &ConsentStatus) -> Self {
        let mut sets = Self::default();

        for purpose in &configuration.purposes {
            let Some(tcf_id) = purpose.tcf_id() else {
                continue;
            };
            if !status.is_allowed(&purpose.code) {
                continue;
            }

            let legal_basis = purpose.legal_basis();
            let set = match (purpose.tcf_type(), legal_basis) {
                (Some(TcfType::SpecialFeature), _) => &mut sets.special_feature_optins,
                (Some(TcfType::Purpose), Some(b)) if b.is_consent() => &mut sets.purpose_consents,
                (Some(TcfType::Purpose), Some(b)) if b.is_legitimate_interest() => {
                    &mut sets.purpose_legitimate_interests
                }
                _ => continue,
            };
            set.insert(tcf_id);
        }

        sets
    }
}

fn catalog_vendors<'a>(
    configuration: &'a Configuration,
) -> impl Iterator<Item = (&'a str, u16)> + 'a {
    configuration.vendors.iter().flatten().filter_map(|v| {
        let id = v.vendor_id();
        if id.is_none() {
            warn!(vendor = %v.id, "skipping vendor with invalid id");
        }
        id.map(|id| (v.id.as_str(), id))
    })
}

fn consented_vendors(configuration: &Configuration, status: &ConsentStatus) -> IdSet {
    let Some(consented) = status.vendors.as_ref() else {
        return IdSet::new();
    };

    catalog_vendors(configuration)
        .filter(|(code, _)| consented.iter().any(|c| c == code))
        .map(|(_, id)| id)
        .collect()
}

/// Builds the TC String encoder input from a configuration and the user's decisions.
pub(crate) fn tc_string(
    configuration: &Configuration,
    status: &ConsentStatus,
    vendor_list_version: u16,
    settings: &TcfSettings,
    now: DateTime<Utc>,
) -> TcfEuV2 {
    let purposes = PurposeSets::new(configuration, status);
    let vendors = consented_vendors(configuration, status);

    let mut tcf = TcfEuV2::default();
    tcf.core = Core {
        created: now,
        last_updated: now,
        cmp_id: settings.cmp_id,
        cmp_version: settings.cmp_version,
        consent_screen: settings.consent_screen,
        consent_language: settings.consent_language.clone(),
        vendor_list_version,
        policy_version: settings.policy_version,
        is_service_specific: settings.is_service_specific,
        use_non_standard_stacks: settings.use_non_standard_stacks,
        special_feature_optins: purposes.special_feature_optins,
        purpose_consents: purposes.purpose_consents,
        purpose_legitimate_interests: purposes.purpose_legitimate_interests,
        purpose_one_treatment: settings.purpose_one_treatment,
        publisher_country_code: settings.publisher_country_code.clone(),
        vendor_consents: vendors.clone(),
        vendor_legitimate_interests: vendors,
        publisher_restrictions: settings.publisher_restrictions.clone(),
        ..Default::default()
    };

    if settings.disclose_vendors {
        tcf.disclosed_vendors = catalog_vendors(configuration).map(|(_, id)| id).collect();
    }

    // publisher purposes are optional, a segment which fails to encode is left out
    tcf.publisher_purposes = settings
        .publisher_purposes
        .clone()
        .filter(|p| match p.encode() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "omitting publisher purposes segment");
                false
            }
        });

    tcf
}

/// Encodes the TC String for the given decisions, with default settings and the current time.
///
/// # Errors
///
/// Returns [`PolicyError::NotApplicableToConfig`] if the configuration is not subject to GDPR,
/// or [`PolicyError::Encode`] if the string cannot be encoded.
pub fn encode_tcf(
    configuration: &Configuration,
    status: &ConsentStatus,
    vendor_list_version: u16,
) -> Result<String, PolicyError> {
    encode_tcf_with(
        configuration,
        status,
        vendor_list_version,
        &TcfSettings::default(),
        Utc::now(),
    )
}

/// Encodes the TC String with explicit settings and creation time.
pub fn encode_tcf_with(
    configuration: &Configuration,
    status: &ConsentStatus,
    vendor_list_version: u16,
    settings: &TcfSettings,
    now: DateTime<Utc>,
) -> Result<String, PolicyError> {
    ensure_applicable(configuration, Regulation::GdprEu)?;

    let s = tc_string(configuration, status, vendor_list_version, settings, now).encode()?;
    debug!(vendor_list_version, tc_string = %s, "encoded TC string");

    Ok(s)
}

/// The TCF v2 policy plugin.
pub struct Tcf {
    configuration: Configuration,
    vendor_list_version: u16,
    settings: TcfSettings,
    store: Arc<dyn ConsentStore>,
}

impl Tcf {
    /// Creates a TCF plugin for a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotApplicableToConfig`] if the configuration does not list
    /// the `gdpreu` regulation.
    pub fn new(
        configuration: Configuration,
        vendor_list_version: u16,
        store: Arc<dyn ConsentStore>,
    ) -> Result<Self, PolicyError> {
        ensure_applicable(&configuration, Regulation::GdprEu)?;

        Ok(Self {
            configuration,
            vendor_list_version,
            settings: TcfSettings::default(),
            store,
        })
    }

    pub fn with_settings(mut self, settings: TcfSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn settings(&self) -> &TcfSettings {
        &self.settings
    }

    /// Encodes the TC String for the given decisions and persists it.
    pub fn consent_changed(&self, status: &ConsentStatus) -> Result<String, PolicyError> {
        let s = encode_tcf_with(
            &self.configuration,
            status,
            self.vendor_list_version,
            &self.settings,
            Utc::now(),
        )?;

        self.store.set(keys::TCF_TC_STRING, s.clone().into());
        self.store.set(keys::TCF_GDPR_APPLIES, true.into());

        Ok(s)
    }
}
