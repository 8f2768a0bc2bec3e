//! IAB TCF v2 "TC String" encoding.
//!
//! A TC String is made of a mandatory core segment, followed by up to three optional
//! segments (disclosed vendors, allowed vendors and publisher purposes), each one
//! independently Base64-URL encoded and separated by `.` characters.
//!
//! Optional segments are only emitted when they carry data.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use iab_consent::sections::tcfeuv2::TcfEuV2;
//!
//! let mut tcf = TcfEuV2::default();
//! tcf.core.created = Utc.timestamp_millis_opt(1582243059300).unwrap();
//! tcf.core.last_updated = tcf.core.created;
//! tcf.core.cmp_id = 27;
//! tcf.core.vendor_list_version = 15;
//! tcf.core.policy_version = 2;
//! tcf.core.purpose_consents.extend([1, 2, 3]);
//! tcf.core.vendor_consents.extend([2, 6, 8]);
//! tcf.core.vendor_legitimate_interests.extend([2, 6, 8]);
//!
//! assert_eq!(
//!     tcf.encode().unwrap(),
//!     "COvFyGBOvFyGBAbAAAENAPCAAOAAAAAAAAAAAEEUACCKAAA"
//! );
//! ```
use crate::core::vendors::{ranges, VendorEncoding};
use crate::core::{DataWriter, ToDataWriter};
use crate::sections::{join_segments, EncodeError, IdSet, SegmentType};
use chrono::{DateTime, Utc};
use num_derive::ToPrimitive;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const TCF_EU_V2_VERSION: u8 = 2;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct TcfEuV2 {
    pub core: Core,
    /// Emitted as a disclosed vendors segment when not empty.
    pub disclosed_vendors: IdSet,
    /// Emitted as an allowed vendors segment when not empty.
    pub allowed_vendors: IdSet,
    pub publisher_purposes: Option<PublisherPurposes>,
}

impl TcfEuV2 {
    /// Encodes the full TC String.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if any segment fails to encode. No partial string is
    /// returned in this case.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let mut w = DataWriter::new();
        w.write(&self.core)?;
        let core = w.into_base64_url()?;

        let disclosed_vendors =
            encode_vendors_segment(SegmentType::DisclosedVendors, &self.disclosed_vendors)?;
        let allowed_vendors =
            encode_vendors_segment(SegmentType::AllowedVendors, &self.allowed_vendors)?;
        let publisher_purposes = self
            .publisher_purposes
            .as_ref()
            .map(PublisherPurposes::encode)
            .transpose()?;

        Ok(join_segments([
            Some(core),
            disclosed_vendors,
            allowed_vendors,
            publisher_purposes,
        ]))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Core {
    pub version: u8,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub policy_version: u8,
    pub is_service_specific: bool,
    pub use_non_standard_stacks: bool,
    pub special_feature_optins: IdSet,
    pub purpose_consents: IdSet,
    pub purpose_legitimate_interests: IdSet,
    pub purpose_one_treatment: bool,
    pub publisher_country_code: String,
    pub vendor_consents: IdSet,
    pub vendor_legitimate_interests: IdSet,
    pub publisher_restrictions: Vec<PublisherRestriction>,
}

impl Default for Core {
    fn default() -> Self {
        Self {
            version: TCF_EU_V2_VERSION,
            created: DateTime::<Utc>::UNIX_EPOCH,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
            cmp_id: 0,
            cmp_version: 0,
            consent_screen: 0,
            consent_language: "EN".to_string(),
            vendor_list_version: 0,
            policy_version: 0,
            is_service_specific: false,
            use_non_standard_stacks: false,
            special_feature_optins: IdSet::new(),
            purpose_consents: IdSet::new(),
            purpose_legitimate_interests: IdSet::new(),
            purpose_one_treatment: false,
            publisher_country_code: "AA".to_string(),
            vendor_consents: IdSet::new(),
            vendor_legitimate_interests: IdSet::new(),
            publisher_restrictions: vec![],
        }
    }
}

impl ToDataWriter for Core {
    type Err = EncodeError;

    fn to_data_writer(&self, w: &mut DataWriter) -> Result<(), Self::Err> {
        if self.version != TCF_EU_V2_VERSION {
            return Err(EncodeError::IncompatibleVersion {
                expected: TCF_EU_V2_VERSION,
                found: self.version,
            });
        }
        let consent_language = two_letter_code(&self.consent_language)?;
        let publisher_country_code = two_letter_code(&self.publisher_country_code)?;

        w.write_fixed_integer("version", self.version, 6)?;
        w.write_datetime_as_deciseconds("created", &self.created)?;
        w.write_datetime_as_deciseconds("last_updated", &self.last_updated)?;
        w.write_fixed_integer("cmp_id", self.cmp_id, 12)?;
        w.write_fixed_integer("cmp_version", self.cmp_version, 12)?;
        w.write_fixed_integer("consent_screen", self.consent_screen, 6)?;
        w.write_string(&consent_language)?;
        w.write_fixed_integer("vendor_list_version", self.vendor_list_version, 12)?;
        w.write_fixed_integer("policy_version", self.policy_version, 6)?;
        w.write_bool(self.is_service_specific)?;
        w.write_bool(self.use_non_standard_stacks)?;
        w.write_fixed_bitfield(&self.special_feature_optins, 12)?;
        w.write_fixed_bitfield(&self.purpose_consents, 24)?;
        w.write_fixed_bitfield(&self.purpose_legitimate_interests, 24)?;
        w.write_bool(self.purpose_one_treatment)?;
        w.write_string(&publisher_country_code)?;
        w.write_optimized_integer_range(&self.vendor_consents)?;
        w.write_optimized_integer_range(&self.vendor_legitimate_interests)?;

        w.write_fixed_integer("num_pub_restrictions", self.publisher_restrictions.len(), 12)?;
        for restriction in &self.publisher_restrictions {
            w.write(restriction)?;
        }

        Ok(())
    }
}

/// Upper-cases a code made of exactly two ASCII letters.
fn two_letter_code(s: &str) -> Result<String, EncodeError> {
    if s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(s.to_ascii_uppercase())
    } else {
        Err(EncodeError::InvalidLanguageCode(s.to_string()))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublisherRestriction {
    pub purpose_id: u8,
    pub restriction_type: RestrictionType,
    pub restricted_vendor_ids: IdSet,
}

impl ToDataWriter for PublisherRestriction {
    type Err = EncodeError;

    fn to_data_writer(&self, w: &mut DataWriter) -> Result<(), Self::Err> {
        w.write_fixed_integer("purpose_id", self.purpose_id, 6)?;
        w.write_fixed_integer("restriction_type", self.restriction_type, 2)?;
        w.write_integer_range(&ranges(&self.restricted_vendor_ids, false))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RestrictionType {
    NotAllowed = 0,
    RequireConsent = 1,
    RequireLegitimateInterest = 2,
    Undefined = 3,
}

/// Publisher transparency and consent for the publisher's own data processing purposes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublisherPurposes {
    pub consents: IdSet,
    pub legitimate_interests: IdSet,
    pub num_custom_purposes: u8,
    pub custom_consents: IdSet,
    pub custom_legitimate_interests: IdSet,
}

impl PublisherPurposes {
    /// Checks that this segment has data to encode.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::EmptyValue`] with the name of the first empty mandatory field.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.consents.is_empty() {
            return Err(EncodeError::EmptyValue("consents"));
        }
        if self.legitimate_interests.is_empty() {
            return Err(EncodeError::EmptyValue("legitimate_interests"));
        }
        if self.num_custom_purposes == 0 {
            return Err(EncodeError::EmptyValue("num_custom_purposes"));
        }
        Ok(())
    }

    /// Encodes the publisher purposes segment.
    pub fn encode(&self) -> Result<String, EncodeError> {
        let mut w = DataWriter::new();
        w.write(self)?;
        w.into_base64_url()
    }
}

impl ToDataWriter for PublisherPurposes {
    type Err = EncodeError;

    fn to_data_writer(&self, w: &mut DataWriter) -> Result<(), Self::Err> {
        self.validate()?;

        w.write_fixed_integer("segment_type", SegmentType::PublisherTc, 3)?;
        w.write_fixed_bitfield(&self.consents, 24)?;
        w.write_fixed_bitfield(&self.legitimate_interests, 24)?;
        w.write_fixed_integer("num_custom_purposes", self.num_custom_purposes, 6)?;
        let n = u16::from(self.num_custom_purposes);
        w.write_fixed_bitfield(&self.custom_consents, n)?;
        w.write_fixed_bitfield(&self.custom_legitimate_interests, n)
    }
}

fn encode_vendors_segment(
    segment_type: SegmentType,
    vendors: &IdSet,
) -> Result<Option<String>, EncodeError> {
    if vendors.is_empty() {
        return Ok(None);
    }

    let mut w = DataWriter::new();
    w.write_fixed_integer("segment_type", segment_type, 3)?;
    w.write(&VendorEncoding::bitfield(vendors))?;
    w.into_base64_url().map(Some)
}
