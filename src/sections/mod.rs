//! Encoders for the consent string formats supported by this crate.
//!
//! - [`tcfeuv2`] produces IAB TCF v2 "TC Strings", made of a mandatory core segment and
//!   optional segments, each one Base64-URL encoded and separated by `.` characters.
//! - [`uspv1`] produces the 4 characters CCPA "US Privacy String".
//!
use num_derive::ToPrimitive;
use std::collections::BTreeSet;
use std::io;
use thiserror::Error;

pub mod tcfeuv2;
pub mod uspv1;

pub type IdSet = BTreeSet<u16>;

/// The type tag written in the first 3 bits of an optional TC String segment.
///
/// The core segment is identified by its position and carries no tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ToPrimitive)]
pub enum SegmentType {
    Core = 0,
    DisclosedVendors = 1,
    AllowedVendors = 2,
    PublisherTc = 3,
}

/// The error type for consent string encoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeError {
    /// Only version 2 of the TCF core segment can be encoded.
    #[error("incompatible version (expected {expected}, found {found})")]
    IncompatibleVersion { expected: u8, found: u8 },
    /// A language or country code is not made of exactly 2 ASCII letters.
    #[error("invalid language code {0:?}")]
    InvalidLanguageCode(String),
    /// A mandatory field of an optional segment is empty.
    #[error("empty value for field {0}")]
    EmptyValue(&'static str),
    /// A value does not fit in the number of bits allocated to its field.
    #[error("value {value} does not fit in {bits} bits for field {field}")]
    FieldOverflow {
        field: &'static str,
        value: i128,
        bits: u32,
    },
    #[error("unable to write bits")]
    Write(#[from] io::Error),
}

/// Joins segments with `.` separators, skipping absent segments.
pub(crate) fn join_segments<I>(segments: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    segments.into_iter().flatten().collect::<Vec<_>>().join(".")
}
