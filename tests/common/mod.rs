use chrono::{DateTime, Utc};
use iab_consent::config::{Configuration, ConsentStatus};
use iab_consent::policy::{encode_ccpa, encode_tcf_with, PolicyError, TcfSettings};
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    configuration: Configuration,
    consent: ConsentStatus,
    #[serde(default)]
    vendor_list_version: u16,
    #[serde(default)]
    notice: bool,
    #[serde(default)]
    lspa: bool,
    /// Expected TC String when created at the Unix epoch, absent if GDPR does not apply.
    expected_tc_string: Option<String>,
    expected_us_privacy: String,
}

impl TestCase {
    pub fn load_from_file<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        let tc: Self = serde_json::from_reader(&f)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(tc)
    }

    pub fn assert_strings_match(&self) {
        let tc_string = encode_tcf_with(
            &self.configuration,
            &self.consent,
            self.vendor_list_version,
            &TcfSettings::default(),
            DateTime::<Utc>::UNIX_EPOCH,
        );

        match (&self.expected_tc_string, tc_string) {
            (Some(expected), Ok(s)) => assert_eq!(&s, expected),
            (None, Err(PolicyError::NotApplicableToConfig { .. })) => {}
            (expected, r) => panic!("expected TC string {expected:?}, got {r:?}"),
        }

        assert_eq!(
            encode_ccpa(&self.configuration, &self.consent, self.notice, self.lspa),
            self.expected_us_privacy
        );
    }
}
