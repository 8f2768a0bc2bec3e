use crate::config::{Configuration, ConsentStatus, Regulation};
use crate::policy::{ensure_applicable, PolicyError};
use crate::sections::uspv1::{Flag, UspV1};
use crate::store::{keys, ConsentStore};
use std::sync::Arc;
use tracing::debug;

/// Derives the US Privacy fields from the user's decisions.
///
/// The user has opted out of sale as soon as one purpose of the catalog was explicitly denied.
pub(crate) fn us_privacy(
    configuration: &Configuration,
    status: &ConsentStatus,
    notice: bool,
    lspa: bool,
) -> UspV1 {
    if !configuration.applies(Regulation::CcpaCa) {
        return UspV1::not_applicable();
    }

    let opted_out = configuration
        .purposes
        .iter()
        .any(|p| status.is_denied(&p.code));

    UspV1 {
        opt_out_notice: Flag::from(notice),
        opt_out_sale: Flag::from(opted_out),
        lspa_covered_transaction: Flag::from(lspa),
    }
}

/// Encodes the US Privacy string for the given decisions.
///
/// Returns `1---` if the configuration is not subject to the CCPA.
pub fn encode_ccpa(
    configuration: &Configuration,
    status: &ConsentStatus,
    notice: bool,
    lspa: bool,
) -> String {
    us_privacy(configuration, status, notice, lspa).to_string()
}

/// The CCPA policy plugin.
pub struct Ccpa {
    configuration: Configuration,
    notice: bool,
    lspa: bool,
    store: Arc<dyn ConsentStore>,
}

impl Ccpa {
    /// Creates a CCPA plugin for a configuration, with notice and LSPA flags unset.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotApplicableToConfig`] if the configuration does not list
    /// the `ccpaca` regulation.
    pub fn new(
        configuration: Configuration,
        store: Arc<dyn ConsentStore>,
    ) -> Result<Self, PolicyError> {
        ensure_applicable(&configuration, Regulation::CcpaCa)?;

        Ok(Self {
            configuration,
            notice: false,
            lspa: false,
            store,
        })
    }

    /// Sets whether the user was given explicit notice of the opportunity to opt out.
    pub fn with_notice(mut self, notice: bool) -> Self {
        self.notice = notice;
        self
    }

    /// Sets whether the publisher is a signatory to the IAB LSPA.
    pub fn with_lspa(mut self, lspa: bool) -> Self {
        self.lspa = lspa;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn consent_changed(&self, status: &ConsentStatus) -> String {
        let s = encode_ccpa(&self.configuration, status, self.notice, self.lspa);
        debug!(us_privacy = %s, "encoded US Privacy string");

        self.store.set(keys::US_PRIVACY_STRING, s.clone().into());
        self.store.set(keys::US_PRIVACY_APPLIED, true.into());

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fixtures::*;
    use crate::store::{InMemoryStore, StoreValue};
    use test_case::test_case;

    #[test_case(true, true, &[("analytics", false)] => "1YYY" ; "notice and lspa, opted out")]
    #[test_case(false, false, &[("analytics", false)] => "1NYN" ; "opted out")]
    #[test_case(true, false, &[("analytics", true)] => "1YNN" ; "all allowed")]
    #[test_case(false, true, &[] => "1NNY" ; "no decision")]
    #[test_case(false, false, &[("unknown", false)] => "1NNN" ; "denied purpose outside catalog")]
    fn encode(notice: bool, lspa: bool, purposes: &[(&str, bool)]) -> String {
        encode_ccpa(
            &configuration(&["ccpaca"]),
            &status(purposes, &[]),
            notice,
            lspa,
        )
    }

    #[test_case(&["gdpreu"] ; "other regulation")]
    #[test_case(&[] ; "no regulation")]
    fn not_applicable(regulations: &[&str]) {
        let s = encode_ccpa(
            &configuration(regulations),
            &status(&[("analytics", false)], &[]),
            true,
            true,
        );
        assert_eq!(s, "1---");
    }

    #[test]
    fn always_four_chars() {
        for configuration in [configuration(&["ccpaca"]), configuration(&[])] {
            for notice in [false, true] {
                for lspa in [false, true] {
                    for allowed in [false, true] {
                        let s = encode_ccpa(
                            &configuration,
                            &status(&[("analytics", allowed)], &[]),
                            notice,
                            lspa,
                        );
                        assert_eq!(s.len(), 4);
                        assert!(s.starts_with('1'));
                        assert!(s[1..].chars().all(|c| matches!(c, 'Y' | 'N' | '-')));
                    }
                }
            }
        }
    }

    #[test]
    fn plugin_requires_ccpa() {
        let r = Ccpa::new(configuration(&["gdpreu"]), Arc::new(InMemoryStore::new()));
        assert!(matches!(
            r,
            Err(PolicyError::NotApplicableToConfig {
                regulation: Regulation::CcpaCa
            })
        ));
    }

    #[test]
    fn consent_changed_persists() {
        let store = Arc::new(InMemoryStore::new());
        let ccpa = Ccpa::new(configuration(&["ccpaca"]), store.clone())
            .unwrap()
            .with_notice(true)
            .with_lspa(true);

        let s = ccpa.consent_changed(&status(&[("tcf.purpose_2", false)], &[]));
        assert_eq!(s, "1YYY");
        assert_eq!(
            store.get(keys::US_PRIVACY_STRING),
            Some(StoreValue::String("1YYY".to_string()))
        );
        assert_eq!(
            store.get(keys::US_PRIVACY_APPLIED),
            Some(StoreValue::Bool(true))
        );
    }
}
