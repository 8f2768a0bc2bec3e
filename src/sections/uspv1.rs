use std::fmt;

pub const USP_V1_VERSION: u8 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flag {
    Yes,
    No,
    NotApplicable,
}

impl Flag {
    pub fn to_char(self) -> char {
        match self {
            Self::Yes => 'Y',
            Self::No => 'N',
            Self::NotApplicable => '-',
        }
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        if b {
            Self::Yes
        } else {
            Self::No
        }
    }
}

// See https://github.com/InteractiveAdvertisingBureau/USPrivacy/blob/master/CCPA/US%20Privacy%20String.md#us-privacy-string-format
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UspV1 {
    pub opt_out_notice: Flag,
    pub opt_out_sale: Flag,
    pub lspa_covered_transaction: Flag,
}

impl UspV1 {
    /// The string used when CCPA does not apply, `1---`.
    pub fn not_applicable() -> Self {
        Self {
            opt_out_notice: Flag::NotApplicable,
            opt_out_sale: Flag::NotApplicable,
            lspa_covered_transaction: Flag::NotApplicable,
        }
    }
}

impl fmt::Display for UspV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            USP_V1_VERSION,
            self.opt_out_notice.to_char(),
            self.opt_out_sale.to_char(),
            self.lspa_covered_transaction.to_char()
        )
    }
}
