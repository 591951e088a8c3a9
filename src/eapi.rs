use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// EAPI (Ebuild API) version.
///
/// The EAPI of a package decides how some of its raw metadata is read:
/// whether IUSE entries may carry default markers, and which SRC_URI
/// syntax is allowed.
///
/// See [PMS 2](https://projects.gentoo.org/pms/latest/pms.html#eapis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Eapi {
    /// EAPI 0: base (legacy).
    #[default]
    Zero,
    /// EAPI 1: slot deps, IUSE defaults.
    One,
    /// EAPI 2: SRC_URI arrows, USE deps.
    Two,
    /// EAPI 3: prefix support.
    Three,
    /// EAPI 4: `REQUIRED_USE`.
    Four,
    /// EAPI 5: sub-slots, slot operators.
    Five,
    /// EAPI 6: `eapply`/`eapply_user`.
    Six,
    /// EAPI 7: `BDEPEND`.
    Seven,
    /// EAPI 8: `IDEPEND`, selective URI restrictions.
    Eight,
    /// EAPI 9.
    Nine,
}

impl Eapi {
    /// Whether IUSE entries may carry `+`/`-` default markers.
    ///
    /// Introduced in EAPI 1.
    pub fn has_iuse_defaults(&self) -> bool {
        *self >= Eapi::One
    }

    /// Whether SRC_URI supports arrow renaming (`-> filename`).
    ///
    /// Introduced in EAPI 2.
    pub fn has_src_uri_arrows(&self) -> bool {
        *self >= Eapi::Two
    }

    /// Whether SRC_URI supports `fetch+`/`mirror+` prefixes.
    ///
    /// Introduced in EAPI 8.
    pub fn has_selective_uri_restrictions(&self) -> bool {
        *self >= Eapi::Eight
    }

    const ALL: [Eapi; 10] = [
        Eapi::Zero,
        Eapi::One,
        Eapi::Two,
        Eapi::Three,
        Eapi::Four,
        Eapi::Five,
        Eapi::Six,
        Eapi::Seven,
        Eapi::Eight,
        Eapi::Nine,
    ];

    /// The value as written in `EAPI=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Eapi::Zero => "0",
            Eapi::One => "1",
            Eapi::Two => "2",
            Eapi::Three => "3",
            Eapi::Four => "4",
            Eapi::Five => "5",
            Eapi::Six => "6",
            Eapi::Seven => "7",
            Eapi::Eight => "8",
            Eapi::Nine => "9",
        }
    }
}

impl fmt::Display for Eapi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blank value is EAPI 0.
impl FromStr for Eapi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        if value.is_empty() {
            return Ok(Eapi::Zero);
        }
        Eapi::ALL
            .into_iter()
            .find(|eapi| eapi.as_str() == value)
            .ok_or_else(|| Error::InvalidEapi(s.to_string()))
    }
}
