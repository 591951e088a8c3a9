use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Stability level for an architecture keyword.
///
/// See [PMS 7.3.3](https://projects.gentoo.org/pms/9/pms.html#keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stability {
    /// Stable on this architecture (e.g. `amd64`).
    Stable,
    /// Testing on this architecture (e.g. `~amd64`).
    Testing,
    /// Disabled on this architecture (e.g. `-amd64`).
    Disabled,
    /// All architectures are disabled (`-*`).
    DisabledAll,
}

/// A single entry of a `KEYWORDS` key.
///
/// Ordered by architecture first, so a keyword set iterates in arch order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeywordName {
    /// Architecture name (e.g. `amd64`, `arm64`, `x86`).
    pub arch: String,
    /// Stability classification.
    pub stability: Stability,
}

impl KeywordName {
    /// Parse a space-separated `KEYWORDS` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{KeywordName, Stability};
    ///
    /// let kws = KeywordName::parse_line("amd64 ~arm64 -*").unwrap();
    /// assert_eq!(kws.len(), 3);
    /// assert_eq!(kws[1].stability, Stability::Testing);
    /// ```
    pub fn parse_line(input: &str) -> Result<Vec<KeywordName>> {
        input
            .split_whitespace()
            .map(|token| token.parse())
            .collect()
    }
}

fn is_arch_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

impl FromStr for KeywordName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "-*" {
            return Ok(KeywordName {
                arch: "*".to_string(),
                stability: Stability::DisabledAll,
            });
        }

        let (arch, stability) = if let Some(arch) = s.strip_prefix('~') {
            (arch, Stability::Testing)
        } else if let Some(arch) = s.strip_prefix('-') {
            (arch, Stability::Disabled)
        } else {
            (s, Stability::Stable)
        };

        if arch.is_empty() || arch.starts_with('-') || !arch.chars().all(is_arch_char) {
            return Err(Error::InvalidKeyword(s.to_string()));
        }

        Ok(KeywordName {
            arch: arch.to_string(),
            stability,
        })
    }
}

impl fmt::Display for KeywordName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.stability {
            Stability::Stable => write!(f, "{}", self.arch),
            Stability::Testing => write!(f, "~{}", self.arch),
            Stability::Disabled => write!(f, "-{}", self.arch),
            Stability::DisabledAll => write!(f, "-*"),
        }
    }
}
