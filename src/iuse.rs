use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::eapi::Eapi;
use crate::error::{Error, Result};
use crate::name::UseFlagName;

/// Default state for an IUSE flag.
///
/// Flags may be prefixed with `+` (enabled by default) or `-` (disabled by
/// default) in the `IUSE` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IUseDefault {
    /// `+flag`: enabled by default.
    Enabled,
    /// `-flag`: disabled by default.
    Disabled,
}

/// How strictly IUSE entries are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IUseFlagParseMode {
    /// Default markers are rejected.
    Strict,
    /// Default markers are accepted.
    Permissive,
}

impl IUseFlagParseMode {
    /// The parse mode a package of this EAPI uses for its `IUSE`.
    pub fn for_eapi(eapi: Eapi) -> Self {
        if eapi.has_iuse_defaults() {
            IUseFlagParseMode::Permissive
        } else {
            IUseFlagParseMode::Strict
        }
    }
}

/// A single flag declared in `IUSE`.
///
/// `prefix_delim_pos` is the byte offset of the `_` that separates a
/// USE_EXPAND prefix from the value (`linguas_en` has it at 7), if the flag
/// belongs to an expanded variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IUseFlag {
    /// The flag name, without default marker.
    pub flag: UseFlagName,
    /// Declared default state, if any.
    pub default: Option<IUseDefault>,
    /// Position of the USE_EXPAND prefix delimiter.
    pub prefix_delim_pos: Option<usize>,
}

impl IUseFlag {
    /// Parse one IUSE entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{IUseDefault, IUseFlag, IUseFlagParseMode};
    ///
    /// let flag = IUseFlag::new("+ssl", IUseFlagParseMode::Permissive, None).unwrap();
    /// assert_eq!(flag.flag.as_str(), "ssl");
    /// assert_eq!(flag.default, Some(IUseDefault::Enabled));
    ///
    /// assert!(IUseFlag::new("+ssl", IUseFlagParseMode::Strict, None).is_err());
    /// ```
    pub fn new(s: &str, mode: IUseFlagParseMode, prefix_delim_pos: Option<usize>) -> Result<Self> {
        let (name, default) = if let Some(name) = s.strip_prefix('+') {
            (name, Some(IUseDefault::Enabled))
        } else if let Some(name) = s.strip_prefix('-') {
            (name, Some(IUseDefault::Disabled))
        } else {
            (s, None)
        };

        if default.is_some() && mode == IUseFlagParseMode::Strict {
            return Err(Error::InvalidIUse(format!("{s} (defaults not allowed)")));
        }

        let flag = UseFlagName::new(name).map_err(|_| Error::InvalidIUse(s.to_string()))?;
        if let Some(pos) = prefix_delim_pos {
            if name.as_bytes().get(pos) != Some(&b'_') {
                return Err(Error::InvalidIUse(format!(
                    "{s} (no prefix delimiter at {pos})"
                )));
            }
        }

        Ok(IUseFlag {
            flag,
            default,
            prefix_delim_pos,
        })
    }

    /// Parse a space-separated `IUSE` value.
    pub fn parse_line(input: &str, mode: IUseFlagParseMode) -> Result<Vec<IUseFlag>> {
        input
            .split_whitespace()
            .map(|token| IUseFlag::new(token, mode, None))
            .collect()
    }

    /// Parse an `IUSE` value into a set holding one entry per flag name.
    ///
    /// A flag declared more than once keeps its marked entry over an
    /// unmarked one. Between two marked entries the later one wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{IUseFlag, IUseFlagParseMode};
    ///
    /// let set = IUseFlag::parse_set("ssl +ssl doc", IUseFlagParseMode::Permissive).unwrap();
    /// assert_eq!(set.len(), 2);
    /// assert!(set.iter().any(|f| f.flag.as_str() == "ssl" && f.enabled_by_default()));
    /// ```
    pub fn parse_set(input: &str, mode: IUseFlagParseMode) -> Result<BTreeSet<IUseFlag>> {
        let mut by_name: BTreeMap<UseFlagName, IUseFlag> = BTreeMap::new();
        for flag in IUseFlag::parse_line(input, mode)? {
            match by_name.get(&flag.flag) {
                Some(seen) if seen.default.is_some() && flag.default.is_none() => {}
                _ => {
                    by_name.insert(flag.flag.clone(), flag);
                }
            }
        }
        Ok(by_name.into_values().collect())
    }

    /// The USE_EXPAND prefix, if the flag has one.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix_delim_pos.map(|pos| &self.flag.as_str()[..pos])
    }

    /// Whether the flag is on when nothing else decides.
    pub fn enabled_by_default(&self) -> bool {
        self.default == Some(IUseDefault::Enabled)
    }
}

impl fmt::Display for IUseFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.default {
            Some(IUseDefault::Enabled) => write!(f, "+{}", self.flag),
            Some(IUseDefault::Disabled) => write!(f, "-{}", self.flag),
            None => write!(f, "{}", self.flag),
        }
    }
}
