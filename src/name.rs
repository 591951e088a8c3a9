use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A USE flag name.
///
/// Names are immutable and cheap to clone: clones share one allocation.
/// Two names with the same text compare and hash equal.
///
/// See [PMS 3.1.4](https://projects.gentoo.org/pms/9/pms.html#use-flag-names).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UseFlagName(Arc<str>);

impl UseFlagName {
    /// Validate and create a USE flag name.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::UseFlagName;
    ///
    /// let flag = UseFlagName::new("python_targets_python3_12").unwrap();
    /// assert_eq!(flag.as_str(), "python_targets_python3_12");
    /// assert!(UseFlagName::new("+ssl").is_err());
    /// ```
    pub fn new(name: &str) -> Result<Self> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => first.is_ascii_alphanumeric() && chars.all(is_flag_char),
            None => false,
        };
        if !valid {
            return Err(Error::InvalidUseFlagName(name.to_string()));
        }
        Ok(UseFlagName(Arc::from(name)))
    }

    /// The flag name as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_flag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '@' | '-')
}

impl FromStr for UseFlagName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UseFlagName::new(s)
    }
}

impl fmt::Display for UseFlagName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UseFlagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A `category/package` name.
///
/// See [PMS 3.1.1](https://projects.gentoo.org/pms/9/pms.html#category-names)
/// and [PMS 3.1.2](https://projects.gentoo.org/pms/9/pms.html#package-names).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedPackageName {
    /// Category part (e.g. `app-editors`).
    pub category: String,
    /// Package part (e.g. `vim`).
    pub package: String,
}

impl QualifiedPackageName {
    /// Validate and create a qualified package name from its parts.
    pub fn new(category: &str, package: &str) -> Result<Self> {
        if !is_valid_name_part(category) || !is_valid_name_part(package) {
            return Err(Error::InvalidPackageName(format!("{category}/{package}")));
        }
        Ok(QualifiedPackageName {
            category: category.to_string(),
            package: package.to_string(),
        })
    }
}

fn is_valid_name_part(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
        }
        _ => false,
    }
}

impl FromStr for QualifiedPackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((category, package)) => QualifiedPackageName::new(category, package),
            None => Err(Error::InvalidPackageName(s.to_string())),
        }
    }
}

impl fmt::Display for QualifiedPackageName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn flag_equality_by_text() {
        let a = UseFlagName::new("foo").unwrap();
        let b: UseFlagName = "foo".parse().unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn flag_allowed_characters() {
        for s in ["ssl", "python_targets_python3_11", "video_cards_i965", "a+b", "l10n_pt-BR", "x@y"] {
            assert!(UseFlagName::new(s).is_ok(), "{s}");
        }
    }

    #[test]
    fn flag_rejects_bad_names() {
        for s in ["", "-foo", "+foo", "_foo", "foo bar", "foo?", "!foo"] {
            assert!(UseFlagName::new(s).is_err(), "{s}");
        }
    }

    #[test]
    fn flag_display() {
        assert_eq!(UseFlagName::new("doc").unwrap().to_string(), "doc");
    }

    #[test]
    fn parse_package_name() {
        let name: QualifiedPackageName = "cat-one/pkg-one".parse().unwrap();
        assert_eq!(name.category, "cat-one");
        assert_eq!(name.package, "pkg-one");
        assert_eq!(name.to_string(), "cat-one/pkg-one");
    }

    #[test]
    fn invalid_package_names() {
        for s in ["foo", "/bar", "foo/", "-foo/bar", "foo/.bar"] {
            assert!(s.parse::<QualifiedPackageName>().is_err(), "{s}");
        }
    }
}
