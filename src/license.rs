use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{Error, Result};
use crate::spec_tree::{Grammar, SpecTree};

/// A `LICENSE` tree of license names.
///
/// See [PMS 7.2](https://projects.gentoo.org/pms/9/pms.html#mandatory-ebuilddefined-variables).
pub type LicenseSpecTree = SpecTree<String>;

const LICENSES: Grammar<String> = Grammar {
    allow_any: true,
    leaf: parse_license_name,
};

impl SpecTree<String> {
    /// Parse a `LICENSE` expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{LicenseSpecTree, SpecTree};
    ///
    /// let tree = LicenseSpecTree::parse_license("|| ( MIT Apache-2.0 )").unwrap();
    /// assert!(matches!(tree.children()[0], SpecTree::Any(_)));
    /// ```
    pub fn parse_license(input: &str) -> Result<LicenseSpecTree> {
        LICENSES.parse(input).map_err(Error::InvalidLicense)
    }
}

fn is_license_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

fn parse_license_name(input: &mut &str) -> ModalResult<String> {
    take_while(1.., is_license_char)
        .verify(|name: &str| {
            // PMS 3.1.7: no leading hyphen, dot or plus
            !name.starts_with(['-', '.', '+'])
        })
        .map(|name: &str| name.to_string())
        .parse_next(input)
}
