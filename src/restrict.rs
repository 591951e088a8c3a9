use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{Error, Result};
use crate::spec_tree::{Grammar, SpecTree};

/// A `RESTRICT` tree of plain tokens (`mirror`, `fetch`, `test`, ...).
///
/// See [PMS 7.3.6](https://projects.gentoo.org/pms/latest/pms.html#restrict).
pub type RestrictSpecTree = SpecTree<String>;

const RESTRICTIONS: Grammar<String> = Grammar {
    allow_any: false,
    leaf: parse_token,
};

impl SpecTree<String> {
    /// Parse a `RESTRICT` expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::RestrictSpecTree;
    ///
    /// let tree = RestrictSpecTree::parse_restrict("mirror !test? ( test )").unwrap();
    /// assert_eq!(tree.leaves(), vec!["mirror", "test"]);
    /// ```
    pub fn parse_restrict(input: &str) -> Result<RestrictSpecTree> {
        RESTRICTIONS.parse(input).map_err(Error::InvalidRestrict)
    }

    /// Whether `token` appears anywhere in the tree, ignoring conditions.
    pub fn has_token(&self, token: &str) -> bool {
        self.leaves().into_iter().any(|t| t == token)
    }

    /// Whether `token` applies regardless of USE flags: it sits at the top
    /// level or in plain groups, never under a `flag?` condition.
    pub fn has_unconditional_token(&self, token: &str) -> bool {
        match self {
            SpecTree::Leaf(t) => t == token,
            SpecTree::All(children) => children.iter().any(|c| c.has_unconditional_token(token)),
            SpecTree::Any(_) | SpecTree::Conditional { .. } => false,
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')
}

fn parse_token(input: &mut &str) -> ModalResult<String> {
    take_while(1.., is_token_char)
        .map(|s: &str| s.to_string())
        .parse_next(input)
}
