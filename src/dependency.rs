use portage_atom::DepEntry;
use winnow::prelude::*;
use winnow::token::take_till;

use crate::error::{Error, Result};
use crate::spec_tree::{Grammar, SpecLeaf, SpecTree};

/// A `DEPEND`-style tree whose leaves are package dependency atoms.
pub type DependencySpecTree = SpecTree<DepEntry>;

/// A `PROVIDE` tree of (old-style) virtual package names.
pub type ProvideSpecTree = SpecTree<DepEntry>;

impl SpecLeaf for DepEntry {}

const DEPENDENCIES: Grammar<DepEntry> = Grammar {
    allow_any: true,
    leaf: parse_atom_leaf,
};

const PROVIDES: Grammar<DepEntry> = Grammar {
    allow_any: false,
    leaf: parse_atom_leaf,
};

impl SpecTree<DepEntry> {
    /// Parse a dependency specification (`DEPEND`, `RDEPEND`, `PDEPEND`).
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::DependencySpecTree;
    ///
    /// let tree = DependencySpecTree::parse_dependencies(
    ///     "app-editors/vim || ( one/one two/two ) ssl? ( dev-libs/openssl )",
    /// ).unwrap();
    /// assert_eq!(tree.leaves().len(), 4);
    /// ```
    pub fn parse_dependencies(input: &str) -> Result<DependencySpecTree> {
        DEPENDENCIES.parse(input).map_err(Error::InvalidDependency)
    }

    /// Parse a `PROVIDE` specification. `||` groups are not allowed.
    pub fn parse_provide(input: &str) -> Result<ProvideSpecTree> {
        PROVIDES.parse(input).map_err(Error::InvalidProvide)
    }
}

fn parse_atom_leaf(input: &mut &str) -> ModalResult<DepEntry> {
    take_till(1.., |c: char| c.is_whitespace())
        .verify(|token: &str| !token.starts_with(['(', ')']))
        .try_map(parse_atom)
        .parse_next(input)
}

/// Parse a single atom token with the dependency parser.
fn parse_atom(token: &str) -> Result<DepEntry> {
    let mut entries =
        DepEntry::parse(token).map_err(|e| Error::InvalidDependency(format!("{token}: {e}")))?;
    match (entries.pop(), entries.is_empty()) {
        (Some(entry), true) => Ok(entry),
        _ => Err(Error::InvalidDependency(token.to_string())),
    }
}
