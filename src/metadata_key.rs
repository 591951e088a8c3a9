use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::contents::Contents;
use crate::dependency::{DependencySpecTree, ProvideSpecTree};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::formatter::{FlagChange, FlagState, Formatter};
use crate::iuse::IUseFlag;
use crate::keyword::KeywordName;
use crate::license::LicenseSpecTree;
use crate::name::UseFlagName;
use crate::package_id::PackageId;
use crate::restrict::RestrictSpecTree;
use crate::src_uri::{FetchableUriSpecTree, SimpleUriSpecTree, UriLabel};

/// How prominently a key should be shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKeyType {
    /// Shown in normal output.
    Normal,
    /// Worth showing even in terse output (`DESCRIPTION`).
    Significant,
    /// Names a person or team responsible for the package.
    Author,
    /// A dependency key (`DEPEND`, `PROVIDE`).
    Dependencies,
    /// Only meaningful to the package manager itself.
    Internal,
}

/// Why and where a repository masks a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryMaskInfo {
    /// The mask file carrying the entry.
    pub mask_file: PathBuf,
    /// Comment lines preceding the entry.
    pub comment: Vec<String>,
}

impl fmt::Display for RepositoryMaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mask_file.display())?;
        if !self.comment.is_empty() {
            write!(f, ": {}", self.comment.join(" "))?;
        }
        Ok(())
    }
}

/// The kind of value a metadata key holds.
///
/// One kind per [`MetadataValue`] variant, named the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataValueKind {
    String,
    Time,
    Contents,
    PackageId,
    RepositoryMaskInfo,
    StringSet,
    KeywordSet,
    UseFlagSet,
    IUseFlagSet,
    LicenseTree,
    ProvideTree,
    DependencyTree,
    RestrictTree,
    FetchableUriTree,
    SimpleUriTree,
}

impl fmt::Display for MetadataValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            MetadataValueKind::String => "string",
            MetadataValueKind::Time => "time",
            MetadataValueKind::Contents => "contents",
            MetadataValueKind::PackageId => "package id",
            MetadataValueKind::RepositoryMaskInfo => "repository mask info",
            MetadataValueKind::StringSet => "string set",
            MetadataValueKind::KeywordSet => "keyword set",
            MetadataValueKind::UseFlagSet => "use flag set",
            MetadataValueKind::IUseFlagSet => "IUSE flag set",
            MetadataValueKind::LicenseTree => "license tree",
            MetadataValueKind::ProvideTree => "provide tree",
            MetadataValueKind::DependencyTree => "dependency tree",
            MetadataValueKind::RestrictTree => "restrict tree",
            MetadataValueKind::FetchableUriTree => "fetchable URI tree",
            MetadataValueKind::SimpleUriTree => "simple URI tree",
        };
        write!(f, "{s}")
    }
}

/// The payload of a metadata key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    /// Free text (`DESCRIPTION`, `SLOT`).
    String(String),
    /// A point in time (`INSTALLED_TIME`).
    Time(DateTime<Utc>),
    /// Files merged by an installed package.
    Contents(Contents),
    /// Another package.
    PackageId(PackageId),
    /// Why the package is masked.
    RepositoryMaskInfo(RepositoryMaskInfo),
    /// An ordered sequence of strings (`INHERITED`).
    StringSet(Vec<String>),
    /// `KEYWORDS`.
    KeywordSet(BTreeSet<KeywordName>),
    /// Flags enabled when the package was built (`USE`).
    UseFlagSet(BTreeSet<UseFlagName>),
    /// Declared flags, one entry per flag name (`IUSE`).
    IUseFlagSet(BTreeSet<IUseFlag>),
    /// `LICENSE`.
    LicenseTree(LicenseSpecTree),
    /// `PROVIDE`: virtuals only, no `||` groups.
    ProvideTree(ProvideSpecTree),
    /// `DEPEND`, `RDEPEND` and `PDEPEND`.
    DependencyTree(DependencySpecTree),
    /// `RESTRICT`.
    RestrictTree(RestrictSpecTree),
    /// `SRC_URI`: URIs and fetch labels.
    FetchableUriTree {
        /// The parsed tree.
        tree: FetchableUriSpecTree,
        /// Label in effect before the first label leaf.
        initial_label: UriLabel,
    },
    /// Plain URIs (`HOMEPAGE`).
    SimpleUriTree(SimpleUriSpecTree),
}

impl MetadataValue {
    /// The kind matching this variant.
    pub fn kind(&self) -> MetadataValueKind {
        match self {
            MetadataValue::String(_) => MetadataValueKind::String,
            MetadataValue::Time(_) => MetadataValueKind::Time,
            MetadataValue::Contents(_) => MetadataValueKind::Contents,
            MetadataValue::PackageId(_) => MetadataValueKind::PackageId,
            MetadataValue::RepositoryMaskInfo(_) => MetadataValueKind::RepositoryMaskInfo,
            MetadataValue::StringSet(_) => MetadataValueKind::StringSet,
            MetadataValue::KeywordSet(_) => MetadataValueKind::KeywordSet,
            MetadataValue::UseFlagSet(_) => MetadataValueKind::UseFlagSet,
            MetadataValue::IUseFlagSet(_) => MetadataValueKind::IUseFlagSet,
            MetadataValue::LicenseTree(_) => MetadataValueKind::LicenseTree,
            MetadataValue::ProvideTree(_) => MetadataValueKind::ProvideTree,
            MetadataValue::DependencyTree(_) => MetadataValueKind::DependencyTree,
            MetadataValue::RestrictTree(_) => MetadataValueKind::RestrictTree,
            MetadataValue::FetchableUriTree { .. } => MetadataValueKind::FetchableUriTree,
            MetadataValue::SimpleUriTree(_) => MetadataValueKind::SimpleUriTree,
        }
    }

    /// Single-line rendering. Set members are separated by spaces.
    pub fn pretty_print_flat(&self, f: &dyn Formatter) -> String {
        match self {
            MetadataValue::String(s) => f.format_plain(s),
            MetadataValue::Time(t) => f.format_plain(&t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            MetadataValue::Contents(contents) => join(
                contents
                    .entries()
                    .iter()
                    .map(|entry| f.format_plain(&entry.to_string())),
            ),
            MetadataValue::PackageId(id) => f.format_plain(&id.canonical_form()),
            MetadataValue::RepositoryMaskInfo(info) => f.format_plain(&info.to_string()),
            MetadataValue::StringSet(items) => join(items.iter().map(|s| f.format_plain(s))),
            MetadataValue::KeywordSet(keywords) => {
                join(keywords.iter().map(|k| f.format_keyword(k)))
            }
            MetadataValue::UseFlagSet(flags) => join(
                flags
                    .iter()
                    .map(|flag| f.format_flag(flag, FlagState::Enabled, FlagChange::Unchanged)),
            ),
            MetadataValue::IUseFlagSet(flags) => join(flags.iter().map(|flag| f.format_iuse(flag))),
            MetadataValue::LicenseTree(tree)
            | MetadataValue::RestrictTree(tree)
            | MetadataValue::SimpleUriTree(tree) => tree.pretty_print_flat(f),
            MetadataValue::ProvideTree(tree) | MetadataValue::DependencyTree(tree) => {
                tree.pretty_print_flat(f)
            }
            MetadataValue::FetchableUriTree { tree, .. } => tree.pretty_print_flat(f),
        }
    }

    /// Multi-line rendering for trees and contents; the flat form for
    /// everything else.
    pub fn pretty_print(&self, f: &dyn Formatter) -> String {
        match self {
            MetadataValue::Contents(contents) => contents
                .entries()
                .iter()
                .map(|entry| format!("{}{}", f.indent(0), f.format_plain(&entry.to_string())))
                .collect::<Vec<_>>()
                .join(&f.newline()),
            MetadataValue::LicenseTree(tree)
            | MetadataValue::RestrictTree(tree)
            | MetadataValue::SimpleUriTree(tree) => tree.pretty_print(f),
            MetadataValue::ProvideTree(tree) | MetadataValue::DependencyTree(tree) => {
                tree.pretty_print(f)
            }
            MetadataValue::FetchableUriTree { tree, .. } => tree.pretty_print(f),
            other => other.pretty_print_flat(f),
        }
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(" ")
}

/// Computes a deferred key's value.
pub type ValueFn = Arc<dyn Fn() -> Result<MetadataValue> + Send + Sync>;

#[derive(Clone)]
enum ValueSource {
    Eager(MetadataValue),
    Deferred(ValueFn),
}

/// A named, typed attribute of a package.
///
/// The value kind is fixed when the key is built. Reading a key as the
/// wrong kind fails before any value is computed.
///
/// # Examples
///
/// ```
/// use portage_metadata_keys::{MetadataKey, MetadataKeyType, MetadataValue, PlainFormatter};
///
/// let key = MetadataKey::new(
///     "DESCRIPTION",
///     "Description",
///     MetadataKeyType::Significant,
///     MetadataValue::String("A text editor".to_string()),
/// );
/// assert_eq!(key.as_string().unwrap(), "A text editor");
/// assert!(key.as_dependency_tree().is_err());
/// assert_eq!(key.pretty_print_flat(&PlainFormatter).unwrap(), "A text editor");
/// ```
#[derive(Clone)]
pub struct MetadataKey {
    raw_name: String,
    human_name: String,
    key_type: MetadataKeyType,
    kind: MetadataValueKind,
    source: ValueSource,
}

macro_rules! checked_cast {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $ty:ty) => {
        $(#[$meta])*
        #[doc = concat!(
            "The value as `", stringify!($ty), "`. Fails without evaluating ",
            "anything if the key is not bound to that kind."
        )]
        pub fn $name(&self) -> Result<$ty> {
            self.expect_kind(MetadataValueKind::$kind)?;
            match self.value()? {
                MetadataValue::$kind(v) => Ok(v),
                other => Err(self.mismatch(MetadataValueKind::$kind, other.kind())),
            }
        }
    };
}

impl MetadataKey {
    /// A key holding an already computed value.
    pub fn new(
        raw_name: impl Into<String>,
        human_name: impl Into<String>,
        key_type: MetadataKeyType,
        value: MetadataValue,
    ) -> Self {
        MetadataKey {
            raw_name: raw_name.into(),
            human_name: human_name.into(),
            key_type,
            kind: value.kind(),
            source: ValueSource::Eager(value),
        }
    }

    /// A key whose value is computed by `compute` on every read.
    pub fn deferred(
        raw_name: impl Into<String>,
        human_name: impl Into<String>,
        key_type: MetadataKeyType,
        kind: MetadataValueKind,
        compute: ValueFn,
    ) -> Self {
        MetadataKey {
            raw_name: raw_name.into(),
            human_name: human_name.into(),
            key_type,
            kind,
            source: ValueSource::Deferred(compute),
        }
    }

    /// Stable machine name, e.g. `DEPEND`.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Display label, e.g. `Build dependencies`.
    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    /// How prominently the key should be shown.
    pub fn key_type(&self) -> MetadataKeyType {
        self.key_type
    }

    /// The kind this key is bound to.
    pub fn kind(&self) -> MetadataValueKind {
        self.kind
    }

    /// The key's value. Deferred keys recompute it on each call.
    pub fn value(&self) -> Result<MetadataValue> {
        match &self.source {
            ValueSource::Eager(value) => Ok(value.clone()),
            ValueSource::Deferred(compute) => {
                let value = compute().map_err(|e| {
                    warn!(key = %self.raw_name, error = %e, "Failed to evaluate metadata key");
                    e
                })?;
                if value.kind() != self.kind {
                    let e = self.mismatch(self.kind, value.kind());
                    warn!(key = %self.raw_name, error = %e, "Metadata key produced the wrong kind");
                    return Err(e);
                }
                Ok(value)
            }
        }
    }

    fn mismatch(&self, expected: MetadataValueKind, found: MetadataValueKind) -> Error {
        Error::KeyTypeMismatch {
            key: self.raw_name.clone(),
            expected,
            found,
        }
    }

    fn expect_kind(&self, expected: MetadataValueKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(self.mismatch(expected, self.kind))
        }
    }

    checked_cast!(as_string, String, String);
    checked_cast!(as_time, Time, DateTime<Utc>);
    checked_cast!(as_contents, Contents, Contents);
    checked_cast!(as_package_id, PackageId, PackageId);
    checked_cast!(as_repository_mask_info, RepositoryMaskInfo, RepositoryMaskInfo);
    checked_cast!(as_string_set, StringSet, Vec<String>);
    checked_cast!(as_keyword_set, KeywordSet, BTreeSet<KeywordName>);
    checked_cast!(as_use_flag_set, UseFlagSet, BTreeSet<UseFlagName>);
    checked_cast!(as_iuse_flag_set, IUseFlagSet, BTreeSet<IUseFlag>);
    checked_cast!(as_license_tree, LicenseTree, LicenseSpecTree);
    checked_cast!(as_provide_tree, ProvideTree, ProvideSpecTree);
    checked_cast!(as_dependency_tree, DependencyTree, DependencySpecTree);
    checked_cast!(as_restrict_tree, RestrictTree, RestrictSpecTree);
    checked_cast!(as_simple_uri_tree, SimpleUriTree, SimpleUriSpecTree);

    /// The `SRC_URI` tree, without its initial label.
    pub fn as_fetchable_uri_tree(&self) -> Result<FetchableUriSpecTree> {
        self.fetchable().map(|(tree, _)| tree)
    }

    /// The label in effect before any label in a fetchable URI tree.
    pub fn initial_label(&self) -> Result<UriLabel> {
        self.fetchable().map(|(_, label)| label)
    }

    fn fetchable(&self) -> Result<(FetchableUriSpecTree, UriLabel)> {
        self.expect_kind(MetadataValueKind::FetchableUriTree)?;
        match self.value()? {
            MetadataValue::FetchableUriTree {
                tree,
                initial_label,
            } => Ok((tree, initial_label)),
            other => Err(self.mismatch(MetadataValueKind::FetchableUriTree, other.kind())),
        }
    }

    /// Single-line rendering of the value.
    pub fn pretty_print_flat(&self, f: &dyn Formatter) -> Result<String> {
        Ok(self.value()?.pretty_print_flat(f))
    }

    /// Multi-line rendering of the value.
    pub fn pretty_print(&self, f: &dyn Formatter) -> Result<String> {
        Ok(self.value()?.pretty_print(f))
    }

    /// Render an IUSE set with each flag's state for `owner`, marking
    /// flags that `other` lacks as added and flags whose state differs
    /// on `other` as changed.
    pub fn pretty_print_flat_with_comparison(
        &self,
        env: &dyn Environment,
        owner: &PackageId,
        other: &PackageId,
        f: &dyn Formatter,
    ) -> Result<String> {
        let flags = self.as_iuse_flag_set()?;
        let theirs: BTreeSet<UseFlagName> = match other.find_metadata(self.raw_name()) {
            Some(key) => key
                .as_iuse_flag_set()?
                .into_iter()
                .map(|flag| flag.flag)
                .collect(),
            None => BTreeSet::new(),
        };

        Ok(join(flags.iter().map(|iuse| {
            let enabled = env.query_use(&iuse.flag, owner);
            let change = if !theirs.contains(&iuse.flag) {
                FlagChange::Added
            } else if env.query_use(&iuse.flag, other) != enabled {
                FlagChange::Changed
            } else {
                FlagChange::Unchanged
            };
            f.format_flag(&iuse.flag, enabled.into(), change)
        })))
    }
}

impl fmt::Debug for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MetadataKey")
            .field("raw_name", &self.raw_name)
            .field("key_type", &self.key_type)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
