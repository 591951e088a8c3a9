//! Typed package metadata keys, specification trees and use requirements
//! based on [PMS].
//!
//! [PMS]: https://projects.gentoo.org/pms/latest/pms.html
//!
//! # Overview
//!
//! Every package version known to a package manager is a [`PackageId`]
//! carrying a [`MetadataStore`]: named [`MetadataKey`]s such as `SLOT`,
//! `DEPEND` or `CONTENTS`, each bound to one [`MetadataValueKind`]. Which
//! keys exist depends on where the package comes from. A package in a
//! source repository has `KEYWORDS` and `DEPEND` but no `CONTENTS`; an
//! installed package has the reverse.
//!
//! Dependency, license, provide, restrict and URI values are
//! [`SpecTree`]s that render either on one line or one node per line
//! through a [`Formatter`]. [`UseRequirement`]s express `[flag]`,
//! `[-flag]`, `[flag=]` and `[!flag=]` constraints and are evaluated
//! against an [`Environment`].
//!
//! # Examples
//!
//! ```
//! use portage_metadata_keys::{
//!     MetadataValueKind, PackageDatabase, PlainFormatter, RawMetadata, Repository,
//!     RepositoryKind,
//! };
//!
//! let raw: RawMetadata = [
//!     ("EAPI", "8"),
//!     ("DESCRIPTION", "Example package"),
//!     ("SLOT", "0"),
//!     ("KEYWORDS", "~amd64"),
//!     ("DEPEND", "dev-libs/openssl ssl? ( app-misc/ca-certificates )"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! let mut repo = Repository::new("gentoo", RepositoryKind::Source);
//! repo.add_version("app-misc/example".parse().unwrap(), "1.0", raw).unwrap();
//!
//! let mut db = PackageDatabase::new();
//! db.add_repository(repo).unwrap();
//!
//! let ids = db
//!     .fetch_repository("gentoo")
//!     .unwrap()
//!     .package_ids(&"app-misc/example".parse().unwrap());
//! let id = &ids[0];
//! assert_eq!(id.to_string(), "app-misc/example-1.0::gentoo");
//! assert!(id.find_metadata("CONTENTS").is_none());
//!
//! let depend = id.find_metadata("DEPEND").unwrap();
//! assert_eq!(depend.kind(), MetadataValueKind::DependencyTree);
//! assert_eq!(
//!     depend.pretty_print_flat(&PlainFormatter).unwrap(),
//!     "dev-libs/openssl ssl? ( app-misc/ca-certificates )"
//! );
//! ```

mod contents;
mod dependency;
mod eapi;
mod environment;
mod error;
mod formatter;
mod iuse;
mod keyword;
mod license;
mod metadata_key;
mod name;
mod package_id;
mod repository;
mod restrict;
mod spec_tree;
mod src_uri;
mod store;
mod use_requirement;

// Re-export public types
pub use contents::{Contents, ContentsEntry};
pub use dependency::{DependencySpecTree, ProvideSpecTree};
pub use eapi::Eapi;
pub use environment::{Environment, StaticEnvironment};
pub use error::{Error, Result};
pub use formatter::{FlagChange, FlagState, Formatter, PlainFormatter};
pub use iuse::{IUseDefault, IUseFlag, IUseFlagParseMode};
pub use keyword::{KeywordName, Stability};
pub use license::LicenseSpecTree;
pub use metadata_key::{
    MetadataKey, MetadataKeyType, MetadataValue, MetadataValueKind, RepositoryMaskInfo, ValueFn,
};
pub use name::{QualifiedPackageName, UseFlagName};
pub use package_id::{PackageId, PackageOrigin};
pub use repository::{PackageDatabase, RawMetadata, Repository, RepositoryKind};
pub use restrict::RestrictSpecTree;
pub use spec_tree::{SpecLeaf, SpecTree, UseCondition};
pub use src_uri::{
    FetchableUri, FetchableUriItem, FetchableUriSpecTree, SimpleUriSpecTree, UriLabel,
    UriLabelKind, UriRestriction,
};
pub use store::MetadataStore;
pub use use_requirement::{
    DisabledUseRequirement, EnabledUseRequirement, EqualUseRequirement, NotEqualUseRequirement,
    UseRequirement,
};
