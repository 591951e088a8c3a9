use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::contents::Contents;
use crate::dependency::DependencySpecTree;
use crate::eapi::Eapi;
use crate::error::{Error, Result};
use crate::iuse::{IUseFlag, IUseFlagParseMode};
use crate::keyword::KeywordName;
use crate::license::LicenseSpecTree;
use crate::metadata_key::{
    MetadataKey, MetadataKeyType, MetadataValue, MetadataValueKind, RepositoryMaskInfo,
};
use crate::name::{QualifiedPackageName, UseFlagName};
use crate::package_id::{PackageId, PackageOrigin};
use crate::restrict::RestrictSpecTree;
use crate::src_uri::{FetchableUriSpecTree, SimpleUriSpecTree, UriLabel};
use crate::store::MetadataStore;

/// Raw `KEY -> VALUE` metadata for one package version, as a repository
/// backend would supply it.
pub type RawMetadata = BTreeMap<String, String>;

/// What a repository holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    /// Packages that can be built.
    Source,
    /// Packages merged on the system.
    Installed,
}

impl RepositoryKind {
    fn origin(self) -> PackageOrigin {
        match self {
            RepositoryKind::Source => PackageOrigin::Source,
            RepositoryKind::Installed => PackageOrigin::Installed,
        }
    }
}

/// An in-memory repository of package versions.
///
/// Versions are added from raw metadata. Which keys a package gets
/// depends on the repository kind: source packages carry `KEYWORDS`,
/// `SRC_URI` and dependency keys, installed packages carry `CONTENTS`,
/// `INSTALLED_TIME`, `REPOSITORY` and `USE`.
///
/// Scalar keys are checked when the version is added. Set and tree keys
/// are parsed each time they are read, so a malformed value only affects
/// its own key.
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    kind: RepositoryKind,
    ids: BTreeMap<QualifiedPackageName, Vec<PackageId>>,
    masks: BTreeMap<QualifiedPackageName, RepositoryMaskInfo>,
}

impl Repository {
    /// An empty repository.
    pub fn new(name: impl Into<String>, kind: RepositoryKind) -> Self {
        Repository {
            name: name.into(),
            kind,
            ids: BTreeMap::new(),
            masks: BTreeMap::new(),
        }
    }

    /// The repository name packages refer to, e.g. `gentoo`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this repository holds source or installed packages.
    pub fn kind(&self) -> RepositoryKind {
        self.kind
    }

    /// Mask every version of `name` added from now on.
    pub fn mask(&mut self, name: QualifiedPackageName, info: RepositoryMaskInfo) {
        self.masks.insert(name, info);
    }

    /// Add one version of a package and return its id.
    ///
    /// `DESCRIPTION` and `SLOT` are required; installed repositories also
    /// require `REPOSITORY` and `INSTALLED_TIME`. A missing `EAPI` means
    /// EAPI 0.
    pub fn add_version(
        &mut self,
        name: QualifiedPackageName,
        version: &str,
        raw: RawMetadata,
    ) -> Result<PackageId> {
        let metadata = self.build_store(&name, &raw)?;
        let id = PackageId::new(name.clone(), version, &self.name, self.kind.origin(), metadata);
        debug!(
            repository = %self.name,
            package = %id,
            keys = id.metadata().len(),
            "Added package version"
        );
        self.ids.entry(name).or_default().push(id.clone());
        Ok(id)
    }

    /// All versions of `name`, in the order they were added. Unknown names
    /// have none.
    pub fn package_ids(&self, name: &QualifiedPackageName) -> &[PackageId] {
        self.ids.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names with at least one version, sorted.
    pub fn package_names(&self) -> impl Iterator<Item = &QualifiedPackageName> {
        self.ids.keys()
    }

    fn build_store(&self, name: &QualifiedPackageName, raw: &RawMetadata) -> Result<MetadataStore> {
        let eapi = match raw.get("EAPI") {
            Some(s) => s.parse::<Eapi>()?,
            None => Eapi::Zero,
        };
        let description = required(raw, "DESCRIPTION")?;
        let slot = required(raw, "SLOT")?;
        let text = |key: &str| raw.get(key).cloned().unwrap_or_default();
        let iuse_mode = IUseFlagParseMode::for_eapi(eapi);

        let mut store = MetadataStore::new();
        store.insert(string_key("EAPI", "EAPI", MetadataKeyType::Internal, eapi.to_string()))?;
        store.insert(string_key(
            "DESCRIPTION",
            "Description",
            MetadataKeyType::Significant,
            description,
        ))?;
        store.insert(string_key("SLOT", "Slot", MetadataKeyType::Normal, slot))?;
        store.insert(deferred(
            "LICENSE",
            "License",
            MetadataKeyType::Normal,
            MetadataValueKind::LicenseTree,
            text("LICENSE"),
            |s| LicenseSpecTree::parse_license(s).map(MetadataValue::LicenseTree),
        ))?;
        store.insert(deferred(
            "IUSE",
            "Relevant USE flags",
            MetadataKeyType::Normal,
            MetadataValueKind::IUseFlagSet,
            text("IUSE"),
            move |s| IUseFlag::parse_set(s, iuse_mode).map(MetadataValue::IUseFlagSet),
        ))?;
        store.insert(deferred(
            "INHERITED",
            "Inherited",
            MetadataKeyType::Internal,
            MetadataValueKind::StringSet,
            text("INHERITED"),
            |s| {
                Ok(MetadataValue::StringSet(
                    s.split_whitespace().map(|e| e.to_string()).collect(),
                ))
            },
        ))?;

        match self.kind {
            RepositoryKind::Source => self.add_source_keys(&mut store, name, raw, eapi)?,
            RepositoryKind::Installed => add_installed_keys(&mut store, raw)?,
        }
        Ok(store)
    }

    fn add_source_keys(
        &self,
        store: &mut MetadataStore,
        name: &QualifiedPackageName,
        raw: &RawMetadata,
        eapi: Eapi,
    ) -> Result<()> {
        let text = |key: &str| raw.get(key).cloned().unwrap_or_default();

        store.insert(deferred(
            "HOMEPAGE",
            "Homepage",
            MetadataKeyType::Significant,
            MetadataValueKind::SimpleUriTree,
            text("HOMEPAGE"),
            |s| SimpleUriSpecTree::parse_simple_uris(s).map(MetadataValue::SimpleUriTree),
        ))?;

        let src_uri = text("SRC_URI");
        let restrict = text("RESTRICT");
        store.insert(MetadataKey::deferred(
            "SRC_URI",
            "Source URIs",
            MetadataKeyType::Normal,
            MetadataValueKind::FetchableUriTree,
            Arc::new(move || {
                let restrictions = RestrictSpecTree::parse_restrict(&restrict)?;
                let tree = FetchableUriSpecTree::parse_fetchable_uris(&src_uri)?;
                tree.validate_for_eapi(eapi)?;
                Ok(MetadataValue::FetchableUriTree {
                    tree,
                    initial_label: UriLabel::for_restrictions(&restrictions),
                })
            }),
        ))?;

        store.insert(deferred(
            "KEYWORDS",
            "Keywords",
            MetadataKeyType::Normal,
            MetadataValueKind::KeywordSet,
            text("KEYWORDS"),
            |s| {
                KeywordName::parse_line(s)
                    .map(|keywords| MetadataValue::KeywordSet(keywords.into_iter().collect()))
            },
        ))?;
        store.insert(deferred(
            "RESTRICT",
            "Restrictions",
            MetadataKeyType::Internal,
            MetadataValueKind::RestrictTree,
            text("RESTRICT"),
            |s| RestrictSpecTree::parse_restrict(s).map(MetadataValue::RestrictTree),
        ))?;

        for (raw_name, human_name) in [
            ("DEPEND", "Build dependencies"),
            ("RDEPEND", "Run dependencies"),
            ("PDEPEND", "Post dependencies"),
        ] {
            store.insert(deferred(
                raw_name,
                human_name,
                MetadataKeyType::Dependencies,
                MetadataValueKind::DependencyTree,
                text(raw_name),
                |s| DependencySpecTree::parse_dependencies(s).map(MetadataValue::DependencyTree),
            ))?;
        }

        if let Some(provide) = raw.get("PROVIDE") {
            store.insert(deferred(
                "PROVIDE",
                "Provides",
                MetadataKeyType::Dependencies,
                MetadataValueKind::ProvideTree,
                provide.clone(),
                |s| DependencySpecTree::parse_provide(s).map(MetadataValue::ProvideTree),
            ))?;
        }

        if let Some(info) = self.masks.get(name) {
            store.insert(MetadataKey::new(
                "repository_mask",
                "Repository masked",
                MetadataKeyType::Internal,
                MetadataValue::RepositoryMaskInfo(info.clone()),
            ))?;
        }
        Ok(())
    }
}

fn add_installed_keys(store: &mut MetadataStore, raw: &RawMetadata) -> Result<()> {
    let text = |key: &str| raw.get(key).cloned().unwrap_or_default();

    let repository = required(raw, "REPOSITORY")?;
    let installed_time = required(raw, "INSTALLED_TIME")?;
    let seconds: i64 = installed_time
        .trim()
        .parse()
        .map_err(|_| Error::InvalidTime(installed_time.clone()))?;
    let time = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::InvalidTime(installed_time.clone()))?;

    store.insert(MetadataKey::new(
        "INSTALLED_TIME",
        "Installed time",
        MetadataKeyType::Normal,
        MetadataValue::Time(time),
    ))?;
    store.insert(string_key(
        "REPOSITORY",
        "Source repository",
        MetadataKeyType::Normal,
        repository,
    ))?;
    store.insert(deferred(
        "CONTENTS",
        "Contents",
        MetadataKeyType::Internal,
        MetadataValueKind::Contents,
        text("CONTENTS"),
        |s| Contents::parse(s).map(MetadataValue::Contents),
    ))?;
    store.insert(deferred(
        "USE",
        "Selected USE flags",
        MetadataKeyType::Normal,
        MetadataValueKind::UseFlagSet,
        text("USE"),
        |s| {
            s.split_whitespace()
                .map(UseFlagName::new)
                .collect::<Result<BTreeSet<_>>>()
                .map(MetadataValue::UseFlagSet)
        },
    ))?;
    Ok(())
}

fn required(raw: &RawMetadata, key: &str) -> Result<String> {
    raw.get(key)
        .cloned()
        .ok_or_else(|| Error::MissingField(key.to_string()))
}

fn string_key(raw_name: &str, human_name: &str, key_type: MetadataKeyType, value: String) -> MetadataKey {
    MetadataKey::new(raw_name, human_name, key_type, MetadataValue::String(value))
}

/// A key parsed from `text` on every read.
fn deferred<F>(
    raw_name: &str,
    human_name: &str,
    key_type: MetadataKeyType,
    kind: MetadataValueKind,
    text: String,
    parse: F,
) -> MetadataKey
where
    F: Fn(&str) -> Result<MetadataValue> + Send + Sync + 'static,
{
    MetadataKey::deferred(raw_name, human_name, key_type, kind, Arc::new(move || parse(&text)))
}

/// A set of repositories, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct PackageDatabase {
    repositories: Vec<Repository>,
}

impl PackageDatabase {
    /// A database with no repositories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository. Names must be unique.
    pub fn add_repository(&mut self, repository: Repository) -> Result<()> {
        if self.repositories.iter().any(|r| r.name == repository.name) {
            return Err(Error::DuplicateRepository(repository.name));
        }
        debug!(
            repository = %repository.name,
            kind = ?repository.kind,
            "Added repository"
        );
        self.repositories.push(repository);
        Ok(())
    }

    /// Look up a repository by name.
    pub fn fetch_repository(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NoSuchRepository(name.to_string()))
    }

    /// Look up a repository by name for adding versions or masks.
    pub fn fetch_repository_mut(&mut self, name: &str) -> Result<&mut Repository> {
        self.repositories
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::NoSuchRepository(name.to_string()))
    }

    /// Repositories in the order they were added.
    pub fn repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::PlainFormatter;
    use crate::src_uri::UriLabelKind;
    use std::path::PathBuf;

    fn raw(pairs: &[(&str, &str)]) -> RawMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn database() -> PackageDatabase {
        let mut source = Repository::new("testrepo", RepositoryKind::Source);
        source
            .add_version(
                "foo/bar".parse().unwrap(),
                "1.0",
                raw(&[
                    ("EAPI", "8"),
                    ("DESCRIPTION", "Test package"),
                    ("SLOT", "0"),
                    ("KEYWORDS", "test ~amd64"),
                    ("IUSE", "+ssl doc"),
                    ("INHERITED", "toolchain-funcs"),
                    ("DEPEND", "cat/dep ssl? ( dev-libs/openssl )"),
                ]),
            )
            .unwrap();

        let mut installed = Repository::new("installed", RepositoryKind::Installed);
        installed
            .add_version(
                "cat-one/pkg-one".parse().unwrap(),
                "1",
                raw(&[
                    ("EAPI", "0"),
                    ("DESCRIPTION", "the one package"),
                    ("SLOT", "0"),
                    ("REPOSITORY", "testrepo"),
                    ("INSTALLED_TIME", "1234567890"),
                    ("CONTENTS", "dir /usr\nobj /usr/bin/one d41d8cd98f00b204e9800998ecf8427e 1234567890"),
                    ("IUSE", "test"),
                    ("USE", "test"),
                    ("INHERITED", "eutils"),
                ]),
            )
            .unwrap();

        let mut db = PackageDatabase::new();
        db.add_repository(source).unwrap();
        db.add_repository(installed).unwrap();
        db
    }

    fn only_id(db: &PackageDatabase, repo: &str, name: &str) -> PackageId {
        let ids = db
            .fetch_repository(repo)
            .unwrap()
            .package_ids(&name.parse().unwrap());
        assert_eq!(ids.len(), 1);
        ids[0].clone()
    }

    fn kind_of(id: &PackageId, key: &str) -> Option<MetadataValueKind> {
        id.find_metadata(key).map(MetadataKey::kind)
    }

    #[test]
    fn source_package_keys() {
        let db = database();
        let id = only_id(&db, "testrepo", "foo/bar");
        assert_eq!(id.origin(), PackageOrigin::Source);

        assert_eq!(kind_of(&id, "CONTENTS"), None);
        assert_eq!(kind_of(&id, "INSTALLED_TIME"), None);
        assert_eq!(kind_of(&id, "REPOSITORY"), None);
        assert_eq!(kind_of(&id, "KEYWORDS"), Some(MetadataValueKind::KeywordSet));
        assert_eq!(kind_of(&id, "USE"), None);
        assert_eq!(kind_of(&id, "IUSE"), Some(MetadataValueKind::IUseFlagSet));
        assert_eq!(kind_of(&id, "INHERITED"), Some(MetadataValueKind::StringSet));
        assert_eq!(kind_of(&id, "DEPEND"), Some(MetadataValueKind::DependencyTree));

        let keywords = id.find_metadata("KEYWORDS").unwrap().as_keyword_set().unwrap();
        assert_eq!(keywords.len(), 2);
        let depend = id.find_metadata("DEPEND").unwrap();
        assert_eq!(
            depend.pretty_print_flat(&PlainFormatter).unwrap(),
            "cat/dep ssl? ( dev-libs/openssl )"
        );
        assert_eq!(depend.key_type(), MetadataKeyType::Dependencies);
    }

    #[test]
    fn installed_package_keys() {
        let db = database();
        let id = only_id(&db, "installed", "cat-one/pkg-one");
        assert_eq!(id.origin(), PackageOrigin::Installed);

        assert_eq!(kind_of(&id, "CONTENTS"), Some(MetadataValueKind::Contents));
        assert_eq!(kind_of(&id, "INSTALLED_TIME"), Some(MetadataValueKind::Time));
        assert_eq!(kind_of(&id, "REPOSITORY"), Some(MetadataValueKind::String));
        assert_eq!(kind_of(&id, "KEYWORDS"), None);
        assert_eq!(kind_of(&id, "USE"), Some(MetadataValueKind::UseFlagSet));
        assert_eq!(kind_of(&id, "IUSE"), Some(MetadataValueKind::IUseFlagSet));
        assert_eq!(kind_of(&id, "INHERITED"), Some(MetadataValueKind::StringSet));
        assert_eq!(kind_of(&id, "DEPEND"), None);

        let contents = id.find_metadata("CONTENTS").unwrap().as_contents().unwrap();
        assert_eq!(contents.len(), 2);
        let time = id.find_metadata("INSTALLED_TIME").unwrap().as_time().unwrap();
        assert_eq!(time.timestamp(), 1_234_567_890);
        assert_eq!(
            id.find_metadata("REPOSITORY").unwrap().as_string().unwrap(),
            "testrepo"
        );
    }

    #[test]
    fn installed_without_inherited() {
        let mut repo = Repository::new("installed", RepositoryKind::Installed);
        let id = repo
            .add_version(
                "cat-two/pkg-two".parse().unwrap(),
                "2",
                raw(&[
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("REPOSITORY", "testrepo"),
                    ("INSTALLED_TIME", "1234567890"),
                ]),
            )
            .unwrap();
        let inherited = id.find_metadata("INHERITED").unwrap();
        assert_eq!(inherited.as_string_set(), Ok(vec![]));
        assert_eq!(inherited.pretty_print_flat(&PlainFormatter).unwrap(), "");
    }

    #[test]
    fn homepage_and_provide_values() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let id = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("HOMEPAGE", "https://example.com/ https://example.org/bar"),
                    ("PROVIDE", "virtual/bar"),
                ]),
            )
            .unwrap();

        let homepage = id.find_metadata("HOMEPAGE").unwrap();
        assert_eq!(homepage.key_type(), MetadataKeyType::Significant);
        assert_eq!(homepage.as_simple_uri_tree().unwrap().leaves().len(), 2);
        assert_eq!(
            homepage.pretty_print_flat(&PlainFormatter).unwrap(),
            "https://example.com/ https://example.org/bar"
        );

        let provide = id.find_metadata("PROVIDE").unwrap();
        assert_eq!(
            provide.as_provide_tree().unwrap(),
            DependencySpecTree::parse_provide("virtual/bar").unwrap()
        );
    }

    #[test]
    fn missing_fields() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let err = repo
            .add_version("foo/bar".parse().unwrap(), "1", raw(&[("SLOT", "0")]))
            .unwrap_err();
        assert_eq!(err, Error::MissingField("DESCRIPTION".to_string()));

        let mut repo = Repository::new("installed", RepositoryKind::Installed);
        let err = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[("DESCRIPTION", "d"), ("SLOT", "0"), ("INSTALLED_TIME", "1")]),
            )
            .unwrap_err();
        assert_eq!(err, Error::MissingField("REPOSITORY".to_string()));
        assert!(repo.package_ids(&"foo/bar".parse().unwrap()).is_empty());
    }

    #[test]
    fn bad_scalars_fail_early() {
        let mut repo = Repository::new("installed", RepositoryKind::Installed);
        let err = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("REPOSITORY", "r"),
                    ("INSTALLED_TIME", "yesterday"),
                ]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTime(_)));

        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let err = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[("EAPI", "banana"), ("DESCRIPTION", "d"), ("SLOT", "0")]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEapi(_)));
    }

    #[test]
    fn malformed_trees_fail_on_read() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let id = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[("DESCRIPTION", "d"), ("SLOT", "0"), ("DEPEND", "( cat/a")]),
            )
            .unwrap();
        let depend = id.find_metadata("DEPEND").unwrap();
        assert_eq!(depend.kind(), MetadataValueKind::DependencyTree);
        assert!(matches!(depend.value(), Err(Error::InvalidDependency(_))));
        assert!(id.find_metadata("RDEPEND").unwrap().as_dependency_tree().unwrap().is_empty());
    }

    #[test]
    fn iuse_mode_follows_eapi() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let id = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[("DESCRIPTION", "d"), ("SLOT", "0"), ("IUSE", "+ssl")]),
            )
            .unwrap();
        assert!(matches!(
            id.find_metadata("IUSE").unwrap().value(),
            Err(Error::InvalidIUse(_))
        ));
    }

    #[test]
    fn src_uri_label_from_restrict() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let id = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[
                    ("EAPI", "8"),
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("RESTRICT", "fetch"),
                    ("SRC_URI", "https://example.com/bar-1.tar.gz"),
                ]),
            )
            .unwrap();
        let src_uri = id.find_metadata("SRC_URI").unwrap();
        assert_eq!(src_uri.initial_label().unwrap().kind, UriLabelKind::ManualOnly);
        assert_eq!(src_uri.as_fetchable_uri_tree().unwrap().leaves().len(), 1);
    }

    #[test]
    fn provide_and_mask_only_when_given() {
        let name: QualifiedPackageName = "foo/bar".parse().unwrap();
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let plain = repo
            .add_version(name.clone(), "1", raw(&[("DESCRIPTION", "d"), ("SLOT", "0")]))
            .unwrap();
        assert!(plain.find_metadata("PROVIDE").is_none());
        assert!(plain.find_metadata("repository_mask").is_none());

        repo.mask(
            name.clone(),
            RepositoryMaskInfo {
                mask_file: PathBuf::from("profiles/package.mask"),
                comment: vec!["Broken".to_string()],
            },
        );
        let masked = repo
            .add_version(
                name.clone(),
                "2",
                raw(&[("DESCRIPTION", "d"), ("SLOT", "0"), ("PROVIDE", "virtual/bar")]),
            )
            .unwrap();
        let info = masked
            .find_metadata("repository_mask")
            .unwrap()
            .as_repository_mask_info()
            .unwrap();
        assert_eq!(info.comment, vec!["Broken".to_string()]);
        assert_eq!(
            masked.find_metadata("PROVIDE").unwrap().kind(),
            MetadataValueKind::ProvideTree
        );
        assert_eq!(repo.package_ids(&name), &[plain, masked]);
    }

    #[test]
    fn repository_lookup() {
        let mut db = database();
        assert!(db.fetch_repository("testrepo").is_ok());
        assert_eq!(
            db.fetch_repository("nope").unwrap_err(),
            Error::NoSuchRepository("nope".to_string())
        );
        assert_eq!(
            db.add_repository(Repository::new("testrepo", RepositoryKind::Source)),
            Err(Error::DuplicateRepository("testrepo".to_string()))
        );
        let names: Vec<&str> = db.repositories().map(Repository::name).collect();
        assert_eq!(names, vec!["testrepo", "installed"]);

        let repo = db.fetch_repository_mut("testrepo").unwrap();
        assert!(repo.package_ids(&"no/such".parse().unwrap()).is_empty());
    }

    #[test]
    fn iuse_comparison() {
        let mut repo = Repository::new("testrepo", RepositoryKind::Source);
        let old = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "1",
                raw(&[("EAPI", "8"), ("DESCRIPTION", "d"), ("SLOT", "0"), ("IUSE", "ssl")]),
            )
            .unwrap();
        let new = repo
            .add_version(
                "foo/bar".parse().unwrap(),
                "2",
                raw(&[("EAPI", "8"), ("DESCRIPTION", "d"), ("SLOT", "0"), ("IUSE", "+ssl doc")]),
            )
            .unwrap();

        let env = crate::environment::StaticEnvironment::new();
        let rendered = new
            .find_metadata("IUSE")
            .unwrap()
            .pretty_print_flat_with_comparison(&env, &new, &old, &PlainFormatter)
            .unwrap();
        assert_eq!(rendered, "-doc% ssl*");
    }
}
