use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::metadata_key::MetadataKey;
use crate::name::QualifiedPackageName;
use crate::store::MetadataStore;

/// Where a package version comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageOrigin {
    /// Available to build from a source repository.
    Source,
    /// Already merged on the system.
    Installed,
}

struct PackageIdData {
    name: QualifiedPackageName,
    version: String,
    repository_name: String,
    origin: PackageOrigin,
    metadata: MetadataStore,
}

/// A handle to one package version in one repository.
///
/// Clones share the package. Two handles compare equal only when they
/// refer to the same package, even if another package has identical
/// name, version and metadata.
#[derive(Clone)]
pub struct PackageId(Arc<PackageIdData>);

impl PackageId {
    pub(crate) fn new(
        name: QualifiedPackageName,
        version: &str,
        repository_name: &str,
        origin: PackageOrigin,
        metadata: MetadataStore,
    ) -> Self {
        PackageId(Arc::new(PackageIdData {
            name,
            version: version.to_string(),
            repository_name: repository_name.to_string(),
            origin,
            metadata,
        }))
    }

    /// `category/package`.
    pub fn name(&self) -> &QualifiedPackageName {
        &self.0.name
    }

    /// The version string, e.g. `1.0-r1`.
    pub fn version(&self) -> &str {
        &self.0.version
    }

    /// Name of the repository holding this package.
    pub fn repository_name(&self) -> &str {
        &self.0.repository_name
    }

    /// Whether the package is buildable or installed.
    pub fn origin(&self) -> PackageOrigin {
        self.0.origin
    }

    /// `category/package-version::repository`
    pub fn canonical_form(&self) -> String {
        format!("{}-{}::{}", self.0.name, self.0.version, self.0.repository_name)
    }

    /// Look up one of the package's metadata keys by raw name.
    pub fn find_metadata(&self, raw_name: &str) -> Option<&MetadataKey> {
        self.0.metadata.find_metadata(raw_name)
    }

    /// Every metadata key of the package.
    pub fn metadata(&self) -> &MetadataStore {
        &self.0.metadata
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("PackageId")
            .field(&self.canonical_form())
            .finish()
    }
}
