use std::collections::HashMap;

use tracing::warn;

use crate::error::Result;
use crate::name::UseFlagName;
use crate::package_id::PackageId;

/// Answers whether a flag is enabled for a package.
pub trait Environment {
    /// Whether `flag` is enabled for `id`.
    fn query_use(&self, flag: &UseFlagName, id: &PackageId) -> bool;
}

/// An [`Environment`] driven by explicit settings and the package's own
/// metadata.
///
/// A flag is looked up in order: a per-package override, a global
/// override, the package's `USE` key, then the `+` default in its `IUSE`.
/// Anything else is disabled. A `USE` or `IUSE` key that fails to evaluate
/// is logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    global: HashMap<UseFlagName, bool>,
    per_package: HashMap<(PackageId, UseFlagName), bool>,
}

impl StaticEnvironment {
    /// An environment with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `flag` on or off for every package.
    pub fn set(&mut self, flag: UseFlagName, enabled: bool) {
        self.global.insert(flag, enabled);
    }

    /// Force `flag` on or off for `id` only.
    pub fn set_for(&mut self, id: &PackageId, flag: UseFlagName, enabled: bool) {
        self.per_package.insert((id.clone(), flag), enabled);
    }
}

impl Environment for StaticEnvironment {
    fn query_use(&self, flag: &UseFlagName, id: &PackageId) -> bool {
        if let Some(&enabled) = self.per_package.get(&(id.clone(), flag.clone())) {
            return enabled;
        }
        if let Some(&enabled) = self.global.get(flag) {
            return enabled;
        }
        if let Some(used) = id
            .find_metadata("USE")
            .and_then(|key| usable(id, "USE", key.as_use_flag_set()))
        {
            return used.contains(flag);
        }
        id.find_metadata("IUSE")
            .and_then(|key| usable(id, "IUSE", key.as_iuse_flag_set()))
            .and_then(|iuse| iuse.into_iter().find(|declared| &declared.flag == flag))
            .is_some_and(|declared| declared.enabled_by_default())
    }
}

fn usable<T>(id: &PackageId, key: &str, value: Result<T>) -> Option<T> {
    match value {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(package = %id, key, error = %e, "Ignoring unreadable flag key");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::PlainFormatter;
    use crate::name::QualifiedPackageName;
    use crate::repository::{RawMetadata, Repository, RepositoryKind};

    fn flag(s: &str) -> UseFlagName {
        UseFlagName::new(s).unwrap()
    }

    fn raw(pairs: &[(&str, &str)]) -> RawMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn name() -> QualifiedPackageName {
        QualifiedPackageName::new("cat", "pkg").unwrap()
    }

    #[test]
    fn source_package_uses_iuse_defaults() {
        let mut repo = Repository::new("repo", RepositoryKind::Source);
        let id = repo
            .add_version(
                name(),
                "1",
                raw(&[("EAPI", "8"), ("DESCRIPTION", "d"), ("SLOT", "0"), ("IUSE", "+ssl doc")]),
            )
            .unwrap();

        let mut env = StaticEnvironment::new();
        assert!(env.query_use(&flag("ssl"), &id));
        assert!(!env.query_use(&flag("doc"), &id));
        assert!(!env.query_use(&flag("unknown"), &id));

        env.set(flag("doc"), true);
        assert!(env.query_use(&flag("doc"), &id));

        env.set_for(&id, flag("doc"), false);
        assert!(!env.query_use(&flag("doc"), &id));
    }

    #[test]
    fn installed_package_uses_use_key() {
        let mut repo = Repository::new("installed", RepositoryKind::Installed);
        let id = repo
            .add_version(
                name(),
                "1",
                raw(&[
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("REPOSITORY", "gentoo"),
                    ("INSTALLED_TIME", "1700000000"),
                    ("IUSE", "ssl doc"),
                    ("USE", "doc"),
                ]),
            )
            .unwrap();

        let env = StaticEnvironment::new();
        assert!(env.query_use(&flag("doc"), &id));
        assert!(!env.query_use(&flag("ssl"), &id));
    }

    #[test]
    fn unreadable_use_falls_back_to_iuse() {
        let mut repo = Repository::new("installed", RepositoryKind::Installed);
        let id = repo
            .add_version(
                name(),
                "1",
                raw(&[
                    ("EAPI", "8"),
                    ("DESCRIPTION", "d"),
                    ("SLOT", "0"),
                    ("REPOSITORY", "gentoo"),
                    ("INSTALLED_TIME", "1700000000"),
                    ("IUSE", "+ssl doc"),
                    ("USE", "ss!l"),
                ]),
            )
            .unwrap();
        assert!(id.find_metadata("USE").unwrap().as_use_flag_set().is_err());

        let env = StaticEnvironment::new();
        assert!(env.query_use(&flag("ssl"), &id));
        assert!(!env.query_use(&flag("doc"), &id));
    }

    #[test]
    fn repeated_iuse_entry_keeps_default() {
        let mut repo = Repository::new("repo", RepositoryKind::Source);
        let id = repo
            .add_version(
                name(),
                "1",
                raw(&[("EAPI", "8"), ("DESCRIPTION", "d"), ("SLOT", "0"), ("IUSE", "ssl +ssl")]),
            )
            .unwrap();

        assert!(StaticEnvironment::new().query_use(&flag("ssl"), &id));
        let iuse = id.find_metadata("IUSE").unwrap();
        assert_eq!(iuse.as_iuse_flag_set().unwrap().len(), 1);
        assert_eq!(iuse.pretty_print_flat(&PlainFormatter).unwrap(), "+ssl");
    }
}
