use std::fmt;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::name::UseFlagName;
use crate::package_id::PackageId;

/// `[flag]`: the flag must be enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnabledUseRequirement {
    flag: UseFlagName,
}

impl EnabledUseRequirement {
    /// A requirement on `flag`.
    pub fn new(flag: UseFlagName) -> Self {
        EnabledUseRequirement { flag }
    }

    /// The flag the requirement is about.
    pub fn flag(&self) -> &UseFlagName {
        &self.flag
    }
}

/// `[-flag]`: the flag must be disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisabledUseRequirement {
    flag: UseFlagName,
}

impl DisabledUseRequirement {
    /// A requirement on `flag`.
    pub fn new(flag: UseFlagName) -> Self {
        DisabledUseRequirement { flag }
    }

    /// The flag the requirement is about.
    pub fn flag(&self) -> &UseFlagName {
        &self.flag
    }
}

/// `[flag=]`: the flag must be in the same state as on `package_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EqualUseRequirement {
    flag: UseFlagName,
    package_id: PackageId,
}

impl EqualUseRequirement {
    /// A requirement on `flag`, compared against `package_id`.
    pub fn new(flag: UseFlagName, package_id: PackageId) -> Self {
        EqualUseRequirement { flag, package_id }
    }

    /// The flag the requirement is about.
    pub fn flag(&self) -> &UseFlagName {
        &self.flag
    }

    /// The package whose flag state is compared against.
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }
}

/// `[!flag=]`: the flag must be in the opposite state to `package_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotEqualUseRequirement {
    flag: UseFlagName,
    package_id: PackageId,
}

impl NotEqualUseRequirement {
    /// A requirement on `flag`, compared against `package_id`.
    pub fn new(flag: UseFlagName, package_id: PackageId) -> Self {
        NotEqualUseRequirement { flag, package_id }
    }

    /// The flag the requirement is about.
    pub fn flag(&self) -> &UseFlagName {
        &self.flag
    }

    /// The package whose flag state is compared against.
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }
}

/// A constraint on one use flag of a package.
///
/// # Examples
///
/// ```
/// use portage_metadata_keys::{
///     RawMetadata, Repository, RepositoryKind, StaticEnvironment, UseRequirement,
/// };
///
/// let mut repo = Repository::new("gentoo", RepositoryKind::Source);
/// let raw: RawMetadata = [("DESCRIPTION", "x"), ("SLOT", "0"), ("EAPI", "8"), ("IUSE", "+ssl")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
/// let id = repo.add_version("dev-libs/foo".parse().unwrap(), "1.0", raw).unwrap();
///
/// let req = UseRequirement::parse("ssl", &id).unwrap();
/// assert!(req.is_satisfied_by(&StaticEnvironment::new(), &id));
/// assert!(req.package_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UseRequirement {
    /// `flag`
    Enabled(EnabledUseRequirement),
    /// `-flag`
    Disabled(DisabledUseRequirement),
    /// `flag=`
    Equal(EqualUseRequirement),
    /// `!flag=`
    NotEqual(NotEqualUseRequirement),
}

impl UseRequirement {
    /// Parse `flag`, `-flag`, `flag=` or `!flag=`. The `=` forms compare
    /// against `id`.
    pub fn parse(input: &str, id: &PackageId) -> Result<Self> {
        let invalid = || Error::InvalidUseRequirement(input.to_string());
        let flag = |name: &str| UseFlagName::new(name).map_err(|_| invalid());

        if let Some(rest) = input.strip_prefix('!') {
            let name = rest.strip_suffix('=').ok_or_else(invalid)?;
            return Ok(UseRequirement::NotEqual(NotEqualUseRequirement::new(
                flag(name)?,
                id.clone(),
            )));
        }
        if let Some(name) = input.strip_suffix('=') {
            return Ok(UseRequirement::Equal(EqualUseRequirement::new(
                flag(name)?,
                id.clone(),
            )));
        }
        if let Some(name) = input.strip_prefix('-') {
            return Ok(UseRequirement::Disabled(DisabledUseRequirement::new(flag(
                name,
            )?)));
        }
        Ok(UseRequirement::Enabled(EnabledUseRequirement::new(flag(
            input,
        )?)))
    }

    /// The flag the requirement is about.
    pub fn flag(&self) -> &UseFlagName {
        match self {
            UseRequirement::Enabled(r) => r.flag(),
            UseRequirement::Disabled(r) => r.flag(),
            UseRequirement::Equal(r) => r.flag(),
            UseRequirement::NotEqual(r) => r.flag(),
        }
    }

    /// The package compared against, for the `=` forms.
    pub fn package_id(&self) -> Option<&PackageId> {
        match self {
            UseRequirement::Enabled(_) | UseRequirement::Disabled(_) => None,
            UseRequirement::Equal(r) => Some(r.package_id()),
            UseRequirement::NotEqual(r) => Some(r.package_id()),
        }
    }

    /// Whether `subject` meets the requirement under `env`.
    pub fn is_satisfied_by(&self, env: &dyn Environment, subject: &PackageId) -> bool {
        let enabled = env.query_use(self.flag(), subject);
        match self {
            UseRequirement::Enabled(_) => enabled,
            UseRequirement::Disabled(_) => !enabled,
            UseRequirement::Equal(r) => enabled == env.query_use(r.flag(), r.package_id()),
            UseRequirement::NotEqual(r) => enabled != env.query_use(r.flag(), r.package_id()),
        }
    }
}

impl fmt::Display for UseRequirement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UseRequirement::Enabled(r) => write!(f, "{}", r.flag()),
            UseRequirement::Disabled(r) => write!(f, "-{}", r.flag()),
            UseRequirement::Equal(r) => write!(f, "{}=", r.flag()),
            UseRequirement::NotEqual(r) => write!(f, "!{}=", r.flag()),
        }
    }
}
