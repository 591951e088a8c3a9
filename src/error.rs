use crate::metadata_key::MetadataValueKind;

/// Error type for metadata key, specification tree and repository operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid USE flag name.
    #[error("invalid USE flag name: {0}")]
    InvalidUseFlagName(String),

    /// Invalid `category/package` name.
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    /// Invalid EAPI value.
    #[error("invalid EAPI: {0}")]
    InvalidEapi(String),

    /// Invalid keyword string.
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Invalid IUSE flag entry.
    #[error("invalid IUSE entry: {0}")]
    InvalidIUse(String),

    /// Invalid CONTENTS line.
    #[error("invalid CONTENTS entry: {0}")]
    InvalidContents(String),

    /// Invalid timestamp.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Invalid dependency specification.
    #[error("invalid dependency specification: {0}")]
    InvalidDependency(String),

    /// Invalid PROVIDE specification.
    #[error("invalid PROVIDE: {0}")]
    InvalidProvide(String),

    /// Invalid LICENSE expression.
    #[error("invalid LICENSE: {0}")]
    InvalidLicense(String),

    /// Invalid RESTRICT expression.
    #[error("invalid RESTRICT: {0}")]
    InvalidRestrict(String),

    /// Invalid SRC_URI or HOMEPAGE expression.
    #[error("invalid URI specification: {0}")]
    InvalidSrcUri(String),

    /// Invalid use requirement.
    #[error("invalid use requirement: {0}")]
    InvalidUseRequirement(String),

    /// Missing mandatory raw metadata field.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A metadata store already holds a key with this raw name.
    #[error("duplicate metadata key: {0}")]
    DuplicateKey(String),

    /// A package database already holds a repository with this name.
    #[error("duplicate repository: {0}")]
    DuplicateRepository(String),

    /// No repository with this name.
    #[error("no such repository: {0}")]
    NoSuchRepository(String),

    /// A metadata key was read as a different kind than it holds.
    #[error("metadata key {key} holds {found}, not {expected}")]
    KeyTypeMismatch {
        /// Raw name of the key.
        key: String,
        /// Kind the caller asked for.
        expected: MetadataValueKind,
        /// Kind the key is bound to.
        found: MetadataValueKind,
    },
}

/// Result type for portage-metadata-keys operations.
pub type Result<T> = std::result::Result<T, Error>;
