//! Unified error types for the kiln toolkit.
//!
//! Every component owns a small error enum ([`ValidationError`], [`ParseError`],
//! [`ResolutionError`], [`RenderError`]) and [`KilnError`] wraps them all. Failures of the
//! external tools are not errors at this level: they are recorded as stage outcomes inside a
//! [`VerificationReport`].

use std::path::PathBuf;
use thiserror::Error;

use crate::verifier::VerificationReport;

/// Caller input that is rejected before any parsing or rendering happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A namespace or project name outside `[a-z][a-z0-9_]*`.
    #[error("{field} '{value}' is invalid: use a lowercase letter followed by lowercase letters, digits or '_'")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("unknown template: {slug} (available: {available})")]
    UnknownTemplate { slug: String, available: String },

    #[error("unknown feature: {name} (available: {available})")]
    UnknownFeature { name: String, available: String },

    /// A toggle was set that the selected template does not recognize.
    #[error("option '{option}' is not supported by template '{template}'")]
    UnsupportedOption { template: String, option: String },

    #[error("invalid purpose '{0}' (expected 'spend' or 'mint')")]
    InvalidPurpose(String),

    /// Token and asset names end up inside byte-string literals.
    #[error("{field} '{value}' must be 1-32 printable ASCII characters without quotes or backslashes")]
    InvalidAssetName { field: &'static str, value: String },

    #[error("unknown scan profile: {name} (available: {available})")]
    UnknownProfile { name: String, available: String },

    /// A required input for the selected template is missing or empty.
    #[error("{0}")]
    MissingInput(String),

    /// A selected feature needs something the datum or redeemer does not provide.
    #[error("feature '{feature}' {requirement}")]
    FeatureRequirement {
        feature: String,
        requirement: String,
    },

    /// An identifier that is lexically valid but collides with an Aiken keyword or a
    /// constructor already in scope.
    #[error("{kind} '{name}' is reserved in Aiken, pick another name")]
    ReservedName { kind: &'static str, name: String },

    #[error("project directory not found: {0}")]
    ProjectNotFound(PathBuf),
}

/// Malformed field-list or action-list DSL input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error in '{fragment}': {reason}")]
    Syntax { fragment: String, reason: String },

    #[error("unknown type '{type_token}' in '{fragment}' (supported: Int, ByteArray, Address, Bool, List<Int>, List<ByteArray>)")]
    UnknownType { fragment: String, type_token: String },

    #[error("invalid identifier '{fragment}': {expected}")]
    InvalidIdentifier {
        fragment: String,
        expected: &'static str,
    },

    #[error("duplicate field '{name}'")]
    DuplicateField { name: String },

    #[error("duplicate action '{name}'")]
    DuplicateAction { name: String },
}

/// Feature-set resolution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("feature '{feature}' requires purpose '{expected}'")]
    PurposeConflict { feature: String, expected: String },

    #[error("feature '{feature}' conflicts with '{other}'")]
    Conflict { feature: String, other: String },

    /// A catalogue entry names a dependency that is not declared.
    #[error("feature '{feature}' depends on undeclared feature '{dependency}'")]
    UnresolvedDependency { feature: String, dependency: String },

    /// The catalogue's dependency graph contains a cycle through `feature`.
    #[error("dependency cycle through feature '{feature}'")]
    CyclicDependency { feature: String },

    #[error("feature '{0}' is declared more than once")]
    DuplicateFeature(String),

    #[error("unknown feature '{0}'")]
    UnknownFeature(String),
}

/// Rendering failures. None of these are expected for a well-formed catalogue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("{operation} is not available for template '{template}'")]
    UnsupportedOperation {
        template: String,
        operation: &'static str,
    },

    #[error("generated path collision: {0}")]
    PathCollision(String),

    /// A generated path that is absolute, uses backslashes, or contains `..`.
    #[error("generated path is not a safe relative path: {0}")]
    InvalidPath(String),

    /// Handlebars template rendering failed (invalid template or missing variables).
    #[error("template rendering failed: {0}")]
    Template(String),
}

/// All errors that can occur during kiln operations.
#[derive(Error, Debug)]
pub enum KilnError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// Verification ran and did not pass, under the `reject` failure policy.
    #[error("verification failed: {}", .0.summary())]
    Verification(Box<VerificationReport>),

    // --- Configuration ---

    /// The configuration file (`kiln.config.json`) was not found.
    #[error("config file not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file exists but contains invalid JSON.
    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration file parsed but holds a value kiln cannot use.
    #[error("invalid config at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // --- Prerequisites ---

    /// A required external tool (`aiken`, `aikido`) is not installed.
    #[error("required tool '{name}' not found, install: {install}")]
    MissingTool { name: String, install: String },

    // --- Output ---

    /// The output directory already exists and is not empty.
    #[error("project directory already exists: {0}")]
    ProjectExists(PathBuf),

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, KilnError>`.
pub type Result<T> = std::result::Result<T, KilnError>;
