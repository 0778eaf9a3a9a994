use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::verifier::Severity;

/// Scanner configuration emitted as `.aikido.toml` next to the manifest.
///
/// A project without a profile is scanned with the scanner's built-in defaults; with one,
/// the listed detectors are suppressed and the scanner's own exit threshold changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    pub name: String,
    /// Severity at which the scanner itself exits non-zero.
    pub fail_on: Severity,
    /// Detectors switched off for this profile.
    pub disabled_detectors: Vec<String>,
    /// Whether inline `test` blocks are scanned too.
    pub include_tests: bool,
}

impl ScanProfile {
    pub const NAMES: &'static [&'static str] = &["standard", "strict"];

    /// Suppresses stylistic detectors that fire on freshly generated code.
    pub fn standard() -> Self {
        Self {
            name: "standard".into(),
            fail_on: Severity::High,
            disabled_detectors: vec!["magic-numbers".into(), "unused-validator-parameter".into()],
            include_tests: false,
        }
    }

    /// Every detector on, tests included, fail from medium upwards.
    pub fn strict() -> Self {
        Self {
            name: "strict".into(),
            fail_on: Severity::Medium,
            disabled_detectors: Vec::new(),
            include_tests: true,
        }
    }

    /// Resolve a profile by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "standard" => Some(Self::standard()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }

    /// Like [`ScanProfile::from_name`], reporting unknown names as a validation error.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        Self::from_name(name).ok_or_else(|| ValidationError::UnknownProfile {
            name: name.to_string(),
            available: Self::NAMES.join(", "),
        })
    }
}
