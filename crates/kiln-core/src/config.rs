//! `kiln.config.json`: toolchain binaries and verification policy.
//!
//! Every field has a default, so a partial file (or none at all, via
//! [`KilnConfig::load_or_default`]) is valid.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KilnError, Result};
use crate::verifier::{Severity, VerifierConfig};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "kiln.config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub toolchain: ToolchainConfig,
    pub verify: VerifyConfig,
}

/// Names or paths of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub compiler: String,
    pub scanner: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "aiken".into(),
            scanner: "aikido".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Timeout for each tool invocation, in seconds.
    pub stage_timeout_secs: u64,
    /// Findings at or above this severity fail the scan stage.
    pub fail_on: Severity,
    pub on_failure: FailurePolicy,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 300,
            fail_on: Severity::High,
            on_failure: FailurePolicy::Reject,
        }
    }
}

/// What `generate` hands back when verification fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// No files; the report comes back as [`KilnError::Verification`].
    #[default]
    Reject,
    /// Files alongside the failed report.
    Report,
}

impl KilnConfig {
    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| KilnError::ConfigNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| KilnError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.check(path)?;
        Ok(config)
    }

    /// Reject values that parse but would make every stage fail.
    fn check(&self, path: &Path) -> Result<()> {
        if self.verify.stage_timeout_secs == 0 {
            return Err(KilnError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "verify.stage_timeout_secs must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| KilnError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            stage_timeout: Duration::from_secs(self.verify.stage_timeout_secs),
            fail_on: self.verify.fail_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KilnConfig::default();
        assert_eq!(config.toolchain.compiler, "aiken");
        assert_eq!(config.toolchain.scanner, "aikido");
        assert_eq!(config.verify.stage_timeout_secs, 300);
        assert_eq!(config.verify.fail_on, Severity::High);
        assert_eq!(config.verify.on_failure, FailurePolicy::Reject);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"verify":{"on_failure":"report","fail_on":"critical"}}"#).unwrap();
        let config = KilnConfig::load(&path).unwrap();
        assert_eq!(config.verify.on_failure, FailurePolicy::Report);
        assert_eq!(config.verify.fail_on, Severity::Critical);
        assert_eq!(config.verify.stage_timeout_secs, 300);
        assert_eq!(config.toolchain.compiler, "aiken");
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = KilnConfig::default();
        config.verify.stage_timeout_secs = 30;
        config.toolchain.compiler = "/opt/aiken/bin/aiken".into();
        config.save(&path).unwrap();
        assert_eq!(KilnConfig::load(&path).unwrap(), config);
        assert_eq!(config.verifier_config().stage_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            KilnConfig::load(&missing),
            Err(KilnError::ConfigNotFound { .. })
        ));
        assert_eq!(KilnConfig::load_or_default(&missing).unwrap(), KilnConfig::default());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            KilnConfig::load_or_default(&bad),
            Err(KilnError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"verify":{"stage_timeout_secs":0}}"#).unwrap();
        let err = KilnConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, KilnError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("stage_timeout_secs"));

        std::fs::write(&path, r#"{"verify":{"stage_timeout_secs":1}}"#).unwrap();
        let config = KilnConfig::load(&path).unwrap();
        assert_eq!(config.verifier_config().stage_timeout, Duration::from_secs(1));
    }
}
