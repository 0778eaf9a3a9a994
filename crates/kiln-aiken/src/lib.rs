//! Aiken toolchain for kiln.
//!
//! Runs the real binaries behind the verification pipeline:
//! - compile: `aiken build`
//! - test: `aiken check` (builds again and runs every inline `test`)
//! - scan: `aikido <dir> --format json --quiet`
//!
//! Processes are spawned with `kill_on_drop`, so a stage timeout in the verifier also
//! terminates the tool.
//!
//! **Prerequisites**: `aiken`, `aikido`

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use kiln_core::config::ToolchainConfig;
use kiln_core::verifier::{PrerequisiteError, ToolOutput, Toolchain, VersionWarning};
use kiln_core::version::{detect_version, PINNED_COMPILER};

const AIKEN_INSTALL: &str = "curl --proto '=https' --tlsv1.2 -LsSf https://install.aiken-lang.org | sh && aikup";
const AIKIDO_INSTALL: &str = "cargo install aikido";

/// `aiken` + `aikido`, resolved from `PATH` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct AikenToolchain {
    compiler: String,
    scanner: String,
}

impl Default for AikenToolchain {
    fn default() -> Self {
        Self::from_config(&ToolchainConfig::default())
    }
}

impl AikenToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self {
            compiler: config.compiler.clone(),
            scanner: config.scanner.clone(),
        }
    }

    async fn run(&self, program: &str, args: &[&str], dir: &Path) -> std::io::Result<ToolOutput> {
        tracing::debug!(program, ?args, dir = %dir.display(), "running tool");
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ToolOutput::from_output(&output))
    }
}

#[async_trait]
impl Toolchain for AikenToolchain {
    fn name(&self) -> &'static str {
        "aiken"
    }

    fn check_prerequisites(&self) -> Result<(), Vec<PrerequisiteError>> {
        let mut missing = Vec::new();

        if which::which(&self.compiler).is_err() {
            missing.push(PrerequisiteError {
                tool_name: self.compiler.clone(),
                install_instructions: AIKEN_INSTALL.into(),
            });
        }

        if which::which(&self.scanner).is_err() {
            missing.push(PrerequisiteError {
                tool_name: self.scanner.clone(),
                install_instructions: AIKIDO_INSTALL.into(),
            });
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    async fn check_versions(&self) -> Vec<VersionWarning> {
        match detect_version(&self.compiler).await {
            Some(found) if found < PINNED_COMPILER => vec![VersionWarning {
                tool_name: self.compiler.clone(),
                found_version: found.to_string(),
                minimum_version: PINNED_COMPILER.to_string(),
            }],
            _ => vec![],
        }
    }

    async fn compile(&self, dir: &Path) -> std::io::Result<ToolOutput> {
        self.run(&self.compiler, &["build"], dir).await
    }

    async fn test(&self, dir: &Path) -> std::io::Result<ToolOutput> {
        self.run(&self.compiler, &["check"], dir).await
    }

    async fn scan(&self, dir: &Path) -> std::io::Result<ToolOutput> {
        let target = dir.to_string_lossy().into_owned();
        self.run(&self.scanner, &[target.as_str(), "--format", "json", "--quiet"], dir)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain(compiler: &str, scanner: &str) -> AikenToolchain {
        AikenToolchain::from_config(&ToolchainConfig {
            compiler: compiler.into(),
            scanner: scanner.into(),
        })
    }

    #[test]
    fn test_defaults() {
        let toolchain = AikenToolchain::new();
        assert_eq!(toolchain.compiler, "aiken");
        assert_eq!(toolchain.scanner, "aikido");
        assert_eq!(toolchain.name(), "aiken");
    }

    #[test]
    fn test_missing_prerequisites_reported() {
        let missing = toolchain("kiln_missing_compiler_xyz", "kiln_missing_scanner_xyz")
            .check_prerequisites()
            .unwrap_err();
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].tool_name, "kiln_missing_compiler_xyz");
        assert!(missing[0].install_instructions.contains("aikup"));
        assert!(missing[1].install_instructions.contains("aikido"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = toolchain("kiln_missing_compiler_xyz", "aikido")
            .compile(dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_versions_skip_undetectable_tools() {
        let warnings = toolchain("kiln_missing_compiler_xyz", "aikido")
            .check_versions()
            .await;
        assert!(warnings.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_captured() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = toolchain("true", "false");
        assert!(toolchain.compile(dir.path()).await.unwrap().success);
        assert!(toolchain.test(dir.path()).await.unwrap().success);
        assert!(!toolchain.scan(dir.path()).await.unwrap().success);
    }
}
