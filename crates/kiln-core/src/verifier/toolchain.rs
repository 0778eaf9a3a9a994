use std::path::Path;

use async_trait::async_trait;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_output(output: &std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Non-empty stdout and stderr, trimmed and joined.
    pub fn diagnostic(&self) -> String {
        [self.stdout.trim(), self.stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Information about a missing prerequisite tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteError {
    pub tool_name: String,
    pub install_instructions: String,
}

/// Warning about a tool version below the one generated projects target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionWarning {
    pub tool_name: String,
    pub found_version: String,
    pub minimum_version: String,
}

/// The external compiler, test runner and scanner behind the verification pipeline.
///
/// Implementations only run the tools and capture their output; judging the output is the
/// verifier's job. An `Err` means the tool could not be run at all.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Check that all required external tools are installed.
    fn check_prerequisites(&self) -> Result<(), Vec<PrerequisiteError>>;

    /// Check installed tool versions against the versions generated projects pin.
    ///
    /// Tools whose version cannot be detected are skipped silently.
    async fn check_versions(&self) -> Vec<VersionWarning> {
        vec![]
    }

    /// Compile the project in `dir`.
    async fn compile(&self, dir: &Path) -> std::io::Result<ToolOutput>;

    /// Run the project's inline tests.
    async fn test(&self, dir: &Path) -> std::io::Result<ToolOutput>;

    /// Run the static analyzer with machine-readable output on stdout.
    async fn scan(&self, dir: &Path) -> std::io::Result<ToolOutput>;
}
