//! Compile → test → scan verification pipeline.
//!
//! The [`Verifier`] drives a [`Toolchain`] through three strictly sequential stages
//! against one project directory:
//!
//! ```text
//! Pending ──► Compiling ──► Testing ──► Scanning ──► Passed
//!    │            │            │            │
//!    │            └────────────┴────────────┴──────► Failed
//!    └──────────────────────────────────────────────► Skipped
//! ```
//!
//! The first failing stage halts the pipeline; later stages are reported as
//! [`StageOutcome::Skipped`]. Every stage invocation runs under its own timeout, and expiry
//! is reported as [`StageFailure::Timeout`] rather than as a tool failure. Nothing here
//! returns an error for a tool that misbehaves: the outcome is always a
//! [`VerificationReport`].

pub mod scan;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
pub mod toolchain;

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generator::GeneratedProject;
use crate::workspace;

pub use toolchain::{PrerequisiteError, ToolOutput, Toolchain, VersionWarning};

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compile,
    Test,
    Scan,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Compile, Stage::Test, Stage::Scan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Compile => "compile",
            Stage::Test => "test",
            Stage::Scan => "scan",
        }
    }

    /// The state the verifier is in while this stage runs.
    pub fn state(&self) -> VerifierState {
        match self {
            Stage::Compile => VerifierState::Compiling,
            Stage::Test => VerifierState::Testing,
            Stage::Scan => VerifierState::Scanning,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierState {
    Pending,
    Compiling,
    Testing,
    Scanning,
    Passed,
    Failed,
    Skipped,
}

/// Scanner finding severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Case-insensitive; `None` for anything outside the five levels.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" | "informational" => Some(Severity::Info),
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single static-analysis finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub detector: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity.as_str().to_uppercase(),
            self.detector,
            self.message
        )?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

/// Why a stage failed. Diagnostics carry the tool's own output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StageFailure {
    CompileError(String),
    TestError(String),
    ScanToolError(String),
    /// Findings at or above the configured threshold.
    SecurityFindings(Vec<Finding>),
    Timeout(Stage),
}

impl StageFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            StageFailure::CompileError(_) => "compile_error",
            StageFailure::TestError(_) => "test_error",
            StageFailure::ScanToolError(_) => "scan_tool_error",
            StageFailure::SecurityFindings(_) => "security_findings",
            StageFailure::Timeout(_) => "timeout",
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailure::CompileError(d) => write!(f, "compile error: {d}"),
            StageFailure::TestError(d) => write!(f, "test failure: {d}"),
            StageFailure::ScanToolError(d) => write!(f, "scanner failed: {d}"),
            StageFailure::SecurityFindings(findings) => {
                write!(f, "{} blocking finding(s)", findings.len())?;
                for finding in findings {
                    write!(f, "\n  {finding}")?;
                }
                Ok(())
            }
            StageFailure::Timeout(stage) => write!(f, "{stage} stage timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "lowercase")]
pub enum StageOutcome {
    Passed,
    Failed(StageFailure),
    Skipped,
}

impl StageOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StageOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

/// Outcome of one pipeline run, one entry per stage in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub stages: Vec<StageResult>,
    /// Every finding the scan reported, blocking or not.
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    /// A report for a pipeline that was never started.
    pub fn skipped() -> Self {
        Self {
            stages: Stage::ALL
                .iter()
                .map(|&stage| StageResult {
                    stage,
                    outcome: StageOutcome::Skipped,
                })
                .collect(),
            findings: Vec::new(),
        }
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    /// The first failing stage, if any.
    pub fn failure(&self) -> Option<(Stage, &StageFailure)> {
        self.stages.iter().find_map(|r| match &r.outcome {
            StageOutcome::Failed(failure) => Some((r.stage, failure)),
            _ => None,
        })
    }

    pub fn passed(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(|r| r.outcome.is_passed())
    }

    pub fn is_skipped(&self) -> bool {
        self.stages
            .iter()
            .all(|r| matches!(r.outcome, StageOutcome::Skipped))
    }

    /// Terminal state of the run.
    pub fn state(&self) -> VerifierState {
        if self.failure().is_some() {
            VerifierState::Failed
        } else if self.passed() {
            VerifierState::Passed
        } else {
            VerifierState::Skipped
        }
    }

    /// One line per stage, e.g. `compile passed, test failed (test failure: ...), scan skipped`.
    pub fn summary(&self) -> String {
        self.stages
            .iter()
            .map(|r| match &r.outcome {
                StageOutcome::Passed => format!("{} passed", r.stage),
                StageOutcome::Skipped => format!("{} skipped", r.stage),
                StageOutcome::Failed(failure) => format!("{} failed ({failure})", r.stage),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Pipeline knobs, usually taken from [`KilnConfig`](crate::config::KilnConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Applied to each tool invocation separately.
    pub stage_timeout: Duration,
    /// Findings at or above this severity fail the scan stage.
    pub fail_on: Severity,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(300),
            fail_on: Severity::High,
        }
    }
}

/// Runs the pipeline through a [`Toolchain`].
///
/// Holds no per-run state, so one verifier can serve concurrent runs on distinct
/// directories.
#[derive(Clone)]
pub struct Verifier {
    toolchain: Arc<dyn Toolchain>,
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(toolchain: Arc<dyn Toolchain>, config: VerifierConfig) -> Self {
        Self { toolchain, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Materialize `project` into a fresh temporary directory and verify it there.
    ///
    /// The directory is removed when verification finishes.
    pub async fn verify_project(&self, project: &GeneratedProject) -> Result<VerificationReport> {
        let dir = workspace::materialize_temp(project)?;
        Ok(self.verify_dir(dir.path()).await)
    }

    /// Run all three stages against an existing project directory.
    pub async fn verify_dir(&self, dir: &Path) -> VerificationReport {
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let mut findings = Vec::new();
        let mut halted = false;

        for stage in Stage::ALL {
            if halted {
                stages.push(StageResult {
                    stage,
                    outcome: StageOutcome::Skipped,
                });
                continue;
            }

            tracing::info!(state = ?stage.state(), dir = %dir.display(), "verification stage started");
            let outcome = match stage {
                Stage::Compile => self
                    .invoke(stage, self.toolchain.compile(dir))
                    .await
                    .map_or_else(StageOutcome::Failed, |out| {
                        exit_outcome(out, StageFailure::CompileError)
                    }),
                Stage::Test => self
                    .invoke(stage, self.toolchain.test(dir))
                    .await
                    .map_or_else(StageOutcome::Failed, |out| {
                        exit_outcome(out, StageFailure::TestError)
                    }),
                Stage::Scan => match self.invoke(stage, self.toolchain.scan(dir)).await {
                    Ok(out) => match scan::parse_output(&out) {
                        Ok(reported) => {
                            let outcome = scan::evaluate(&reported, self.config.fail_on);
                            findings = reported;
                            outcome
                        }
                        Err(diagnostic) => {
                            StageOutcome::Failed(StageFailure::ScanToolError(diagnostic))
                        }
                    },
                    Err(failure) => StageOutcome::Failed(failure),
                },
            };

            match &outcome {
                StageOutcome::Failed(failure) => {
                    tracing::info!(%stage, kind = failure.kind(), "verification stage failed");
                    halted = true;
                }
                _ => tracing::info!(%stage, "verification stage passed"),
            }
            stages.push(StageResult { stage, outcome });
        }

        let report = VerificationReport { stages, findings };
        tracing::info!(state = ?report.state(), "verification finished");
        report
    }

    /// Await one tool invocation under the stage timeout.
    ///
    /// Spawn failures map to the stage's own failure kind; expiry maps to
    /// [`StageFailure::Timeout`].
    async fn invoke<F>(&self, stage: Stage, call: F) -> std::result::Result<ToolOutput, StageFailure>
    where
        F: Future<Output = std::io::Result<ToolOutput>>,
    {
        match tokio::time::timeout(self.config.stage_timeout, call).await {
            Err(_) => {
                tracing::warn!(%stage, timeout = ?self.config.stage_timeout, "tool invocation timed out");
                Err(StageFailure::Timeout(stage))
            }
            Ok(Err(e)) => {
                let diagnostic = format!("failed to run {}: {e}", self.toolchain.name());
                Err(match stage {
                    Stage::Compile => StageFailure::CompileError(diagnostic),
                    Stage::Test => StageFailure::TestError(diagnostic),
                    Stage::Scan => StageFailure::ScanToolError(diagnostic),
                })
            }
            Ok(Ok(out)) => {
                tracing::debug!(%stage, success = out.success, stdout = %out.stdout, stderr = %out.stderr, "tool output");
                Ok(out)
            }
        }
    }
}

fn exit_outcome(out: ToolOutput, fail: fn(String) -> StageFailure) -> StageOutcome {
    if out.success {
        StageOutcome::Passed
    } else {
        StageOutcome::Failed(fail(out.diagnostic()))
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::{Script, ScriptedToolchain};
    use super::*;

    fn verifier(toolchain: ScriptedToolchain) -> Verifier {
        Verifier::new(
            Arc::new(toolchain),
            VerifierConfig {
                stage_timeout: Duration::from_millis(200),
                fail_on: Severity::High,
            },
        )
    }

    fn scan_json(severity: &str) -> String {
        format!(
            r#"{{"findings":[{{"detector":"missing-signature-check","severity":"{severity}","message":"m"}}],"total":1}}"#
        )
    }

    #[tokio::test]
    async fn test_all_stages_pass() {
        let report = verifier(ScriptedToolchain::passing()).verify_dir(Path::new(".")).await;
        assert!(report.passed());
        assert_eq!(report.state(), VerifierState::Passed);
        assert_eq!(report.summary(), "compile passed, test passed, scan passed");
    }

    #[tokio::test]
    async fn test_compile_failure_short_circuits() {
        let toolchain = ScriptedToolchain::passing().with_compile(Script::fail("unexpected token"));
        let calls = toolchain.calls();
        let report = verifier(toolchain).verify_dir(Path::new(".")).await;

        assert_eq!(
            report.outcome(Stage::Compile),
            Some(&StageOutcome::Failed(StageFailure::CompileError(
                "unexpected token".into()
            )))
        );
        assert_eq!(report.outcome(Stage::Test), Some(&StageOutcome::Skipped));
        assert_eq!(report.outcome(Stage::Scan), Some(&StageOutcome::Skipped));
        assert_eq!(calls.snapshot(), vec![Stage::Compile]);
        assert_eq!(report.state(), VerifierState::Failed);
    }

    #[tokio::test]
    async fn test_test_failure_skips_scan() {
        let toolchain = ScriptedToolchain::passing().with_test(Script::fail("1 test failed"));
        let calls = toolchain.calls();
        let report = verifier(toolchain).verify_dir(Path::new(".")).await;
        assert!(matches!(
            report.failure(),
            Some((Stage::Test, StageFailure::TestError(_)))
        ));
        assert_eq!(calls.snapshot(), vec![Stage::Compile, Stage::Test]);
    }

    #[tokio::test]
    async fn test_medium_finding_passes_high_fails() {
        let medium = ScriptedToolchain::passing().with_scan(Script::pass(&scan_json("medium")));
        let report = verifier(medium).verify_dir(Path::new(".")).await;
        assert_eq!(report.outcome(Stage::Scan), Some(&StageOutcome::Passed));
        assert_eq!(report.findings.len(), 1);

        let high = ScriptedToolchain::passing().with_scan(Script::fail_with_stdout(&scan_json("high")));
        let report = verifier(high).verify_dir(Path::new(".")).await;
        match report.outcome(Stage::Scan) {
            Some(StageOutcome::Failed(StageFailure::SecurityFindings(findings))) => {
                assert_eq!(findings.len(), 1);
                assert_eq!(findings[0].severity, Severity::High);
            }
            other => panic!("unexpected scan outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scanner_crash_is_tool_error() {
        let toolchain = ScriptedToolchain::passing().with_scan(Script::fail("segfault"));
        let report = verifier(toolchain).verify_dir(Path::new(".")).await;
        assert!(matches!(
            report.failure(),
            Some((Stage::Scan, StageFailure::ScanToolError(_)))
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let toolchain =
            ScriptedToolchain::passing().with_test(Script::pass("").delayed(Duration::from_secs(5)));
        let report = verifier(toolchain).verify_dir(Path::new(".")).await;
        assert_eq!(
            report.outcome(Stage::Test),
            Some(&StageOutcome::Failed(StageFailure::Timeout(Stage::Test)))
        );
        assert_eq!(report.outcome(Stage::Scan), Some(&StageOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_spawn_error_maps_to_stage_failure() {
        let toolchain = ScriptedToolchain::passing().with_compile(Script::spawn_error());
        let report = verifier(toolchain).verify_dir(Path::new(".")).await;
        match report.failure() {
            Some((Stage::Compile, StageFailure::CompileError(d))) => {
                assert!(d.contains("failed to run scripted"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_project_materializes() {
        let mut project = GeneratedProject::new();
        project
            .push(crate::generator::GeneratedFile::new("aiken.toml", "name = \"a/b\"\n"))
            .unwrap();
        let report = verifier(ScriptedToolchain::passing())
            .verify_project(&project)
            .await
            .unwrap();
        assert!(report.passed());
    }

    #[test]
    fn test_skipped_report() {
        let report = VerificationReport::skipped();
        assert!(report.is_skipped());
        assert!(!report.passed());
        assert_eq!(report.state(), VerifierState::Skipped);
        assert_eq!(report.stages.len(), 3);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::parse("catastrophic"), None);
    }

    #[test]
    fn test_report_serializes_with_status_tags() {
        let report = VerificationReport {
            stages: vec![StageResult {
                stage: Stage::Compile,
                outcome: StageOutcome::Failed(StageFailure::CompileError("boom".into())),
            }],
            findings: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stages"][0]["stage"], "compile");
        assert_eq!(json["stages"][0]["status"], "failed");
        assert_eq!(json["stages"][0]["failure"]["kind"], "compile_error");
    }
}
