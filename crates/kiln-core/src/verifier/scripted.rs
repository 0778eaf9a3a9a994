//! A [`Toolchain`] that replays scripted outputs instead of running binaries.
//!
//! Used by the verifier's own tests and by integration tests that exercise the full
//! generate → verify path without `aiken` or `aikido` installed.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::toolchain::{PrerequisiteError, ToolOutput, Toolchain};
use super::Stage;

/// Scanner output for a clean project.
pub const CLEAN_SCAN: &str = r#"{"findings":[],"total":0}"#;

/// The scripted result of one tool invocation.
#[derive(Debug, Clone)]
pub struct Script {
    output: Option<ToolOutput>,
    delay: Option<Duration>,
}

impl Script {
    /// Exit zero with `stdout`.
    pub fn pass(stdout: &str) -> Self {
        Self::exit(true, stdout, "")
    }

    /// Exit non-zero with `stderr` and nothing on stdout.
    pub fn fail(stderr: &str) -> Self {
        Self::exit(false, "", stderr)
    }

    /// Exit non-zero with `stdout`, the way the scanner reports findings over its threshold.
    pub fn fail_with_stdout(stdout: &str) -> Self {
        Self::exit(false, stdout, "")
    }

    /// The tool cannot be started at all.
    pub fn spawn_error() -> Self {
        Self {
            output: None,
            delay: None,
        }
    }

    fn exit(success: bool, stdout: &str, stderr: &str) -> Self {
        Self {
            output: Some(ToolOutput {
                success,
                stdout: stdout.into(),
                stderr: stderr.into(),
            }),
            delay: None,
        }
    }

    /// Sleep before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn run(&self) -> std::io::Result<ToolOutput> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.output.clone().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "scripted tool not found")
        })
    }
}

/// Shared record of which stages were invoked, in order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Stage>>>);

impl CallLog {
    fn record(&self, stage: Stage) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(stage);
        }
    }

    pub fn snapshot(&self) -> Vec<Stage> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedToolchain {
    compile: Script,
    test: Script,
    scan: Script,
    calls: CallLog,
}

impl ScriptedToolchain {
    /// Every stage succeeds and the scan is clean.
    pub fn passing() -> Self {
        Self {
            compile: Script::pass(""),
            test: Script::pass(""),
            scan: Script::pass(CLEAN_SCAN),
            calls: CallLog::default(),
        }
    }

    pub fn with_compile(mut self, script: Script) -> Self {
        self.compile = script;
        self
    }

    pub fn with_test(mut self, script: Script) -> Self {
        self.test = script;
        self
    }

    pub fn with_scan(mut self, script: Script) -> Self {
        self.scan = script;
        self
    }

    /// A handle that keeps observing calls after the toolchain moves into a verifier.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }
}

#[async_trait]
impl Toolchain for ScriptedToolchain {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn check_prerequisites(&self) -> Result<(), Vec<PrerequisiteError>> {
        Ok(())
    }

    async fn compile(&self, _dir: &Path) -> std::io::Result<ToolOutput> {
        self.calls.record(Stage::Compile);
        self.compile.run().await
    }

    async fn test(&self, _dir: &Path) -> std::io::Result<ToolOutput> {
        self.calls.record(Stage::Test);
        self.test.run().await
    }

    async fn scan(&self, _dir: &Path) -> std::io::Result<ToolOutput> {
        self.calls.record(Stage::Scan);
        self.scan.run().await
    }
}
