//! Scanner JSON output and the severity policy.
//!
//! The scanner prints `{"findings": [...], "total": N}`. It exits non-zero when its own
//! threshold is crossed, so a non-zero exit with parseable findings is a normal scan
//! result, while a non-zero exit with nothing to show for it is a tool failure.

use serde::Deserialize;

use super::{Finding, Severity, StageFailure, StageOutcome, ToolOutput};

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    findings: Vec<RawFinding>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    detector: String,
    severity: String,
    #[serde(alias = "description")]
    message: String,
    #[serde(default)]
    location: Option<String>,
}

impl From<RawFinding> for Finding {
    fn from(raw: RawFinding) -> Self {
        let severity = Severity::parse(&raw.severity).unwrap_or_else(|| {
            tracing::warn!(
                detector = %raw.detector,
                severity = %raw.severity,
                "unknown finding severity, treating as info"
            );
            Severity::Info
        });
        Finding {
            detector: raw.detector,
            severity,
            message: raw.message,
            location: raw.location,
        }
    }
}

/// Parse scanner output into findings, or a diagnostic for a scanner failure.
pub fn parse_output(out: &ToolOutput) -> Result<Vec<Finding>, String> {
    if out.stdout.trim().is_empty() {
        return Err(format!(
            "scanner produced no output (success: {}): {}",
            out.success,
            out.stderr.trim()
        ));
    }
    let report: RawReport = serde_json::from_str(&out.stdout)
        .map_err(|e| format!("unparseable scanner output: {e}\n{}", out.diagnostic()))?;
    if !out.success && report.findings.is_empty() {
        return Err(format!(
            "scanner exited non-zero without findings: {}",
            out.diagnostic()
        ));
    }
    Ok(report.findings.into_iter().map(Finding::from).collect())
}

/// Fail the scan when any finding reaches `fail_on`.
pub fn evaluate(findings: &[Finding], fail_on: Severity) -> StageOutcome {
    let blocking: Vec<Finding> = findings
        .iter()
        .filter(|f| f.severity >= fail_on)
        .cloned()
        .collect();
    if blocking.is_empty() {
        StageOutcome::Passed
    } else {
        StageOutcome::Failed(StageFailure::SecurityFindings(blocking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str) -> ToolOutput {
        ToolOutput {
            success,
            stdout: stdout.into(),
            stderr: "stderr text".into(),
        }
    }

    fn finding(severity: Severity) -> Finding {
        Finding {
            detector: "d".into(),
            severity,
            message: "m".into(),
            location: None,
        }
    }

    #[test]
    fn test_empty_stdout_is_failure() {
        let err = parse_output(&output(false, "  ")).unwrap_err();
        assert!(err.contains("no output"));
        assert!(err.contains("stderr text"));
    }

    #[test]
    fn test_invalid_json_is_failure() {
        let err = parse_output(&output(true, "not-json")).unwrap_err();
        assert!(err.contains("unparseable"));
    }

    #[test]
    fn test_non_zero_with_findings_parses() {
        let json = r#"{"findings":[{"detector":"double-satisfaction","severity":"Critical","description":"x","location":"validators/a.ak:12"}],"total":1}"#;
        let findings = parse_output(&output(false, json)).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].message, "x");
        assert_eq!(findings[0].location.as_deref(), Some("validators/a.ak:12"));
    }

    #[test]
    fn test_non_zero_without_findings_is_failure() {
        let err = parse_output(&output(false, r#"{"findings":[],"total":0}"#)).unwrap_err();
        assert!(err.contains("without findings"));
    }

    #[test]
    fn test_clean_scan() {
        assert!(parse_output(&output(true, r#"{"findings":[]}"#)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_severity_is_info() {
        let json = r#"{"findings":[{"detector":"d","severity":"spicy","message":"m"}]}"#;
        let findings = parse_output(&output(true, json)).unwrap();
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_policy_boundary() {
        assert_eq!(
            evaluate(&[finding(Severity::Medium)], Severity::High),
            StageOutcome::Passed
        );
        assert_eq!(
            evaluate(&[finding(Severity::High)], Severity::High),
            StageOutcome::Failed(StageFailure::SecurityFindings(vec![finding(Severity::High)]))
        );
        let outcome = evaluate(
            &[finding(Severity::Low), finding(Severity::Critical)],
            Severity::High,
        );
        assert_eq!(
            outcome,
            StageOutcome::Failed(StageFailure::SecurityFindings(vec![finding(Severity::Critical)]))
        );
    }
}
