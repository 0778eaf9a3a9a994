//! The [`Kiln`] façade: the core's public operations.
//!
//! `generate` sequences option validation, DSL parsing and feature resolution (inside
//! [`ResolvedOptions::resolve`]), rendering, and verification. Any failure stops the
//! sequence and comes back as a [`KilnError`]; no partial file set ever leaves here.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::catalogue::{self, Feature, Template};
use crate::config::{FailurePolicy, KilnConfig};
use crate::error::{KilnError, Result, ValidationError};
use crate::generator::{GeneratedProject, ProjectRenderer};
use crate::options::{self, GenerateOptions, ResolvedOptions};
use crate::verifier::{Toolchain, VerificationReport, Verifier};

/// Result of [`Kiln::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A generated project and the verification report that gated it.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub project: GeneratedProject,
    /// All stages `Skipped` when verification was disabled.
    pub report: VerificationReport,
}

pub struct Kiln {
    renderer: ProjectRenderer,
    verifier: Verifier,
    on_failure: FailurePolicy,
}

impl Kiln {
    pub fn new(config: &KilnConfig, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            renderer: ProjectRenderer::new(),
            verifier: Verifier::new(toolchain, config.verifier_config()),
            on_failure: config.verify.on_failure,
        }
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn list_templates(&self) -> &'static [Template] {
        catalogue::templates()
    }

    pub fn get_template_info(&self, slug: &str) -> std::result::Result<&'static Template, ValidationError> {
        catalogue::template(slug)
    }

    pub fn list_features(&self) -> &'static [Feature] {
        catalogue::features()
    }

    /// Parse and resolve without rendering; every independent problem is reported.
    pub fn validate(&self, options: &GenerateOptions) -> ValidationReport {
        let errors = options::diagnose(options);
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub async fn generate(&self, options: &GenerateOptions) -> Result<Generation> {
        let resolved = ResolvedOptions::resolve(options)?;
        let project = self.renderer.render(&resolved)?;
        self.gate(&resolved, project).await
    }

    /// Like [`Kiln::generate`], plus the TypeScript SDK under `sdk/`.
    pub async fn generate_sdk(&self, options: &GenerateOptions) -> Result<Generation> {
        let resolved = ResolvedOptions::resolve(options)?;
        let project = self.renderer.render_sdk(&resolved)?;
        self.gate(&resolved, project).await
    }

    /// Run the full pipeline against an existing project directory.
    ///
    /// Always runs all three stages; `skip_verify` only applies to generation.
    pub async fn verify(&self, path: &Path) -> Result<VerificationReport> {
        if !path.is_dir() {
            return Err(ValidationError::ProjectNotFound(path.to_path_buf()).into());
        }
        Ok(self.verifier.verify_dir(path).await)
    }

    async fn gate(&self, resolved: &ResolvedOptions, project: GeneratedProject) -> Result<Generation> {
        if resolved.skip_verify {
            tracing::info!(template = resolved.template.slug, "verification skipped");
            return Ok(Generation {
                project,
                report: VerificationReport::skipped(),
            });
        }

        let report = self.verifier.verify_project(&project).await?;
        if report.failure().is_some() && self.on_failure == FailurePolicy::Reject {
            tracing::warn!(summary = %report.summary(), "generated project rejected");
            return Err(KilnError::Verification(Box::new(report)));
        }
        Ok(Generation { project, report })
    }
}
