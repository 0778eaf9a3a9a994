use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use kiln_core::verifier::VerificationReport;
use kiln_core::{workspace, Generation, Kiln, KilnError};

use crate::output;
use crate::ProjectArgs;

#[derive(Serialize)]
struct Summary<'a> {
    output: &'a Path,
    fingerprint: String,
    files: Vec<&'a str>,
    report: &'a VerificationReport,
}

/// Generate a project and write it to disk.
///
/// Unless `--skip-verify` is given, the project is materialized in a temporary directory
/// and verified first; with the default `reject` policy nothing is written when any stage
/// fails.
pub async fn run(
    kiln: &Kiln,
    args: &ProjectArgs,
    sdk: bool,
    skip_verify: bool,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let options = args.to_options(skip_verify);
    let target: PathBuf = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&options.project_name));

    if !json {
        output::print_header(&format!("kiln generate: {} ({})", options.project_name, options.template));
    }

    // Checked again on write; this catches the common case before minutes of verification.
    workspace::ensure_writable(&target)?;

    if !skip_verify {
        let toolchain = kiln.verifier().toolchain();
        if let Err(missing) = toolchain.check_prerequisites() {
            for m in &missing {
                output::print_warning(&format!(
                    "Missing: {} - install: {}",
                    m.tool_name, m.install_instructions
                ));
            }
            if let Some(first) = missing.into_iter().next() {
                output::print_warning("Pass --skip-verify to generate without the toolchain");
                return Err(KilnError::MissingTool {
                    name: first.tool_name,
                    install: first.install_instructions,
                }
                .into());
            }
        }
        for w in toolchain.check_versions().await {
            output::print_warning(&format!(
                "{} {} is older than {} used by generated projects",
                w.tool_name, w.found_version, w.minimum_version
            ));
        }
    }

    let total = if skip_verify { 2 } else { 3 };
    if !json {
        output::print_step(1, total, "Rendering templates");
    }
    let spinner = (!skip_verify && !json).then(|| {
        output::print_step(2, total, "Verifying (compile, test, scan)");
        output::spinner("running aiken build / aiken check / aikido")
    });

    let result = if sdk {
        kiln.generate_sdk(&options).await
    } else {
        kiln.generate(&options).await
    };
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let Generation { project, report } = match result {
        Ok(generation) => generation,
        Err(KilnError::Verification(report)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&*report)?);
            } else {
                output::print_report(&report);
            }
            anyhow::bail!("verification failed, no files written");
        }
        Err(e) => return Err(e.into()),
    };

    if !json {
        if !report.is_skipped() {
            output::print_report(&report);
        }
        output::print_step(total, total, &format!("Writing files to {}", target.display()));
    }
    workspace::write_project(&project, &target)?;

    if json {
        let summary = Summary {
            output: &target,
            fingerprint: project.fingerprint(),
            files: project.paths().collect(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for path in project.paths() {
        output::print_key_value("file", path);
    }
    if let Some((stage, _)) = report.failure() {
        output::print_warning(&format!("{stage} stage failed; files written under the report policy"));
    } else if report.passed() {
        output::print_success(&format!("Project '{}' generated and verified", options.project_name));
    } else {
        output::print_success(&format!("Project '{}' generated (verification skipped)", options.project_name));
    }
    println!();
    println!("  Next steps:");
    println!("    cd {}", target.display());
    println!("    aiken check");
    println!();

    Ok(())
}
