use std::path::Path;

use anyhow::Result;

use kiln_core::Kiln;

use crate::output;

/// Run compile, test and scan against an existing project directory.
pub async fn run(kiln: &Kiln, path: &Path, json: bool) -> Result<()> {
    if let Err(missing) = kiln.verifier().toolchain().check_prerequisites() {
        for m in &missing {
            output::print_warning(&format!(
                "Missing: {} - install: {}",
                m.tool_name, m.install_instructions
            ));
        }
    }

    let spinner = (!json).then(|| {
        output::print_header(&format!("kiln verify: {}", path.display()));
        output::spinner("running aiken build / aiken check / aikido")
    });
    let report = kiln.verify(path).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = report?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }

    if report.passed() {
        if !json {
            output::print_success("Verification passed");
        }
        Ok(())
    } else {
        anyhow::bail!("verification failed: {}", report.summary())
    }
}
