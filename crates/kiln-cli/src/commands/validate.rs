use anyhow::Result;

use kiln_core::Kiln;

use crate::output;
use crate::ProjectArgs;

/// Parse and resolve the configuration; exits non-zero when it is invalid.
pub fn run(kiln: &Kiln, args: &ProjectArgs, json: bool) -> Result<()> {
    let report = kiln.validate(&args.to_options(true));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        output::print_success("Configuration is valid");
    } else {
        for error in &report.errors {
            output::print_error(error);
        }
    }

    if !report.valid {
        anyhow::bail!("{} problem(s) found", report.errors.len());
    }
    Ok(())
}
