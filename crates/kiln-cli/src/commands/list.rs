use anyhow::Result;

use kiln_core::Kiln;

use crate::output;

pub fn run_templates(kiln: &Kiln, json: bool) -> Result<()> {
    let templates = kiln.list_templates();
    if json {
        println!("{}", serde_json::to_string_pretty(templates)?);
        return Ok(());
    }

    output::print_header("Templates");
    for t in templates {
        let sdk = if t.supports_sdk { " [sdk]" } else { "" };
        println!("  {:<20} {}{}", t.slug, t.description, sdk);
        if !t.allowed_options.is_empty() {
            let options: Vec<&str> = t.allowed_options.iter().map(|o| o.as_str()).collect();
            output::print_key_value("    options", &options.join(", "));
        }
    }
    Ok(())
}

pub fn run_features(kiln: &Kiln, json: bool) -> Result<()> {
    let features = kiln.list_features();
    if json {
        println!("{}", serde_json::to_string_pretty(features)?);
        return Ok(());
    }

    output::print_header("Features (custom template)");
    for f in features {
        let purpose = f.purpose.map_or("any", |p| p.as_str());
        println!("  {:<20} {:<6} {}", f.name, purpose, f.description);
        if !f.depends_on.is_empty() {
            output::print_key_value("    requires", &f.depends_on.join(", "));
        }
        if !f.conflicts_with.is_empty() {
            output::print_key_value("    conflicts", &f.conflicts_with.join(", "));
        }
    }
    Ok(())
}
