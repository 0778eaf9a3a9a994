//! Template system for generated Aiken projects.
//!
//! Templates are embedded into the binary at compile time via [`include_str!`] in the
//! [`embedded`] module, then rendered with Handlebars through
//! [`renderer::TemplateRenderer`].
//!
//! ## Template variables
//!
//! Every catalogue template receives the same context, so strict mode never trips over a
//! toggle that only one template reads:
//! - `{{namespace}}`, `{{project_name}}`, `{{module_path}}` (`namespace/project_name`)
//! - `{{validator_name}}`: validator module and blueprint name
//! - `{{token_name}}`, `{{asset_name}}`, `{{time_lock}}` (simple_mint)
//! - `{{cancellable}}`, `{{partial_claim}}` (vesting)
//!
//! **Warning**: files under `templates/` and the constants in [`embedded`] must stay in
//! sync. The `include_str!` paths are checked at compile time.

pub mod embedded;
pub mod renderer;
