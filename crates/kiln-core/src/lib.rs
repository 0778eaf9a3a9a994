//! Core library for kiln, a generator of verified Aiken starter projects.
//!
//! The [`orchestrator::Kiln`] façade exposes every public operation. Underneath it:
//! - [`catalogue`]: the static template and feature registry
//! - [`spec_parser`]: the field-list and action-list DSL used by the custom template
//! - [`features`]: the feature dependency graph, resolver, and fragment composer
//! - [`generator`]: deterministic file rendering from embedded Handlebars templates
//! - [`verifier`]: the compile → test → scan pipeline behind the [`verifier::Toolchain`] trait
//!
//! The toolchain that actually runs `aiken` and `aikido` lives in the `kiln-aiken` crate.

pub mod catalogue;
pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod options;
pub mod orchestrator;
pub mod profile;
pub mod spec_parser;
pub mod templates;
pub mod verifier;
pub mod version;
pub mod workspace;

pub use error::{KilnError, Result};
pub use options::GenerateOptions;
pub use orchestrator::{Generation, Kiln, ValidationReport};
