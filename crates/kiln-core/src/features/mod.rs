//! Feature dependency graph, resolver, and fragment composer.
//!
//! [`FeatureGraph`] turns the catalogue's feature list into an index-based DAG at load
//! time. [`FeatureGraph::resolve`] computes the purpose-checked transitive closure of a
//! requested set along with a deterministic render order, and [`compose`] stitches the
//! resolved fragments into the pieces of a custom validator.

pub mod compose;
pub mod graph;

pub use compose::{compose, deadline_field, ComposedValidator, ValidatorNames};
pub use graph::{FeatureGraph, ResolvedFeatures};
