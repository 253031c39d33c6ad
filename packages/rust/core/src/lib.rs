//! Definition coordination for compdef.
//!
//! This crate sequences the harvest, summary, aggregation, and curation
//! services into a single definition, caching uncurated results in a
//! [`DefinitionStore`](compdef_shared::DefinitionStore).

pub mod coordinator;
pub mod provenance;
pub mod source_location;

pub use coordinator::{Collaborators, DefinitionCoordinator};
pub use source_location::{GitHubInference, InferenceRegistry, SourceLocationInference};
