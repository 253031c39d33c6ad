//! Shared types, error model, configuration, and collaborator contracts for compdef.
//!
//! This crate is the foundation depended on by all other compdef crates.
//! It provides:
//! - [`CompdefError`] — the unified error type
//! - Domain types ([`Coordinates`], [`StoreCoordinates`], [`Curation`], [`Definition`])
//! - Configuration ([`AppConfig`], [`CoordinatorConfig`], config loading)
//! - Collaborator traits ([`HarvestService`], [`DefinitionStore`], ...)

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheSection, CoordinatorConfig, CoordinatorSection, StorageSection, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CompdefError, Result};
pub use services::{
    AggregationService, CurationService, DefinitionStore, HarvestService, SummaryService,
};
pub use types::{
    Coordinates, Curation, CurationRef, DEFINITION_TOOL, DEFINITION_TOOL_VERSION, Definition,
    Described, HarvestData, SourceLocation, StoreCoordinates, SummarizedData,
};
