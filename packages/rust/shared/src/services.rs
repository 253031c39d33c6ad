//! Collaborator contracts consumed by the definition coordinator.
//!
//! Implementations are shared across concurrent calls, so every trait is
//! `Send + Sync` and object safe (`Arc<dyn HarvestService>` etc.).

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Coordinates, Curation, CurationRef, Definition, HarvestData, StoreCoordinates,
    SummarizedData,
};

/// Source of raw per-tool facts about a component.
#[async_trait]
pub trait HarvestService: Send + Sync {
    /// All harvested tool output for `coordinates`. Fails when nothing has
    /// been harvested.
    async fn get_all(&self, coordinates: &Coordinates) -> Result<HarvestData>;
}

/// Normalizes raw harvest output into per-tool summaries.
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn summarize_all(
        &self,
        coordinates: &Coordinates,
        raw: &HarvestData,
    ) -> Result<SummarizedData>;
}

/// Merges per-tool summaries into a single view.
#[async_trait]
pub trait AggregationService: Send + Sync {
    async fn process(
        &self,
        coordinates: &Coordinates,
        summarized: &SummarizedData,
    ) -> Result<Definition>;
}

/// Resolves and applies curations.
#[async_trait]
pub trait CurationService: Send + Sync {
    /// Resolve `reference` (or the component's accepted curation when
    /// `None`) to a curation, if one exists.
    async fn get(
        &self,
        coordinates: &Coordinates,
        reference: Option<&CurationRef>,
    ) -> Result<Option<Curation>>;

    /// Apply `curation` to the aggregated view. Must return `aggregated`
    /// unchanged when `curation` is `None`.
    async fn apply(
        &self,
        coordinates: &Coordinates,
        curation: Option<&Curation>,
        aggregated: Definition,
    ) -> Result<Definition>;
}

/// Persistent cache of computed definitions.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Previously stored definition. Any error signals "not found" to the
    /// coordinator; implementations should use
    /// [`CompdefError::NotFound`](crate::CompdefError::NotFound) for a
    /// genuine miss.
    async fn get(&self, coordinates: &StoreCoordinates) -> Result<Definition>;

    /// Persist a serialized definition.
    async fn store(&self, coordinates: &StoreCoordinates, body: Vec<u8>) -> Result<()>;
}
