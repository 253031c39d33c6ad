//! Definition coordinator: cache-or-compute over the collaborator services.
//!
//! `get` → store hit, or `compute` → serialize → background store write.
//! `compute` → curation → harvest → summarize → aggregate → apply curation →
//! provenance and source-location annotation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use compdef_shared::{
    AggregationService, CompdefError, CoordinatorConfig, Coordinates, CurationRef,
    CurationService, DEFINITION_TOOL, DEFINITION_TOOL_VERSION, Definition, DefinitionStore,
    HarvestService, Result, StoreCoordinates, SummaryService,
};

use crate::provenance;
use crate::source_location::InferenceRegistry;

/// The services a coordinator composes.
#[derive(Clone)]
pub struct Collaborators {
    pub harvest: Arc<dyn HarvestService>,
    pub summary: Arc<dyn SummaryService>,
    pub aggregation: Arc<dyn AggregationService>,
    pub curation: Arc<dyn CurationService>,
    pub store: Arc<dyn DefinitionStore>,
}

/// Produces definitions for component coordinates, caching uncurated results.
pub struct DefinitionCoordinator {
    services: Collaborators,
    config: CoordinatorConfig,
    inference: InferenceRegistry,
    /// Background store writes not yet joined by [`flush`](Self::flush).
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl DefinitionCoordinator {
    /// Create a coordinator with the built-in source-location inferences.
    pub fn new(services: Collaborators, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            services,
            config,
            inference: InferenceRegistry::new(),
            pending_writes: Mutex::new(Vec::new()),
        })
    }

    /// Replace the source-location inference table.
    pub fn with_inference(mut self, inference: InferenceRegistry) -> Self {
        self.inference = inference;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Cache key for the stored definition of `coordinates`, under the fixed
    /// `definition` tool tag and version.
    pub fn store_coordinates(&self, coordinates: &Coordinates) -> StoreCoordinates {
        coordinates.to_store_coordinates(DEFINITION_TOOL, DEFINITION_TOOL_VERSION)
    }

    /// Definition for `coordinates`.
    ///
    /// With a curation reference the store is neither read nor written and
    /// the definition is always recomputed. Without one, a stored definition
    /// is returned as-is; a failed read counts as a miss and triggers
    /// [`compute_and_store`](Self::compute_and_store), unless
    /// `strict_reads` is set and the failure is not a genuine miss.
    #[instrument(skip_all, fields(coordinates = %coordinates, curated = curation.is_some()))]
    pub async fn get(
        &self,
        coordinates: &Coordinates,
        curation: Option<&CurationRef>,
    ) -> Result<Definition> {
        if curation.is_some() {
            debug!("curation override supplied, bypassing definition cache");
            return self.compute(coordinates, curation).await;
        }

        let store_coordinates = self.store_coordinates(coordinates);
        match self.services.store.get(&store_coordinates).await {
            Ok(definition) => {
                debug!("definition cache hit");
                Ok(definition)
            }
            Err(e) if e.is_not_found() => {
                debug!("definition cache miss");
                self.compute_and_store(coordinates, &store_coordinates).await
            }
            Err(e) if self.config.strict_reads => Err(e),
            Err(e) => {
                warn!(error = %e, "definition store read failed, recomputing");
                self.compute_and_store(coordinates, &store_coordinates).await
            }
        }
    }

    /// Definitions for every coordinate, keyed by entity key.
    ///
    /// At most `concurrency` lookups run at once; the rest start in input
    /// order as slots free up. Duplicate keys keep whichever lookup finished
    /// last. Any failure fails the whole batch.
    #[instrument(skip_all, fields(count = coordinates.len()))]
    pub async fn get_all(
        &self,
        coordinates: &[Coordinates],
    ) -> Result<HashMap<String, Definition>> {
        let start = Instant::now();

        let definitions: HashMap<String, Definition> = stream::iter(coordinates)
            .map(|c| async move {
                let definition = self.get(c, None).await?;
                Ok::<_, CompdefError>((c.entity_key(), definition))
            })
            .buffer_unordered(self.config.concurrency)
            .try_collect()
            .await?;

        info!(
            requested = coordinates.len(),
            returned = definitions.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "batch lookup complete"
        );

        Ok(definitions)
    }

    /// Compute an uncurated definition and hand it to the store without
    /// waiting for the write.
    ///
    /// Write failures are logged and dropped; the next `get` simply misses
    /// again.
    pub async fn compute_and_store(
        &self,
        coordinates: &Coordinates,
        store_coordinates: &StoreCoordinates,
    ) -> Result<Definition> {
        let definition = self.compute(coordinates, None).await?;
        let body = serde_json::to_vec_pretty(&definition)?;

        let store = Arc::clone(&self.services.store);
        let key = store_coordinates.clone();
        let handle = tokio::spawn(async move {
            match store.store(&key, body).await {
                Ok(()) => debug!(key = %key, "definition stored"),
                Err(e) => warn!(key = %key, error = %e, "failed to store definition"),
            }
        });

        let mut pending = self.pending_writes.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);

        Ok(definition)
    }

    /// Run the full pipeline for `coordinates`. Stages run in order and the
    /// first failure is returned unchanged.
    #[instrument(skip_all, fields(coordinates = %coordinates))]
    pub async fn compute(
        &self,
        coordinates: &Coordinates,
        curation: Option<&CurationRef>,
    ) -> Result<Definition> {
        let services = &self.services;

        let curation = services.curation.get(coordinates, curation).await?;
        let raw = services.harvest.get_all(coordinates).await?;
        debug!(tools = raw.len(), "harvest loaded");

        let summarized = services.summary.summarize_all(coordinates, &raw).await?;
        let aggregated = services
            .aggregation
            .process(coordinates, &summarized)
            .await?;

        let mut definition = services
            .curation
            .apply(coordinates, curation.as_ref(), aggregated)
            .await?;

        provenance::record_curation(&mut definition, curation.as_ref());
        self.inference
            .ensure_source_location(&mut definition, coordinates);

        Ok(definition)
    }

    /// Wait for every background store write started so far.
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.pending_writes.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "definition store task failed");
            }
        }
    }
}
