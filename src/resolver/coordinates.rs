//! Resolution of nodes carrying a latitude/longitude pair.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ReconResult;
use crate::recon::{Batch, Coordinate, ReconClient, ResolveCoordinatesRequest};
use crate::value::PropertyValues;
use crate::vocabulary::{LATITUDE, LONGITUDE};

use super::state::{PendingKeys, ResolvedMap};
use super::{ResolveStats, Resolver};

/// Extracts the coordinate key of a node.
///
/// Both `latitude` and `longitude` must be present; for each, the first
/// `Number` or `Text` value parsing to a finite number is used. Values are
/// taken as-is: out-of-range latitudes are not rejected.
#[must_use]
pub fn extract_coordinate(node: &PropertyValues) -> Option<Coordinate> {
    let latitude = node.first_f64(LATITUDE)?;
    let longitude = node.first_f64(LONGITUDE)?;
    Some(Coordinate::new(latitude, longitude))
}

/// Resolves coordinates to places through the reconciliation service.
#[derive(Debug)]
pub struct CoordinatesResolver {
    run_id: Uuid,
    client: ReconClient,
    pending: PendingKeys<Coordinate>,
    resolved: ResolvedMap<Coordinate>,
    passes: AtomicU32,
}

impl CoordinatesResolver {
    /// Creates a resolver for one run.
    #[must_use]
    pub fn new(client: ReconClient) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            client,
            pending: PendingKeys::new(),
            resolved: ResolvedMap::new(),
            passes: AtomicU32::new(0),
        }
    }

    /// Id of this resolver instance.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Coordinates queued so far, in first-submission order.
    #[must_use]
    pub fn pending(&self) -> Vec<Coordinate> {
        self.pending.snapshot()
    }

    /// Number of coordinates with at least one candidate.
    #[must_use]
    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    /// All candidate places of a coordinate, in service order.
    #[must_use]
    pub fn candidates(&self, coordinate: &Coordinate) -> Option<Vec<String>> {
        self.resolved.candidates(coordinate)
    }
}

#[async_trait]
impl Resolver for CoordinatesResolver {
    fn name(&self) -> &'static str {
        "coordinates"
    }

    fn submit(&self, node: &PropertyValues) -> bool {
        let Some(coordinate) = extract_coordinate(node) else {
            return false;
        };
        self.pending.insert(coordinate);
        true
    }

    // TODO: pick among candidates by a preferred place-type list instead of taking the first.
    fn get_resolved(&self, node: &PropertyValues) -> Option<String> {
        extract_coordinate(node).and_then(|c| self.resolved.first(&c))
    }

    async fn resolve(&self) -> ReconResult<ResolveStats> {
        let started_at = Utc::now();
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        let keys = self.pending.snapshot();
        if keys.is_empty() {
            tracing::debug!(run_id = %self.run_id, "no coordinates to resolve");
            return Ok(ResolveStats::idle(self.name(), self.run_id, started_at));
        }
        if pass > 1 {
            tracing::debug!(run_id = %self.run_id, pass, "re-sending every queued coordinate");
        }

        let keys_sent = keys.len();
        let api_calls = keys_sent.div_ceil(self.client.chunk_size()) as u64;
        let response = self
            .client
            .resolve_coordinates(ResolveCoordinatesRequest::from_items(keys))
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    run_id = %self.run_id,
                    keys = keys_sent,
                    error = %e,
                    "coordinate resolution failed"
                );
            })?;

        let keys_resolved = self.resolved.fold(response.place_coordinates.into_iter().map(|pc| {
            let coordinate = pc.coordinate();
            (coordinate, pc.places.into_iter().map(|p| p.dcid).collect())
        }));

        tracing::info!(
            run_id = %self.run_id,
            keys = keys_sent,
            resolved = keys_resolved,
            api_calls,
            "resolved coordinates"
        );

        Ok(ResolveStats {
            resolver: self.name(),
            run_id: self.run_id,
            keys_sent,
            keys_resolved,
            api_calls,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
