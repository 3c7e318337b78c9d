//! In-memory reconciliation backend.
//!
//! Answers requests from lookup tables instead of calling a remote service.
//! It is intended for embedded usage, tests, and as a reference for what the
//! service returns: every requested key gets an entry in the response, with an
//! empty candidate list when nothing is known about it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::vocabulary::DCID;

use super::transport::ReconTransport;
use super::wire::{
    Coordinate, IdWithProperty, Place, PlaceCoordinate, ResolveCoordinatesRequest,
    ResolveCoordinatesResponse, ResolveEntitiesRequest, ResolveEntitiesResponse, ResolvedEntity,
    ResolvedId,
};

#[derive(Debug, Default)]
struct Tables {
    places: HashMap<Coordinate, Vec<String>>,
    entities: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct Faults {
    coordinates: HashSet<Coordinate>,
    source_ids: HashSet<String>,
    delays: HashMap<Coordinate, Duration>,
}

/// Table-backed reconciliation service.
#[derive(Debug, Default)]
pub struct InMemoryRecon {
    tables: RwLock<Tables>,
    faults: RwLock<Faults>,
    request_sizes: Mutex<Vec<usize>>,
}

impl InMemoryRecon {
    /// Creates an empty service that resolves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the candidate places of a coordinate, in response order.
    #[must_use]
    pub fn with_places<I, S>(self, coordinate: Coordinate, dcids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .places
            .insert(coordinate, dcids.into_iter().map(Into::into).collect());
        self
    }

    /// Registers the canonical ids an external id resolves to, in response order.
    #[must_use]
    pub fn with_entity<I, S>(self, source_id: impl Into<String>, dcids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .insert(source_id.into(), dcids.into_iter().map(Into::into).collect());
        self
    }

    /// Makes every call whose request contains `coordinate` fail.
    #[must_use]
    pub fn failing_on_coordinate(self, coordinate: Coordinate) -> Self {
        self.faults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .coordinates
            .insert(coordinate);
        self
    }

    /// Makes every call whose request contains `source_id` fail.
    #[must_use]
    pub fn failing_on_source_id(self, source_id: impl Into<String>) -> Self {
        self.faults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .source_ids
            .insert(source_id.into());
        self
    }

    /// Delays every call whose request contains `coordinate` by `delay`.
    ///
    /// A call waits for the longest delay among its coordinates before it
    /// answers or fails.
    #[must_use]
    pub fn delaying_coordinate(self, coordinate: Coordinate, delay: Duration) -> Self {
        self.faults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delays
            .insert(coordinate, delay);
        self
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.request_sizes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Sizes of the requests received, sorted ascending.
    ///
    /// Chunks may arrive in any order, so arrival order is not reported.
    #[must_use]
    pub fn request_sizes(&self) -> Vec<usize> {
        let mut sizes = self
            .request_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sizes.sort_unstable();
        sizes
    }

    fn record(&self, size: usize) {
        self.request_sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(size);
    }
}

fn injected_failure(what: &str) -> TransportError {
    TransportError::ConnectionFailed {
        message: format!("injected failure for {what}"),
    }
}

#[async_trait]
impl ReconTransport for InMemoryRecon {
    async fn resolve_coordinates(
        &self,
        request: ResolveCoordinatesRequest,
    ) -> Result<ResolveCoordinatesResponse, TransportError> {
        self.record(request.coordinates.len());

        let (delay, failing) = {
            let faults = self.faults.read().unwrap_or_else(PoisonError::into_inner);
            let delay = request
                .coordinates
                .iter()
                .filter_map(|c| faults.delays.get(c).copied())
                .max();
            let failing = request
                .coordinates
                .iter()
                .find(|c| faults.coordinates.contains(*c))
                .copied();
            (delay, failing)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(c) = failing {
            return Err(injected_failure(&format!("({}, {})", c.latitude, c.longitude)));
        }

        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let place_coordinates = request
            .coordinates
            .iter()
            .map(|c| PlaceCoordinate {
                latitude: c.latitude,
                longitude: c.longitude,
                places: tables
                    .places
                    .get(c)
                    .map(|dcids| dcids.iter().map(|d| Place { dcid: d.clone() }).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(ResolveCoordinatesResponse { place_coordinates })
    }

    async fn resolve_entities(
        &self,
        request: ResolveEntitiesRequest,
    ) -> Result<ResolveEntitiesResponse, TransportError> {
        self.record(request.entities.len());

        {
            let faults = self.faults.read().unwrap_or_else(PoisonError::into_inner);
            let failing = request
                .entities
                .iter()
                .find(|e| faults.source_ids.contains(&e.source_id));
            if let Some(e) = failing {
                return Err(injected_failure(&e.source_id));
            }
        }

        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let resolved_entities = request
            .entities
            .iter()
            .map(|e| ResolvedEntity {
                source_id: e.source_id.clone(),
                resolved_ids: tables
                    .entities
                    .get(&e.source_id)
                    .map(|dcids| {
                        dcids
                            .iter()
                            .map(|d| ResolvedId {
                                ids: vec![IdWithProperty::new(DCID, d.clone())],
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        Ok(ResolveEntitiesResponse { resolved_entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recon::wire::EntitySubGraph;

    #[tokio::test]
    async fn answers_every_requested_coordinate() {
        let known = Coordinate::new(1.0, 2.0);
        let unknown = Coordinate::new(3.0, 4.0);
        let recon = InMemoryRecon::new().with_places(known, ["geoId/01", "country/USA"]);

        let response = recon
            .resolve_coordinates(ResolveCoordinatesRequest {
                coordinates: vec![known, unknown],
            })
            .await
            .unwrap();

        assert_eq!(response.place_coordinates.len(), 2);
        assert_eq!(response.place_coordinates[0].places[0].dcid, "geoId/01");
        assert!(response.place_coordinates[1].places.is_empty());
        assert_eq!(recon.calls(), 1);
        assert_eq!(recon.request_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn entity_resolution_returns_dcid_pairs() {
        let recon = InMemoryRecon::new().with_entity("isoCode:IN", ["country/IND"]);
        let response = recon
            .resolve_entities(ResolveEntitiesRequest {
                entities: vec![EntitySubGraph::from_external_id("isoCode", "IN")],
            })
            .await
            .unwrap();
        let ids = &response.resolved_entities[0].resolved_ids[0].ids;
        assert_eq!(ids[0], IdWithProperty::new("dcid", "country/IND"));
    }

    #[tokio::test]
    async fn injected_fault_fails_the_call() {
        let bad = Coordinate::new(9.0, 9.0);
        let recon = InMemoryRecon::new().failing_on_coordinate(bad);
        let err = recon
            .resolve_coordinates(ResolveCoordinatesRequest {
                coordinates: vec![Coordinate::new(1.0, 1.0), bad],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
        assert_eq!(recon.calls(), 1);
    }

    #[tokio::test]
    async fn delayed_coordinate_holds_the_call() {
        let slow = Coordinate::new(5.0, 5.0);
        let recon = InMemoryRecon::new().delaying_coordinate(slow, Duration::from_millis(50));
        let started = tokio::time::Instant::now();
        recon
            .resolve_coordinates(ResolveCoordinatesRequest {
                coordinates: vec![Coordinate::new(1.0, 1.0), slow],
            })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
