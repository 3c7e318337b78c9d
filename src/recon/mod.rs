//! Client side of the reconciliation service.
//!
//! Wire shapes, the transport seam, the call counter, and the batch client
//! that chunks large requests into bounded outbound calls.

mod client;
mod counter;
mod memory;
mod transport;
mod wire;

pub use client::ReconClient;
pub use counter::{total_api_calls, ApiCallCounter};
pub use memory::InMemoryRecon;
pub use transport::{HttpTransport, ReconTransport, RESOLVE_COORDINATES_PATH, RESOLVE_ENTITIES_PATH};
pub use wire::{
    Batch, Coordinate, EntitySubGraph, IdWithProperty, Place, PlaceCoordinate,
    ResolveCoordinatesRequest, ResolveCoordinatesResponse, ResolveEntitiesRequest,
    ResolveEntitiesResponse, ResolvedEntity, ResolvedId,
};
