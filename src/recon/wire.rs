//! Request and response shapes exchanged with the reconciliation service.
//!
//! Field names follow the service's JSON (camelCase). Absent lists decode as
//! empty lists.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
///
/// Equality and hashing are exact and bitwise: two coordinates written with
/// different precision are different keys, and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn bits(self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// A property/value pair identifying an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdWithProperty {
    /// Property name, e.g. `isoCode` or `dcid`.
    pub prop: String,
    /// Property value.
    pub val: String,
}

impl IdWithProperty {
    /// Creates a pair.
    #[must_use]
    pub fn new(prop: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            val: val.into(),
        }
    }
}

/// Batch of coordinates to resolve to places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCoordinatesRequest {
    /// Coordinates to resolve, in request order.
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
}

/// A place candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Canonical id of the place.
    pub dcid: String,
}

/// Candidate places for one requested coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCoordinate {
    /// Latitude echoed from the request.
    pub latitude: f64,
    /// Longitude echoed from the request.
    pub longitude: f64,
    /// Candidate places, in service order.
    #[serde(default)]
    pub places: Vec<Place>,
}

impl PlaceCoordinate {
    /// The coordinate this entry answers.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Response to [`ResolveCoordinatesRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCoordinatesResponse {
    /// One entry per requested coordinate.
    #[serde(default)]
    pub place_coordinates: Vec<PlaceCoordinate>,
}

/// An entity to resolve, keyed by its source id (`<prop>:<val>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySubGraph {
    /// Caller-chosen key echoed in the response.
    pub source_id: String,
    /// Identifying property/value pairs.
    #[serde(default)]
    pub properties: Vec<IdWithProperty>,
}

impl EntitySubGraph {
    /// Entity identified by a single external id.
    #[must_use]
    pub fn from_external_id(prop: &str, val: &str) -> Self {
        Self {
            source_id: format!("{prop}:{val}"),
            properties: vec![IdWithProperty::new(prop, val)],
        }
    }
}

/// Batch of entities to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveEntitiesRequest {
    /// Entities to resolve, in request order.
    #[serde(default)]
    pub entities: Vec<EntitySubGraph>,
}

/// One group of ids the service resolved an entity to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedId {
    /// Ids of the resolved entity, `dcid` among them.
    #[serde(default)]
    pub ids: Vec<IdWithProperty>,
}

/// Resolution outcome for one source id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntity {
    /// Source id from the request.
    pub source_id: String,
    /// Candidate entities, in service order.
    #[serde(default)]
    pub resolved_ids: Vec<ResolvedId>,
}

/// Response to [`ResolveEntitiesRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveEntitiesResponse {
    /// One entry per requested entity.
    #[serde(default)]
    pub resolved_entities: Vec<ResolvedEntity>,
}

/// A request or response made of a flat list of items that can be split
/// into chunks and concatenated back without changing its meaning.
pub trait Batch: Sized {
    /// Element type of the list.
    type Item;

    /// Consumes the batch into its items, in order.
    fn into_items(self) -> Vec<Self::Item>;

    /// Builds a batch from items, keeping their order.
    fn from_items(items: Vec<Self::Item>) -> Self;
}

impl Batch for ResolveCoordinatesRequest {
    type Item = Coordinate;

    fn into_items(self) -> Vec<Coordinate> {
        self.coordinates
    }

    fn from_items(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }
}

impl Batch for ResolveCoordinatesResponse {
    type Item = PlaceCoordinate;

    fn into_items(self) -> Vec<PlaceCoordinate> {
        self.place_coordinates
    }

    fn from_items(place_coordinates: Vec<PlaceCoordinate>) -> Self {
        Self { place_coordinates }
    }
}

impl Batch for ResolveEntitiesRequest {
    type Item = EntitySubGraph;

    fn into_items(self) -> Vec<EntitySubGraph> {
        self.entities
    }

    fn from_items(entities: Vec<EntitySubGraph>) -> Self {
        Self { entities }
    }
}

impl Batch for ResolveEntitiesResponse {
    type Item = ResolvedEntity;

    fn into_items(self) -> Vec<ResolvedEntity> {
        self.resolved_entities
    }

    fn from_items(resolved_entities: Vec<ResolvedEntity>) -> Self {
        Self { resolved_entities }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn coordinate_equality_is_exact() {
        assert_eq!(Coordinate::new(37.77493, -122.41942), Coordinate::new(37.77493, -122.41942));
        assert_ne!(
            Coordinate::new(37.77493, -122.41942),
            Coordinate::new(37.774_930_1, -122.41942)
        );
        assert_ne!(Coordinate::new(0.0, 0.0), Coordinate::new(-0.0, 0.0));

        let mut set = HashSet::new();
        assert!(set.insert(Coordinate::new(1.0, 2.0)));
        assert!(!set.insert(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn coordinates_request_json_shape() {
        let request = ResolveCoordinatesRequest {
            coordinates: vec![Coordinate::new(51.510357, -0.116773)],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["coordinates"][0]["latitude"], 51.510357);
        assert_eq!(json["coordinates"][0]["longitude"], -0.116773);
    }

    #[test]
    fn coordinates_response_decodes_camel_case() {
        let body = r#"{"placeCoordinates":[
            {"latitude":37.77493,"longitude":-122.41942,
             "places":[{"dcid":"geoId/06"},{"dcid":"country/USA"}]},
            {"latitude":0.5,"longitude":0.5}
        ]}"#;
        let response: ResolveCoordinatesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.place_coordinates.len(), 2);
        assert_eq!(response.place_coordinates[0].places[1].dcid, "country/USA");
        assert_eq!(
            response.place_coordinates[0].coordinate(),
            Coordinate::new(37.77493, -122.41942)
        );
        assert!(response.place_coordinates[1].places.is_empty());
    }

    #[test]
    fn empty_response_body_decodes() {
        let response: ResolveEntitiesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.resolved_entities.is_empty());
    }

    #[test]
    fn entities_wire_shape() {
        let request = ResolveEntitiesRequest {
            entities: vec![EntitySubGraph::from_external_id("isoCode", "IN")],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["entities"][0]["sourceId"], "isoCode:IN");
        assert_eq!(json["entities"][0]["properties"][0]["prop"], "isoCode");

        let body = r#"{"resolvedEntities":[{"sourceId":"isoCode:IN",
            "resolvedIds":[{"ids":[{"prop":"dcid","val":"country/IND"}]}]}]}"#;
        let response: ResolveEntitiesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.resolved_entities[0].source_id, "isoCode:IN");
        assert_eq!(
            response.resolved_entities[0].resolved_ids[0].ids[0],
            IdWithProperty::new("dcid", "country/IND")
        );
    }

    #[test]
    fn batch_items_keep_order() {
        let coords = vec![Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0)];
        let request = ResolveCoordinatesRequest::from_items(coords.clone());
        assert_eq!(request.into_items(), coords);
    }
}
