//! Well-known property names read by the resolvers.

/// Latitude of a place, in decimal degrees.
pub const LATITUDE: &str = "latitude";

/// Longitude of a place, in decimal degrees.
pub const LONGITUDE: &str = "longitude";

/// Property carrying a canonical id in resolved ids returned by the service.
pub const DCID: &str = "dcid";

/// External id properties the reconciliation service can resolve, in the
/// order nodes are inspected.
pub const EXTERNAL_ID_PROPERTIES: &[&str] = &[
    "isoCode",
    "geoId",
    "nutsCode",
    "wikidataId",
    "geoNamesId",
    "istatId",
    "austrianMunicipalityKey",
    "indianCensusAreaCode2011",
    "indianCensusAreaCode2001",
    "lgdCode",
    "udiseCode",
];
