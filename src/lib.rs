//! # graph-recon - identifier resolution for knowledge-graph ingestion
//!
//! Before ingested graph nodes are written to the canonical store, raw
//! identifying attributes such as coordinates or external ids must be
//! resolved to canonical entity ids by a remote reconciliation service.
//! This crate collects those keys from many nodes, deduplicates them, resolves
//! them in bounded batches, and caches the answers for per-node lookup.
//!
//! ## Core Concepts
//!
//! - **PropertyValues**: an ingested node, property name to typed values
//! - **Resolver**: a strategy with a `submit` / `resolve` / `get_resolved` lifecycle
//! - **ReconClient**: chunks one logical request into bounded outbound calls
//! - **ResolverSet**: several resolvers run side by side over the same nodes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graph_recon::{
//!     CoordinatesResolver, PropertyValues, ReconClient, ReconConfig, Resolver, TypedValue,
//! };
//!
//! let client = ReconClient::from_config(&ReconConfig::from_env()?)?;
//! let resolver = CoordinatesResolver::new(client);
//!
//! let node = PropertyValues::new()
//!     .with("latitude", TypedValue::number("37.77493"))
//!     .with("longitude", TypedValue::number("-122.41942"));
//!
//! resolver.submit(&node);
//! resolver.resolve().await?;
//! let dcid = resolver.get_resolved(&node);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod recon;
pub mod resolver;
pub mod scan;
pub mod value;
pub mod vocabulary;

// Re-export primary types at crate root for convenience
pub use config::ReconConfig;
pub use error::{ReconError, ReconResult, TransportError, ValidationError};
pub use recon::{
    total_api_calls, ApiCallCounter, Coordinate, HttpTransport, InMemoryRecon, ReconClient,
    ReconTransport,
};
pub use resolver::{
    extract_coordinate, CoordinatesResolver, ExternalId, ExternalIdResolver, ResolveStats,
    Resolver, ResolverSet,
};
pub use scan::{ScanConfig, ScanPool, ScanSummary};
pub use value::{PropertyValues, TypedValue, ValueType};
