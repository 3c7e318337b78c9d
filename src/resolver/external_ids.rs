//! Resolution of nodes carrying external ids such as `isoCode` or `wikidataId`.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::ReconConfig;
use crate::error::ReconResult;
use crate::recon::{Batch, EntitySubGraph, ReconClient, ResolveEntitiesRequest};
use crate::value::PropertyValues;
use crate::vocabulary::{DCID, EXTERNAL_ID_PROPERTIES};

use super::state::{PendingKeys, ResolvedMap};
use super::{ResolveStats, Resolver};

/// An external id property/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId {
    /// Id property, e.g. `isoCode`.
    pub prop: String,
    /// Id value.
    pub val: String,
}

impl ExternalId {
    /// Source id used on the wire, `<prop>:<val>`.
    #[must_use]
    pub fn source_id(&self) -> String {
        format!("{}:{}", self.prop, self.val)
    }

    fn to_subgraph(&self) -> EntitySubGraph {
        EntitySubGraph::from_external_id(&self.prop, &self.val)
    }
}

/// Resolves external ids to canonical ids through the reconciliation service.
///
/// A node may carry several external ids; each one is a separate key. When
/// the resolved keys of a node disagree, the node is left unresolved.
#[derive(Debug)]
pub struct ExternalIdResolver {
    run_id: Uuid,
    client: ReconClient,
    id_properties: Vec<String>,
    pending: PendingKeys<ExternalId>,
    resolved: ResolvedMap<String>,
    passes: AtomicU32,
}

impl ExternalIdResolver {
    /// Creates a resolver inspecting the default external id properties.
    #[must_use]
    pub fn new(client: ReconClient) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            client,
            id_properties: EXTERNAL_ID_PROPERTIES.iter().map(|p| (*p).to_string()).collect(),
            pending: PendingKeys::new(),
            resolved: ResolvedMap::new(),
            passes: AtomicU32::new(0),
        }
    }

    /// Creates a resolver inspecting `config.id_properties`.
    ///
    /// The client is built separately, usually with
    /// [`ReconClient::from_config`] on the same configuration.
    #[must_use]
    pub fn from_config(client: ReconClient, config: &ReconConfig) -> Self {
        Self::new(client).with_id_properties(config.id_properties.iter().cloned())
    }

    /// Replaces the inspected properties; order sets lookup priority.
    #[must_use]
    pub fn with_id_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Id of this resolver instance.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// External ids carried by `node`, in property priority order.
    #[must_use]
    pub fn extract(&self, node: &PropertyValues) -> Vec<ExternalId> {
        self.id_properties
            .iter()
            .filter_map(|prop| {
                node.first_literal(prop).map(|val| ExternalId {
                    prop: prop.clone(),
                    val: val.to_string(),
                })
            })
            .collect()
    }

    /// External ids queued so far, in first-submission order.
    #[must_use]
    pub fn pending(&self) -> Vec<ExternalId> {
        self.pending.snapshot()
    }

    /// Candidate canonical ids of a source id, in service order.
    #[must_use]
    pub fn candidates(&self, source_id: &str) -> Option<Vec<String>> {
        self.resolved.candidates(&source_id.to_string())
    }
}

#[async_trait]
impl Resolver for ExternalIdResolver {
    fn name(&self) -> &'static str {
        "external_ids"
    }

    fn submit(&self, node: &PropertyValues) -> bool {
        let ids = self.extract(node);
        let accepted = !ids.is_empty();
        for id in ids {
            self.pending.insert(id);
        }
        accepted
    }

    fn get_resolved(&self, node: &PropertyValues) -> Option<String> {
        let mut chosen: Option<(String, String)> = None;
        for id in self.extract(node) {
            let source_id = id.source_id();
            let Some(dcid) = self.resolved.first(&source_id) else {
                continue;
            };
            let Some((first_source, existing)) = chosen.as_ref() else {
                chosen = Some((source_id, dcid));
                continue;
            };
            if *existing != dcid {
                tracing::warn!(
                    run_id = %self.run_id,
                    node = node.label(),
                    first = %first_source,
                    first_dcid = %existing,
                    conflicting = %source_id,
                    conflicting_dcid = %dcid,
                    "external ids resolve to different entities"
                );
                return None;
            }
        }
        chosen.map(|(_, dcid)| dcid)
    }

    async fn resolve(&self) -> ReconResult<ResolveStats> {
        let started_at = Utc::now();
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        let keys = self.pending.snapshot();
        if keys.is_empty() {
            tracing::debug!(run_id = %self.run_id, "no external ids to resolve");
            return Ok(ResolveStats::idle(self.name(), self.run_id, started_at));
        }
        if pass > 1 {
            tracing::debug!(run_id = %self.run_id, pass, "re-sending every queued external id");
        }

        let keys_sent = keys.len();
        let api_calls = keys_sent.div_ceil(self.client.chunk_size()) as u64;
        let request =
            ResolveEntitiesRequest::from_items(keys.iter().map(ExternalId::to_subgraph).collect());
        let response = self.client.resolve_entities(request).await.inspect_err(|e| {
            tracing::warn!(
                run_id = %self.run_id,
                keys = keys_sent,
                error = %e,
                "external id resolution failed"
            );
        })?;

        let keys_resolved = self.resolved.fold(response.resolved_entities.into_iter().map(|entity| {
            let dcids = entity
                .resolved_ids
                .into_iter()
                .flat_map(|group| group.ids)
                .filter(|id| id.prop == DCID)
                .map(|id| id.val)
                .collect();
            (entity.source_id, dcids)
        }));

        tracing::info!(
            run_id = %self.run_id,
            keys = keys_sent,
            resolved = keys_resolved,
            api_calls,
            "resolved external ids"
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

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::recon::InMemoryRecon;
    use crate::value::TypedValue;

    fn resolver(recon: InMemoryRecon) -> ExternalIdResolver {
        ExternalIdResolver::new(ReconClient::new(Arc::new(recon)))
    }

    #[test]
    fn extract_follows_property_priority() {
        let r = resolver(InMemoryRecon::new());
        let node = PropertyValues::new()
            .with("wikidataId", TypedValue::text("Q668"))
            .with("isoCode", TypedValue::text("IN"))
            .with("name", TypedValue::text("India"));
        let ids: Vec<String> = r.extract(&node).iter().map(ExternalId::source_id).collect();
        assert_eq!(ids, vec!["isoCode:IN".to_string(), "wikidataId:Q668".to_string()]);
    }

    #[test]
    fn submit_rejects_nodes_without_ids() {
        let r = resolver(InMemoryRecon::new());
        let node = PropertyValues::new().with("name", TypedValue::text("India"));
        assert!(!r.submit(&node));
        let reference_only = PropertyValues::new().with("geoId", TypedValue::resolved("geoId/06"));
        assert!(!r.submit(&reference_only));
        assert!(r.pending().is_empty());
    }

    #[tokio::test]
    async fn resolves_and_agrees() {
        let r = resolver(
            InMemoryRecon::new()
                .with_entity("isoCode:IN", ["country/IND"])
                .with_entity("wikidataId:Q668", ["country/IND"]),
        );
        let node = PropertyValues::new()
            .with("isoCode", TypedValue::text("IN"))
            .with("wikidataId", TypedValue::text("Q668"));
        assert!(r.submit(&node));
        assert_eq!(r.get_resolved(&node), None);

        let stats = r.resolve().await.unwrap();
        assert_eq!(stats.keys_sent, 2);
        assert_eq!(stats.keys_resolved, 2);
        assert_eq!(r.get_resolved(&node).as_deref(), Some("country/IND"));
    }

    #[tokio::test]
    async fn disagreement_leaves_node_unresolved() {
        let r = resolver(
            InMemoryRecon::new()
                .with_entity("isoCode:IN", ["country/IND"])
                .with_entity("geoId:06", ["geoId/06"]),
        );
        let node = PropertyValues::new()
            .with("isoCode", TypedValue::text("IN"))
            .with("geoId", TypedValue::text("06"));
        r.submit(&node);
        r.resolve().await.unwrap();
        assert_eq!(r.get_resolved(&node), None);

        let india = PropertyValues::new().with("isoCode", TypedValue::text("IN"));
        assert_eq!(r.get_resolved(&india).as_deref(), Some("country/IND"));
    }

    #[test]
    fn configured_properties_limit_extraction() {
        let config = ReconConfig::default()
            .with_overrides(|key| (key == "RECON_ID_PROPERTIES").then(|| "geoId".to_string()))
            .unwrap()
            .validate()
            .unwrap();
        let r = ExternalIdResolver::from_config(
            ReconClient::new(Arc::new(InMemoryRecon::new())),
            &config,
        );

        let india = PropertyValues::new().with("isoCode", TypedValue::text("IN"));
        assert!(!r.submit(&india));
        let california = PropertyValues::new()
            .with("isoCode", TypedValue::text("US-CA"))
            .with("geoId", TypedValue::text("06"));
        assert!(r.submit(&california));
        let queued: Vec<String> = r.pending().iter().map(ExternalId::source_id).collect();
        assert_eq!(queued, vec!["geoId:06".to_string()]);
    }

    #[test]
    fn default_config_matches_default_properties() {
        let client = ReconClient::new(Arc::new(InMemoryRecon::new()));
        let from_config = ExternalIdResolver::from_config(client.clone(), &ReconConfig::default());
        let node = PropertyValues::new()
            .with("udiseCode", TypedValue::text("1"))
            .with("isoCode", TypedValue::text("IN"));
        assert_eq!(from_config.extract(&node), ExternalIdResolver::new(client).extract(&node));
    }

    #[tokio::test]
    async fn custom_properties_limit_extraction() {
        let r = resolver(InMemoryRecon::new().with_entity("geoId:06", ["geoId/06"]))
            .with_id_properties(["geoId"]);
        let node = PropertyValues::new()
            .with("isoCode", TypedValue::text("US-CA"))
            .with("geoId", TypedValue::text("06"));
        assert!(r.submit(&node));
        assert_eq!(r.pending().len(), 1);
        r.resolve().await.unwrap();
        assert_eq!(r.get_resolved(&node).as_deref(), Some("geoId/06"));
        assert_eq!(r.candidates("geoId:06"), Some(vec!["geoId/06".to_string()]));
    }
}
