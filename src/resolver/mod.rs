//! Resolvers turn raw identifying attributes of nodes into canonical ids.
//!
//! Every strategy follows the same two-phase lifecycle:
//!
//! 1. **Scan**: `submit` is called for every node, possibly from many threads.
//!    The resolver extracts its key and queues it once.
//! 2. **Resolve**: `resolve` is awaited once. Queued keys go to the
//!    reconciliation service in batches and the answers are cached.
//! 3. **Rewrite**: `get_resolved` is called per node and re-derives the same
//!    key to look up its canonical id.
//!
//! `get_resolved` before `resolve` has completed returns `None`. A second
//! `resolve` re-sends every queued key, since the queue is never cleared.

mod coordinates;
mod external_ids;
mod set;
mod state;

pub use coordinates::{extract_coordinate, CoordinatesResolver};
pub use external_ids::{ExternalId, ExternalIdResolver};
pub use set::ResolverSet;
pub use state::{PendingKeys, ResolvedMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ReconResult;
use crate::value::PropertyValues;

/// Summary of one resolve pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Strategy name.
    pub resolver: &'static str,
    /// Id of the resolver instance, shared by its log events.
    pub run_id: Uuid,
    /// Keys sent to the service.
    pub keys_sent: usize,
    /// Keys that came back with at least one candidate.
    pub keys_resolved: usize,
    /// Outbound calls issued for this pass.
    pub api_calls: u64,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// When the pass finished.
    pub finished_at: DateTime<Utc>,
}

impl ResolveStats {
    pub(crate) fn idle(resolver: &'static str, run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            resolver,
            run_id,
            keys_sent: 0,
            keys_resolved: 0,
            api_calls: 0,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Keys sent that came back without candidates.
    #[must_use]
    pub const fn keys_unresolved(&self) -> usize {
        self.keys_sent.saturating_sub(self.keys_resolved)
    }
}

/// A resolution strategy for one category of identifying attribute.
///
/// `submit` and `get_resolved` must derive keys with identical logic, so a
/// node accepted by `submit` is found by `get_resolved` whenever its key
/// was resolved.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Strategy name used in logs and stats.
    fn name(&self) -> &'static str;

    /// Queues the node's key. Returns false if the node does not carry the
    /// attributes this strategy needs.
    fn submit(&self, node: &PropertyValues) -> bool;

    /// Canonical id for the node, if its key was resolved.
    fn get_resolved(&self, node: &PropertyValues) -> Option<String>;

    /// Resolves everything queued so far.
    ///
    /// Completes immediately without calls when nothing is queued.
    ///
    /// # Errors
    /// Transport and response failures fail the whole pass; nothing from a
    /// failed pass is cached.
    ///
    /// # Panics
    /// Implementations backed by [`ReconClient`](crate::ReconClient) spawn
    /// chunk calls and must be polled inside a Tokio 1.x runtime.
    async fn resolve(&self) -> ReconResult<ResolveStats>;
}
