//! Ordered composition of independent resolvers.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::error::ReconResult;
use crate::value::PropertyValues;

use super::{ResolveStats, Resolver};

/// Resolvers run side by side over the same nodes.
///
/// Each resolver keeps its own state; the set only fans calls out. For
/// `get_resolved`, earlier resolvers take precedence.
#[derive(Clone, Default)]
pub struct ResolverSet {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl std::fmt::Debug for ResolverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.name()))
            .finish()
    }
}

impl ResolverSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver, builder style.
    #[must_use]
    pub fn with(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.push(resolver);
        self
    }

    /// Appends a resolver.
    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns true if the set has no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Submits the node to every resolver. Returns true if any accepted it.
    pub fn submit(&self, node: &PropertyValues) -> bool {
        self.resolvers
            .iter()
            .fold(false, |accepted, r| r.submit(node) || accepted)
    }

    /// Resolves every resolver concurrently.
    ///
    /// # Errors
    /// Fails with the first resolver error.
    ///
    /// # Panics
    /// As [`Resolver::resolve`], outside a Tokio runtime.
    pub async fn resolve(&self) -> ReconResult<Vec<ResolveStats>> {
        try_join_all(self.resolvers.iter().map(|r| r.resolve())).await
    }

    /// Canonical id from the first resolver that has one for the node.
    #[must_use]
    pub fn get_resolved(&self, node: &PropertyValues) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.get_resolved(node))
    }
}
