//! Batch client for the reconciliation service.
//!
//! One logical request of any size becomes one outbound call per chunk of at
//! most `chunk_size` keys. Chunk calls run as independent tasks; the results
//! are concatenated in chunk order once every chunk has succeeded. The first
//! failing chunk fails the whole request and no partial response is returned.
//! Sibling chunks still in flight are left to run to completion.

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::JoinHandle;

use crate::config::ReconConfig;
use crate::error::{ReconError, ReconResult, TransportError};

use super::counter::ApiCallCounter;
use super::transport::{HttpTransport, ReconTransport};
use super::wire::{
    Batch, ResolveCoordinatesRequest, ResolveCoordinatesResponse, ResolveEntitiesRequest,
    ResolveEntitiesResponse,
};

/// Splits `items` into contiguous chunks of at most `size` elements, in order.
fn partition<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}

/// Chunking, counting client in front of a [`ReconTransport`].
#[derive(Clone)]
pub struct ReconClient {
    transport: Arc<dyn ReconTransport>,
    chunk_size: usize,
    counter: ApiCallCounter,
}

impl std::fmt::Debug for ReconClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconClient")
            .field("chunk_size", &self.chunk_size)
            .field("api_calls", &self.counter.get())
            .finish_non_exhaustive()
    }
}

impl ReconClient {
    /// Creates a client over any transport with the default chunk size.
    #[must_use]
    pub fn new(transport: Arc<dyn ReconTransport>) -> Self {
        Self {
            transport,
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
            counter: ApiCallCounter::new(),
        }
    }

    /// Creates an HTTP client from configuration.
    pub fn from_config(config: &ReconConfig) -> ReconResult<Self> {
        let config = config.clone().validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport)).with_chunk_size(config.chunk_size))
    }

    /// Sets the maximum number of keys per outbound call (at least 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Maximum number of keys per outbound call.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Outbound calls issued through this client so far.
    #[must_use]
    pub fn api_calls(&self) -> u64 {
        self.counter.get()
    }

    /// Handle on this client's call counter.
    #[must_use]
    pub fn counter(&self) -> ApiCallCounter {
        self.counter.clone()
    }

    /// Resolves coordinates to candidate places.
    ///
    /// # Errors
    /// Fails with the first chunk error; no partial response is returned.
    ///
    /// # Panics
    /// Chunk calls are spawned onto the current Tokio runtime; polling a
    /// non-empty request outside a Tokio 1.x runtime panics.
    pub async fn resolve_coordinates(
        &self,
        request: ResolveCoordinatesRequest,
    ) -> ReconResult<ResolveCoordinatesResponse> {
        self.call_chunked("resolve_coordinates", request, |transport, chunk| async move {
            transport.resolve_coordinates(chunk).await
        })
        .await
    }

    /// Resolves external ids to candidate canonical ids.
    ///
    /// # Errors
    /// Fails with the first chunk error; no partial response is returned.
    ///
    /// # Panics
    /// Same as [`ReconClient::resolve_coordinates`]: requires a Tokio runtime.
    pub async fn resolve_entities(
        &self,
        request: ResolveEntitiesRequest,
    ) -> ReconResult<ResolveEntitiesResponse> {
        self.call_chunked("resolve_entities", request, |transport, chunk| async move {
            transport.resolve_entities(chunk).await
        })
        .await
    }

    async fn call_chunked<Req, Resp, F, Fut>(
        &self,
        operation: &'static str,
        request: Req,
        call: F,
    ) -> ReconResult<Resp>
    where
        Req: Batch,
        Resp: Batch + Send + 'static,
        F: Fn(Arc<dyn ReconTransport>, Req) -> Fut,
        Fut: Future<Output = Result<Resp, TransportError>> + Send + 'static,
    {
        let items = request.into_items();
        if items.is_empty() {
            return Ok(Resp::from_items(Vec::new()));
        }

        let keys = items.len();
        let chunks = partition(items, self.chunk_size);
        let total = chunks.len();
        tracing::debug!(
            operation,
            keys,
            chunks = total,
            chunk_size = self.chunk_size,
            "dispatching chunked request"
        );

        let handles: Vec<JoinHandle<Result<Resp, TransportError>>> = chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let size = chunk.len();
                self.counter.increment();
                let fut = call(Arc::clone(&self.transport), Req::from_items(chunk));
                tokio::spawn(async move {
                    let result = fut.await;
                    match &result {
                        Ok(_) => {
                            tracing::debug!(operation, chunk = index, size, "chunk completed");
                        }
                        Err(e) => {
                            tracing::warn!(
                                operation,
                                chunk = index,
                                size,
                                error = %e,
                                "chunk failed"
                            );
                        }
                    }
                    result
                })
            })
            .collect();

        let responses = try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result.map_err(ReconError::from),
                Err(e) => Err(ReconError::internal(format!("chunk task failed: {e}"))),
            }
        }))
        .await?;

        let merged: Vec<Resp::Item> = responses.into_iter().flat_map(Batch::into_items).collect();
        tracing::debug!(operation, keys, entries = merged.len(), "merged chunked response");
        Ok(Resp::from_items(merged))
    }
}
