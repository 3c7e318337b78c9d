//! Transport to the reconciliation service.
//!
//! `ReconTransport` is the seam between the batch client and the service.
//! `HttpTransport` talks JSON over HTTP; `InMemoryRecon` answers from tables
//! and is used for embedded runs and tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ReconConfig;
use crate::error::{ReconError, ReconResult, TransportError};

use super::wire::{
    ResolveCoordinatesRequest, ResolveCoordinatesResponse, ResolveEntitiesRequest,
    ResolveEntitiesResponse,
};

/// Path of the coordinate resolution endpoint.
pub const RESOLVE_COORDINATES_PATH: &str = "/v1/recon/resolve/coordinate";

/// Path of the entity resolution endpoint.
pub const RESOLVE_ENTITIES_PATH: &str = "/v1/recon/entity/resolve";

const API_KEY_HEADER: &str = "X-API-Key";

/// A single, unchunked call to the reconciliation service.
///
/// Implementations must not retry; one invocation is one outbound call.
#[async_trait]
pub trait ReconTransport: Send + Sync {
    /// Resolves coordinates to candidate places.
    async fn resolve_coordinates(
        &self,
        request: ResolveCoordinatesRequest,
    ) -> Result<ResolveCoordinatesResponse, TransportError>;

    /// Resolves external ids to candidate canonical ids.
    async fn resolve_entities(
        &self,
        request: ResolveEntitiesRequest,
    ) -> Result<ResolveEntitiesResponse, TransportError>;
}

/// JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl HttpTransport {
    /// Creates a transport from a validated configuration.
    pub fn new(config: &ReconConfig) -> ReconResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReconError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a transport around an existing HTTP client.
    ///
    /// The client's own timeout applies; `config.timeout` is only used to
    /// report timeouts.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &ReconConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    fn map_send_error(&self, err: &reqwest::Error) -> TransportError {
        if err.is_builder() {
            TransportError::SerializationFailed {
                message: err.to_string(),
            }
        } else if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.timeout_ms,
            }
        } else {
            TransportError::ConnectionFailed {
                message: err.to_string(),
            }
        }
    }

    async fn post<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut builder = self.client.post(self.url(path)).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::ServerError {
                code: status.as_u16(),
                message,
            });
        }

        response.json::<Resp>().await.map_err(|e| {
            if e.is_decode() {
                TransportError::DeserializationFailed {
                    message: e.to_string(),
                }
            } else {
                self.map_send_error(&e)
            }
        })
    }
}

#[async_trait]
impl ReconTransport for HttpTransport {
    async fn resolve_coordinates(
        &self,
        request: ResolveCoordinatesRequest,
    ) -> Result<ResolveCoordinatesResponse, TransportError> {
        self.post(RESOLVE_COORDINATES_PATH, &request).await
    }

    async fn resolve_entities(
        &self,
        request: ResolveEntitiesRequest,
    ) -> Result<ResolveEntitiesResponse, TransportError> {
        self.post(RESOLVE_ENTITIES_PATH, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let config = ReconConfig::default().with_endpoint("http://localhost:9000/");
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.url(RESOLVE_COORDINATES_PATH),
            "http://localhost:9000/v1/recon/resolve/coordinate"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connection_failure() {
        // Port 9 (discard) on loopback is not expected to be listening.
        let config = ReconConfig::default().with_endpoint("http://127.0.0.1:9");
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport
            .resolve_coordinates(ResolveCoordinatesRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed { .. }));
    }
}
