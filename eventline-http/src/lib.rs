//! HTTP transport for `eventline`. POSTs each payload as JSON to one endpoint.
//! Any non-2xx answer counts as a failed delivery.

use eventline::{Payload, PipelineConfig, Transport, TransportError};
use reqwest::{Client, Url};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), endpoint)
    }

    /// Reuse an existing client (proxies, default headers, connection pool).
    pub fn with_client(client: Client, endpoint: &str) -> Result<Self, TransportError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// Build from the `endpoint` of a pipeline config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, TransportError> {
        let endpoint = config
            .endpoint()
            .ok_or_else(|| TransportError::InvalidEndpoint("no endpoint configured".into()))?;
        Self::new(endpoint)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl tower_service::Service<Payload> for HttpTransport {
    type Response = ();
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Payload) -> Self::Future {
        let request = self.client.post(self.endpoint.clone()).json(&payload);
        let events = payload.len();
        Box::pin(async move {
            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!(
                    status = status.as_u16(),
                    events,
                    "collection endpoint rejected batch"
                );
                return Err(TransportError::Status { status: status.as_u16() });
            }
            Ok(())
        })
    }
}

impl Transport for HttpTransport {}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::Encode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
