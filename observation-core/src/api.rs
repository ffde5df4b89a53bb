//! Access layer for the remote observations service.
//!
//! Each call maps one CRUD intent onto one request and folds every response
//! into a single contract: the payload's `data`, an [`ApiError`] carrying a
//! message, or [`Outcome::Cancelled`] when the caller's token fired first.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    cancel::CancellationToken,
    model::{Observation, ObservationId},
};

pub mod error;
pub mod transport;

pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Result of a call that was not rejected.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    /// The token was cancelled before the call resolved. Not an error.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a, T> {
    data: &'a T,
}

#[derive(Debug, Clone)]
pub struct ObservationsApi {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl ObservationsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create(
        &self,
        observation: &Observation,
        token: &CancellationToken,
    ) -> Result<Outcome<Observation>, ApiError> {
        let url = self.collection_url();
        let body = encode(observation)?;
        require_data(self.fetch_json(Method::POST, url, Some(body), token).await?)
    }

    pub async fn list(
        &self,
        token: &CancellationToken,
    ) -> Result<Outcome<Vec<Observation>>, ApiError> {
        let url = self.collection_url();
        require_data(self.fetch_json(Method::GET, url, None, token).await?)
    }

    pub async fn read(
        &self,
        id: ObservationId,
        token: &CancellationToken,
    ) -> Result<Outcome<Observation>, ApiError> {
        match self.read_record(id, token).await? {
            Outcome::Completed(record) => Observation::deserialize(&record)
                .map(Outcome::Completed)
                .map_err(|err| ApiError::Decode(err.to_string())),
            Outcome::Cancelled => Ok(Outcome::Cancelled),
        }
    }

    /// Like [`read`](Self::read), but returns `data` exactly as the service sent it.
    pub async fn read_record(
        &self,
        id: ObservationId,
        token: &CancellationToken,
    ) -> Result<Outcome<Value>, ApiError> {
        let url = self.record_url(id);
        require_data(self.fetch_json(Method::GET, url, None, token).await?)
    }

    pub async fn update(
        &self,
        observation: &Observation,
        token: &CancellationToken,
    ) -> Result<Outcome<Observation>, ApiError> {
        let id = observation.observation_id.ok_or(ApiError::MissingId)?;
        let url = self.record_url(id);
        let body = encode(observation)?;
        require_data(self.fetch_json(Method::PUT, url, Some(body), token).await?)
    }

    pub async fn delete(
        &self,
        id: ObservationId,
        token: &CancellationToken,
    ) -> Result<Outcome<()>, ApiError> {
        let url = self.record_url(id);
        let outcome = self.fetch_json::<Value>(Method::DELETE, url, None, token).await?;
        Ok(outcome.map(|_| ()))
    }

    fn collection_url(&self) -> String {
        format!("{}/observations", self.base_url)
    }

    fn record_url(&self, id: ObservationId) -> String {
        format!("{}/observations/{id}", self.base_url)
    }

    /// Shared request path for every operation.
    ///
    /// `Completed(None)` means the service answered 204 or sent no `data`.
    /// A payload `error` wins over the HTTP status.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<String>,
        token: &CancellationToken,
    ) -> Result<Outcome<Option<T>>, ApiError> {
        if token.is_cancelled() {
            debug!(%method, %url, "request skipped, token already cancelled");
            return Ok(Outcome::Cancelled);
        }

        debug!(%method, %url, "sending request");
        let request = HttpRequest::json(method.clone(), url.clone(), body);

        let response = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%method, %url, "request cancelled");
                return Ok(Outcome::Cancelled);
            }
            result = self.transport.send(request) => result.inspect_err(|err| {
                warn!(%method, %url, error = %err, "transport failure");
            })?,
        };

        if response.status == StatusCode::NO_CONTENT {
            return Ok(Outcome::Completed(None));
        }

        let payload: Value = serde_json::from_str(&response.body).map_err(|err| {
            warn!(%method, %url, status = %response.status, "response body is not JSON");
            ApiError::Decode(err.to_string())
        })?;

        if let Some(message) = payload.get("error").and_then(error_message) {
            warn!(%method, %url, status = %response.status, %message, "service reported an error");
            return Err(ApiError::Service { status: response.status.as_u16(), message });
        }

        match payload.get("data") {
            None | Some(Value::Null) => Ok(Outcome::Completed(None)),
            Some(data) => <T as Deserialize>::deserialize(data)
                .map(|value| Outcome::Completed(Some(value)))
                .map_err(|err| ApiError::Decode(err.to_string())),
        }
    }
}

fn encode<T: Serialize>(data: &T) -> Result<String, ApiError> {
    serde_json::to_string(&RequestEnvelope { data })
        .map_err(|err| ApiError::Encode(err.to_string()))
}

fn require_data<T>(outcome: Outcome<Option<T>>) -> Result<Outcome<T>, ApiError> {
    match outcome {
        Outcome::Completed(Some(value)) => Ok(Outcome::Completed(value)),
        Outcome::Completed(None) => Err(ApiError::MissingData),
        Outcome::Cancelled => Ok(Outcome::Cancelled),
    }
}

/// Falsy `error` values (null, false, "") do not count as errors.
fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
