use crate::error::{FetchFailure, TransportFault};
use crate::model::{Agent, Prd};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;

pub const HEALTH_PATH: &str = "/api/v1/health";

pub const AGENTS: Endpoint<Agent> = Endpoint::new("/api/v1/agents", "agents");
pub const PRDS: Endpoint<Prd> = Endpoint::new("/api/v1/prds", "prds");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One uncached GET. Implementations must bypass any HTTP cache.
///
/// `target` is either a path relative to the page origin (`/api/v1/agents`)
/// or an absolute URL; resolving it is the transport's business.
pub trait HttpGet {
    fn get(&self, target: &str) -> impl Future<Output = Result<HttpReply, TransportFault>>;
}

/// Where a collection lives and which envelope field carries it.
pub struct Endpoint<T> {
    pub path: &'static str,
    pub key: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> Endpoint<T> {
    pub const fn new(path: &'static str, key: &'static str) -> Self {
        Self {
            path,
            key,
            _item: PhantomData,
        }
    }
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Endpoint<T> {}

impl<T> std::fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("key", &self.key)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome<T> {
    Success(Vec<T>),
    Failure(FetchFailure),
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(failure) => Some(failure),
        }
    }

    /// The decoded items, or an empty sequence when the fetch failed.
    pub fn into_items(self) -> Vec<T> {
        match self {
            FetchOutcome::Success(items) => items,
            FetchOutcome::Failure(_) => Vec::new(),
        }
    }
}

pub async fn fetch_collection<T, H>(transport: &H, endpoint: Endpoint<T>) -> FetchOutcome<T>
where
    T: DeserializeOwned,
    H: HttpGet,
{
    let reply = match transport.get(endpoint.path).await {
        Ok(reply) => reply,
        Err(fault) => {
            tracing::warn!(path = endpoint.path, error = %fault, "request produced no response");
            return FetchOutcome::Failure(fault.into());
        }
    };

    if !reply.is_success() {
        if let Some(detail) = error_detail(&reply.body) {
            tracing::debug!(path = endpoint.path, status = reply.status, %detail, "backend error payload");
        }
        tracing::warn!(path = endpoint.path, status = reply.status, "request failed");
        return FetchOutcome::Failure(FetchFailure::Status { code: reply.status });
    }

    match decode_envelope(&reply.body, endpoint.key) {
        Ok(items) => {
            tracing::debug!(path = endpoint.path, count = items.len(), "collection loaded");
            FetchOutcome::Success(items)
        }
        Err(message) => {
            tracing::warn!(path = endpoint.path, error = %message, "could not decode collection");
            FetchOutcome::Failure(FetchFailure::Decode { message })
        }
    }
}

/// Decodes `{ <key>: [T] }`. A missing or null key is an empty collection.
pub fn decode_envelope<T: DeserializeOwned>(body: &str, key: &str) -> Result<Vec<T>, String> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let serde_json::Value::Object(mut fields) = value else {
        return Err("response body is not a JSON object".into());
    };

    match fields.remove(key) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items).map_err(|e| format!("field '{key}': {e}")),
    }
}

/// Pulls `detail` or `message` out of a JSON error body, if there is one.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .or_else(|| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
