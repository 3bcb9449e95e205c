//! HTTP client for the actor-grain runtime.
//!
//! Implements both grain ports against the runtime's JSON API:
//!
//! | Call | Request | Success | Other |
//! |------|---------|---------|-------|
//! | snapshot get | `GET /actors/{userId}` | 200 + snapshot | 404 → `NotFound` |
//! | snapshot persist | `POST /actors/{userId}` | 200 / 201 | |
//! | start cycle | `POST /users/{userId}/cycles/start` | 200 → `true` | 409 → `false` |
//! | active cycle | `GET /users/{userId}/cycles/active` | 200 + ref | 404 → `NotFound` |
//! | complete | `POST /cycles/{cycleId}/complete` | 2xx | 404 → `NotFound` |
//!
//! Any other status, a timeout, or a transport failure is `Client`.
//! Retries are left to the caller.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::ActorRuntimeConfig;
use crate::domain::cycle::{CycleDates, CycleSnapshot};
use crate::domain::foundation::{CycleId, Timestamp, UserId};
use crate::ports::{ActiveCycleIndex, ActiveCycleRef, ActorRuntimeError, SnapshotStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartCycleRequest {
    cycle_id: CycleId,
    start_date: Timestamp,
    end_date: Timestamp,
}

/// Typed client for the actor runtime's snapshot and index grains.
#[derive(Clone)]
pub struct ActorRuntimeClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    api_token: Option<Secret<String>>,
}

impl ActorRuntimeClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// `Client` when the base URL does not parse or the HTTP client cannot
    /// be built.
    pub fn new(config: &ActorRuntimeConfig) -> Result<Self, ActorRuntimeError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ActorRuntimeError::Client(format!("Invalid base URL: {}", e)))?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ActorRuntimeError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            api_token: config.api_token.clone(),
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ActorRuntimeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ActorRuntimeError::Client("Base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ActorRuntimeError> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ActorRuntimeError::Client(format!(
                    "Request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else if e.is_connect() {
                ActorRuntimeError::Client(format!("Connection failed: {}", e))
            } else {
                ActorRuntimeError::Client(e.to_string())
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ActorRuntimeError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ActorRuntimeError::Decode(e.to_string()))
    }
}

fn unexpected(operation: &str, status: StatusCode) -> ActorRuntimeError {
    ActorRuntimeError::Client(format!("{} returned unexpected status {}", operation, status))
}

#[async_trait]
impl SnapshotStore for ActorRuntimeClient {
    async fn get(&self, user_id: &UserId) -> Result<CycleSnapshot, ActorRuntimeError> {
        let url = self.url(&["actors", user_id.as_str()])?;
        let response = self.send(self.request(Method::GET, url)).await?;

        match response.status() {
            StatusCode::OK => Self::decode(response).await,
            StatusCode::NOT_FOUND => Err(ActorRuntimeError::NotFound(user_id.to_string())),
            status => Err(unexpected("GET snapshot", status)),
        }
    }

    async fn persist(
        &self,
        user_id: &UserId,
        snapshot: &CycleSnapshot,
    ) -> Result<(), ActorRuntimeError> {
        let url = self.url(&["actors", user_id.as_str()])?;
        let response = self
            .send(self.request(Method::POST, url).json(snapshot))
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                tracing::debug!(user_id = %user_id, state = %snapshot.value, "Snapshot persisted");
                Ok(())
            }
            status => Err(unexpected("POST snapshot", status)),
        }
    }
}

#[async_trait]
impl ActiveCycleIndex for ActorRuntimeClient {
    async fn try_start_new_cycle(
        &self,
        user_id: &UserId,
        cycle_id: &CycleId,
        dates: &CycleDates,
    ) -> Result<bool, ActorRuntimeError> {
        let url = self.url(&["users", user_id.as_str(), "cycles", "start"])?;
        let body = StartCycleRequest {
            cycle_id: *cycle_id,
            start_date: dates.start_date(),
            end_date: dates.end_date(),
        };
        let response = self
            .send(self.request(Method::POST, url).json(&body))
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            status => Err(unexpected("POST start cycle", status)),
        }
    }

    async fn get_active(&self, user_id: &UserId) -> Result<ActiveCycleRef, ActorRuntimeError> {
        let url = self.url(&["users", user_id.as_str(), "cycles", "active"])?;
        let response = self.send(self.request(Method::GET, url)).await?;

        match response.status() {
            StatusCode::OK => Self::decode(response).await,
            StatusCode::NOT_FOUND => Err(ActorRuntimeError::NotFound(user_id.to_string())),
            status => Err(unexpected("GET active cycle", status)),
        }
    }

    async fn mark_complete(&self, cycle_id: &CycleId) -> Result<(), ActorRuntimeError> {
        let id = cycle_id.to_string();
        let url = self.url(&["cycles", id.as_str(), "complete"])?;
        let response = self.send(self.request(Method::POST, url)).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ActorRuntimeError::NotFound(id)),
            status => Err(unexpected("POST complete cycle", status)),
        }
    }
}
