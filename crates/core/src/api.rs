//! Client for the remote `/games` REST resource.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::AppConfig,
    models::{GameId, GamePayload, GameRecord},
};

/// Failure talking to the backend. The variants only matter for logs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server responded with {0}")]
    Status(StatusCode),
    /// The response body was not the expected JSON.
    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err)
        } else if let Some(status) = err.status() {
            ApiError::Status(status)
        } else {
            ApiError::Transport(err)
        }
    }
}

/// Operations the catalogue needs from the backend.
#[async_trait]
pub trait GamesApi: Send + Sync {
    /// `GET /games`.
    async fn list(&self) -> Result<Vec<GameRecord>, ApiError>;
    /// `POST /games`. The created record in the response is not used.
    async fn create(&self, payload: &GamePayload) -> Result<(), ApiError>;
    /// `PUT /games/{id}`.
    async fn update(&self, id: &GameId, payload: &GamePayload) -> Result<(), ApiError>;
    /// `DELETE /games/{id}`.
    async fn delete(&self, id: &GameId) -> Result<(), ApiError>;
}

/// [`GamesApi`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpGamesApi {
    client: Client,
    base_url: String,
}

impl HttpGamesApi {
    /// Build a client for the configured backend.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Transport)?;
        Ok(Self::with_client(client, config.base_url()))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL of the collection endpoint.
    pub fn collection_url(&self) -> String {
        format!("{}/games", self.base_url)
    }

    /// URL of a single record.
    pub fn record_url(&self, id: &GameId) -> String {
        format!("{}/games/{}", self.base_url, id)
    }
}

#[async_trait]
impl GamesApi for HttpGamesApi {
    async fn list(&self) -> Result<Vec<GameRecord>, ApiError> {
        let url = self.collection_url();
        debug!(%url, "GET");
        let games = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<GameRecord>>()
            .await?;
        Ok(games)
    }

    async fn create(&self, payload: &GamePayload) -> Result<(), ApiError> {
        let url = self.collection_url();
        debug!(%url, title = %payload.title, "POST");
        self.client
            .post(&url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn update(&self, id: &GameId, payload: &GamePayload) -> Result<(), ApiError> {
        let url = self.record_url(id);
        debug!(%url, title = %payload.title, "PUT");
        self.client
            .put(&url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, id: &GameId) -> Result<(), ApiError> {
        let url = self.record_url(id);
        debug!(%url, "DELETE");
        self.client.delete(&url).send().await?.error_for_status()?;
        Ok(())
    }
}
