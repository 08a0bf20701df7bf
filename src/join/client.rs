//! Connection-details requests

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::livekit::ConnectionDetails;
use crate::rooms::AccessDenied;

/// Default path of the connection-details endpoint
pub const CONN_DETAILS_ENDPOINT: &str = "/api/connection-details";

/// Parameters of a connection-details request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub room_name: String,
    pub participant_name: String,
    pub region: Option<String>,
    pub code: Option<String>,
}

impl ConnectionRequest {
    /// Endpoint URL with the request encoded as query parameters
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("roomName", &self.room_name);
            query.append_pair("participantName", &self.participant_name);
            if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
                query.append_pair("region", region);
            }
            if let Some(code) = self.code.as_deref().filter(|c| !c.is_empty()) {
                query.append_pair("code", code);
            }
        }
        url
    }
}

/// Failure of a connection-details request
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP 403: the room code is missing or wrong. `reason` is set when the
    /// server said which.
    #[error("access denied")]
    Forbidden { reason: Option<AccessDenied> },

    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Source of connection details
#[async_trait]
pub trait ConnectionDetailsClient: Send + Sync {
    async fn fetch(&self, request: &ConnectionRequest) -> Result<ConnectionDetails, FetchError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Connection-details endpoint over HTTP
pub struct HttpConnectionDetailsClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpConnectionDetailsClient {
    /// `origin` is the page origin; `endpoint` may be relative to it or absolute
    pub fn new(origin: &str, endpoint: Option<&str>) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(origin)?.join(endpoint.unwrap_or(CONN_DETAILS_ENDPOINT))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConnectionDetailsClient for HttpConnectionDetailsClient {
    async fn fetch(&self, request: &ConnectionRequest) -> Result<ConnectionDetails, FetchError> {
        let response = self
            .client
            .get(request.to_url(&self.endpoint))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let reason = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|reason| AccessDenied::parse(&reason));
            return Err(FetchError::Forbidden { reason });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ConnectionDetails>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
