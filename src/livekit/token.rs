//! LiveKit participant access tokens
//!
//! A token is an HS256 JWT signed with the project API secret. The issuer is
//! the API key and the subject is the participant identity; the `video`
//! claim carries the room grant.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: u32 = 5 * 60;

/// Room permissions granted to a participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub room_join: bool,
    pub can_publish: bool,
    pub can_publish_data: bool,
    pub can_subscribe: bool,
}

impl VideoGrant {
    /// Full participant rights in a single room
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room: Some(room.into()),
            room_join: true,
            can_publish: true,
            can_publish_data: true,
            can_subscribe: true,
        }
    }
}

/// JWT claims understood by the LiveKit server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub video: VideoGrant,
}

/// Builder for a participant access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    name: Option<String>,
    metadata: Option<String>,
    ttl: Duration,
    grant: VideoGrant,
}

impl AccessToken {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            identity: String::new(),
            name: None,
            metadata: None,
            ttl: Duration::seconds(i64::from(DEFAULT_TOKEN_TTL_SECS)),
            grant: VideoGrant::default(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_grant(mut self, grant: VideoGrant) -> Self {
        self.grant = grant;
        self
    }

    /// Sign the token
    pub fn to_jwt(&self) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.api_key.clone(),
            sub: self.identity.clone(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            video: self.grant.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )
    }
}
