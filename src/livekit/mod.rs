//! LiveKit integration: access tokens and server URLs
//!
//! Media transport itself belongs to the LiveKit SDK; this module only
//! produces what a participant needs to hand over to it.

mod server_url;
mod token;

pub use server_url::resolve_server_url;
pub use token::{AccessToken, Claims, VideoGrant, DEFAULT_TOKEN_TTL_SECS};

use serde::{Deserialize, Serialize};

/// Connection details handed to the media SDK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub server_url: String,
    pub room_name: String,
    pub participant_name: String,
    pub participant_token: String,
}
