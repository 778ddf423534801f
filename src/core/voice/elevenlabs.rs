//! ElevenLabs Conversational AI client.
//!
//! Wraps the signed-URL endpoint of the ElevenLabs ConvAI REST API:
//!
//! - URL: `GET {base}/v1/convai/conversation/get_signed_url?agent_id={agent}`
//! - Authentication: `xi-api-key: {api_key}` header
//!
//! The returned URL is short-lived and lets a browser client open the
//! real-time conversation socket directly against ElevenLabs, so the API key
//! never leaves the server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ConversationProvider, ProviderError, SignedConversation};

/// Default API origin; overridable so tests can point at a local mock.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Signed-URL minting is a small metadata call; anything slower than this is
/// treated as provider unavailability.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("Voicegate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// ElevenLabs ConvAI client bound to one configured agent.
#[derive(Clone)]
pub struct ElevenLabsConvai {
    client: Client,
    base_url: String,
    api_key: String,
    agent_id: String,
}

impl ElevenLabsConvai {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
        })
    }
}

#[async_trait]
impl ConversationProvider for ElevenLabsConvai {
    async fn signed_conversation_url(&self) -> Result<SignedConversation, ProviderError> {
        let url = format!("{}/v1/convai/conversation/get_signed_url", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("agent_id", self.agent_id.as_str())])
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SignedUrlResponse = response.json().await?;
        debug!(agent_id = %self.agent_id, "minted signed conversation url");

        Ok(SignedConversation {
            signed_url: parsed.signed_url,
        })
    }
}
