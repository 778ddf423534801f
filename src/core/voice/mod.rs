//! Outbound voice-provider clients.
//!
//! [`ConversationProvider`] is the seam between the handlers and whichever
//! conversational-voice vendor issues signed session URLs. The production
//! implementation is [`elevenlabs::ElevenLabsConvai`]; tests substitute
//! stub implementations.

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsConvai;

use async_trait::async_trait;
use thiserror::Error;

/// A short-lived, provider-issued URL authorizing one client to open a
/// real-time conversation directly with the vendor.
#[derive(Debug, Clone)]
pub struct SignedConversation {
    pub signed_url: String,
}

/// Errors from the voice provider's signed-URL endpoint.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced a usable response (DNS, TLS, timeout, or
    /// an unparsable body).
    #[error("request to voice provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("voice provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// A vendor able to mint signed conversation URLs for a fixed,
/// server-configured agent.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    async fn signed_conversation_url(&self) -> Result<SignedConversation, ProviderError>;
}
