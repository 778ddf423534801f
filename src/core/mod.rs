pub mod voice;

// Re-export commonly used types for convenience
pub use voice::{ConversationProvider, ElevenLabsConvai, ProviderError, SignedConversation};
