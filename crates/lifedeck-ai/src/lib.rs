//! Text generation for report sections: the backend trait and an
//! OpenRouter-compatible chat-completions client.

mod generation;
mod openrouter;

pub use generation::{
    ChatMessage, Generation, GenerationBackend, GenerationError, GenerationRequest,
    GenerationSettings, Role,
};
pub use openrouter::{OpenRouterClient, OpenRouterConfig};
