pub mod mock;
pub mod openai_compat;
pub mod registry;
pub mod traits;

pub(crate) mod sse;
pub(crate) mod util;

pub use mock::{MockProvider, ScriptedMockProvider};
pub use openai_compat::OpenAiCompatProvider;
pub use registry::ProviderRegistry;
pub use traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider, ToolChoice};
