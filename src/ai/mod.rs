//! Section text generation through LLM providers

pub mod cancel;
pub mod provider;

pub use cancel::{sleep_or_cancel, with_cancellation};
pub use provider::{
    LlmProvider, MockProvider, ProviderConfig, ResilientClient, SharedProvider, build_client,
    create_provider, provider_names,
};
