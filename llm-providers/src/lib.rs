pub mod analyzer;
pub mod backoff;
pub mod health;
pub mod keyword;
pub mod prompt;
pub mod provider;

pub use analyzer::{AnalysisConfig, AnalysisOutcome, BatchAnalyzer};
pub use backoff::BackoffPolicy;
pub use health::ProviderHealth;
pub use keyword::KeywordClassifier;
pub use prompt::BATCH_SIZE;
pub use provider::{
    build_provider_chain, ChatCompletionsProvider, InferenceProvider, ProviderKeys,
};
