use crate::prompt::{build_batch_prompt, parse_batch_response};
use async_trait::async_trait;
use brandscope_core::{BrandConfig, ConfigError, PostJudgment, ProviderError, RedditPost};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_COMPLETION_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.1;

/// One external inference endpoint. Implementations must surface rate
/// limits distinguishably so the orchestrator can skip the provider for
/// the rest of the run.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Classify a batch of posts. On success the returned judgments
    /// correspond one-to-one, in order, with the input posts.
    async fn classify_batch(
        &self,
        posts: &[RedditPost],
        brand: &BrandConfig,
    ) -> Result<Vec<PostJudgment>, ProviderError>;
}

/// Adapter over an OpenAI-compatible chat-completions endpoint. All four
/// providers in the chain speak this protocol; they differ only in base
/// URL, model, and credential.
pub struct ChatCompletionsProvider {
    name: String,
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsProvider {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            name: name.into(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(
            "Groq",
            "https://api.groq.com/openai/v1/chat/completions",
            api_key,
            "llama-3.1-8b-instant",
        )
    }

    pub fn cerebras(api_key: impl Into<String>) -> Self {
        Self::new(
            "Cerebras",
            "https://api.cerebras.ai/v1/chat/completions",
            api_key,
            "llama-3.3-70b",
        )
    }

    pub fn sambanova(api_key: impl Into<String>) -> Self {
        Self::new(
            "SambaNova",
            "https://api.sambanova.ai/v1/chat/completions",
            api_key,
            "Meta-Llama-3.3-70B-Instruct",
        )
    }

    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::new(
            "Mistral",
            "https://api.mistral.ai/v1/chat/completions",
            api_key,
            "mistral-small-latest",
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider: self.name.clone(),
            }
        } else {
            ProviderError::Unavailable {
                provider: self.name.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify_batch(
        &self,
        posts: &[RedditPost],
        brand: &BrandConfig,
    ) -> Result<Vec<PostJudgment>, ProviderError> {
        let prompt = build_batch_prompt(posts, brand);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        debug!("Calling {} for a batch of {} posts", self.name, posts.len());
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(60);
                    warn!("{} rate limited, retry after {}s", self.name, retry_after);
                    ProviderError::RateLimited {
                        provider: self.name.clone(),
                        retry_after,
                    }
                }
                401 | 403 => ProviderError::Auth {
                    provider: self.name.clone(),
                },
                code => ProviderError::Unavailable {
                    provider: self.name.clone(),
                    reason: format!("HTTP {code}"),
                },
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Schema {
                provider: self.name.clone(),
                details: "response carried no message content".to_string(),
            })?;

        parse_batch_response(&content, posts, &self.name)
    }
}

/// Credentials for the provider chain, usually read from the environment.
/// A provider without a key simply does not join the chain.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub groq: Option<String>,
    pub cerebras: Option<String>,
    pub sambanova: Option<String>,
    pub mistral: Option<String>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        fn non_empty(var: &str) -> Option<String> {
            std::env::var(var).ok().filter(|v| !v.trim().is_empty())
        }
        Self {
            groq: non_empty("GROQ_API_KEY"),
            cerebras: non_empty("CEREBRAS_API_KEY"),
            sambanova: non_empty("SAMBANOVA_API_KEY"),
            mistral: non_empty("MISTRAL_API_KEY"),
        }
    }
}

/// Build the priority-ordered provider chain. Refuses to build an empty
/// chain: a run that could only ever use the keyword fallback must be an
/// explicit caller choice, not a silent degradation.
pub fn build_provider_chain(
    keys: &ProviderKeys,
) -> Result<Vec<Box<dyn InferenceProvider>>, ConfigError> {
    let mut chain: Vec<Box<dyn InferenceProvider>> = Vec::new();
    if let Some(key) = &keys.groq {
        chain.push(Box::new(ChatCompletionsProvider::groq(key.clone())));
    }
    if let Some(key) = &keys.cerebras {
        chain.push(Box::new(ChatCompletionsProvider::cerebras(key.clone())));
    }
    if let Some(key) = &keys.sambanova {
        chain.push(Box::new(ChatCompletionsProvider::sambanova(key.clone())));
    }
    if let Some(key) = &keys.mistral {
        chain.push(Box::new(ChatCompletionsProvider::mistral(key.clone())));
    }

    if chain.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_requires_at_least_one_key() {
        let err = build_provider_chain(&ProviderKeys::default());
        assert!(matches!(err, Err(ConfigError::NoProvidersConfigured)));
    }

    #[test]
    fn test_chain_preserves_priority_order() {
        let keys = ProviderKeys {
            groq: Some("k1".to_string()),
            cerebras: None,
            sambanova: Some("k3".to_string()),
            mistral: Some("k4".to_string()),
        };
        let chain = build_provider_chain(&keys).unwrap();
        let names: Vec<_> = chain.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Groq", "SambaNova", "Mistral"]);
    }

    #[test]
    fn test_chat_response_parse() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "[]"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("[]"));
    }

    #[test]
    fn test_chat_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
