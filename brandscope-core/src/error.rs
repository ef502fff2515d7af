use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failures of a single post-source search call. Everything here is
/// absorbed into per-source health tracking; none of it is fatal to a run.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Access blocked for {resource}")]
    Blocked { resource: String },

    #[error("Rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
}

impl SourceError {
    /// Blocked access is an IP-level denial that will not clear within the
    /// run; transient failures may.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SourceError::Blocked { .. })
    }
}

/// Failures of a single provider classification call. Rate limits are
/// distinguishable so the orchestrator can skip the provider for the rest
/// of the run.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Rate limit exceeded for {provider}. Retry after {retry_after} seconds")]
    RateLimited { provider: String, retry_after: u64 },

    #[error("Provider service unavailable: {provider}: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Request timeout for {provider}")]
    Timeout { provider: String },

    #[error("Authentication failed for {provider}")]
    Auth { provider: String },

    #[error("Malformed response from {provider}: {details}")]
    Schema { provider: String, details: String },
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub fn provider(&self) -> &str {
        match self {
            ProviderError::RateLimited { provider, .. }
            | ProviderError::Unavailable { provider, .. }
            | ProviderError::Timeout { provider }
            | ProviderError::Auth { provider }
            | ProviderError::Schema { provider, .. } => provider,
        }
    }
}

/// Configuration problems detected before any network call. The only
/// fatal error class: a run refuses to start rather than silently degrade.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("No inference providers configured")]
    NoProvidersConfigured,

    #[error("Brand not found: {name}")]
    BrandNotFound { name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_permanence() {
        let blocked = SourceError::Blocked {
            resource: "/search.json".to_string(),
        };
        assert!(blocked.is_permanent());

        let unavailable = SourceError::Unavailable {
            reason: "connection reset".to_string(),
        };
        assert!(!unavailable.is_permanent());

        let limited = SourceError::RateLimited { retry_after: 60 };
        assert!(!limited.is_permanent());
    }

    #[test]
    fn test_provider_error_rate_limit_detection() {
        let limited = ProviderError::RateLimited {
            provider: "Groq".to_string(),
            retry_after: 30,
        };
        assert!(limited.is_rate_limit());
        assert_eq!(limited.provider(), "Groq");

        let schema = ProviderError::Schema {
            provider: "Mistral".to_string(),
            details: "expected 10 judgments, got 7".to_string(),
        };
        assert!(!schema.is_rate_limit());
        assert_eq!(schema.provider(), "Mistral");
    }

    #[test]
    fn test_error_conversion_to_core() {
        let err: CoreError = SourceError::RateLimited { retry_after: 5 }.into();
        assert!(matches!(err, CoreError::Source(_)));

        let err: CoreError = ConfigError::NoProvidersConfigured.into();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
