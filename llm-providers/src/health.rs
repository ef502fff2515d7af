use std::collections::HashSet;
use std::sync::Mutex;

/// Run-scoped provider rate-limit ledger. Once a provider is flagged it
/// stays skipped until the run ends; there is deliberately no clearing
/// API. Real limits are often time-boxed, but within a single run's
/// lifetime retrying a limited provider only burns the batch budget.
#[derive(Debug, Default)]
pub struct ProviderHealth {
    rate_limited: Mutex<HashSet<String>>,
}

impl ProviderHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_rate_limited(&self, provider: &str) {
        let mut flagged = self.rate_limited.lock().unwrap();
        flagged.insert(provider.to_string());
    }

    pub fn is_rate_limited(&self, provider: &str) -> bool {
        let flagged = self.rate_limited.lock().unwrap();
        flagged.contains(provider)
    }

    pub fn rate_limited_providers(&self) -> Vec<String> {
        let flagged = self.rate_limited.lock().unwrap();
        let mut names: Vec<String> = flagged.iter().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_persists() {
        let health = ProviderHealth::new();
        assert!(!health.is_rate_limited("Groq"));

        health.mark_rate_limited("Groq");
        assert!(health.is_rate_limited("Groq"));
        assert!(!health.is_rate_limited("Mistral"));
    }

    #[test]
    fn test_flagged_list_is_sorted_and_deduplicated() {
        let health = ProviderHealth::new();
        health.mark_rate_limited("Mistral");
        health.mark_rate_limited("Groq");
        health.mark_rate_limited("Groq");

        assert_eq!(
            health.rate_limited_providers(),
            vec!["Groq".to_string(), "Mistral".to_string()]
        );
    }
}
