use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Search configuration for one brand. Read-only input to the pipeline;
/// the caller owns where it is stored and how it is edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub product_terms: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub subreddit_hints: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_category() -> String {
    "general".to_string()
}

impl BrandConfig {
    /// Pre-flight validation. Runs before any network call; failures here
    /// are fatal to the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.keywords.is_empty() {
            return Err(ConfigError::MissingField {
                field: "keywords".to_string(),
            });
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "keywords".to_string(),
                reason: "empty search term".to_string(),
            });
        }
        Ok(())
    }
}

/// The on-disk brands file: a map of brand name to config. Loading it is
/// caller territory; this type only gives the JSON a shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandsFile {
    #[serde(default)]
    pub brands: HashMap<String, BrandConfig>,
}

impl BrandsFile {
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Case-insensitive brand lookup, with the matched key written back
    /// into the returned config's name.
    pub fn find(&self, name: &str) -> Result<BrandConfig, ConfigError> {
        for (key, cfg) in &self.brands {
            if key.eq_ignore_ascii_case(name) {
                let mut cfg = cfg.clone();
                cfg.name = key.clone();
                return Ok(cfg);
            }
        }
        Err(ConfigError::BrandNotFound {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BrandConfig {
        BrandConfig {
            name: "Sahi".to_string(),
            category: "skincare".to_string(),
            keywords: vec!["sahi".to_string(), "sahi sunscreen".to_string()],
            product_terms: vec!["sunscreen".to_string()],
            competitors: vec!["Minimalist".to_string()],
            subreddit_hints: vec!["IndianSkincareAddicts".to_string()],
            description: "Skincare brand".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let mut cfg = sample_config();
        cfg.name = "  ".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField { field }) if field == "name"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut cfg = sample_config();
        cfg.keywords.clear();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField { field }) if field == "keywords"
        ));

        let mut cfg = sample_config();
        cfg.keywords = vec!["".to_string()];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_brands_file_case_insensitive_lookup() {
        let json = r#"{"brands": {"Sahi": {"name": "Sahi", "keywords": ["sahi"]}}}"#;
        let file = BrandsFile::parse(json).unwrap();

        let found = file.find("sahi").unwrap();
        assert_eq!(found.name, "Sahi");
        assert_eq!(found.category, "general");

        assert!(matches!(
            file.find("unknown"),
            Err(ConfigError::BrandNotFound { .. })
        ));
    }
}
