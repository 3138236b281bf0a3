use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DataAccess;

/// Default upper bound of objects held per cached path.
pub const CACHE_MAXIMUM_SIZE: u64 = 100;
/// Default idle expiry applied per cached path.
pub const CACHE_EXPIRE_AFTER_WRITE: &str = "3600S";
/// Default lexical prefix of anchor markers in templates.
pub const DEFAULT_NEEDLE_PREFIX: &str = "needlework-needle-";

/// Run-level generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Strategy used when an entity omits one.
    pub default_data_access: DataAccess,
    /// Bound applied per cached path.
    pub cache_maximum_entries: u64,
    /// Duration string applied per cached path (e.g. `3600S`).
    pub cache_expire_after_write: String,
    /// Register cache entries for generated entities.
    pub caching_enabled: bool,
    /// Prefix placed before the anchor name to form its marker.
    pub needle_prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_data_access: DataAccess::ActiveRecord,
            cache_maximum_entries: CACHE_MAXIMUM_SIZE,
            cache_expire_after_write: CACHE_EXPIRE_AFTER_WRITE.to_string(),
            caching_enabled: false,
            needle_prefix: DEFAULT_NEEDLE_PREFIX.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration once, before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.needle_prefix.trim().is_empty() {
            return Err(Error::Configuration(
                "needle_prefix must not be blank".to_string(),
            ));
        }

        if self.caching_enabled && self.cache_maximum_entries == 0 {
            return Err(Error::Configuration(
                "cache_maximum_entries must be positive when caching is enabled".to_string(),
            ));
        }

        if !is_duration(&self.cache_expire_after_write) {
            return Err(Error::Configuration(format!(
                "cache_expire_after_write '{}' is not a duration like 3600S",
                self.cache_expire_after_write
            )));
        }

        Ok(())
    }
}

fn is_duration(value: &str) -> bool {
    let Some(unit) = value.chars().last() else {
        return false;
    };
    let digits = &value[..value.len() - unit.len_utf8()];
    matches!(unit.to_ascii_uppercase(), 'S' | 'M' | 'H' | 'D')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = GeneratorConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn parses_overrides() {
        let config = GeneratorConfig::from_toml_str(
            r#"
default_data_access = "repository"
cache_maximum_entries = 500
cache_expire_after_write = "10M"
caching_enabled = true
"#,
        )
        .expect("parse config");
        assert_eq!(config.default_data_access, DataAccess::Repository);
        assert_eq!(config.cache_maximum_entries, 500);
        assert_eq!(config.cache_expire_after_write, "10M");
        assert!(config.caching_enabled);
    }

    #[test]
    fn rejects_malformed_values() {
        let bad_duration = GeneratorConfig {
            cache_expire_after_write: "soon".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            bad_duration.validate(),
            Err(Error::Configuration(_))
        ));

        let zero_bound = GeneratorConfig {
            caching_enabled: true,
            cache_maximum_entries: 0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(zero_bound.validate(), Err(Error::Configuration(_))));

        let unknown_strategy = GeneratorConfig::from_toml_str("default_data_access = \"dao\"");
        assert!(matches!(unknown_strategy, Err(Error::Configuration(_))));
    }
}
