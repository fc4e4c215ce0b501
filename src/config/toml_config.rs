use crate::core::retry::MAX_RETRIES_LIMIT;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional run configuration file. Every key may be omitted.
///
/// ```toml
/// [source]
/// endpoint = "${VPIC_ENDPOINT}"
/// base_delay_seconds = 2.0
/// timeout_factor = 5
/// retry_attempts = 4
///
/// [batch]
/// chunk_size = 40
/// pause_seconds = 4.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub base_delay_seconds: Option<f64>,
    pub timeout_factor: Option<u32>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    pub chunk_size: Option<usize>,
    pub pause_seconds: Option<f64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VPIC_ENDPOINT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.source.endpoint {
            validation::validate_url("source.endpoint", endpoint)?;
        }
        if let Some(chunk_size) = self.batch.chunk_size {
            validation::validate_positive_number("batch.chunk_size", chunk_size, 1)?;
        }
        if let Some(delay) = self.source.base_delay_seconds {
            if delay <= 0.0 {
                return Err(EtlError::InvalidConfigValueError {
                    field: "source.base_delay_seconds".to_string(),
                    value: delay.to_string(),
                    reason: "Base delay must be greater than zero".to_string(),
                });
            }
        }
        if let Some(retries) = self.source.retry_attempts {
            validation::validate_range("source.retry_attempts", retries, 0, MAX_RETRIES_LIMIT)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[source]
endpoint = "https://vpic.example.com/decode"
base_delay_seconds = 0.5
timeout_factor = 3
retry_attempts = 2

[batch]
chunk_size = 25
pause_seconds = 1.0
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://vpic.example.com/decode")
        );
        assert_eq!(config.source.base_delay_seconds, Some(0.5));
        assert_eq!(config.source.retry_attempts, Some(2));
        assert_eq!(config.batch.chunk_size, Some(25));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.source.endpoint.is_none());
        assert!(config.batch.chunk_size.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("VIN_ETL_TEST_ENDPOINT", "https://test.vpic.local/batch");

        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "${VIN_ETL_TEST_ENDPOINT}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://test.vpic.local/batch")
        );

        std::env::remove_var("VIN_ETL_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[batch]\nchunk_size = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[source]\nbase_delay_seconds = 0.0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[source]\nretry_attempts = 4294967295\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[batch]\nchunk_size = 10\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.batch.chunk_size, Some(10));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = TomlConfig::from_toml_str("[batch]\nchunk_size = \"forty\"\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }
}
