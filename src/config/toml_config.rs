use crate::core::engine::DEFAULT_COOLDOWN;
use crate::core::export::DEFAULT_REPORT_FILENAME;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub api: ApiConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub scan_segment: String,
    pub metrics_segment: String,
    pub scan_version: String,
    pub metrics_version: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.yext.com/v2/accounts/me".to_string(),
            scan_segment: "scan".to_string(),
            metrics_segment: "metrics".to_string(),
            scan_version: "20240412".to_string(),
            metrics_version: "20230726".to_string(),
            timeout_seconds: 30,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub cooldown_seconds: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            filename: DEFAULT_REPORT_FILENAME.to_string(),
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

impl ScanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: ScanConfig =
            toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        // 未解析的 ${VAR} 視為沒有提供金鑰
        if let Some(key) = &config.api.api_key {
            if key.trim().is_empty() || env_var_pattern().is_match(key) {
                tracing::debug!("api.api_key is unset or unresolved, ignoring it");
                config.api.api_key = None;
            }
        }

        Ok(config)
    }

    /// 替換環境變數 (例如 ${YEXT_API_KEY})，找不到的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.run.cooldown_seconds)
    }

    pub fn output_path(&self) -> &str {
        &self.output.output_path
    }

    pub fn filename(&self) -> &str {
        &self.output.filename
    }
}

impl Validate for ScanConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_non_empty_string("api.scan_segment", &self.api.scan_segment)?;
        validation::validate_non_empty_string("api.metrics_segment", &self.api.metrics_segment)?;
        validation::validate_non_empty_string("api.scan_version", &self.api.scan_version)?;
        validation::validate_non_empty_string("api.metrics_version", &self.api.metrics_version)?;
        validation::validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_file_name("output.filename", &self.output.filename)?;
        Ok(())
    }
}
