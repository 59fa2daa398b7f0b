use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const CONFIG_FILE_NAME: &str = ".swiftpm-consultant.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LLMConfig,
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub max_attempts: u32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 300,
            temperature: None,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Get the default config file path (~/.swiftpm-consultant.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(CONFIG_FILE_NAME))
    }

    /// Load config from the default location, falling back to defaults if the file doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config = match Self::default_config_path() {
            Ok(path) if path.exists() => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(&path)?
            }
            Ok(path) => {
                tracing::debug!("No config file found at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{e}, using default configuration");
                Self::default()
            }
        };

        Ok(config.with_env_overrides(env::var("OLLAMA_HOST").ok().as_deref()))
    }

    /// Load config from an explicit path. Unlike [`Config::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let config = Self::from_file(path)?;
        Ok(config.with_env_overrides(env::var("OLLAMA_HOST").ok().as_deref()))
    }

    /// Load config from a specific file path
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed reading config file {}: {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `OLLAMA_HOST`, which takes precedence over the config file.
    pub fn with_env_overrides(mut self, ollama_host: Option<&str>) -> Self {
        if let Some(host) = ollama_host.map(str::trim).filter(|h| !h.is_empty()) {
            tracing::debug!("Using OLLAMA_HOST={host}");
            self.llm.base_url = normalize_base_url(host);
        }
        self
    }

    /// Apply command line overrides, which take precedence over everything else.
    pub fn with_cli_overrides(mut self, host: Option<&str>, model: Option<&str>) -> Self {
        if let Some(host) = host {
            self.llm.base_url = normalize_base_url(host);
        }
        if let Some(model) = model {
            self.llm.model = model.to_string();
        }
        self
    }

    fn validate(&self) -> crate::Result<()> {
        if self.review.max_attempts == 0 {
            anyhow::bail!("review.max_attempts must be at least 1");
        }
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }
        Ok(())
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        format!(
            r#"# swiftpm-consultant configuration file
# Command line flags (--model, --host) override anything set here.

[llm]
# Base URL of the Ollama server. The OLLAMA_HOST environment variable
# overrides this value.
base_url = "{DEFAULT_BASE_URL}"

# Model used for the review. Prefix matches count, so "llama3" finds
# "llama3:latest".
model = "{DEFAULT_MODEL}"

# Request timeout in seconds (default: 300 seconds / 5 minutes)
timeout_seconds = 300

# Sampling temperature. Leave unset to use the model's own default.
# temperature = 0.2

[review]
# How many times to ask the model again when it answers with nothing.
max_attempts = {DEFAULT_MAX_ATTEMPTS}
"#
        )
    }
}

/// `OLLAMA_HOST` is often given as `host:port` without a scheme.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
