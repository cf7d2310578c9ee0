//! Configuration management for the analysis pipeline
//!
//! Values are read through [`ConfigProvider`] implementations so that the
//! binaries can load them from the environment while tests supply them from
//! memory. Keys are lowercase (`llm_api_key`); the environment provider turns
//! them into `RELIVE_LLM_API_KEY`.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{Result, ServiceError};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model priority list, most preferred first
pub const DEFAULT_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid float for key {}: {}", key, e)))
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(ServiceError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a comma separated list, skipping empty entries
    fn get_list(&self, key: &str) -> Result<Vec<String>> {
        let value = self.get_string(key)?;
        Ok(value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    fn get_float_or(&self, key: &str, default: f64) -> f64 {
        self.get_float(key).unwrap_or(default)
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the end of the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }

    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.add_provider(provider);
        self
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.get_string(key).ok())
            .ok_or_else(|| {
                ServiceError::configuration(format!(
                    "Configuration key not found in any provider: {}",
                    key
                ))
            })
    }
}

/// Provider used by the binaries: `RELIVE_*` variables first, then unprefixed
/// ones such as `OPENAI_API_KEY`
pub fn default_provider() -> CompositeConfigProvider {
    CompositeConfigProvider::new()
        .with_provider(EnvConfigProvider::new().with_prefix("RELIVE"))
        .with_provider(EnvConfigProvider::new())
}

/// Narrow an integer setting, rejecting negative or out-of-range values
fn checked<T: TryFrom<i64>>(key: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| {
        ServiceError::configuration(format!("Value out of range for key {}: {}", key, value))
    })
}

/// Trait for service-specific configuration
pub trait ServiceConfig: fmt::Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}

/// Connection settings for an OpenAI-compatible chat completion provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key; empty when no credential was configured
    pub api_key: String,

    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Timeout in seconds for a single HTTP call
    pub timeout_seconds: u64,

    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 60,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 2048,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &crate::util::redact_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProviderConfig {
    /// Load configuration from a config provider
    ///
    /// A missing API key is not an error here: the pipeline reports it as a
    /// configuration error per request, and the gateway stays up in a
    /// degraded state.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let api_key = provider
            .get_string("llm_api_key")
            .or_else(|_| provider.get_string("openai_api_key"))
            .unwrap_or_default()
            .trim()
            .to_string();

        let timeout_seconds = provider.get_int_or("llm_timeout_seconds", defaults.timeout_seconds as i64);
        let max_tokens = provider.get_int_or("max_tokens", defaults.max_tokens as i64);

        let config = Self {
            api_key,
            base_url: provider
                .get_string_or("llm_base_url", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds: checked("llm_timeout_seconds", timeout_seconds)?,
            temperature: provider.get_float_or("temperature", defaults.temperature as f64) as f32,
            top_p: provider.get_float_or("top_p", defaults.top_p as f64) as f32,
            max_tokens: checked("max_tokens", max_tokens)?,
        };

        config.validate_settings()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn validate_settings(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            ServiceError::configuration(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;

        if self.timeout_seconds == 0 {
            return Err(ServiceError::configuration("Timeout must be at least one second"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ServiceError::configuration(format!(
                "Temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ServiceError::configuration(format!(
                "top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }

        Ok(())
    }
}

impl ServiceConfig for ProviderConfig {
    fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            return Err(ServiceError::configuration(
                "LLM API key is required (set RELIVE_LLM_API_KEY or OPENAI_API_KEY)",
            ));
        }
        self.validate_settings()
    }
}

/// Pipeline behavior: model priority, retry policy and client timing
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Model ids in priority order
    pub models: Vec<String>,

    /// Attempts per model, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,

    /// Serve a canned result when every model is exhausted
    pub graceful_degradation: bool,

    /// Delay between a successful analysis and the results navigation event
    pub navigation_delay: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            graceful_degradation: false,
            navigation_delay: Duration::from_millis(1500),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let models = match provider.get_list("llm_models") {
            Ok(models) => models,
            Err(_) => defaults.models,
        };

        let max_attempts = provider.get_int_or("retry_max_attempts", defaults.max_attempts as i64);
        let base_delay_ms =
            provider.get_int_or("retry_base_delay_ms", defaults.base_delay.as_millis() as i64);
        let navigation_delay_ms = provider.get_int_or(
            "navigation_delay_ms",
            defaults.navigation_delay.as_millis() as i64,
        );

        let config = Self {
            models,
            max_attempts: checked("retry_max_attempts", max_attempts)?,
            base_delay: Duration::from_millis(checked("retry_base_delay_ms", base_delay_ms)?),
            graceful_degradation: provider.get_bool_or("graceful_degradation", defaults.graceful_degradation),
            navigation_delay: Duration::from_millis(checked("navigation_delay_ms", navigation_delay_ms)?),
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for AnalysisConfig {
    fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ServiceError::configuration("At least one model must be configured"));
        }

        if self.max_attempts == 0 {
            return Err(ServiceError::configuration("max_attempts must be at least 1"));
        }

        Ok(())
    }
}
