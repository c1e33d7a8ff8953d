use serde::Deserialize;
use std::{collections::HashMap, env};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;
pub const DEFAULT_ASSISTANT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_SEARCH_MAX_RESULTS: u32 = 5;
pub const DEFAULT_SEARCH_TIMEOUT_SECONDS: u64 = 15;

/// Domains the legal search is narrowed to unless configured otherwise
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "lovdata.no",
    "regjeringen.no",
    "domstol.no",
    "stortinget.no",
];

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            assistant: AssistantConfig::from_env()?,
            search: SearchConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| "SERVER_PORT must be a valid port number")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl LoggingConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        let mut modules = HashMap::new();

        // Load module-specific log levels
        if let Ok(level) = env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_ASSISTANT_PROVIDERS") {
            modules.insert("assistant_providers".to_string(), level);
        }

        Ok(Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| default_log_format()),
            modules,
        })
    }

    /// Build an env-filter directive string, e.g. `info,api=debug`
    pub fn filter_directive(&self) -> String {
        let mut filter = self.level.clone();
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        for (module, level) in modules {
            filter.push_str(&format!(",{module}={level}"));
        }
        filter
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            modules: HashMap::new(),
        }
    }
}

/// Hosted assistant (threads and runs) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Bearer credential for the hosted conversation service
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Identifier of the provisioned assistant runs are started against
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Upper bound on tool-call rounds within a single turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default = "default_assistant_timeout")]
    pub timeout_seconds: u64,
}

fn default_openai_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}

fn default_assistant_timeout() -> u64 {
    DEFAULT_ASSISTANT_TIMEOUT_SECONDS
}

impl AssistantConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| default_openai_base_url()),
            assistant_id: non_empty_var("ASSISTANT_ID"),
            max_tool_rounds: env::var("ASSISTANT_MAX_TOOL_ROUNDS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|_| "ASSISTANT_MAX_TOOL_ROUNDS must be a valid number")?
                .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
            timeout_seconds: env::var("ASSISTANT_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ASSISTANT_TIMEOUT_SECONDS),
        })
    }

    /// Both the credential and the assistant id are required to start runs
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.assistant_id.is_some()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            assistant_id: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            timeout_seconds: DEFAULT_ASSISTANT_TIMEOUT_SECONDS,
        }
    }
}

/// Web search provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Provider credential; when absent every search yields no results
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_serper_base_url")]
    pub base_url: String,
    #[serde(default = "default_trusted_domains")]
    pub trusted_domains: Vec<String>,
    #[serde(default = "default_search_max_results")]
    pub max_results: u32,
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

fn default_serper_base_url() -> String {
    DEFAULT_SERPER_BASE_URL.to_string()
}

fn default_trusted_domains() -> Vec<String> {
    DEFAULT_TRUSTED_DOMAINS
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_search_max_results() -> u32 {
    DEFAULT_SEARCH_MAX_RESULTS
}

fn default_search_timeout() -> u64 {
    DEFAULT_SEARCH_TIMEOUT_SECONDS
}

impl SearchConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, String> {
        let trusted_domains = env::var("SEARCH_TRUSTED_DOMAINS")
            .ok()
            .map(|domains| parse_domain_list(&domains))
            .filter(|domains| !domains.is_empty())
            .unwrap_or_else(default_trusted_domains);

        Ok(Self {
            api_key: non_empty_var("SERPER_API_KEY"),
            base_url: env::var("SERPER_BASE_URL").unwrap_or_else(|_| default_serper_base_url()),
            trusted_domains,
            max_results: env::var("SEARCH_MAX_RESULTS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|_| "SEARCH_MAX_RESULTS must be a valid number")?
                .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
            timeout_seconds: env::var("SEARCH_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECONDS),
        })
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_serper_base_url(),
            trusted_domains: default_trusted_domains(),
            max_results: DEFAULT_SEARCH_MAX_RESULTS,
            timeout_seconds: DEFAULT_SEARCH_TIMEOUT_SECONDS,
        }
    }
}

/// Split a comma separated domain list, dropping blanks
pub fn parse_domain_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read an environment variable, treating an empty value as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_list() {
        assert_eq!(
            parse_domain_list("lovdata.no, domstol.no,,  "),
            vec!["lovdata.no".to_string(), "domstol.no".to_string()]
        );
        assert!(parse_domain_list(" , ").is_empty());
    }

    #[test]
    fn test_assistant_config_requires_key_and_id() {
        let mut config = AssistantConfig::default();
        assert!(!config.is_configured());

        config.api_key = Some("sk-test".to_string());
        assert!(!config.is_configured());

        config.assistant_id = Some("asst_123".to_string());
        assert!(config.is_configured());
    }

    #[test]
    fn test_logging_filter_directive_is_stable() {
        let mut modules = HashMap::new();
        modules.insert("services".to_string(), "trace".to_string());
        modules.insert("api".to_string(), "debug".to_string());
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: "json".to_string(),
            modules,
        };

        assert_eq!(config.filter_directive(), "warn,api=debug,services=trace");
    }

    #[test]
    fn test_search_defaults() {
        let config = SearchConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_SERPER_BASE_URL);
        assert_eq!(config.trusted_domains.len(), DEFAULT_TRUSTED_DOMAINS.len());
        assert_eq!(config.max_results, DEFAULT_SEARCH_MAX_RESULTS);
    }
}
