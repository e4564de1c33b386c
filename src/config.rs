use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default Abstract API IP geolocation endpoint
pub const DEFAULT_BASE_URL: &str = "https://ipgeolocation.abstractapi.com/v1/";

/// Default timeout for lookup requests in seconds
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Default timeout for connectivity probes in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

pub struct IpscopeConfig {
    /// Abstract API key used for every request
    pub api_key: String,

    /// Base URL of the geolocation endpoint
    pub base_url: String,

    /// Timeout for lookup requests in seconds (default: 10)
    pub lookup_timeout_secs: u64,

    /// Timeout for connectivity probes in seconds (default: 5)
    pub connect_timeout_secs: u64,
}

const EMPTY_CONFIG: &str = r#"### ipscope configuration file

### Abstract API key used for every lookup (required)
### can also be provided via the IPSCOPE_API_KEY environment variable
# api_key = ""

### geolocation endpoint base URL
# base_url = "https://ipgeolocation.abstractapi.com/v1/"

### request timeout settings (in seconds)
# lookup_timeout_secs = 10
# connect_timeout_secs = 5
"#;

impl Default for IpscopeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl IpscopeConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<IpscopeConfig> {
        // Pick up a .env file if one is present (e.g. IPSCOPE_API_KEY=...)
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();

        // By default use $HOME/.ipscope/ipscope.toml as the configuration file path
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        // Config dir
        let ipscope_dir = format!("{}/.ipscope", home_dir.as_str());

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(ipscope_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create ipscope directory: {}", e))?;
                let p = format!("{}/ipscope.toml", ipscope_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of IPSCOPE)
        // E.g., `IPSCOPE_API_KEY=xxxx ./ipscope` would set the API key
        builder = builder.add_source(config::Environment::with_prefix("IPSCOPE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        // The API key is the only required setting. A missing credential is fatal
        // at startup, before any request is attempted.
        let api_key = match config.get("api_key") {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                return Err(anyhow!(
                    "api_key not set. Add it to {} or set IPSCOPE_API_KEY.",
                    Self::config_file_path()
                ))
            }
        };

        let base_url = config
            .get("base_url")
            .map(|s| s.to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let lookup_timeout_secs = config
            .get("lookup_timeout_secs")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS);

        let connect_timeout_secs = config
            .get("connect_timeout_secs")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(IpscopeConfig {
            api_key,
            base_url,
            lookup_timeout_secs,
            connect_timeout_secs,
        })
    }

    /// Get lookup timeout as Duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Get connectivity probe timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Display configuration summary; the API key is redacted
    pub fn summary(&self) -> String {
        let lines = vec![
            format!("API Key:            {}", redact_key(&self.api_key)),
            format!("Base URL:           {}", self.base_url),
            format!("Lookup Timeout:     {} seconds", self.lookup_timeout_secs),
            format!("Probe Timeout:      {} seconds", self.connect_timeout_secs),
        ];
        lines.join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.ipscope/ipscope.toml", home_dir)
    }
}

/// Show at most the first four characters of a credential
fn redact_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let visible: String = key.chars().take(4).collect();
    format!("{}****", visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IpscopeConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.lookup_timeout_secs, 10);
        assert_eq!(config.connect_timeout_secs, 5);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_timeout_durations() {
        let config = IpscopeConfig {
            api_key: "k".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            lookup_timeout_secs: 7,
            connect_timeout_secs: 3,
        };

        assert_eq!(config.lookup_timeout(), Duration::from_secs(7));
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_redact_key() {
        assert_eq!(redact_key(""), "(not set)");
        assert_eq!(redact_key("abcd1234"), "abcd****");
        assert_eq!(redact_key("ab"), "ab****");
    }

    #[test]
    fn test_summary_redacts_key() {
        let config = IpscopeConfig {
            api_key: "secret-key-value".to_string(),
            ..Default::default()
        };
        let summary = config.summary();
        assert!(!summary.contains("secret-key-value"));
        assert!(summary.contains("secr****"));
    }
}
