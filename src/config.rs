use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub api_nonce: Option<String>,
    pub login_url: String,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/offline_queue.json"),
            api_base_url: "http://127.0.0.1:8000/wp-json/fasting/v1".to_string(),
            api_token: None,
            api_nonce: None,
            login_url: "/wp-login.php".to_string(),
            sync_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: parse_or(non_empty("PORT"), "PORT", defaults.port),
            data_path: non_empty("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            api_base_url: non_empty("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            api_token: non_empty("API_TOKEN"),
            api_nonce: non_empty("API_NONCE"),
            login_url: non_empty("LOGIN_URL").unwrap_or(defaults.login_url),
            sync_interval: Duration::from_secs(parse_or(
                non_empty("SYNC_INTERVAL_SECS"),
                "SYNC_INTERVAL_SECS",
                defaults.sync_interval.as_secs(),
            )
            .max(1)),
            request_timeout: Duration::from_secs(parse_or(
                non_empty("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.sync_interval, Duration::from_secs(30));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn reads_and_trims_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("API_BASE_URL", "https://example.com/wp-json/fasting/v1/"),
            ("API_TOKEN", "abc"),
            ("SYNC_INTERVAL_SECS", "nope"),
            ("API_NONCE", "  "),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_base_url, "https://example.com/wp-json/fasting/v1");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert!(config.api_nonce.is_none());
        assert_eq!(config.sync_interval, Duration::from_secs(30));
    }
}
