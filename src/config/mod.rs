use std::env;
use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// 未配置时使用进程内存储
    pub database_url: Option<String>,
    /// 未配置时节流和会话使用进程内缓存
    pub redis_url: Option<String>,
    pub throttle_window_secs: u64,
    pub throttle_sweep_interval_secs: u64,
    pub session_ttl_secs: u64,
    pub session_cookie_name: String,
    pub trusted_proxies: Vec<IpAddr>,
    pub github_client_id: String,
    pub github_client_secret: String,
    pub github_oauth_url: String,
    pub github_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 8080,
            api_base_uri: String::new(),
            database_url: None,
            redis_url: None,
            throttle_window_secs: 24 * 3600,
            throttle_sweep_interval_secs: 60,
            session_ttl_secs: 3600,
            session_cookie_name: "session_id".into(),
            trusted_proxies: Vec::new(),
            github_client_id: String::new(),
            github_client_secret: String::new(),
            github_oauth_url: "https://github.com/login/oauth/access_token".into(),
            github_api_url: "https://api.github.com/user".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        Ok(Config {
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server_port),
            api_base_uri: var("API_BASE_URI")
                .map(|uri| uri.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_uri),
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL"),
            throttle_window_secs: parse_var("THROTTLE_WINDOW")?
                .unwrap_or(defaults.throttle_window_secs),
            throttle_sweep_interval_secs: parse_var("THROTTLE_SWEEP_INTERVAL")?
                .unwrap_or(defaults.throttle_sweep_interval_secs),
            session_ttl_secs: parse_var("SESSION_TTL")?.unwrap_or(defaults.session_ttl_secs),
            session_cookie_name: var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            trusted_proxies: match var("TRUSTED_PROXIES") {
                Some(list) => parse_proxies(&list)?,
                None => defaults.trusted_proxies,
            },
            github_client_id: var("GITHUB_CLIENT_ID").unwrap_or_default(),
            github_client_secret: var("GITHUB_CLIENT_SECRET").unwrap_or_default(),
            github_oauth_url: var("GITHUB_OAUTH_URL").unwrap_or(defaults.github_oauth_url),
            github_api_url: var("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
        })
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_secs(self.throttle_window_secs)
    }

    pub fn throttle_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.throttle_sweep_interval_secs.max(1))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(None),
    }
}

fn parse_proxies(list: &str) -> Result<Vec<IpAddr>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::InvalidValue {
                name: "TRUSTED_PROXIES",
                value: s.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_proxies_are_parsed() {
        let proxies = parse_proxies("10.0.0.1, ::1,").unwrap();
        assert_eq!(proxies.len(), 2);
        assert!(parse_proxies("10.0.0.1,not-an-ip").is_err());
    }

    #[test]
    fn default_window_is_one_day() {
        assert_eq!(Config::default().throttle_window(), Duration::from_secs(86_400));
    }
}
