//! atelier.toml configuration.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:3001"
//!
//! [api]
//! url = "http://localhost:8080"
//! api_key = "secret"
//! timeout = "10s"
//!
//! [cache]
//! ttl = "30s"
//! ```
//!
//! Every field is optional. Command-line flags are applied on top with
//! [`AtelierConfig::apply`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:3001";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("invalid listen address: {0:?}")]
    InvalidListen(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: "30s".to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl AtelierConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(listen) = overrides.listen {
            self.server.listen = listen;
        }
        if let Some(port) = overrides.port {
            let host = self
                .server
                .listen
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.server.listen = format!("{host}:{port}");
        }
        if let Some(url) = overrides.api_url {
            self.api.url = url;
        }
        if let Some(key) = overrides.api_key {
            self.api.api_key = Some(key);
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.server.listen.clone()))
    }

    pub fn api_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.api.timeout).ok_or_else(|| ConfigError::InvalidDuration {
            field: "api.timeout",
            value: self.api.timeout.clone(),
        })
    }

    pub fn cache_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.cache.ttl).ok_or_else(|| ConfigError::InvalidDuration {
            field: "cache.ttl",
            value: self.cache.ttl.clone(),
        })
    }
}

/// Parse `"500ms"`, `"5s"`, `"2m"`, `"1h"` or a bare number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }
    let (number, unit) = match s.char_indices().last()? {
        (i, 's') => (&s[..i], 1),
        (i, 'm') => (&s[..i], 60),
        (i, 'h') => (&s[..i], 3600),
        _ => (s, 1),
    };
    let n: u64 = number.trim().parse().ok()?;
    Some(Duration::from_secs(n * unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AtelierConfig::default();
        assert_eq!(config.listen_addr().unwrap().port(), 3001);
        assert_eq!(config.api.url, DEFAULT_API_URL);
        assert_eq!(config.api_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn parse_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
url = "http://atelier.internal:9090"
api_key = "s3cret"

[cache]
ttl = "2m"
"#
        )
        .unwrap();

        let config = AtelierConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.listen, DEFAULT_LISTEN);
        assert_eq!(config.api.url, "http://atelier.internal:9090");
        assert_eq!(config.api.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.api.timeout, "10s");
        assert_eq!(config.cache_ttl().unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AtelierConfig::from_file(&dir.path().join("atelier.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nlisten = 3").unwrap();
        let err = AtelierConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win() {
        let mut config = AtelierConfig::default();
        config.apply(Overrides {
            port: Some(8081),
            api_url: Some("http://backend:8080".into()),
            api_key: Some("k".into()),
            ..Default::default()
        });
        assert_eq!(config.server.listen, "0.0.0.0:8081");
        assert_eq!(config.api.url, "http://backend:8080");
        assert_eq!(config.api.api_key.as_deref(), Some("k"));

        config.apply(Overrides {
            listen: Some("127.0.0.1:4000".into()),
            ..Default::default()
        });
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:4000");
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 15 "), Some(Duration::from_secs(15)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn bad_values_are_reported() {
        let mut config = AtelierConfig::default();
        config.cache.ttl = "forever".into();
        assert!(matches!(
            config.cache_ttl(),
            Err(ConfigError::InvalidDuration { field: "cache.ttl", .. })
        ));

        config.server.listen = "nowhere".into();
        assert!(matches!(config.listen_addr(), Err(ConfigError::InvalidListen(_))));
    }
}
