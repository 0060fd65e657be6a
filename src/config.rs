//! Connection settings for the object store.
//!
//! Every field is resolved from an explicit override first, then from an
//! environment-like lookup, then from [`ConnectionDefaults`]. The two
//! credentials have no default: when either is absent resolution fails
//! before any client is built.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::domain::{errors::ValidationError, value_objects::BucketName};

pub const ENDPOINT_KEY: &str = "S3_ENDPOINT";
pub const REGION_KEY: &str = "S3_REGION";
pub const BUCKET_KEY: &str = "S3_BUCKET";
pub const ACCESS_KEY_KEY: &str = "S3_ACCESS_KEY";
pub const SECRET_KEY_KEY: &str = "S3_SECRET_KEY";
pub const PATH_STYLE_KEY: &str = "S3_PATH_STYLE";
pub const TIMEOUT_SECS_KEY: &str = "S3_TIMEOUT_SECS";

/// Errors raised while resolving the connection configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{} must be set", .missing.join(" and "))]
    MissingCredentials { missing: Vec<&'static str> },

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid bucket name: {0}")]
    InvalidBucket(#[from] ValidationError),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Fallback values used when neither an override nor the lookup provides one
#[derive(Debug, Clone)]
pub struct ConnectionDefaults {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub path_style: bool,
    pub timeout: Option<Duration>,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8333".to_string(),
            region: "us-east-1".to_string(),
            bucket: "email-attachments".to_string(),
            path_style: true,
            timeout: None,
        }
    }
}

/// Values supplied explicitly, typically from command line flags
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved, immutable connection configuration
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    endpoint: String,
    region: String,
    bucket: BucketName,
    access_key: String,
    secret_key: String,
    path_style: bool,
    timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Endpoint URL without a trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn path_style(&self) -> bool {
        self.path_style
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the endpoint is plain HTTP
    pub fn allow_http(&self) -> bool {
        self.endpoint.starts_with("http://")
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("path_style", &self.path_style)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolves a [`ConnectionConfig`] from overrides, a key/value lookup and defaults
pub struct ConfigResolver<L> {
    defaults: ConnectionDefaults,
    overrides: ConfigOverrides,
    lookup: L,
}

impl ConfigResolver<fn(&str) -> Option<String>> {
    /// Resolver backed by the process environment
    pub fn from_env(overrides: ConfigOverrides) -> Self {
        Self::new(ConnectionDefaults::default(), overrides, env_lookup)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl<L> ConfigResolver<L>
where
    L: Fn(&str) -> Option<String>,
{
    pub fn new(defaults: ConnectionDefaults, overrides: ConfigOverrides, lookup: L) -> Self {
        Self {
            defaults,
            overrides,
            lookup,
        }
    }

    pub fn resolve(&self) -> Result<ConnectionConfig, ConfigError> {
        let access_key = self.value(&self.overrides.access_key, ACCESS_KEY_KEY);
        let secret_key = self.value(&self.overrides.secret_key, SECRET_KEY_KEY);

        let (access_key, secret_key) = match (access_key, secret_key) {
            (Some(access_key), Some(secret_key)) => (access_key, secret_key),
            (access_key, secret_key) => {
                let mut missing = Vec::new();
                if access_key.is_none() {
                    missing.push(ACCESS_KEY_KEY);
                }
                if secret_key.is_none() {
                    missing.push(SECRET_KEY_KEY);
                }
                return Err(ConfigError::MissingCredentials { missing });
            }
        };

        let endpoint = self
            .value(&self.overrides.endpoint, ENDPOINT_KEY)
            .unwrap_or_else(|| self.defaults.endpoint.clone());
        let endpoint = normalize_endpoint(&endpoint)?;

        let region = self
            .value(&self.overrides.region, REGION_KEY)
            .unwrap_or_else(|| self.defaults.region.clone());

        let bucket = self
            .value(&self.overrides.bucket, BUCKET_KEY)
            .unwrap_or_else(|| self.defaults.bucket.clone());
        let bucket = BucketName::new(bucket)?;

        let path_style = match self.overrides.path_style {
            Some(path_style) => path_style,
            None => match self.lookup_value(PATH_STYLE_KEY) {
                Some(raw) => parse_bool(PATH_STYLE_KEY, &raw)?,
                None => self.defaults.path_style,
            },
        };

        let timeout = match self.overrides.timeout_secs {
            Some(secs) => Some(Duration::from_secs(secs)),
            None => match self.lookup_value(TIMEOUT_SECS_KEY) {
                Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue {
                        key: TIMEOUT_SECS_KEY,
                        value: raw.clone(),
                    }
                })?)),
                None => self.defaults.timeout,
            },
        };

        Ok(ConnectionConfig {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
            path_style,
            timeout,
        })
    }

    fn value(&self, explicit: &Option<String>, key: &str) -> Option<String> {
        explicit
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| self.lookup_value(key))
    }

    fn lookup_value(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }
}

fn normalize_endpoint(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver(
        vars: &[(&str, &str)],
        overrides: ConfigOverrides,
    ) -> ConfigResolver<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigResolver::new(ConnectionDefaults::default(), overrides, move |key: &str| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn test_defaults_with_credentials() {
        let config = resolver(
            &[(ACCESS_KEY_KEY, "test"), (SECRET_KEY_KEY, "test")],
            ConfigOverrides::default(),
        )
        .resolve()
        .unwrap();

        assert_eq!(config.endpoint(), "http://localhost:8333");
        assert_eq!(config.region(), "us-east-1");
        assert_eq!(config.bucket().as_str(), "email-attachments");
        assert_eq!(config.access_key(), "test");
        assert_eq!(config.secret_key(), "test");
        assert!(config.path_style());
        assert!(config.allow_http());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_missing_credentials() {
        let err = resolver(&[], ConfigOverrides::default())
            .resolve()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredentials {
                missing: vec![ACCESS_KEY_KEY, SECRET_KEY_KEY]
            }
        );
        assert_eq!(err.to_string(), "S3_ACCESS_KEY and S3_SECRET_KEY must be set");
    }

    #[test]
    fn test_empty_secret_counts_as_missing() {
        let err = resolver(
            &[(ACCESS_KEY_KEY, "test"), (SECRET_KEY_KEY, "")],
            ConfigOverrides::default(),
        )
        .resolve()
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredentials {
                missing: vec![SECRET_KEY_KEY]
            }
        );
    }

    #[test]
    fn test_overrides_win_over_lookup() {
        let overrides = ConfigOverrides {
            endpoint: Some("https://s3.example.com/".to_string()),
            bucket: Some("other-bucket".to_string()),
            access_key: Some("flag-key".to_string()),
            path_style: Some(false),
            timeout_secs: Some(5),
            ..Default::default()
        };
        let config = resolver(
            &[
                (ENDPOINT_KEY, "http://ignored:9000"),
                (ACCESS_KEY_KEY, "env-key"),
                (SECRET_KEY_KEY, "env-secret"),
                (REGION_KEY, "eu-west-1"),
            ],
            overrides,
        )
        .resolve()
        .unwrap();

        assert_eq!(config.endpoint(), "https://s3.example.com");
        assert!(!config.allow_http());
        assert_eq!(config.bucket().as_str(), "other-bucket");
        assert_eq!(config.access_key(), "flag-key");
        assert_eq!(config.secret_key(), "env-secret");
        assert_eq!(config.region(), "eu-west-1");
        assert!(!config.path_style());
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_lookup_path_style_and_timeout() {
        let config = resolver(
            &[
                (ACCESS_KEY_KEY, "k"),
                (SECRET_KEY_KEY, "s"),
                (PATH_STYLE_KEY, "no"),
                (TIMEOUT_SECS_KEY, "30"),
            ],
            ConfigOverrides::default(),
        )
        .resolve()
        .unwrap();

        assert!(!config.path_style());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values() {
        let creds = [(ACCESS_KEY_KEY, "k"), (SECRET_KEY_KEY, "s")];

        let mut vars = creds.to_vec();
        vars.push((PATH_STYLE_KEY, "maybe"));
        assert!(matches!(
            resolver(&vars, ConfigOverrides::default()).resolve(),
            Err(ConfigError::InvalidValue { key: PATH_STYLE_KEY, .. })
        ));

        let mut vars = creds.to_vec();
        vars.push((ENDPOINT_KEY, "ftp://localhost:21"));
        assert!(matches!(
            resolver(&vars, ConfigOverrides::default()).resolve(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));

        let mut vars = creds.to_vec();
        vars.push((BUCKET_KEY, "Not_A_Bucket"));
        assert!(matches!(
            resolver(&vars, ConfigOverrides::default()).resolve(),
            Err(ConfigError::InvalidBucket(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = resolver(
            &[(ACCESS_KEY_KEY, "visible"), (SECRET_KEY_KEY, "hunter2")],
            ConfigOverrides::default(),
        )
        .resolve()
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("visible"));
        assert!(!rendered.contains("hunter2"));
    }
}
