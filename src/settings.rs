use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::DecodingKey;
use sqlx::postgres::PgConnectOptions;
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub jwt_secret: String,
}

/// Relational backend parameters. Every field is optional; the backend is only
/// considered configured when host, credentials and database name are all present.
#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    #[serde(default = "default_snapshot_root")]
    pub snapshot_root: PathBuf,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_max_asset_size_mb")]
    pub max_asset_size_mb: f64,

    #[serde(default)]
    pub cleanup_interval: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            host: None,
            port: default_db_port(),
            username: None,
            password: None,
            name: None,
            max_connections: default_max_connections(),
            connect_retries: default_connect_retries(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            asset_root: default_asset_root(),
            snapshot_root: default_snapshot_root(),
            public_base_url: default_public_base_url(),
            max_asset_size_mb: default_max_asset_size_mb(),
            cleanup_interval: None,
        }
    }
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Stage-Store".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_db_port() -> u16 {
    5432
}
fn default_max_connections() -> u32 {
    10
}
fn default_connect_retries() -> u32 {
    3
}
fn default_asset_root() -> PathBuf {
    PathBuf::from("data/generated-images")
}
fn default_snapshot_root() -> PathBuf {
    PathBuf::from("data/stage-snapshots")
}
fn default_public_base_url() -> String {
    "/generated-images".to_string()
}
fn default_max_asset_size_mb() -> f64 {
    1024.0
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        if config.jwt_secret.trim().is_empty() {
            config.jwt_secret = env::var("APP_JWT_SECRET")
                .map_err(|_| ConfigError::Message("APP_JWT_SECRET must be set".into()))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters".to_string());
        }
        let max_mb = self.storage.max_asset_size_mb;
        if max_mb.is_nan() || max_mb <= 0.0 {
            errors.push("STORAGE__MAX_ASSET_SIZE_MB must be positive".to_string());
        }
        if let Some(raw) = &self.storage.cleanup_interval {
            if let Err(e) = humantime::parse_duration(raw) {
                errors.push(format!("STORAGE__CLEANUP_INTERVAL is invalid: {}", e));
            }
        }
        if self.storage.asset_root == self.storage.snapshot_root {
            errors.push("asset_root and snapshot_root must differ".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }
}

impl StorageSettings {
    /// Interval for the scheduled eviction pass; `None` leaves eviction to the admin route.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval
            .as_deref()
            .and_then(|raw| humantime::parse_duration(raw).ok())
    }
}

impl DatabaseSettings {
    /// Connection options for the relational backend, or `None` when the
    /// parameter set is incomplete. A partial set counts as absent.
    pub fn connect_options(&self) -> Option<PgConnectOptions> {
        let host = non_blank(&self.host)?;
        let username = non_blank(&self.username)?;
        let password = non_blank(&self.password)?;
        let name = non_blank(&self.name)?;

        Some(
            PgConnectOptions::new()
                .host(host)
                .port(self.port)
                .username(username)
                .password(password)
                .database(name)
        )
    }

    pub fn is_configured(&self) -> bool {
        self.connect_options().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database", &self.database)
            .field("storage", &self.storage)
            .field("jwt_secret", &self.jwt_secret.redact())
            .finish()
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("connect_retries", &self.connect_retries)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}
