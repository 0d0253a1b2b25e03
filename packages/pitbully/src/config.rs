use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration loaded from environment variables.
///
/// Every section also deserializes with defaults, so a host can embed it in
/// its own configuration document instead of using the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub requests: RequestConfig,
    /// Seconds between background flushes of the store. Zero disables it.
    pub autosave_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let backend: StorageBackend = env::var("PITBULLY_STORAGE")
            .unwrap_or_else(|_| "file".to_string())
            .parse()
            .context("PITBULLY_STORAGE must be one of file, mysql, mariadb, postgresql, sqlite")?;

        let kind = backend.database_kind().unwrap_or_default();
        let defaults = DatabaseConfig::default();

        let database = DatabaseConfig {
            kind,
            host: env::var("PITBULLY_DB_HOST").unwrap_or(defaults.host),
            port: match env::var("PITBULLY_DB_PORT") {
                Ok(port) => port
                    .parse()
                    .context("PITBULLY_DB_PORT must be a valid port number")?,
                Err(_) => kind.default_port(),
            },
            database: env::var("PITBULLY_DB_NAME").unwrap_or(defaults.database),
            username: env::var("PITBULLY_DB_USER").unwrap_or(defaults.username),
            password: env::var("PITBULLY_DB_PASSWORD").unwrap_or(defaults.password),
            use_ssl: env_flag("PITBULLY_DB_USE_SSL", defaults.use_ssl)?,
            verify_server_certificate: env_flag(
                "PITBULLY_DB_VERIFY_SERVER_CERTIFICATE",
                defaults.verify_server_certificate,
            )?,
            data_dir: env::var("PITBULLY_DB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            pool: PoolConfig {
                max_size: env_number("PITBULLY_POOL_MAX_SIZE", defaults.pool.max_size)?,
                connection_timeout_ms: env_number(
                    "PITBULLY_POOL_CONNECTION_TIMEOUT_MS",
                    defaults.pool.connection_timeout_ms,
                )?,
                max_lifetime_ms: env_number(
                    "PITBULLY_POOL_MAX_LIFETIME_MS",
                    defaults.pool.max_lifetime_ms,
                )?,
            },
        };

        let request_defaults = RequestConfig::default();

        Ok(Self {
            storage: StorageConfig {
                backend,
                data_file: env::var("PITBULLY_DATA_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_data_file()),
                database,
            },
            requests: RequestConfig {
                timeout_secs: env_number("PITBULLY_TPA_TIMEOUT_SECS", request_defaults.timeout_secs)?,
                safe_scan_height: env_number(
                    "PITBULLY_SAFE_SCAN_HEIGHT",
                    request_defaults.safe_scan_height,
                )?,
            },
            autosave_secs: env_number("PITBULLY_AUTOSAVE_SECS", 300)?,
        })
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_secs > 0).then(|| Duration::from_secs(self.autosave_secs))
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow!("{} must be a boolean, got {:?}", key, other)),
        },
        Err(_) => Ok(default),
    }
}

fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("plugins/Pitbully/locations.yml")
}

// =============================================================================
// Storage
// =============================================================================

/// Which backend holds location records. Chosen once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum StorageBackend {
    #[default]
    File,
    Database(DatabaseKind),
}

impl StorageBackend {
    pub fn database_kind(&self) -> Option<DatabaseKind> {
        match self {
            StorageBackend::File => None,
            StorageBackend::Database(kind) => Some(*kind),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "yaml" | "yml" => Ok(StorageBackend::File),
            other => other.parse().map(StorageBackend::Database),
        }
    }
}

impl TryFrom<String> for StorageBackend {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Database(kind) => write!(f, "{}", kind),
        }
    }
}

/// Relational database families with distinct SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DatabaseKind {
    #[default]
    MySql,
    MariaDb,
    Postgres,
    Sqlite,
}

impl DatabaseKind {
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseKind::MySql | DatabaseKind::MariaDb => 3306,
            DatabaseKind::Postgres => 5432,
            DatabaseKind::Sqlite => 0,
        }
    }

    /// File-oriented engines ignore host, port and credentials.
    pub fn is_file_based(&self) -> bool {
        matches!(self, DatabaseKind::Sqlite)
    }

    pub fn all() -> [DatabaseKind; 4] {
        [
            DatabaseKind::MySql,
            DatabaseKind::MariaDb,
            DatabaseKind::Postgres,
            DatabaseKind::Sqlite,
        ]
    }
}

impl FromStr for DatabaseKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(DatabaseKind::MySql),
            "mariadb" => Ok(DatabaseKind::MariaDb),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            other => Err(anyhow!("unknown storage backend {:?}", other)),
        }
    }
}

impl TryFrom<String> for DatabaseKind {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatabaseKind::MySql => "mysql",
            DatabaseKind::MariaDb => "mariadb",
            DatabaseKind::Postgres => "postgresql",
            DatabaseKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Structured document used by the file backend.
    pub data_file: PathBuf,
    pub database: DatabaseConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_file: default_data_file(),
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub use_ssl: bool,
    pub verify_server_certificate: bool,
    /// Where file-oriented engines keep their database file.
    pub data_dir: PathBuf,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::MySql,
            host: "localhost".to_string(),
            port: DatabaseKind::MySql.default_port(),
            database: "pitbully".to_string(),
            username: "root".to_string(),
            password: String::new(),
            use_ssl: false,
            verify_server_certificate: true,
            data_dir: PathBuf::from("plugins/Pitbully"),
            pool: PoolConfig::default(),
        }
    }
}

/// Bounded connection pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_size: u32,
    pub connection_timeout_ms: u64,
    pub max_lifetime_ms: u64,
}

impl PoolConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_millis(self.max_lifetime_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout_ms: 30_000,
            max_lifetime_ms: 1_800_000,
        }
    }
}

// =============================================================================
// Teleport requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Seconds a teleport request stays pending before it lapses.
    pub timeout_secs: u64,
    /// How far above the target the safe-landing scan may climb.
    pub safe_scan_height: u32,
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            safe_scan_height: 384,
        }
    }
}
