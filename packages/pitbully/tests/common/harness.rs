//! Test harness for storage integration tests.
//!
//! `StoreHarness` gives each test its own scratch directory for the YAML
//! file and the SQLite database. `PostgresHarness` and `MySqlHarness` each
//! share one container across the run; tests using them need Docker and are
//! ignored by default (`cargo test -- --ignored`).

#![allow(dead_code)]

use anyhow::{Context, Result};
use pitbully_core::config::{DatabaseConfig, DatabaseKind, PoolConfig};
use pitbully_core::domains::locations::{SqlLocationStore, YamlLocationStore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::mysql::Mysql;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Install a subscriber that respects RUST_LOG.
/// Run tests with: RUST_LOG=debug cargo test -- --nocapture
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn small_pool() -> PoolConfig {
    PoolConfig {
        max_size: 2,
        connection_timeout_ms: 5_000,
        max_lifetime_ms: 60_000,
    }
}

// =============================================================================
// Scratch directory harness (YAML + SQLite)
// =============================================================================

/// The directory is removed when the harness drops, even if the test panics.
pub struct StoreHarness {
    pub dir: PathBuf,
    _temp: TempDir,
}

impl AsyncTestContext for StoreHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create store harness")
    }

    async fn teardown(self) {
        drop(self);
    }
}

impl StoreHarness {
    pub async fn new() -> Result<Self> {
        init_tracing();
        let temp = tempfile::Builder::new()
            .prefix("pitbully-test-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        Ok(Self {
            dir: temp.path().to_path_buf(),
            _temp: temp,
        })
    }

    pub fn yaml_path(&self) -> PathBuf {
        self.dir.join("locations.yml")
    }

    pub fn yaml_store(&self) -> YamlLocationStore {
        YamlLocationStore::new(self.yaml_path())
    }

    pub async fn write_yaml(&self, contents: &str) -> Result<()> {
        tokio::fs::write(self.yaml_path(), contents)
            .await
            .context("Failed to write fixture document")
    }

    pub async fn read_yaml(&self) -> Result<String> {
        tokio::fs::read_to_string(self.yaml_path())
            .await
            .context("Failed to read location document")
    }

    pub fn sqlite_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            kind: DatabaseKind::Sqlite,
            database: "pitbully".to_string(),
            data_dir: self.dir.clone(),
            pool: small_pool(),
            ..DatabaseConfig::default()
        }
    }

    pub async fn sqlite_store(&self) -> Result<SqlLocationStore> {
        SqlLocationStore::connect(&self.sqlite_config())
            .await
            .context("Failed to open SQLite store")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// =============================================================================
// Shared Postgres container
// =============================================================================

struct SharedPostgres {
    host: String,
    port: u16,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_POSTGRES: OnceCell<SharedPostgres> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        init_tracing();
        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?.to_string();
        let port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            host,
            port,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_POSTGRES
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared Postgres container")
            })
            .await
    }
}

/// Relational store on the shared Postgres container. Tables are shared
/// between tests, so tests use fresh actor ids and unique warp names.
pub struct PostgresHarness {
    pub store: SqlLocationStore,
}

impl AsyncTestContext for PostgresHarness {
    async fn setup() -> Self {
        let shared = SharedPostgres::get().await;
        let config = DatabaseConfig {
            kind: DatabaseKind::Postgres,
            host: shared.host.clone(),
            port: shared.port,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            pool: small_pool(),
            ..DatabaseConfig::default()
        };
        let store = SqlLocationStore::connect(&config)
            .await
            .expect("Failed to connect to Postgres");
        Self { store }
    }

    async fn teardown(self) {
        use pitbully_core::domains::locations::LocationStore;
        let _ = self.store.close().await;
    }
}

// =============================================================================
// Shared MySQL container
// =============================================================================

struct SharedMySql {
    host: String,
    port: u16,
    _mysql: ContainerAsync<Mysql>,
}

static SHARED_MYSQL: OnceCell<SharedMySql> = OnceCell::const_new();

impl SharedMySql {
    async fn init() -> Result<Self> {
        init_tracing();
        let mysql = Mysql::default()
            .start()
            .await
            .context("Failed to start MySQL container")?;

        let host = mysql.get_host().await?.to_string();
        let port = mysql.get_host_port_ipv4(3306).await?;

        Ok(Self {
            host,
            port,
            _mysql: mysql,
        })
    }

    async fn get() -> &'static Self {
        SHARED_MYSQL
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared MySQL container")
            })
            .await
    }
}

/// Relational store on the shared MySQL container, logged in as `root`
/// (no password) against the image's `test` database.
pub struct MySqlHarness {
    pub store: SqlLocationStore,
}

impl AsyncTestContext for MySqlHarness {
    async fn setup() -> Self {
        let shared = SharedMySql::get().await;
        let config = DatabaseConfig {
            kind: DatabaseKind::MySql,
            host: shared.host.clone(),
            port: shared.port,
            database: "test".to_string(),
            username: "root".to_string(),
            password: String::new(),
            use_ssl: false,
            pool: small_pool(),
            ..DatabaseConfig::default()
        };
        let store = SqlLocationStore::connect(&config)
            .await
            .expect("Failed to connect to MySQL");
        Self { store }
    }

    async fn teardown(self) {
        use pitbully_core::domains::locations::LocationStore;
        let _ = self.store.close().await;
    }
}
