// SqlLocationStore - relational backend over a bounded sqlx pool
//
// Every write runs in its own transaction, so write-through of the last
// location and the replace-on-save of the world spawn are atomic. Upserts
// follow the dialect's style; engines without native upsert delete the keyed
// row and insert a fresh one inside that transaction.

pub mod connection;
pub mod dialect;
pub mod migrate;

pub use connection::{build_connection_url, connect_pool, redact_url};
pub use dialect::{Dialect, Upsert, UpsertStyle};
pub use migrate::MigrationReport;

use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, AnyPool, Row};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};

use crate::common::{ActorId, Coordinate};
use crate::config::{DatabaseConfig, DatabaseKind, StorageBackend};
use crate::domains::locations::error::{LocationError, StoreResult};
use crate::domains::locations::models::{LocationKind, PlayerLocations};
use crate::domains::locations::store::LocationStore;
use dialect::{PLAYER_LOCATIONS, PLAYER_SETTINGS, WARP_LOCATIONS, WORLD_SPAWN};

const COORDINATE_COLUMNS: &[&str] = &["x", "y", "z", "yaw", "pitch"];

/// A bound statement parameter.
#[derive(Debug, Clone)]
enum Param {
    Text(String),
    Real(f64),
    Int(i64),
}

fn bind<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    params: &[Param],
) -> Query<'q, Any, AnyArguments<'q>> {
    for param in params {
        query = match param {
            Param::Text(value) => query.bind(value.clone()),
            Param::Real(value) => query.bind(*value),
            Param::Int(value) => query.bind(*value),
        };
    }
    query
}

fn axes(location: &Coordinate) -> [Param; 5] {
    [
        Param::Real(location.x),
        Param::Real(location.y),
        Param::Real(location.z),
        Param::Real(f64::from(location.yaw)),
        Param::Real(f64::from(location.pitch)),
    ]
}

fn world_and_axes(location: &Coordinate) -> Vec<Param> {
    std::iter::once(Param::Text(location.world.clone()))
        .chain(axes(location))
        .collect()
}

fn coordinate_from_row(row: &AnyRow) -> Result<Coordinate, sqlx::Error> {
    Ok(Coordinate {
        world: row.try_get("world_name")?,
        x: row.try_get("x")?,
        y: row.try_get("y")?,
        z: row.try_get("z")?,
        yaw: row.try_get::<f64, _>("yaw")? as f32,
        pitch: row.try_get::<f64, _>("pitch")? as f32,
    })
}

fn actor_from_row(row: &AnyRow) -> StoreResult<ActorId> {
    let raw: String = row.try_get("player_id")?;
    ActorId::parse(&raw).map_err(|_| LocationError::InvalidActorId(raw))
}

/// Prepared statement text for one dialect.
struct Statements {
    upsert_location: Upsert,
    upsert_setting: Upsert,
    upsert_warp: Upsert,
    upsert_spawn: Upsert,
    select_location: String,
    select_locations_of_kind: String,
    select_player_locations: String,
    select_all_player_locations: String,
    delete_location: String,
    delete_player_locations: String,
    select_keep_xp: String,
    select_all_settings: String,
    select_warp: String,
    select_all_warps: String,
    delete_warp: String,
    select_spawn: String,
    delete_other_spawns: String,
}

impl Statements {
    fn new(dialect: Dialect) -> Self {
        let with_world: Vec<&str> = std::iter::once("world_name")
            .chain(COORDINATE_COLUMNS.iter().copied())
            .collect();

        Self {
            upsert_location: dialect.upsert(
                PLAYER_LOCATIONS,
                &["player_id", "location_type"],
                &with_world,
            ),
            upsert_setting: dialect.upsert(PLAYER_SETTINGS, &["player_id"], &["keep_xp"]),
            upsert_warp: dialect.upsert(WARP_LOCATIONS, &["warp_name"], &with_world),
            upsert_spawn: dialect.upsert(WORLD_SPAWN, &["world_name"], COORDINATE_COLUMNS),
            select_location: dialect.sql(
                "SELECT world_name, x, y, z, yaw, pitch FROM player_locations \
                 WHERE player_id = ? AND location_type = ?",
            ),
            select_locations_of_kind: dialect.sql(
                "SELECT player_id, world_name, x, y, z, yaw, pitch FROM player_locations \
                 WHERE location_type = ?",
            ),
            select_player_locations: dialect.sql(
                "SELECT location_type, world_name, x, y, z, yaw, pitch FROM player_locations \
                 WHERE player_id = ?",
            ),
            select_all_player_locations: dialect.sql(
                "SELECT player_id, location_type, world_name, x, y, z, yaw, pitch \
                 FROM player_locations",
            ),
            delete_location: dialect
                .sql("DELETE FROM player_locations WHERE player_id = ? AND location_type = ?"),
            delete_player_locations: dialect
                .sql("DELETE FROM player_locations WHERE player_id = ?"),
            select_keep_xp: dialect.sql("SELECT keep_xp FROM player_settings WHERE player_id = ?"),
            select_all_settings: dialect.sql("SELECT player_id, keep_xp FROM player_settings"),
            select_warp: dialect.sql(
                "SELECT world_name, x, y, z, yaw, pitch FROM warp_locations WHERE warp_name = ?",
            ),
            select_all_warps: dialect.sql(
                "SELECT warp_name, world_name, x, y, z, yaw, pitch FROM warp_locations",
            ),
            delete_warp: dialect.sql("DELETE FROM warp_locations WHERE warp_name = ?"),
            select_spawn: dialect.sql("SELECT world_name, x, y, z, yaw, pitch FROM world_spawn"),
            delete_other_spawns: dialect.sql("DELETE FROM world_spawn WHERE world_name <> ?"),
        }
    }
}

async fn run_upsert(
    conn: &mut AnyConnection,
    upsert: &Upsert,
    keys: Vec<Param>,
    values: Vec<Param>,
) -> Result<(), sqlx::Error> {
    match upsert {
        Upsert::Single(sql) => {
            let params: Vec<Param> = keys.into_iter().chain(values).collect();
            bind(sqlx::query(sql), &params).execute(&mut *conn).await?;
        }
        Upsert::DeleteThenInsert { delete, insert } => {
            bind(sqlx::query(delete), &keys).execute(&mut *conn).await?;
            let params: Vec<Param> = keys.into_iter().chain(values).collect();
            bind(sqlx::query(insert), &params).execute(&mut *conn).await?;
        }
    }
    Ok(())
}

/// Location store backed by MySQL, MariaDB, PostgreSQL or SQLite.
pub struct SqlLocationStore {
    pool: AnyPool,
    dialect: Dialect,
    statements: Statements,
}

impl SqlLocationStore {
    /// Connect and create any missing tables.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = connect_pool(config).await.inspect_err(|error| {
            error!(
                operation = "connect",
                backend = %config.kind,
                host = %config.host,
                database = %config.database,
                %error,
                "failed to connect to location database"
            )
        })?;
        let store = Self::from_pool(pool, config.kind);
        store.init_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool. The schema is not touched.
    pub fn from_pool(pool: AnyPool, kind: DatabaseKind) -> Self {
        let dialect = Dialect::new(kind);
        Self {
            pool,
            dialect,
            statements: Statements::new(dialect),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create every table if it does not exist yet.
    pub async fn init_schema(&self) -> StoreResult<()> {
        for ddl in self.dialect.schema() {
            sqlx::raw_sql(&ddl)
                .execute(&self.pool)
                .await
                .inspect_err(|error| {
                    error!(operation = "init_schema", backend = %self.dialect.kind(), %error, "failed to create location tables")
                })?;
        }
        debug!(backend = %self.dialect.kind(), "location schema ready");
        Ok(())
    }

    async fn upsert_location(
        &self,
        conn: &mut AnyConnection,
        actor: ActorId,
        kind: LocationKind,
        location: &Coordinate,
    ) -> Result<(), sqlx::Error> {
        run_upsert(
            conn,
            &self.statements.upsert_location,
            vec![
                Param::Text(actor.to_string()),
                Param::Text(kind.as_str().to_string()),
            ],
            world_and_axes(location),
        )
        .await
    }

    async fn upsert_keep_xp(
        &self,
        conn: &mut AnyConnection,
        actor: ActorId,
        keep_xp: bool,
    ) -> Result<(), sqlx::Error> {
        run_upsert(
            conn,
            &self.statements.upsert_setting,
            vec![Param::Text(actor.to_string())],
            vec![Param::Int(i64::from(keep_xp))],
        )
        .await
    }

    async fn write_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
        location: &Coordinate,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        self.upsert_location(&mut tx, actor, kind, location).await?;
        if kind.writes_through() {
            self.upsert_location(&mut tx, actor, LocationKind::Last, location)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn read_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
    ) -> StoreResult<Option<Coordinate>> {
        let row = bind(
            sqlx::query(&self.statements.select_location),
            &[
                Param::Text(actor.to_string()),
                Param::Text(kind.as_str().to_string()),
            ],
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(coordinate_from_row).transpose()?)
    }

    async fn read_all_locations(
        &self,
        kind: LocationKind,
    ) -> StoreResult<HashMap<ActorId, Coordinate>> {
        let rows = bind(
            sqlx::query(&self.statements.select_locations_of_kind),
            &[Param::Text(kind.as_str().to_string())],
        )
        .fetch_all(&self.pool)
        .await?;

        let mut locations = HashMap::with_capacity(rows.len());
        for row in &rows {
            match actor_from_row(row) {
                Ok(actor) => {
                    locations.insert(actor, coordinate_from_row(row)?);
                }
                Err(error) => warn!(table = PLAYER_LOCATIONS, %error, "skipping row"),
            }
        }
        Ok(locations)
    }

    async fn remove_location(&self, actor: ActorId, kind: LocationKind) -> StoreResult<bool> {
        let result = bind(
            sqlx::query(&self.statements.delete_location),
            &[
                Param::Text(actor.to_string()),
                Param::Text(kind.as_str().to_string()),
            ],
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn read_keep_xp(&self, actor: ActorId) -> StoreResult<Option<bool>> {
        let row = bind(
            sqlx::query(&self.statements.select_keep_xp),
            &[Param::Text(actor.to_string())],
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row
            .map(|row| row.try_get::<i64, _>("keep_xp"))
            .transpose()?
            .map(|flag| flag != 0))
    }

    async fn write_keep_xp(&self, actor: ActorId, keep_xp: bool) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        self.upsert_keep_xp(&mut tx, actor, keep_xp).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn write_player_data(&self, actor: ActorId, data: &PlayerLocations) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        bind(
            sqlx::query(&self.statements.delete_player_locations),
            &[Param::Text(actor.to_string())],
        )
        .execute(&mut *tx)
        .await?;
        for (kind, location) in data.locations() {
            self.upsert_location(&mut tx, actor, kind, location).await?;
        }
        self.upsert_keep_xp(&mut tx, actor, data.keep_xp).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn read_player_data(&self, actor: ActorId) -> StoreResult<Option<PlayerLocations>> {
        let rows = bind(
            sqlx::query(&self.statements.select_player_locations),
            &[Param::Text(actor.to_string())],
        )
        .fetch_all(&self.pool)
        .await?;
        let keep_xp = self.read_keep_xp(actor).await?;

        if rows.is_empty() && keep_xp.is_none() {
            return Ok(None);
        }

        let mut data = PlayerLocations::default();
        for row in &rows {
            apply_location_row(&mut data, row)?;
        }
        if let Some(keep_xp) = keep_xp {
            data.keep_xp = keep_xp;
        }
        Ok(Some(data))
    }

    async fn read_all_player_data(&self) -> StoreResult<HashMap<ActorId, PlayerLocations>> {
        let rows = sqlx::query(&self.statements.select_all_player_locations)
            .fetch_all(&self.pool)
            .await?;
        let settings = sqlx::query(&self.statements.select_all_settings)
            .fetch_all(&self.pool)
            .await?;

        let mut players: HashMap<ActorId, PlayerLocations> = HashMap::new();
        for row in &rows {
            match actor_from_row(row) {
                Ok(actor) => apply_location_row(players.entry(actor).or_default(), row)?,
                Err(error) => warn!(table = PLAYER_LOCATIONS, %error, "skipping row"),
            }
        }
        for row in &settings {
            match actor_from_row(row) {
                Ok(actor) => {
                    let flag: i64 = row.try_get("keep_xp")?;
                    players.entry(actor).or_default().keep_xp = flag != 0;
                }
                Err(error) => warn!(table = PLAYER_SETTINGS, %error, "skipping row"),
            }
        }
        Ok(players)
    }

    async fn write_warp(&self, name: &str, location: &Coordinate) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        run_upsert(
            &mut tx,
            &self.statements.upsert_warp,
            vec![Param::Text(name.to_string())],
            world_and_axes(location),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn read_warp(&self, name: &str) -> StoreResult<Option<Coordinate>> {
        let row = bind(
            sqlx::query(&self.statements.select_warp),
            &[Param::Text(name.to_string())],
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(coordinate_from_row).transpose()?)
    }

    async fn remove_warp(&self, name: &str) -> StoreResult<bool> {
        let result = bind(
            sqlx::query(&self.statements.delete_warp),
            &[Param::Text(name.to_string())],
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn read_all_warps(&self) -> StoreResult<BTreeMap<String, Coordinate>> {
        let rows = sqlx::query(&self.statements.select_all_warps)
            .fetch_all(&self.pool)
            .await?;
        let mut warps = BTreeMap::new();
        for row in &rows {
            warps.insert(row.try_get("warp_name")?, coordinate_from_row(row)?);
        }
        Ok(warps)
    }

    async fn write_world_spawn(&self, location: &Coordinate) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        bind(
            sqlx::query(&self.statements.delete_other_spawns),
            &[Param::Text(location.world.clone())],
        )
        .execute(&mut *tx)
        .await?;
        run_upsert(
            &mut tx,
            &self.statements.upsert_spawn,
            vec![Param::Text(location.world.clone())],
            axes(location).to_vec(),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn read_world_spawn(&self) -> StoreResult<Option<Coordinate>> {
        let row = sqlx::query(&self.statements.select_spawn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(coordinate_from_row).transpose()?)
    }
}

fn apply_location_row(data: &mut PlayerLocations, row: &AnyRow) -> StoreResult<()> {
    let raw: String = row.try_get("location_type")?;
    match raw.parse::<LocationKind>() {
        Ok(kind) => {
            data.set(kind, Some(coordinate_from_row(row)?));
        }
        Err(error) => warn!(table = PLAYER_LOCATIONS, %error, "skipping row"),
    }
    Ok(())
}

#[async_trait]
impl LocationStore for SqlLocationStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Database(self.dialect.kind())
    }

    async fn save_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
        location: &Coordinate,
    ) -> StoreResult<()> {
        self.write_location(actor, kind, location)
            .await
            .inspect_err(|error| {
                error!(operation = "save_location", player = %actor, %kind, %error, "failed to save location")
            })
    }

    async fn get_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
    ) -> StoreResult<Option<Coordinate>> {
        self.read_location(actor, kind).await.inspect_err(|error| {
            error!(operation = "get_location", player = %actor, %kind, %error, "failed to read location")
        })
    }

    async fn get_all_locations(
        &self,
        kind: LocationKind,
    ) -> StoreResult<HashMap<ActorId, Coordinate>> {
        self.read_all_locations(kind).await.inspect_err(|error| {
            error!(operation = "get_all_locations", %kind, %error, "failed to read locations")
        })
    }

    async fn delete_location(&self, actor: ActorId, kind: LocationKind) -> StoreResult<bool> {
        self.remove_location(actor, kind).await.inspect_err(|error| {
            error!(operation = "delete_location", player = %actor, %kind, %error, "failed to delete location")
        })
    }

    async fn get_keep_xp(&self, actor: ActorId) -> StoreResult<bool> {
        self.read_keep_xp(actor)
            .await
            .map(|flag| flag.unwrap_or(true))
            .inspect_err(|error| {
                error!(operation = "get_keep_xp", player = %actor, %error, "failed to read keep-xp flag")
            })
    }

    async fn set_keep_xp(&self, actor: ActorId, keep_xp: bool) -> StoreResult<()> {
        self.write_keep_xp(actor, keep_xp).await.inspect_err(|error| {
            error!(operation = "set_keep_xp", player = %actor, %error, "failed to save keep-xp flag")
        })
    }

    async fn save_player_data(&self, actor: ActorId, data: &PlayerLocations) -> StoreResult<()> {
        self.write_player_data(actor, data).await.inspect_err(|error| {
            error!(operation = "save_player_data", player = %actor, %error, "failed to save player data")
        })
    }

    async fn get_player_data(&self, actor: ActorId) -> StoreResult<Option<PlayerLocations>> {
        self.read_player_data(actor).await.inspect_err(|error| {
            error!(operation = "get_player_data", player = %actor, %error, "failed to read player data")
        })
    }

    async fn get_all_player_data(&self) -> StoreResult<HashMap<ActorId, PlayerLocations>> {
        self.read_all_player_data().await.inspect_err(|error| {
            error!(operation = "get_all_player_data", %error, "failed to read player data")
        })
    }

    async fn save_warp(&self, name: &str, location: &Coordinate) -> StoreResult<()> {
        self.write_warp(name, location).await.inspect_err(|error| {
            error!(operation = "save_warp", warp = name, %error, "failed to save warp")
        })
    }

    async fn get_warp(&self, name: &str) -> StoreResult<Option<Coordinate>> {
        self.read_warp(name).await.inspect_err(|error| {
            error!(operation = "get_warp", warp = name, %error, "failed to read warp")
        })
    }

    async fn delete_warp(&self, name: &str) -> StoreResult<bool> {
        self.remove_warp(name).await.inspect_err(|error| {
            error!(operation = "delete_warp", warp = name, %error, "failed to delete warp")
        })
    }

    async fn get_all_warps(&self) -> StoreResult<BTreeMap<String, Coordinate>> {
        self.read_all_warps().await.inspect_err(|error| {
            error!(operation = "get_all_warps", %error, "failed to read warps")
        })
    }

    async fn save_world_spawn(&self, location: &Coordinate) -> StoreResult<()> {
        self.write_world_spawn(location).await.inspect_err(|error| {
            error!(operation = "save_world_spawn", world = %location.world, %error, "failed to save world spawn")
        })
    }

    async fn get_world_spawn(&self) -> StoreResult<Option<Coordinate>> {
        self.read_world_spawn().await.inspect_err(|error| {
            error!(operation = "get_world_spawn", %error, "failed to read world spawn")
        })
    }

    /// Rows are read on demand; loading only makes sure the tables exist.
    async fn load_all(&self) -> StoreResult<()> {
        self.init_schema().await
    }

    /// Every write is committed when it is made.
    async fn save_all(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.pool.close().await;
        info!(backend = %self.dialect.kind(), "location database closed");
        Ok(())
    }
}
