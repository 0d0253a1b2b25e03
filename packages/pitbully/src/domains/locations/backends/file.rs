// YamlLocationStore - single structured document, held in memory
//
// Reads and writes only touch the in-memory state; the document is written
// on save_all (explicit flush, autosave or close). On load, the legacy flat
// per-category sections are folded into the per-player section and the file
// is written back without them.

use async_trait::async_trait;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::common::{ActorId, Coordinate};
use crate::config::StorageBackend;
use crate::domains::locations::error::{LocationError, StoreResult};
use crate::domains::locations::models::{LocationKind, PlayerLocations};
use crate::domains::locations::store::LocationStore;

const PLAYERS: &str = "players";
const WARPS: &str = "warpLocations";
const WORLD_SPAWN: &str = "worldSpawnLocation";
const KEEP_XP: &str = "keepXp";

#[derive(Debug, Clone, Default, PartialEq)]
struct FileState {
    players: HashMap<ActorId, PlayerLocations>,
    warps: BTreeMap<String, Coordinate>,
    world_spawn: Option<Coordinate>,
    /// Top-level sections this backend does not manage; written back as-is
    other: Mapping,
}

/// What a load found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub players: usize,
    pub warps: usize,
    pub world_spawn: bool,
    /// Legacy per-category sections folded into the per-player section
    pub legacy_sections: usize,
    /// Entries dropped because their id or coordinate was malformed
    pub skipped: usize,
}

struct ParsedDocument {
    state: FileState,
    legacy_sections: usize,
    skipped: usize,
}

/// Location store backed by one YAML document.
pub struct YamlLocationStore {
    path: PathBuf,
    state: RwLock<FileState>,
    // Serialises writers of the document file
    flush: AsyncMutex<()>,
}

impl YamlLocationStore {
    /// Nothing is read until `load_all`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(FileState::default()),
            flush: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, FileState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FileState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Load the document, migrating legacy sections forward.
    ///
    /// A missing file is an empty store. If any legacy section was found the
    /// migrated document is written back immediately.
    pub async fn load_document(&self) -> StoreResult<LoadReport> {
        self.read_document().await.inspect_err(|error| {
            error!(
                operation = "load_all",
                path = %self.path.display(),
                %error,
                "failed to load location file"
            )
        })
    }

    async fn read_document(&self) -> StoreResult<LoadReport> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no location file yet, starting empty");
                *self.write() = FileState::default();
                return Ok(LoadReport::default());
            }
            Err(e) => return Err(LocationError::io(&self.path, e)),
        };

        let root: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(&text)?
        };

        let parsed = parse_document(root);
        let report = LoadReport {
            players: parsed.state.players.len(),
            warps: parsed.state.warps.len(),
            world_spawn: parsed.state.world_spawn.is_some(),
            legacy_sections: parsed.legacy_sections,
            skipped: parsed.skipped,
        };
        *self.write() = parsed.state;

        if report.legacy_sections > 0 {
            info!(
                path = %self.path.display(),
                sections = report.legacy_sections,
                players = report.players,
                "migrated legacy location sections"
            );
            self.write_document().await?;
        }

        debug!(
            path = %self.path.display(),
            players = report.players,
            warps = report.warps,
            "location file loaded"
        );
        Ok(report)
    }

    async fn write_document(&self) -> StoreResult<()> {
        let _flush = self.flush.lock().await;
        let text = {
            let state = self.read();
            serde_yaml::to_string(&to_document(&state)?)?
        };
        write_atomically(&self.path, text).await
    }
}

#[async_trait]
impl LocationStore for YamlLocationStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::File
    }

    async fn save_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
        location: &Coordinate,
    ) -> StoreResult<()> {
        self.write()
            .players
            .entry(actor)
            .or_default()
            .record(kind, location.clone());
        Ok(())
    }

    async fn get_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
    ) -> StoreResult<Option<Coordinate>> {
        Ok(self
            .read()
            .players
            .get(&actor)
            .and_then(|record| record.get(kind).cloned()))
    }

    async fn get_all_locations(
        &self,
        kind: LocationKind,
    ) -> StoreResult<HashMap<ActorId, Coordinate>> {
        Ok(self
            .read()
            .players
            .iter()
            .filter_map(|(actor, record)| record.get(kind).map(|at| (*actor, at.clone())))
            .collect())
    }

    async fn delete_location(&self, actor: ActorId, kind: LocationKind) -> StoreResult<bool> {
        Ok(self
            .write()
            .players
            .get_mut(&actor)
            .and_then(|record| record.set(kind, None))
            .is_some())
    }

    async fn get_keep_xp(&self, actor: ActorId) -> StoreResult<bool> {
        Ok(self
            .read()
            .players
            .get(&actor)
            .map_or(true, |record| record.keep_xp))
    }

    async fn set_keep_xp(&self, actor: ActorId, keep_xp: bool) -> StoreResult<()> {
        self.write().players.entry(actor).or_default().keep_xp = keep_xp;
        Ok(())
    }

    async fn save_player_data(&self, actor: ActorId, data: &PlayerLocations) -> StoreResult<()> {
        self.write().players.insert(actor, data.clone());
        Ok(())
    }

    async fn get_player_data(&self, actor: ActorId) -> StoreResult<Option<PlayerLocations>> {
        Ok(self.read().players.get(&actor).cloned())
    }

    async fn get_all_player_data(&self) -> StoreResult<HashMap<ActorId, PlayerLocations>> {
        Ok(self.read().players.clone())
    }

    async fn save_warp(&self, name: &str, location: &Coordinate) -> StoreResult<()> {
        self.write()
            .warps
            .insert(name.to_string(), location.clone());
        Ok(())
    }

    async fn get_warp(&self, name: &str) -> StoreResult<Option<Coordinate>> {
        Ok(self.read().warps.get(name).cloned())
    }

    async fn delete_warp(&self, name: &str) -> StoreResult<bool> {
        Ok(self.write().warps.remove(name).is_some())
    }

    async fn get_all_warps(&self) -> StoreResult<BTreeMap<String, Coordinate>> {
        Ok(self.read().warps.clone())
    }

    async fn save_world_spawn(&self, location: &Coordinate) -> StoreResult<()> {
        self.write().world_spawn = Some(location.clone());
        Ok(())
    }

    async fn get_world_spawn(&self) -> StoreResult<Option<Coordinate>> {
        Ok(self.read().world_spawn.clone())
    }

    async fn load_all(&self) -> StoreResult<()> {
        self.load_document().await.map(|_| ())
    }

    async fn save_all(&self) -> StoreResult<()> {
        self.write_document().await.inspect_err(|error| {
            error!(
                operation = "save_all",
                path = %self.path.display(),
                %error,
                "failed to write location file"
            )
        })
    }

    async fn close(&self) -> StoreResult<()> {
        self.save_all().await
    }
}

// =============================================================================
// Document mapping
// =============================================================================

fn parse_document(root: Value) -> ParsedDocument {
    let mut root = match root {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        other => {
            warn!(found = ?other, "location document is not a mapping, ignoring its contents");
            Mapping::new()
        }
    };

    let mut state = FileState::default();
    let mut skipped = 0;

    if let Some(players) = root.remove(PLAYERS) {
        for (key, section) in mapping_entries(players, PLAYERS) {
            let Some(actor) = parse_actor(&key, PLAYERS) else {
                skipped += 1;
                continue;
            };
            let record = state.players.entry(actor).or_default();
            for kind in LocationKind::all() {
                if let Some(value) = section.get(kind.document_key()) {
                    match parse_coordinate(value, kind.document_key(), &actor.to_string()) {
                        Some(location) => {
                            record.set(kind, Some(location));
                        }
                        None => skipped += 1,
                    }
                }
            }
            if let Some(value) = section.get(KEEP_XP) {
                match value.as_bool() {
                    Some(keep_xp) => record.keep_xp = keep_xp,
                    None => warn!(player = %actor, found = ?value, "keepXp is not a boolean, using default"),
                }
            }
        }
    }

    // Legacy sections only fill gaps the per-player section left open.
    let mut legacy_sections = 0;
    for kind in LocationKind::all() {
        let Some(section) = root.remove(kind.legacy_section()) else {
            continue;
        };
        legacy_sections += 1;
        for (key, value) in mapping_entries(section, kind.legacy_section()) {
            let Some(actor) = parse_actor(&key, kind.legacy_section()) else {
                skipped += 1;
                continue;
            };
            let Some(location) = parse_coordinate(&value, kind.legacy_section(), &actor.to_string())
            else {
                skipped += 1;
                continue;
            };
            let record = state.players.entry(actor).or_default();
            if record.get(kind).is_none() {
                record.set(kind, Some(location));
            }
        }
    }

    if let Some(warps) = root.remove(WARPS) {
        for (key, value) in mapping_entries(warps, WARPS) {
            let Some(name) = scalar_key(&key) else {
                warn!(section = WARPS, key = ?key, "skipping warp with a non-scalar name");
                skipped += 1;
                continue;
            };
            match parse_coordinate(&value, WARPS, &name) {
                Some(location) => {
                    state.warps.insert(name, location);
                }
                None => skipped += 1,
            }
        }
    }

    if let Some(spawn) = root.remove(WORLD_SPAWN) {
        match parse_coordinate(&spawn, WORLD_SPAWN, WORLD_SPAWN) {
            Some(location) => state.world_spawn = Some(location),
            None => skipped += 1,
        }
    }

    state.other = root;

    ParsedDocument {
        state,
        legacy_sections,
        skipped,
    }
}

fn to_document(state: &FileState) -> StoreResult<Value> {
    let players: BTreeMap<String, &PlayerLocations> = state
        .players
        .iter()
        .map(|(actor, record)| (actor.to_string(), record))
        .collect();

    let mut root = Mapping::new();
    root.insert(Value::String(PLAYERS.to_string()), serde_yaml::to_value(players)?);
    root.insert(Value::String(WARPS.to_string()), serde_yaml::to_value(&state.warps)?);
    if let Some(spawn) = &state.world_spawn {
        root.insert(Value::String(WORLD_SPAWN.to_string()), serde_yaml::to_value(spawn)?);
    }
    for (key, value) in &state.other {
        root.insert(key.clone(), value.clone());
    }
    Ok(Value::Mapping(root))
}

fn mapping_entries(section: Value, name: &str) -> Vec<(Value, Value)> {
    match section {
        Value::Mapping(mapping) => mapping.into_iter().collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(section = name, found = ?other, "expected a mapping, skipping section");
            Vec::new()
        }
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_actor(key: &Value, section: &str) -> Option<ActorId> {
    let parsed = key.as_str().map(ActorId::parse);
    match parsed {
        Some(Ok(actor)) => Some(actor),
        _ => {
            warn!(section, key = ?key, "skipping entry with an invalid actor id");
            None
        }
    }
}

/// A coordinate without a world name cannot be placed anywhere, so it is
/// treated as malformed.
fn parse_coordinate(value: &Value, section: &str, key: &str) -> Option<Coordinate> {
    match serde_yaml::from_value::<Coordinate>(value.clone()) {
        Ok(location) if !location.world.trim().is_empty() => Some(location),
        Ok(_) => {
            warn!(section, key, "skipping location with no world");
            None
        }
        Err(error) => {
            warn!(section, key, %error, "skipping malformed location");
            None
        }
    }
}

async fn write_atomically(path: &Path, contents: String) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LocationError::io(parent, e))?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, contents)
        .await
        .map_err(|e| LocationError::io(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| LocationError::io(path, e))
}
