// TestDependencies - mock host implementations for testing
//
// Provides in-memory worlds and actors that record every call, so tests can
// assert on notices, teleports and spawn changes without a game server, and a
// location store that fails every call.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{BaseActors, BaseWorlds};
use crate::common::{ActorId, Coordinate};
use crate::config::StorageBackend;
use crate::domains::locations::{
    LocationError, LocationKind, LocationStore, PlayerLocations, StoreResult,
};
use crate::domains::teleport_requests::Notice;

// =============================================================================
// Mock Worlds
// =============================================================================

/// Worlds made of air except for blocks explicitly marked solid.
pub struct MockWorlds {
    heights: Mutex<HashMap<String, i32>>,
    solid: Mutex<HashSet<(String, i32, i32, i32)>>,
    spawns: Mutex<Vec<Coordinate>>,
    passable_queries: AtomicUsize,
}

impl MockWorlds {
    pub fn new() -> Self {
        Self {
            heights: Mutex::new(HashMap::new()),
            solid: Mutex::new(HashSet::new()),
            spawns: Mutex::new(Vec::new()),
            passable_queries: AtomicUsize::new(0),
        }
    }

    /// Add a loaded world with the given build ceiling
    pub fn with_world(self, name: &str, max_height: i32) -> Self {
        self.load_world(name, max_height);
        self
    }

    pub fn load_world(&self, name: &str, max_height: i32) {
        self.heights
            .lock()
            .unwrap()
            .insert(name.to_string(), max_height);
    }

    pub fn unload_world(&self, name: &str) {
        self.heights.lock().unwrap().remove(name);
    }

    pub fn set_solid(&self, world: &str, x: i32, y: i32, z: i32) {
        self.solid
            .lock()
            .unwrap()
            .insert((world.to_string(), x, y, z));
    }

    /// Mark a vertical run of blocks in one column as solid
    pub fn fill_solid(&self, world: &str, x: i32, z: i32, rows: RangeInclusive<i32>) {
        let mut solid = self.solid.lock().unwrap();
        for y in rows {
            solid.insert((world.to_string(), x, y, z));
        }
    }

    /// Every spawn point the core asked the host to apply
    pub fn spawns(&self) -> Vec<Coordinate> {
        self.spawns.lock().unwrap().clone()
    }

    /// How many block lookups have been made
    pub fn passable_queries(&self) -> usize {
        self.passable_queries.load(Ordering::SeqCst)
    }
}

impl Default for MockWorlds {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseWorlds for MockWorlds {
    fn is_loaded(&self, world: &str) -> bool {
        self.heights.lock().unwrap().contains_key(world)
    }

    fn max_height(&self, world: &str) -> Option<i32> {
        self.heights.lock().unwrap().get(world).copied()
    }

    fn is_passable(&self, world: &str, x: i32, y: i32, z: i32) -> bool {
        self.passable_queries.fetch_add(1, Ordering::SeqCst);
        !self
            .solid
            .lock()
            .unwrap()
            .contains(&(world.to_string(), x, y, z))
    }

    fn set_spawn(&self, spawn: &Coordinate) -> bool {
        if !self.is_loaded(&spawn.world) {
            return false;
        }
        self.spawns.lock().unwrap().push(spawn.clone());
        true
    }
}

// =============================================================================
// Mock Actors
// =============================================================================

/// Connected actors with a position each; records notices and teleports.
pub struct MockActors {
    online: Mutex<HashMap<ActorId, Coordinate>>,
    notices: Mutex<Vec<(ActorId, Notice)>>,
    teleports: Mutex<Vec<(ActorId, Coordinate)>>,
    refuse_teleports: AtomicBool,
}

impl MockActors {
    pub fn new() -> Self {
        Self {
            online: Mutex::new(HashMap::new()),
            notices: Mutex::new(Vec::new()),
            teleports: Mutex::new(Vec::new()),
            refuse_teleports: AtomicBool::new(false),
        }
    }

    pub fn connect(&self, actor: ActorId, at: Coordinate) {
        self.online.lock().unwrap().insert(actor, at);
    }

    pub fn disconnect(&self, actor: ActorId) {
        self.online.lock().unwrap().remove(&actor);
    }

    /// Make every subsequent teleport fail
    pub fn refuse_teleports(&self, refuse: bool) {
        self.refuse_teleports.store(refuse, Ordering::SeqCst);
    }

    /// Notices delivered to one actor, oldest first
    pub fn notices_for(&self, actor: ActorId) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == actor)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    /// Completed teleports, oldest first
    pub fn teleports(&self) -> Vec<(ActorId, Coordinate)> {
        self.teleports.lock().unwrap().clone()
    }
}

impl Default for MockActors {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseActors for MockActors {
    fn is_online(&self, actor: ActorId) -> bool {
        self.online.lock().unwrap().contains_key(&actor)
    }

    fn location_of(&self, actor: ActorId) -> Option<Coordinate> {
        self.online.lock().unwrap().get(&actor).cloned()
    }

    fn teleport(&self, actor: ActorId, to: &Coordinate) -> bool {
        if self.refuse_teleports.load(Ordering::SeqCst) {
            return false;
        }
        let mut online = self.online.lock().unwrap();
        let Some(position) = online.get_mut(&actor) else {
            return false;
        };
        *position = to.clone();
        self.teleports.lock().unwrap().push((actor, to.clone()));
        true
    }

    fn notify(&self, actor: ActorId, notice: Notice) {
        self.notices.lock().unwrap().push((actor, notice));
    }
}

// =============================================================================
// Unavailable Store
// =============================================================================

/// A location store whose every call fails, like a database that is down.
pub struct UnavailableStore;

impl UnavailableStore {
    fn fail<T>() -> StoreResult<T> {
        Err(LocationError::io(
            "unavailable",
            std::io::Error::new(std::io::ErrorKind::NotConnected, "store unavailable"),
        ))
    }
}

#[async_trait]
impl LocationStore for UnavailableStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::File
    }

    async fn save_location(&self, _: ActorId, _: LocationKind, _: &Coordinate) -> StoreResult<()> {
        Self::fail()
    }

    async fn get_location(&self, _: ActorId, _: LocationKind) -> StoreResult<Option<Coordinate>> {
        Self::fail()
    }

    async fn get_all_locations(&self, _: LocationKind) -> StoreResult<HashMap<ActorId, Coordinate>> {
        Self::fail()
    }

    async fn delete_location(&self, _: ActorId, _: LocationKind) -> StoreResult<bool> {
        Self::fail()
    }

    async fn get_keep_xp(&self, _: ActorId) -> StoreResult<bool> {
        Self::fail()
    }

    async fn set_keep_xp(&self, _: ActorId, _: bool) -> StoreResult<()> {
        Self::fail()
    }

    async fn save_player_data(&self, _: ActorId, _: &PlayerLocations) -> StoreResult<()> {
        Self::fail()
    }

    async fn get_player_data(&self, _: ActorId) -> StoreResult<Option<PlayerLocations>> {
        Self::fail()
    }

    async fn get_all_player_data(&self) -> StoreResult<HashMap<ActorId, PlayerLocations>> {
        Self::fail()
    }

    async fn save_warp(&self, _: &str, _: &Coordinate) -> StoreResult<()> {
        Self::fail()
    }

    async fn get_warp(&self, _: &str) -> StoreResult<Option<Coordinate>> {
        Self::fail()
    }

    async fn delete_warp(&self, _: &str) -> StoreResult<bool> {
        Self::fail()
    }

    async fn get_all_warps(&self) -> StoreResult<BTreeMap<String, Coordinate>> {
        Self::fail()
    }

    async fn save_world_spawn(&self, _: &Coordinate) -> StoreResult<()> {
        Self::fail()
    }

    async fn get_world_spawn(&self) -> StoreResult<Option<Coordinate>> {
        Self::fail()
    }

    async fn load_all(&self) -> StoreResult<()> {
        Self::fail()
    }

    async fn save_all(&self) -> StoreResult<()> {
        Self::fail()
    }

    async fn close(&self) -> StoreResult<()> {
        Self::fail()
    }
}
