// LocationStore - capability surface shared by every backend
//
// Every read of something never written returns absent. Every write is
// visible to the next read in the same process. Failures are logged by the
// backend and returned; callers that must never fail go through
// LocationFacade instead.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use super::error::StoreResult;
use super::models::{LocationKind, PlayerLocations};
use crate::common::{ActorId, Coordinate};
use crate::config::StorageBackend;

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Which backend this is, for logging
    fn backend(&self) -> StorageBackend;

    // =========================================================================
    // Per-actor locations
    // =========================================================================

    /// Store one category for an actor. Death and teleport saves also
    /// overwrite the actor's last location, atomically.
    async fn save_location(
        &self,
        actor: ActorId,
        kind: LocationKind,
        location: &Coordinate,
    ) -> StoreResult<()>;

    async fn get_location(&self, actor: ActorId, kind: LocationKind)
        -> StoreResult<Option<Coordinate>>;

    async fn get_all_locations(&self, kind: LocationKind)
        -> StoreResult<HashMap<ActorId, Coordinate>>;

    /// Returns whether anything was removed
    async fn delete_location(&self, actor: ActorId, kind: LocationKind) -> StoreResult<bool>;

    async fn get_keep_xp(&self, actor: ActorId) -> StoreResult<bool>;

    async fn set_keep_xp(&self, actor: ActorId, keep_xp: bool) -> StoreResult<()>;

    /// Replace an actor's whole record. Categories absent from `data` are
    /// removed; nothing is written through.
    async fn save_player_data(&self, actor: ActorId, data: &PlayerLocations) -> StoreResult<()>;

    /// `None` if nothing was ever stored for the actor
    async fn get_player_data(&self, actor: ActorId) -> StoreResult<Option<PlayerLocations>>;

    async fn get_all_player_data(&self) -> StoreResult<HashMap<ActorId, PlayerLocations>>;

    // =========================================================================
    // Global records
    // =========================================================================

    /// Warp names are case-sensitive
    async fn save_warp(&self, name: &str, location: &Coordinate) -> StoreResult<()>;

    async fn get_warp(&self, name: &str) -> StoreResult<Option<Coordinate>>;

    async fn delete_warp(&self, name: &str) -> StoreResult<bool>;

    async fn get_all_warps(&self) -> StoreResult<BTreeMap<String, Coordinate>>;

    /// The server keeps a single spawn; saving replaces any previous one.
    async fn save_world_spawn(&self, location: &Coordinate) -> StoreResult<()>;

    async fn get_world_spawn(&self) -> StoreResult<Option<Coordinate>>;

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Populate from the backing medium
    async fn load_all(&self) -> StoreResult<()>;

    /// Flush to the backing medium
    async fn save_all(&self) -> StoreResult<()>;

    /// Flush and release resources
    async fn close(&self) -> StoreResult<()>;

    // =========================================================================
    // Per-category conveniences
    // =========================================================================

    async fn save_death(&self, actor: ActorId, location: &Coordinate) -> StoreResult<()> {
        self.save_location(actor, LocationKind::Death, location).await
    }

    async fn get_death(&self, actor: ActorId) -> StoreResult<Option<Coordinate>> {
        self.get_location(actor, LocationKind::Death).await
    }

    async fn get_all_deaths(&self) -> StoreResult<HashMap<ActorId, Coordinate>> {
        self.get_all_locations(LocationKind::Death).await
    }

    async fn save_teleport(&self, actor: ActorId, location: &Coordinate) -> StoreResult<()> {
        self.save_location(actor, LocationKind::Teleport, location).await
    }

    async fn get_teleport(&self, actor: ActorId) -> StoreResult<Option<Coordinate>> {
        self.get_location(actor, LocationKind::Teleport).await
    }

    async fn get_all_teleports(&self) -> StoreResult<HashMap<ActorId, Coordinate>> {
        self.get_all_locations(LocationKind::Teleport).await
    }

    async fn save_last(&self, actor: ActorId, location: &Coordinate) -> StoreResult<()> {
        self.save_location(actor, LocationKind::Last, location).await
    }

    async fn get_last(&self, actor: ActorId) -> StoreResult<Option<Coordinate>> {
        self.get_location(actor, LocationKind::Last).await
    }

    async fn get_all_lasts(&self) -> StoreResult<HashMap<ActorId, Coordinate>> {
        self.get_all_locations(LocationKind::Last).await
    }

    async fn save_home(&self, actor: ActorId, location: &Coordinate) -> StoreResult<()> {
        self.save_location(actor, LocationKind::Home, location).await
    }

    async fn get_home(&self, actor: ActorId) -> StoreResult<Option<Coordinate>> {
        self.get_location(actor, LocationKind::Home).await
    }

    async fn get_all_homes(&self) -> StoreResult<HashMap<ActorId, Coordinate>> {
        self.get_all_locations(LocationKind::Home).await
    }

    async fn has_home(&self, actor: ActorId) -> StoreResult<bool> {
        Ok(self.get_home(actor).await?.is_some())
    }

    async fn delete_home(&self, actor: ActorId) -> StoreResult<bool> {
        self.delete_location(actor, LocationKind::Home).await
    }

    async fn has_warp(&self, name: &str) -> StoreResult<bool> {
        Ok(self.get_warp(name).await?.is_some())
    }
}
