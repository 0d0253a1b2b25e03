// LocationFacade - the never-failing surface the command and listener
// layers call.
//
// Backends log their own failures with context; here they only degrade to
// absent, false or nothing.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::PlayerLocations;
use super::store::LocationStore;
use crate::common::{ActorId, Coordinate};
use crate::config::StorageBackend;
use crate::kernel::BaseWorlds;

/// Owns the one active store for the process.
#[derive(Clone)]
pub struct LocationFacade {
    store: Arc<dyn LocationStore>,
    worlds: Arc<dyn BaseWorlds>,
}

impl LocationFacade {
    pub fn new(store: Arc<dyn LocationStore>, worlds: Arc<dyn BaseWorlds>) -> Self {
        Self { store, worlds }
    }

    pub fn store(&self) -> &Arc<dyn LocationStore> {
        &self.store
    }

    pub fn backend(&self) -> StorageBackend {
        self.store.backend()
    }

    // =========================================================================
    // Death, teleport and back
    // =========================================================================

    /// Also becomes the actor's back location.
    pub async fn record_death(&self, actor: ActorId, at: &Coordinate) {
        let _ = self.store.save_death(actor, at).await;
    }

    /// `from` is where the actor stood before teleporting. Also becomes the
    /// actor's back location.
    pub async fn record_teleport(&self, actor: ActorId, from: &Coordinate) {
        let _ = self.store.save_teleport(actor, from).await;
    }

    pub async fn last_death(&self, actor: ActorId) -> Option<Coordinate> {
        self.store.get_death(actor).await.ok().flatten()
    }

    pub async fn last_teleport(&self, actor: ActorId) -> Option<Coordinate> {
        self.store.get_teleport(actor).await.ok().flatten()
    }

    /// Most recent of the last death and the last pre-teleport position
    pub async fn back_location(&self, actor: ActorId) -> Option<Coordinate> {
        self.store.get_last(actor).await.ok().flatten()
    }

    // =========================================================================
    // Homes
    // =========================================================================

    pub async fn home(&self, actor: ActorId) -> Option<Coordinate> {
        self.store.get_home(actor).await.ok().flatten()
    }

    pub async fn set_home(&self, actor: ActorId, at: &Coordinate) {
        let _ = self.store.save_home(actor, at).await;
    }

    pub async fn has_home(&self, actor: ActorId) -> bool {
        self.store.has_home(actor).await.unwrap_or(false)
    }

    /// Returns whether a home existed
    pub async fn delete_home(&self, actor: ActorId) -> bool {
        self.store.delete_home(actor).await.unwrap_or(false)
    }

    // =========================================================================
    // Warps
    // =========================================================================

    pub async fn warp(&self, name: &str) -> Option<Coordinate> {
        self.store.get_warp(name).await.ok().flatten()
    }

    pub async fn set_warp(&self, name: &str, at: &Coordinate) {
        let _ = self.store.save_warp(name, at).await;
    }

    pub async fn has_warp(&self, name: &str) -> bool {
        self.store.has_warp(name).await.unwrap_or(false)
    }

    pub async fn delete_warp(&self, name: &str) -> bool {
        self.store.delete_warp(name).await.unwrap_or(false)
    }

    pub async fn warps(&self) -> BTreeMap<String, Coordinate> {
        self.store.get_all_warps().await.unwrap_or_default()
    }

    /// Sorted
    pub async fn warp_names(&self) -> Vec<String> {
        self.warps().await.into_keys().collect()
    }

    // =========================================================================
    // World spawn
    // =========================================================================

    pub async fn world_spawn(&self) -> Option<Coordinate> {
        self.store.get_world_spawn().await.ok().flatten()
    }

    /// Store the spawn and apply it in the host right away. Returns whether
    /// the host accepted it.
    pub async fn set_world_spawn(&self, at: &Coordinate) -> bool {
        let _ = self.store.save_world_spawn(at).await;
        let applied = self.worlds.set_spawn(at);
        if applied {
            debug!(world = %at.world, "world spawn applied");
        } else {
            warn!(world = %at.world, "host refused world spawn");
        }
        applied
    }

    // =========================================================================
    // Settings and bulk access
    // =========================================================================

    /// Defaults to true, including when the store cannot be read
    pub async fn keep_xp(&self, actor: ActorId) -> bool {
        self.store.get_keep_xp(actor).await.unwrap_or(true)
    }

    pub async fn set_keep_xp(&self, actor: ActorId, keep_xp: bool) {
        let _ = self.store.set_keep_xp(actor, keep_xp).await;
    }

    pub async fn player_data(&self, actor: ActorId) -> Option<PlayerLocations> {
        self.store.get_player_data(actor).await.ok().flatten()
    }

    pub async fn save_player_data(&self, actor: ActorId, data: &PlayerLocations) {
        let _ = self.store.save_player_data(actor, data).await;
    }

    /// Returns whether the flush succeeded
    pub async fn flush(&self) -> bool {
        self.store.save_all().await.is_ok()
    }

    pub async fn close(&self) {
        let _ = self.store.close().await;
    }
}
