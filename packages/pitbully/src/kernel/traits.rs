// Trait definitions for the host environment
//
// These are INFRASTRUCTURE traits only - no business logic.
// The host (game server) implements them; the core only calls through them.
//
// Naming convention: Base* for trait names (e.g., BaseWorlds, BaseActors)

use crate::common::{ActorId, Coordinate};
use crate::domains::teleport_requests::Notice;

// =============================================================================
// Worlds Trait (Infrastructure - block queries and spawn points)
// =============================================================================

pub trait BaseWorlds: Send + Sync {
    /// Whether the named world is currently loaded
    fn is_loaded(&self, world: &str) -> bool;

    /// Exclusive upper bound for buildable rows, or `None` if the world is
    /// not loaded
    fn max_height(&self, world: &str) -> Option<i32>;

    /// Whether an actor can occupy the block at the given position
    fn is_passable(&self, world: &str, x: i32, y: i32, z: i32) -> bool;

    /// Make the coordinate the spawn point of its world, effective immediately.
    /// Returns false if the host refused (e.g. world not loaded).
    fn set_spawn(&self, spawn: &Coordinate) -> bool;
}

// =============================================================================
// Actors Trait (Infrastructure - connected players)
// =============================================================================

pub trait BaseActors: Send + Sync {
    /// Whether the actor is currently connected
    fn is_online(&self, actor: ActorId) -> bool;

    /// Current position of a connected actor
    fn location_of(&self, actor: ActorId) -> Option<Coordinate>;

    /// Move an actor. Returns false if the host refused or the actor left.
    fn teleport(&self, actor: ActorId, to: &Coordinate) -> bool;

    /// Deliver a user-visible notice. Rendering is the host's concern.
    fn notify(&self, actor: ActorId, notice: Notice);
}
