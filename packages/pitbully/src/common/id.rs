//! Typed identifiers.
//!
//! `Id<T, V>` is a `Uuid` tagged with the entity it names, so an `ActorId`
//! and a `RequestId` never mix even though both are UUIDs:
//!
//! ```rust
//! use pitbully_core::common::{ActorId, RequestId};
//!
//! let actor = ActorId::new();
//! let request = RequestId::new();
//! // let wrong: RequestId = actor; // does not compile
//! # let _ = (actor, request);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Time-ordered ids (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct V7;

/// Random ids (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct V4;

/// `T` names the entity, `V` the UUID version `new()` generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T, V = V7> {
    uuid: Uuid,
    kind: PhantomData<fn() -> (T, V)>,
}

impl<T, V> Id<T, V> {
    /// Wrap an id issued elsewhere. Actor ids always arrive this way.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }

    /// Parse the hyphenated or simple form; surrounding whitespace is ignored.
    ///
    /// Storage keys go through here, and a failure marks the record as
    /// malformed.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self::from_uuid)
    }
}

impl<T> Id<T, V7> {
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }
}

impl<T> Id<T, V4> {
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }
}

impl<T> Default for Id<T, V7> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Default for Id<T, V4> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, V> fmt::Display for Id<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<T, V> From<Uuid> for Id<T, V> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

/// A connected participant (player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Actor;

/// A pending teleport handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeleportRequestMarker;

/// Stable player identity, issued by the host.
pub type ActorId = Id<Actor, V4>;

/// Identity of one teleport handshake.
pub type RequestId = Id<TeleportRequestMarker>;
