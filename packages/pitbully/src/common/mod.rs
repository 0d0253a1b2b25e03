// Common types shared across the crate

pub mod coordinate;
pub mod id;

pub use coordinate::Coordinate;
pub use id::{Actor, ActorId, Id, RequestId, TeleportRequestMarker, V4, V7};
