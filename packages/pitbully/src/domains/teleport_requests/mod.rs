//! Teleport request domain - two-party teleport handshakes with expiry
//!
//! Flow:
//!   create(requester, target) → target notified → accept | deny | expiry | disconnect
//!
//! At most one outgoing request per requester and one incoming request per
//! target exist at any time. Whichever terminal path removes the request
//! from the index first wins; every later path is a no-op.

pub mod coordinator;
pub mod error;
pub mod models;
pub mod notice;

pub use coordinator::TeleportRequestCoordinator;
pub use error::RequestError;
pub use models::request::{AcceptOutcome, CreateOutcome, TeleportRequest};
pub use notice::Notice;
