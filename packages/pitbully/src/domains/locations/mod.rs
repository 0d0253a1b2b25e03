//! Locations domain - per-player named locations, warps and world spawn
//!
//! `LocationStore` is the capability surface; `YamlLocationStore` and
//! `SqlLocationStore` implement it. `LocationFacade` wraps whichever one is
//! active and never fails.

pub mod backends;
pub mod error;
pub mod facade;
pub mod models;
pub mod store;

pub use backends::{open_store, MigrationReport, SqlLocationStore, YamlLocationStore};
pub use error::{LocationError, StoreResult};
pub use facade::LocationFacade;
pub use models::{LocationKind, PlayerLocations};
pub use store::LocationStore;
