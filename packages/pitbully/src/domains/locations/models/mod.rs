pub mod location_kind;
pub mod player_locations;

pub use location_kind::LocationKind;
pub use player_locations::PlayerLocations;
