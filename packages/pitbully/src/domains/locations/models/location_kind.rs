use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domains::locations::error::LocationError;

/// The per-actor location categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// Where the actor last died
    Death,
    /// Where the actor stood before their last teleport
    Teleport,
    /// Most recent of death and teleport; the "go back" target
    Last,
    Home,
}

impl LocationKind {
    pub fn all() -> [LocationKind; 4] {
        [
            LocationKind::Death,
            LocationKind::Teleport,
            LocationKind::Last,
            LocationKind::Home,
        ]
    }

    /// Value stored in the relational `location_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Death => "death",
            LocationKind::Teleport => "teleport",
            LocationKind::Last => "last",
            LocationKind::Home => "home",
        }
    }

    /// Field name inside a player's section of the structured document
    pub fn document_key(&self) -> &'static str {
        match self {
            LocationKind::Death => "lastDeath",
            LocationKind::Teleport => "lastTeleport",
            LocationKind::Last => "lastLocation",
            LocationKind::Home => "home",
        }
    }

    /// Top-level section the flat legacy layout kept this category in
    pub fn legacy_section(&self) -> &'static str {
        match self {
            LocationKind::Death => "lastDeathLocations",
            LocationKind::Teleport => "lastTeleportLocations",
            LocationKind::Last => "lastLocations",
            LocationKind::Home => "homeLocations",
        }
    }

    /// Saving this category also overwrites `Last` for the same actor.
    pub fn writes_through(&self) -> bool {
        matches!(self, LocationKind::Death | LocationKind::Teleport)
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "death" => Ok(LocationKind::Death),
            "teleport" => Ok(LocationKind::Teleport),
            "last" => Ok(LocationKind::Last),
            "home" => Ok(LocationKind::Home),
            other => Err(LocationError::InvalidLocationKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_values_parse_back() {
        for kind in LocationKind::all() {
            assert_eq!(kind.as_str().parse::<LocationKind>().unwrap(), kind);
        }
        assert!("spawn".parse::<LocationKind>().is_err());
    }

    #[test]
    fn only_death_and_teleport_write_through() {
        let through: Vec<_> = LocationKind::all()
            .into_iter()
            .filter(LocationKind::writes_through)
            .collect();
        assert_eq!(through, vec![LocationKind::Death, LocationKind::Teleport]);
    }
}
