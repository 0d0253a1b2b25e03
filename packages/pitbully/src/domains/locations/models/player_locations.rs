use serde::{Deserialize, Serialize};

use super::LocationKind;
use crate::common::Coordinate;

/// Everything stored for one actor, read and written as a unit.
///
/// Serializes to the per-player section of the structured document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLocations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_death: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_teleport: Option<Coordinate>,
    #[serde(
        default,
        rename = "lastLocation",
        skip_serializing_if = "Option::is_none"
    )]
    pub last: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<Coordinate>,
    /// Keep experience on death
    #[serde(default = "default_keep_xp")]
    pub keep_xp: bool,
}

fn default_keep_xp() -> bool {
    true
}

impl Default for PlayerLocations {
    fn default() -> Self {
        Self {
            last_death: None,
            last_teleport: None,
            last: None,
            home: None,
            keep_xp: default_keep_xp(),
        }
    }
}

impl PlayerLocations {
    pub fn get(&self, kind: LocationKind) -> Option<&Coordinate> {
        self.slot(kind).as_ref()
    }

    /// Replace one category. Does not write through to `Last`.
    pub fn set(&mut self, kind: LocationKind, location: Option<Coordinate>) -> Option<Coordinate> {
        std::mem::replace(self.slot_mut(kind), location)
    }

    /// Store a location, updating `Last` too for death and teleport.
    pub fn record(&mut self, kind: LocationKind, location: Coordinate) {
        if kind.writes_through() {
            self.last = Some(location.clone());
        }
        *self.slot_mut(kind) = Some(location);
    }

    /// Categories that currently hold a location
    pub fn locations(&self) -> impl Iterator<Item = (LocationKind, &Coordinate)> {
        LocationKind::all()
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|location| (kind, location)))
    }

    fn slot(&self, kind: LocationKind) -> &Option<Coordinate> {
        match kind {
            LocationKind::Death => &self.last_death,
            LocationKind::Teleport => &self.last_teleport,
            LocationKind::Last => &self.last,
            LocationKind::Home => &self.home,
        }
    }

    fn slot_mut(&mut self, kind: LocationKind) -> &mut Option<Coordinate> {
        match kind {
            LocationKind::Death => &mut self.last_death,
            LocationKind::Teleport => &mut self.last_teleport,
            LocationKind::Last => &mut self.last,
            LocationKind::Home => &mut self.home,
        }
    }
}
