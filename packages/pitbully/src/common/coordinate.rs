use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a named world, with facing.
///
/// Equality is structural: two coordinates are equal when every field is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Coordinate {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64, yaw: f32, pitch: f32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw,
            pitch,
        }
    }

    /// Block column and row containing this coordinate.
    pub fn block_x(&self) -> i32 {
        self.x.floor() as i32
    }

    pub fn block_y(&self) -> i32 {
        self.y.floor() as i32
    }

    pub fn block_z(&self) -> i32 {
        self.z.floor() as i32
    }

    /// Same coordinate at a different height, facing preserved.
    pub fn with_y(&self, y: f64) -> Self {
        Self { y, ..self.clone() }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.2}, {:.2}, {:.2})",
            self.world, self.x, self.y, self.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_positions_floor_negative_axes() {
        let c = Coordinate::new("world", -0.5, 63.9, 10.0, 0.0, 0.0);
        assert_eq!((c.block_x(), c.block_y(), c.block_z()), (-1, 63, 10));
    }

    #[test]
    fn with_y_keeps_facing() {
        let c = Coordinate::new("world", 1.0, 2.0, 3.0, 90.0, -15.0);
        let moved = c.with_y(70.0);
        assert_eq!(moved.y, 70.0);
        assert_eq!(moved.yaw, 90.0);
        assert_eq!(moved.pitch, -15.0);
        assert_eq!(moved.world, "world");
    }

    #[test]
    fn missing_facing_defaults_to_zero() {
        let c: Coordinate =
            serde_yaml::from_str("world: nether\nx: 10\ny: 64\nz: -3.5\n").unwrap();
        assert_eq!(c, Coordinate::new("nether", 10.0, 64.0, -3.5, 0.0, 0.0));
    }
}
