//! Small builders shared by the integration tests.

#![allow(dead_code)]

use pitbully_core::common::{ActorId, Coordinate};

pub fn coord(world: &str, x: f64, y: f64, z: f64) -> Coordinate {
    Coordinate::new(world, x, y, z, 0.0, 0.0)
}

pub fn facing(world: &str, x: f64, y: f64, z: f64, yaw: f32, pitch: f32) -> Coordinate {
    Coordinate::new(world, x, y, z, yaw, pitch)
}

pub fn actors<const N: usize>() -> [ActorId; N] {
    std::array::from_fn(|_| ActorId::new())
}
