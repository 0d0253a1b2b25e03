//! Placement domain - finds somewhere an actor can stand near a coordinate

pub mod resolver;

pub use resolver::SafePlacementResolver;
