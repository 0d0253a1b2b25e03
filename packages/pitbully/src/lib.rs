// Pitbully - location persistence and teleport handshakes
//
// This crate is the core behind the command and listener layers of a game
// server: it stores per-player named locations behind a swappable backend
// and coordinates short-lived teleport requests between pairs of players.
//
// The host game server is reached only through the traits in kernel/traits.rs.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
