// Business domains
pub mod locations;
pub mod placement;
pub mod teleport_requests;
