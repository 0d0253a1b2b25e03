// Common test utilities

pub mod fixtures;
pub mod harness;
pub mod store_properties;

pub use fixtures::*;
pub use harness::*;
