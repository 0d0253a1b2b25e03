//! Kernel module - host seams, service assembly and lifecycle.

pub mod pitbully_kernel;
pub mod test_dependencies;
pub mod traits;

pub use pitbully_kernel::{BuildError, LifecycleEvent, Pitbully, PitbullyBuilder};
pub use test_dependencies::{MockActors, MockWorlds, UnavailableStore};
pub use traits::*;
