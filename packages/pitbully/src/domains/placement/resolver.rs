use std::sync::Arc;

use tracing::debug;

use crate::common::Coordinate;
use crate::kernel::BaseWorlds;

/// Finds a vertically safe landing spot at or above a target coordinate.
///
/// Block state is owned by the host and changes between calls, so nothing
/// is cached; each lookup is a fresh upward scan.
#[derive(Clone)]
pub struct SafePlacementResolver {
    worlds: Arc<dyn BaseWorlds>,
}

impl SafePlacementResolver {
    pub fn new(worlds: Arc<dyn BaseWorlds>) -> Self {
        Self { worlds }
    }

    /// Scan upward from `target`, one row at a time, for the first row where
    /// both that block and the block below it are passable. The landing is
    /// the lower of the two rows, so the actor's feet and head both fit.
    ///
    /// At most `max_upward_scan` rows above the starting row are examined,
    /// and never at or above the world's build ceiling. Returns `None` when
    /// the world is not loaded or no row qualifies.
    pub fn find_safe_landing(&self, target: &Coordinate, max_upward_scan: u32) -> Option<Coordinate> {
        let Some(ceiling) = self.worlds.max_height(&target.world) else {
            debug!(world = %target.world, "safe landing: world not loaded");
            return None;
        };

        let (x, z) = (target.block_x(), target.block_z());
        let start = target.block_y();
        let last = (i64::from(start) + i64::from(max_upward_scan)).min(i64::from(ceiling) - 1);

        // The row below the candidate must exist too.
        let mut y = i64::from(start).max(i64::from(i32::MIN) + 1);
        while y <= last {
            let row = y as i32;
            if self.worlds.is_passable(&target.world, x, row, z)
                && self.worlds.is_passable(&target.world, x, row - 1, z)
            {
                // TODO: check the block under the landing row for hazards
                // (lava, fire, void) before accepting it.
                return Some(target.with_y(f64::from(row - 1)));
            }
            y += 1;
        }

        debug!(
            world = %target.world,
            x, z, start, ceiling,
            "safe landing: no passable column found"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockWorlds;

    fn resolver(worlds: &Arc<MockWorlds>) -> SafePlacementResolver {
        SafePlacementResolver::new(worlds.clone())
    }

    #[test]
    fn lands_on_top_of_floor() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        worlds.fill_solid("world", 0, 0, 0..=63);

        let target = Coordinate::new("world", 0.5, 64.0, 0.5, 45.0, 10.0);
        let landing = resolver(&worlds).find_safe_landing(&target, 16).unwrap();

        assert_eq!(landing, Coordinate::new("world", 0.5, 64.0, 0.5, 45.0, 10.0));
    }

    #[test]
    fn climbs_out_of_buried_target() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        worlds.fill_solid("world", 3, -2, 0..=70);

        let target = Coordinate::new("world", 3.2, 60.0, -1.7, 0.0, 0.0);
        let landing = resolver(&worlds).find_safe_landing(&target, 32).unwrap();

        assert_eq!(landing.y, 71.0);
        assert_eq!(landing.x, 3.2);
        assert_eq!(landing.z, -1.7);
    }

    #[test]
    fn needs_two_open_rows() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        worlds.fill_solid("world", 0, 0, 0..=63);
        // One-block overhang leaves a single open row at 64.
        worlds.set_solid("world", 0, 65, 0);

        let target = Coordinate::new("world", 0.0, 64.0, 0.0, 0.0, 0.0);
        let landing = resolver(&worlds).find_safe_landing(&target, 16).unwrap();

        assert_eq!(landing.y, 66.0);
    }

    #[test]
    fn gives_up_past_scan_limit() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        worlds.fill_solid("world", 0, 0, 0..=100);

        let target = Coordinate::new("world", 0.0, 10.0, 0.0, 0.0, 0.0);
        assert!(resolver(&worlds).find_safe_landing(&target, 20).is_none());
    }

    #[test]
    fn never_scans_through_the_ceiling() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 64));
        worlds.fill_solid("world", 0, 0, 0..=62);

        // Row 63 is open but row 64 is the ceiling, so no two-high gap exists.
        let target = Coordinate::new("world", 0.0, 10.0, 0.0, 0.0, 0.0);
        assert!(resolver(&worlds).find_safe_landing(&target, 500).is_none());
    }

    #[test]
    fn target_below_the_lowest_row_does_not_overflow() {
        let worlds = Arc::new(MockWorlds::new().with_world("world", 320));
        let target = Coordinate::new("world", 0.0, -1e12, 0.0, 0.0, 0.0);

        let landing = resolver(&worlds).find_safe_landing(&target, 16).unwrap();
        assert_eq!(landing.y, f64::from(i32::MIN));

        worlds.set_solid("world", 0, i32::MIN + 1, 0);
        let landing = resolver(&worlds).find_safe_landing(&target, 16).unwrap();
        assert_eq!(landing.y, f64::from(i32::MIN + 2));
    }

    #[test]
    fn unloaded_world_fails_immediately() {
        let worlds = Arc::new(MockWorlds::new());
        let target = Coordinate::new("gone", 0.0, 64.0, 0.0, 0.0, 0.0);

        assert!(resolver(&worlds).find_safe_landing(&target, 16).is_none());
        assert_eq!(worlds.passable_queries(), 0);
    }
}
