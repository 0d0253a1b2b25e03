use serde::Serialize;
use tracing::{info, warn};

use super::SqlLocationStore;
use crate::domains::locations::error::StoreResult;
use crate::domains::locations::store::LocationStore;

/// Counts of records copied by `migrate_from_file_storage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub deaths: usize,
    pub teleports: usize,
    pub lasts: usize,
    pub homes: usize,
    pub warps: usize,
    pub world_spawn: bool,
    pub keep_xp: usize,
    /// Records whose save failed; the copy carried on past them
    pub failures: usize,
}

impl MigrationReport {
    pub fn copied(&self) -> usize {
        self.deaths
            + self.teleports
            + self.lasts
            + self.homes
            + self.warps
            + self.keep_xp
            + usize::from(self.world_spawn)
    }

    fn tally(count: &mut usize, failures: &mut usize, result: StoreResult<()>) {
        match result {
            Ok(()) => *count += 1,
            Err(_) => *failures += 1,
        }
    }
}

impl SqlLocationStore {
    /// Copy every record out of `source` through the ordinary save
    /// operations.
    ///
    /// Lasts are copied after deaths and teleports so the stored last
    /// location survives the write-through those saves perform. Existing
    /// rows are overwritten. A failed save is counted and skipped; only a
    /// failure to read `source` aborts the copy.
    pub async fn migrate_from_file_storage(
        &self,
        source: &dyn LocationStore,
    ) -> StoreResult<MigrationReport> {
        info!(
            from = %source.backend(),
            to = %self.backend(),
            "copying location records"
        );
        let mut report = MigrationReport::default();

        for (actor, location) in source.get_all_deaths().await? {
            let result = self.save_death(actor, &location).await;
            MigrationReport::tally(&mut report.deaths, &mut report.failures, result);
        }
        for (actor, location) in source.get_all_teleports().await? {
            let result = self.save_teleport(actor, &location).await;
            MigrationReport::tally(&mut report.teleports, &mut report.failures, result);
        }
        for (actor, location) in source.get_all_lasts().await? {
            let result = self.save_last(actor, &location).await;
            MigrationReport::tally(&mut report.lasts, &mut report.failures, result);
        }
        for (actor, location) in source.get_all_homes().await? {
            let result = self.save_home(actor, &location).await;
            MigrationReport::tally(&mut report.homes, &mut report.failures, result);
        }
        for (name, location) in source.get_all_warps().await? {
            let result = self.save_warp(&name, &location).await;
            MigrationReport::tally(&mut report.warps, &mut report.failures, result);
        }
        if let Some(spawn) = source.get_world_spawn().await? {
            match self.save_world_spawn(&spawn).await {
                Ok(()) => report.world_spawn = true,
                Err(_) => report.failures += 1,
            }
        }
        for (actor, data) in source.get_all_player_data().await? {
            let result = self.set_keep_xp(actor, data.keep_xp).await;
            MigrationReport::tally(&mut report.keep_xp, &mut report.failures, result);
        }

        if report.failures > 0 {
            warn!(
                failures = report.failures,
                copied = report.copied(),
                "location copy finished with failures"
            );
        } else {
            info!(copied = report.copied(), "location copy finished");
        }
        Ok(report)
    }
}
