//! Whole-world persistence.
//!
//! The entire entity graph plus the scheduler state (game clock, pending
//! deferred actions, heartbeat roster) serialize as one bincode blob.
//! Because entities are plain records keyed by value ids, a snapshot is a
//! faithful copy with no fixup pass on load.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::scheduler::Scheduler;
use crate::world::errors::WorldError;
use crate::world::registry::World;

/// Borrowing view written by [`save`].
#[derive(Serialize)]
struct SnapshotRef<'a> {
    world: &'a World,
    scheduler: &'a Scheduler,
}

/// Owned state produced by [`load`].
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub world: World,
    pub scheduler: Scheduler,
}

/// Write world and scheduler state to `path`, creating parent directories as
/// needed.
pub fn save(path: &Path, world: &World, scheduler: &Scheduler) -> Result<(), WorldError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| WorldError::Snapshot(format!("creating {}: {e}", parent.display())))?;
    }
    let bytes = bincode::serialize(&SnapshotRef { world, scheduler })
        .map_err(|e| WorldError::Snapshot(format!("encoding snapshot: {e}")))?;
    fs::write(path, &bytes)
        .map_err(|e| WorldError::Snapshot(format!("writing {}: {e}", path.display())))?;
    info!("snapshot saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read a snapshot back from `path`.
pub fn load(path: &Path) -> Result<Snapshot, WorldError> {
    let bytes = fs::read(path)
        .map_err(|e| WorldError::Snapshot(format!("reading {}: {e}", path.display())))?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)
        .map_err(|e| WorldError::Snapshot(format!("decoding snapshot: {e}")))?;
    info!("snapshot loaded from {}", path.display());
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::seed;
    use chrono::Utc;

    #[test]
    fn save_then_load_restores_the_graph() {
        let mut world = World::new();
        seed::build_demo_world(&mut world);
        let mut scheduler = Scheduler::new(Utc::now(), 5.0, 1.0);
        for npc in world.heartbeat_npcs() {
            scheduler.subscribe(npc);
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("world.snapshot");
        save(&path, &world, &scheduler).expect("save");
        let restored = load(&path).expect("load");

        assert_eq!(restored.world, world);
        assert_eq!(restored.scheduler, scheduler);
    }

    #[test]
    fn missing_file_reports_snapshot_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.snapshot");
        let err = load(&path).expect_err("must fail");
        assert!(matches!(err, WorldError::Snapshot(_)));
    }
}
