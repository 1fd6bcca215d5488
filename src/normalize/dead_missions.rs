//! Dead-mission culling.
//!
//! A mission with no bit terms in any field neither depends on nor affects
//! the flag graph. Missions at or above the cull floor with out-degree zero
//! are tombstoned; ids below the floor are reserved entry points.
//!
//! Runs once. A mission that only becomes empty later (for example after a
//! merge) is not revisited.

use tracing::info;

use crate::store::Registry;

/// Tombstone every live, non-reserved mission with no bit terms.
///
/// Returns the culled ids, ascending.
pub fn cull_dead_missions(registry: &mut Registry, cull_floor: i32) -> Vec<i32> {
    let dead: Vec<i32> = registry
        .missions
        .iter()
        .filter(|(id, mission)| *id >= cull_floor && mission.out_degree() == 0)
        .map(|(id, _)| id)
        .collect();

    for &id in &dead {
        if let Some(mission) = registry.missions.get(id) {
            info!(mission = id, name = %mission.name, "culled mission with no bit terms");
        }
        registry.missions.tombstone(id);
    }
    dead
}
