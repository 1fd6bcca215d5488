//! Topological merge.
//!
//! Two live missions are equivalent when every bit cluster, sorted, is
//! identical. Ids are visited ascending; each live mission absorbs every
//! equivalent higher id, which is appended to its display name and
//! tombstoned.
//!
//! Incoming references to a merged-away id are not retargeted onto the
//! survivor. Readers see the tombstone and skip it.

use std::cmp::Ordering;

use tracing::info;

use crate::store::Registry;
use crate::types::{ExpressionRecord, Mission, TermListError};

/// One merge: `absorbed` folded into `survivor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    /// Lower id, kept.
    pub survivor: i32,
    /// Higher id, tombstoned.
    pub absorbed: i32,
}

/// Compare the sorted bit topology of two missions.
pub fn compare_topology(a: &Mission, b: &Mission) -> Result<Ordering, TermListError> {
    for &field in Mission::FIELDS {
        match a.bits(field).compare(b.bits(field))? {
            Ordering::Equal => {}
            ord => return Ok(ord),
        }
    }
    Ok(Ordering::Equal)
}

/// Merge every group of equivalent live missions.
pub fn merge_equivalent_missions(registry: &mut Registry) -> Result<Vec<Merge>, TermListError> {
    for (_, mission) in registry.missions.iter_mut() {
        for &field in Mission::FIELDS {
            mission.bits_mut(field).sort();
        }
    }

    let ids = registry.missions.live_ids();
    let mut merges = Vec::new();

    for (i, &low) in ids.iter().enumerate() {
        if !registry.missions.is_live(low) {
            continue;
        }
        let mut absorbed = Vec::new();
        for &high in &ids[i + 1..] {
            let (Some(a), Some(b)) = (registry.missions.get(low), registry.missions.get(high)) else {
                continue;
            };
            if compare_topology(a, b)? == Ordering::Equal {
                absorbed.push((high, b.display_name()));
                registry.missions.tombstone(high);
            }
        }
        if let Some(survivor) = registry.missions.get_mut(low) {
            for (high, name) in absorbed {
                info!(survivor = low, absorbed = high, "merged equivalent missions");
                survivor.merged.push((high, name));
                merges.push(Merge { survivor: low, absorbed: high });
            }
        }
    }
    Ok(merges)
}
