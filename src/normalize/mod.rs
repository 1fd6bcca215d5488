//! Graph normalization passes.
//!
//! Each pass is independently callable; [`normalize`] runs the ones a
//! [`PruneMode`] selects, in order:
//!
//! ```text
//! cron-reset bit culling → dead-mission culling → topological merge
//!         (some, strict)         (some, strict)        (strict)
//! ```
//!
//! Every pass is a single forward sweep. None iterates to a fixpoint.

pub mod cron_bits;
pub mod dead_missions;
pub mod merge;

pub use cron_bits::{cull_cron_reset_bits, reset_bit, CronCullOutcome};
pub use dead_missions::cull_dead_missions;
pub use merge::{compare_topology, merge_equivalent_missions, Merge};

use serde::Serialize;
use tracing::info;

use crate::config::PruneMode;
use crate::store::Registry;
use crate::types::TermListError;

/// Summary of one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Mode that selected the passes.
    pub mode: Option<PruneMode>,
    /// Reset crons tombstoned.
    pub culled_crons: Vec<i32>,
    /// Bits stripped and tombstoned.
    pub ignored_bits: Vec<i32>,
    /// Missions tombstoned for having no bit terms.
    pub dead_missions: Vec<i32>,
    /// `(survivor, absorbed)` merge pairs.
    pub merges: Vec<(i32, i32)>,
}

/// Run the passes selected by `mode`.
pub fn normalize(
    registry: &mut Registry,
    mode: PruneMode,
    cull_floor: i32,
) -> Result<NormalizeReport, TermListError> {
    let mut report = NormalizeReport { mode: Some(mode), ..NormalizeReport::default() };

    if mode.culls() {
        let crons = cull_cron_reset_bits(registry)?;
        report.culled_crons = crons.crons;
        report.ignored_bits = crons.bits;
        report.dead_missions = cull_dead_missions(registry, cull_floor);
    }
    if mode.merges() {
        report.merges = merge_equivalent_missions(registry)?
            .into_iter()
            .map(|m| (m.survivor, m.absorbed))
            .collect();
    }

    let (bits, missions, crons) = registry.live_counts();
    info!(
        %mode,
        culled_crons = report.culled_crons.len(),
        ignored_bits = report.ignored_bits.len(),
        dead_missions = report.dead_missions.len(),
        merges = report.merges.len(),
        live_bits = bits,
        live_missions = missions,
        live_crons = crons,
        "normalization complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mission, Polarity};

    fn registry() -> Registry {
        let mut registry = Registry::default();
        for (id, bit) in [(200, 1), (201, 1)] {
            let mut m = Mission::new(id, format!("m{id}"));
            m.b_accept.push(Polarity::Set, bit).unwrap();
            registry.missions.insert(id, m).unwrap();
        }
        registry.missions.insert(202, Mission::new(202, "empty")).unwrap();
        registry
    }

    #[test]
    fn test_all_mode_changes_nothing() {
        let mut reg = registry();
        let report = normalize(&mut reg, PruneMode::All, 128).unwrap();
        assert!(report.dead_missions.is_empty() && report.merges.is_empty());
        assert_eq!(reg.missions.live_count(), 3);
    }

    #[test]
    fn test_some_mode_culls_but_does_not_merge() {
        let mut reg = registry();
        let report = normalize(&mut reg, PruneMode::Some, 128).unwrap();
        assert_eq!(report.dead_missions, vec![202]);
        assert!(report.merges.is_empty());
        assert_eq!(reg.missions.live_ids(), vec![200, 201]);
    }

    #[test]
    fn test_strict_mode_merges() {
        let mut reg = registry();
        let report = normalize(&mut reg, PruneMode::Strict, 128).unwrap();
        assert_eq!(report.merges, vec![(200, 201)]);
        assert_eq!(reg.missions.live_ids(), vec![200]);
    }
}
