//! The run-wide registry of bits, missions and crons.

use crate::config::{IdRange, PipelineConfig};
use crate::types::{Bit, Cron, Mission, SlotState};

use super::arena::Arena;

/// Owns the three arenas for one run.
///
/// Passed by reference through every stage; there is no ambient state.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Bits, created on first reference.
    pub bits: Arena<Bit>,
    /// Missions, created on ingest.
    pub missions: Arena<Mission>,
    /// Crons, created on ingest.
    pub crons: Arena<Cron>,
}

impl Registry {
    /// Create an empty registry sized from `config`.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            bits: Arena::new("bit", IdRange::new(0, config.bit_capacity)),
            missions: Arena::new("misn", config.mission_ids),
            crons: Arena::new("cron", config.cron_ids),
        }
    }

    /// True once any expression has referenced `bit` and it has not been culled.
    pub fn bit_is_used(&self, bit: i32) -> bool {
        self.bits.state(bit) == SlotState::Live
    }

    /// True if `mission` is live.
    pub fn mission_is_used(&self, mission: i32) -> bool {
        self.missions.is_live(mission)
    }

    /// True if `cron` is live.
    pub fn cron_is_used(&self, cron: i32) -> bool {
        self.crons.is_live(cron)
    }

    /// Live node counts: (bits, missions, crons).
    pub fn live_counts(&self) -> (usize, usize, usize) {
        (self.bits.live_count(), self.missions.live_count(), self.crons.live_count())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_from_config() {
        let registry = Registry::default();
        assert_eq!(registry.bits.range(), IdRange::new(0, 100_001));
        assert_eq!(registry.missions.range(), IdRange::new(128, 1128));
        assert_eq!(registry.crons.range(), IdRange::new(128, 2048));
        assert_eq!(registry.live_counts(), (0, 0, 0));
    }

    #[test]
    fn test_usage_flags() {
        let mut registry = Registry::default();
        registry.missions.insert(200, Mission::new(200, "m")).unwrap();
        assert!(registry.mission_is_used(200));
        assert!(!registry.bit_is_used(5));
        registry.bits.get_or_insert_with(5, || Bit::new(5));
        assert!(registry.bit_is_used(5));
        registry.missions.tombstone(200);
        assert!(!registry.mission_is_used(200));
        assert!(!registry.cron_is_used(300));
    }
}
