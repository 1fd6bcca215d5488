//! Bit culling by cron pattern.
//!
//! Many crons exist only to reset a bit some mission set: enabled on `bN`,
//! clearing `bN` on start, end or both and touching nothing else. Such a cron is
//! tombstoned. If no live mission tests `bN` set for availability, the bit
//! is noise: it is removed from every live mission's clusters and the bit
//! itself is tombstoned.
//!
//! Single forward pass. A cron whose pattern only appears after another
//! cron is culled is not revisited.

use std::collections::BTreeSet;

use tracing::info;

use crate::store::Registry;
use crate::types::{Cluster, Cron, ExpressionRecord, Mission, TermListError};

/// What the pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CronCullOutcome {
    /// Crons tombstoned, ascending.
    pub crons: Vec<i32>,
    /// Bits tombstoned and stripped from missions, ascending.
    pub bits: Vec<i32>,
    /// Terms removed from mission clusters.
    pub terms_removed: usize,
}

/// The bit a reset-only cron toggles, if `cron` matches the pattern.
pub fn reset_bit(cron: &Cron) -> Option<i32> {
    let enable = &cron.b_enable;
    if enable.set.len() != 1 || !enable.clear.is_empty() {
        return None;
    }
    let bit = enable.set.get(0)?;
    if !cron.b_start.set.is_empty() || !cron.b_end.set.is_empty() {
        return None;
    }
    let cleared: BTreeSet<i32> = cron
        .b_start
        .clear
        .as_slice()
        .iter()
        .chain(cron.b_end.clear.as_slice())
        .copied()
        .collect();
    (cleared.len() == 1 && cleared.contains(&bit)).then_some(bit)
}

/// True if a live mission requires `bit` set to become available.
fn required_by_live_mission(registry: &Registry, bit: i32) -> Result<bool, TermListError> {
    let Some(b) = registry.bits.get(bit) else {
        return Ok(false);
    };
    for mission in b.misn_available.set.iterate()? {
        if registry.missions.is_live(mission) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn strip(cluster: &mut Cluster, ignore: &BTreeSet<i32>) -> usize {
    cluster.set.remove_if(|v| ignore.contains(&v)) + cluster.clear.remove_if(|v| ignore.contains(&v))
}

/// Run the pass.
pub fn cull_cron_reset_bits(registry: &mut Registry) -> Result<CronCullOutcome, TermListError> {
    let mut outcome = CronCullOutcome::default();
    let mut ignore: BTreeSet<i32> = BTreeSet::new();

    let candidates: Vec<(i32, i32)> = registry
        .crons
        .iter()
        .filter_map(|(id, cron)| reset_bit(cron).map(|bit| (id, bit)))
        .collect();

    for (cron, bit) in candidates {
        registry.crons.tombstone(cron);
        outcome.crons.push(cron);
        if required_by_live_mission(registry, bit)? {
            info!(cron, bit, "culled reset cron; bit kept, a mission tests it");
        } else {
            info!(cron, bit, "culled reset cron and its bit");
            ignore.insert(bit);
        }
    }

    if ignore.is_empty() {
        return Ok(outcome);
    }

    for (_, mission) in registry.missions.iter_mut() {
        for &field in Mission::FIELDS {
            outcome.terms_removed += strip(mission.bits_mut(field), &ignore);
        }
    }
    for &bit in &ignore {
        registry.bits.tombstone(bit);
    }
    outcome.bits = ignore.into_iter().collect();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::parser::ExpressionParser;
    use crate::types::Polarity;

    fn cron(id: i32, enable: &str, start: &str, end: &str) -> Cron {
        let mut c = Cron::new(id, format!("cron {id}"));
        c.enable_on = enable.to_string();
        c.on_start = start.to_string();
        c.on_end = end.to_string();
        c
    }

    fn build(missions: Vec<Mission>, crons: Vec<Cron>) -> Registry {
        let mut registry = Registry::default();
        let mut builder = GraphBuilder::new(&mut registry, ExpressionParser::default());
        for m in missions {
            builder.add_mission(m).unwrap();
        }
        for c in crons {
            builder.add_cron(c).unwrap();
        }
        registry
    }

    fn parsed_cron(enable: &str, start: &str, end: &str) -> Cron {
        let registry = build(vec![], vec![cron(300, enable, start, end)]);
        registry.crons.get(300).cloned().unwrap()
    }

    #[test]
    fn test_reset_bit_pattern() {
        assert_eq!(reset_bit(&parsed_cron("b10", "", "!b10")), Some(10));
        assert_eq!(reset_bit(&parsed_cron("b10", "!b10", "")), Some(10));
        assert_eq!(reset_bit(&parsed_cron("b10", "!b10", "!b10")), Some(10));
        assert_eq!(reset_bit(&parsed_cron("b10", "!b10 !b10", "")), Some(10));
        assert_eq!(reset_bit(&parsed_cron("b10", "!b10", "!b11")), None);
        assert_eq!(reset_bit(&parsed_cron("b10", "", "!b11")), None);
        assert_eq!(reset_bit(&parsed_cron("b10", "b12", "!b10")), None);
        assert_eq!(reset_bit(&parsed_cron("b10 !b3", "", "!b10")), None);
        assert_eq!(reset_bit(&parsed_cron("b10 b11", "", "!b10")), None);
        assert_eq!(reset_bit(&parsed_cron("", "", "")), None);
    }

    #[test]
    fn test_unrequired_bit_is_culled_everywhere() {
        let mut setter = Mission::new(200, "Setter");
        setter.on_success = "b10 b11".to_string();
        let mut clearer = Mission::new(201, "Clearer");
        clearer.on_accept = "!b10".to_string();
        let mut registry = build(vec![setter, clearer], vec![cron(300, "b10", "", "!b10")]);

        let outcome = cull_cron_reset_bits(&mut registry).unwrap();
        assert_eq!(outcome.crons, vec![300]);
        assert_eq!(outcome.bits, vec![10]);
        assert_eq!(outcome.terms_removed, 2);
        assert!(!registry.cron_is_used(300));
        assert!(!registry.bit_is_used(10));
        assert!(registry.bit_is_used(11));
        assert_eq!(registry.missions.get(200).unwrap().b_success.set.as_slice(), &[11]);
        assert!(registry.missions.get(201).unwrap().b_accept.is_empty());
    }

    #[test]
    fn test_required_bit_survives_but_cron_goes() {
        let mut gate = Mission::new(200, "Gate");
        gate.available_bits = "b10".to_string();
        let mut registry = build(vec![gate], vec![cron(300, "b10", "!b10", "")]);

        let outcome = cull_cron_reset_bits(&mut registry).unwrap();
        assert_eq!(outcome.crons, vec![300]);
        assert!(outcome.bits.is_empty());
        assert!(registry.bit_is_used(10));
        assert_eq!(registry.missions.get(200).unwrap().b_available.set.as_slice(), &[10]);
    }

    #[test]
    fn test_requirement_by_dead_mission_does_not_count() {
        let mut gate = Mission::new(200, "Gate");
        gate.available_bits = "b10".to_string();
        let mut registry = build(vec![gate], vec![cron(300, "b10", "", "!b10")]);
        registry.missions.tombstone(200);
        let outcome = cull_cron_reset_bits(&mut registry).unwrap();
        assert_eq!(outcome.bits, vec![10]);
    }

    #[test]
    fn test_no_pattern_no_change() {
        let mut registry = build(vec![], vec![cron(300, "b10", "b11", "!b10")]);
        let outcome = cull_cron_reset_bits(&mut registry).unwrap();
        assert_eq!(outcome, CronCullOutcome::default());
        assert!(registry.cron_is_used(300));
    }

    #[test]
    fn test_clear_polarity_pattern_side() {
        // enable must be a single set term
        let c = parsed_cron("!b10", "", "b10");
        assert_eq!(c.b_enable.side(Polarity::Clear).as_slice(), &[10]);
        assert_eq!(reset_bit(&c), None);
    }
}
