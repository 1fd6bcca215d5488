//! Cluster/graph builder.
//!
//! Registers a mission or cron, parses each of its expression fields into
//! the record's own clusters, and mirrors every bit term onto the Bit it
//! names. After a record is built:
//!
//! > bit `b` is in `record.bits(field).set` ⇔ `record.id` is in
//! > `bits[b].cluster(phase(field)).set` (same for clear)
//!
//! which lets the normalizer and emitter work without re-reading raw text.

use serde::Serialize;
use tracing::{debug, warn};

use crate::parser::ExpressionParser;
use crate::store::{Arena, Registry, StoreError};
use crate::types::{Bit, Cron, ExpressionRecord, Mission, TermListError};

/// Error type for building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Record was not registered.
    #[error("Record rejected: {0}")]
    Rejected(#[from] StoreError),
    /// A cluster could not grow; the run cannot be trusted.
    #[error("Cluster storage exhausted: {0}")]
    Capacity(#[from] TermListError),
}

impl BuildError {
    /// True if the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }
}

/// Counters for records built so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Expression fields parsed.
    pub fields: usize,
    /// Terms recorded.
    pub terms: usize,
    /// Fields discarded on a parse error.
    pub failed_fields: usize,
    /// Fields with content the parser did not understand.
    pub unrecognized_fields: usize,
}

impl BuildStats {
    /// Add another record's counters.
    pub fn absorb(&mut self, other: BuildStats) {
        self.fields += other.fields;
        self.terms += other.terms;
        self.failed_fields += other.failed_fields;
        self.unrecognized_fields += other.unrecognized_fields;
    }
}

/// Builds records into a registry.
pub struct GraphBuilder<'r> {
    registry: &'r mut Registry,
    parser: ExpressionParser,
    stats: BuildStats,
}

impl<'r> GraphBuilder<'r> {
    /// Create a builder writing into `registry`.
    pub fn new(registry: &'r mut Registry, parser: ExpressionParser) -> Self {
        Self { registry, parser, stats: BuildStats::default() }
    }

    /// Totals over every record built by this builder.
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Register a mission and parse its fields.
    pub fn add_mission(&mut self, mission: Mission) -> Result<BuildStats, BuildError> {
        let id = mission.id;
        debug!(mission = id, name = %mission.name, "building mission");
        self.registry.missions.insert(id, mission)?;
        let stats = link_fields(&self.parser, &mut self.registry.missions, &mut self.registry.bits, id)?;
        self.stats.absorb(stats);
        Ok(stats)
    }

    /// Register a cron and parse its fields.
    pub fn add_cron(&mut self, cron: Cron) -> Result<BuildStats, BuildError> {
        let id = cron.id;
        debug!(cron = id, name = %cron.name, "building cron");
        self.registry.crons.insert(id, cron)?;
        let stats = link_fields(&self.parser, &mut self.registry.crons, &mut self.registry.bits, id)?;
        self.stats.absorb(stats);
        Ok(stats)
    }
}

/// Parse every field of record `id` and mirror its bit terms onto `bits`.
///
/// Parse errors discard that field only. Capacity errors abort.
fn link_fields<R: ExpressionRecord>(
    parser: &ExpressionParser,
    records: &mut Arena<R>,
    bits: &mut Arena<Bit>,
    id: i32,
) -> Result<BuildStats, TermListError> {
    let mut stats = BuildStats::default();
    let Some(record) = records.get_mut(id) else {
        return Ok(stats);
    };

    for &field in R::FIELDS {
        stats.fields += 1;
        let accepts_missions = record.triggers(field).is_some();
        let parsed = match parser.scan(record.expression(field), accepts_missions) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(record = id, field = ?field, error = %e, "expression discarded");
                stats.failed_fields += 1;
                continue;
            }
        };
        if parsed.unrecognized {
            stats.unrecognized_fields += 1;
        }

        let phase = R::phase(field);
        let (bits_out, missions_out) = record.clusters_mut(field);
        let outcome = parsed.commit(bits_out, missions_out)?;
        stats.terms += outcome.terms;

        for term in &parsed.bits {
            match bits.get_or_insert_with(term.id, || Bit::new(term.id)) {
                Some(bit) => bit.cluster_mut(phase).push(term.polarity, id)?,
                None => warn!(record = id, bit = term.id, "bit was culled, back-reference skipped"),
            }
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CronField, MissionField, Phase, Polarity};

    fn registry() -> Registry {
        Registry::default()
    }

    #[test]
    fn test_mission_terms_are_mirrored_on_bits() {
        let mut reg = registry();
        let mut m = Mission::new(200, "Courier");
        m.on_accept = "b42 !b43 s300".to_string();
        m.available_bits = "!b42".to_string();
        let stats = GraphBuilder::new(&mut reg, ExpressionParser::default()).add_mission(m).unwrap();
        assert_eq!(stats.fields, 6);
        assert_eq!(stats.terms, 4);

        let mission = reg.missions.get(200).unwrap();
        assert_eq!(mission.b_accept.set.as_slice(), &[42]);
        assert_eq!(mission.b_accept.clear.as_slice(), &[43]);
        assert_eq!(mission.misn_accept.set.as_slice(), &[300]);
        assert_eq!(mission.b_available.clear.as_slice(), &[42]);

        let b42 = reg.bits.get(42).unwrap();
        assert_eq!(b42.misn_accept.set.as_slice(), &[200]);
        assert_eq!(b42.misn_available.clear.as_slice(), &[200]);
        assert_eq!(reg.bits.get(43).unwrap().misn_accept.clear.as_slice(), &[200]);
        assert!(reg.bit_is_used(42));
        assert!(!reg.bit_is_used(44));
    }

    #[test]
    fn test_cron_terms_record_cron_id() {
        let mut reg = registry();
        let mut c = Cron::new(500, "Reset");
        c.enable_on = "b10".to_string();
        c.on_end = "!b10".to_string();
        GraphBuilder::new(&mut reg, ExpressionParser::default()).add_cron(c).unwrap();
        let bit = reg.bits.get(10).unwrap();
        assert_eq!(bit.cluster(Phase::Cron(CronField::Enable)).set.as_slice(), &[500]);
        assert_eq!(bit.cluster(Phase::Cron(CronField::End)).clear.as_slice(), &[500]);
    }

    #[test]
    fn test_bad_field_is_discarded_others_kept() {
        let mut reg = registry();
        let mut m = Mission::new(201, "Broken");
        m.on_accept = "(b1".to_string();
        m.on_success = "b2".to_string();
        let stats = GraphBuilder::new(&mut reg, ExpressionParser::default()).add_mission(m).unwrap();
        assert_eq!(stats.failed_fields, 1);
        let mission = reg.missions.get(201).unwrap();
        assert!(mission.b_accept.is_empty());
        assert_eq!(mission.b_success.set.as_slice(), &[2]);
        assert!(!reg.bit_is_used(1));
    }

    #[test]
    fn test_duplicate_and_out_of_range_records_rejected() {
        let mut reg = registry();
        let mut builder = GraphBuilder::new(&mut reg, ExpressionParser::default());
        builder.add_mission(Mission::new(200, "a")).unwrap();
        let err = builder.add_mission(Mission::new(200, "b")).unwrap_err();
        assert!(matches!(err, BuildError::Rejected(StoreError::Occupied { id: 200, .. })));
        assert!(!err.is_fatal());
        assert!(builder.add_mission(Mission::new(5, "low")).is_err());
        assert!(builder.add_cron(Cron::new(4000, "high")).is_err());
    }

    #[test]
    fn test_every_forward_term_has_back_reference() {
        let mut reg = registry();
        let mut m = Mission::new(210, "Loop");
        m.on_success = "b1 !(b2 !b3)".to_string();
        m.on_failure = "!b4".to_string();
        m.on_ship_done = "b1".to_string();
        GraphBuilder::new(&mut reg, ExpressionParser::default()).add_mission(m).unwrap();

        let mission = reg.missions.get(210).unwrap();
        for &field in Mission::FIELDS {
            for term in mission.bits(field).terms() {
                let bit = reg.bits.get(term.id).unwrap();
                let back = bit.cluster(Phase::Mission(field)).side(term.polarity);
                assert!(back.contains(210).unwrap(), "{field:?} {term:?}");
            }
        }
        assert_eq!(
            reg.bits.get(3).unwrap().cluster(Phase::Mission(MissionField::Success)).side(Polarity::Set).as_slice(),
            &[210]
        );
        assert!(mission.b_failure.is_empty());
        assert!(!reg.bit_is_used(4), "on_failure is not parsed");
    }
}
