//! EVNEW text export line decoder.
//!
//! One record per line. Tokens are double-quoted strings (possibly empty) or
//! bare words; the first token tags the record kind and the last must be
//! `"EOR"`. Anything that does not decode cleanly is returned as a
//! [`RecordError`] for the caller to log and skip.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::config::{IdRange, PipelineConfig};
use crate::types::{Cron, CronDetails, Mission, MissionDetails};

/// Fields between the tag and `"EOR"` on a cron line.
pub const CRON_FIELDS: usize = 27;

/// Fields between the tag and `"EOR"` on a misn line.
pub const MISSION_FIELDS: usize = 53;

const END_OF_RECORD: &str = "EOR";

/// Error type for line decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// First token is not a known record kind.
    #[error("Unknown record tag '{0}'")]
    UnknownTag(String),
    /// Wrong number of fields.
    #[error("{kind} record has {found} fields, expected {expected}")]
    Arity {
        /// Record kind.
        kind: &'static str,
        /// Required field count.
        expected: usize,
        /// Fields present.
        found: usize,
    },
    /// Last token is not `"EOR"`.
    #[error("{kind} record is not terminated by \"EOR\"")]
    Unterminated {
        /// Record kind.
        kind: &'static str,
    },
    /// A numeric field did not parse.
    #[error("{kind} field {field} has invalid value '{value}'")]
    BadField {
        /// Record kind.
        kind: &'static str,
        /// Field name.
        field: &'static str,
        /// Raw token.
        value: String,
    },
    /// Record id outside the configured range.
    #[error("{kind} {id} <{name}> is not in range {range}")]
    IdOutOfRange {
        /// Record kind.
        kind: &'static str,
        /// Decoded id.
        id: i32,
        /// Decoded name.
        name: String,
        /// Accepted range.
        range: IdRange,
    },
}

/// A decoded record.
#[derive(Debug, Clone)]
pub enum Record {
    /// A `"misn"` line.
    Mission(Mission),
    /// A `"cron"` line.
    Cron(Cron),
}

impl Record {
    /// Record id.
    pub fn id(&self) -> i32 {
        match self {
            Self::Mission(m) => m.id,
            Self::Cron(c) => c.id,
        }
    }

    /// Record kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mission(_) => "misn",
            Self::Cron(_) => "cron",
        }
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*)"|(\S+)"#).expect("token pattern compiles"))
}

/// Split a line into tokens, unquoting quoted strings.
pub fn tokenize(line: &str) -> Vec<&str> {
    token_pattern()
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Sequential reader over one record's fields.
struct Fields<'a> {
    kind: &'static str,
    tokens: std::slice::Iter<'a, &'a str>,
}

impl<'a> Fields<'a> {
    fn next_token(&mut self) -> &'a str {
        // Arity is checked before any field is read.
        self.tokens.next().copied().unwrap_or_default()
    }

    fn text(&mut self) -> String {
        self.next_token().to_string()
    }

    fn int(&mut self, field: &'static str) -> Result<i32, RecordError> {
        let value = self.next_token();
        value.parse().map_err(|_| self.bad(field, value))
    }

    fn hex(&mut self, field: &'static str) -> Result<u32, RecordError> {
        let value = self.next_token();
        let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).unwrap_or(value);
        u32::from_str_radix(digits, 16).map_err(|_| self.bad(field, value))
    }

    fn bad(&self, field: &'static str, value: &str) -> RecordError {
        RecordError::BadField { kind: self.kind, field, value: value.to_string() }
    }
}

/// Decodes export lines into records, rejecting ids outside the configured ranges.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    mission_ids: IdRange,
    cron_ids: IdRange,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl RecordDecoder {
    /// Create a decoder using the id ranges of `config`.
    pub fn new(config: &PipelineConfig) -> Self {
        Self { mission_ids: config.mission_ids, cron_ids: config.cron_ids }
    }

    /// Decode one line. Blank lines yield `Ok(None)`.
    pub fn decode(&self, line: &str) -> Result<Option<Record>, RecordError> {
        let tokens = tokenize(line);
        let Some((&tag, rest)) = tokens.split_first() else {
            return Ok(None);
        };
        let record = match tag {
            "cron" => Record::Cron(self.decode_cron(rest)?),
            "misn" => Record::Mission(self.decode_mission(rest)?),
            other => return Err(RecordError::UnknownTag(other.to_string())),
        };
        Ok(Some(record))
    }

    fn fields<'a>(kind: &'static str, expected: usize, rest: &'a [&'a str]) -> Result<Fields<'a>, RecordError> {
        if rest.len() != expected + 1 {
            return Err(RecordError::Arity { kind, expected, found: rest.len().saturating_sub(1) });
        }
        if rest[expected] != END_OF_RECORD {
            return Err(RecordError::Unterminated { kind });
        }
        Ok(Fields { kind, tokens: rest[..expected].iter() })
    }

    fn check_id(kind: &'static str, range: IdRange, id: i32, name: &str) -> Result<(), RecordError> {
        if range.contains(id as i64) {
            Ok(())
        } else {
            Err(RecordError::IdOutOfRange { kind, id, name: name.to_string(), range })
        }
    }

    fn decode_cron(&self, rest: &[&str]) -> Result<Cron, RecordError> {
        let mut f = Self::fields("cron", CRON_FIELDS, rest)?;
        let id = f.int("id")?;
        let name = f.text();
        let mut cron = Cron::new(id, name);
        let d = &mut cron.details;
        d.first_day = f.int("first_day")?;
        d.first_month = f.int("first_month")?;
        d.first_year = f.int("first_year")?;
        d.last_day = f.int("last_day")?;
        d.last_month = f.int("last_month")?;
        d.last_year = f.int("last_year")?;
        d.random = f.int("random")?;
        d.duration = f.int("duration")?;
        d.pre_holdoff = f.int("pre_holdoff")?;
        d.post_holdoff = f.int("post_holdoff")?;
        cron.enable_on = f.text();
        cron.on_start = f.text();
        cron.on_end = f.text();
        let d: &mut CronDetails = &mut cron.details;
        d.contribute = f.hex("contribute")?;
        d.require = f.hex("require")?;
        d.government_1 = f.int("government_1")?;
        d.government_news_1 = f.int("government_news_1")?;
        d.government_2 = f.int("government_2")?;
        d.government_news_2 = f.int("government_news_2")?;
        d.government_3 = f.int("government_3")?;
        d.government_news_3 = f.int("government_news_3")?;
        d.government_4 = f.int("government_4")?;
        d.government_news_4 = f.int("government_news_4")?;
        d.independent_news = f.int("independent_news")?;
        d.flags = f.int("flags")?;
        Self::check_id("cron", self.cron_ids, cron.id, &cron.name)?;
        Ok(cron)
    }

    fn decode_mission(&self, rest: &[&str]) -> Result<Mission, RecordError> {
        let mut f = Self::fields("misn", MISSION_FIELDS, rest)?;
        let id = f.int("id")?;
        let name = f.text();
        let mut mission = Mission::new(id, name);
        let d: &mut MissionDetails = &mut mission.details;
        d.available_stellar = f.int("available_stellar")?;
        d.available_location = f.int("available_location")?;
        d.available_record = f.int("available_record")?;
        d.available_rating = f.int("available_rating")?;
        d.available_random = f.int("available_random")?;
        d.travel_stellar = f.int("travel_stellar")?;
        d.return_stellar = f.int("return_stellar")?;
        d.cargo_type = f.int("cargo_type")?;
        d.cargo_amount = f.int("cargo_amount")?;
        d.cargo_pickup_mode = f.int("cargo_pickup_mode")?;
        d.cargo_dropoff_mode = f.int("cargo_dropoff_mode")?;
        d.scan_mask = f.hex("scan_mask")?;
        d.pay_value = f.int("pay_value")?;
        d.ship_count = f.int("ship_count")?;
        d.ship_system = f.int("ship_system")?;
        d.ship_dude = f.int("ship_dude")?;
        d.ship_goal = f.int("ship_goal")?;
        d.ship_behavior = f.int("ship_behavior")?;
        d.ship_name = f.int("ship_name")?;
        d.ship_start = f.int("ship_start")?;
        d.completion_government = f.int("completion_government")?;
        d.completion_reward = f.int("completion_reward")?;
        d.ship_subtitle = f.int("ship_subtitle")?;
        d.briefing_desc = f.int("briefing_desc")?;
        d.quick_briefing_desc = f.int("quick_briefing_desc")?;
        d.load_cargo_desc = f.int("load_cargo_desc")?;
        d.dropoff_cargo_desc = f.int("dropoff_cargo_desc")?;
        d.completion_desc = f.int("completion_desc")?;
        d.failing_desc = f.int("failing_desc")?;
        d.ship_done_desc = f.int("ship_done_desc")?;
        d.refusing_desc = f.int("refusing_desc")?;
        d.time_limit = f.int("time_limit")?;
        d.aux_ship_count = f.int("aux_ship_count")?;
        d.aux_ship_dude = f.int("aux_ship_dude")?;
        d.aux_ship_syst = f.int("aux_ship_syst")?;
        d.available_ship_type = f.int("available_ship_type")?;
        mission.available_bits = f.text();
        mission.on_accept = f.text();
        mission.on_refuse = f.text();
        mission.on_success = f.text();
        mission.on_failure = f.text();
        mission.on_abort = f.text();
        mission.on_ship_done = f.text();
        let d = &mut mission.details;
        d.require_bits = f.hex("require_bits")?;
        d.date_increment = f.int("date_increment")?;
        d.accept_button = f.text();
        d.refuse_button = f.text();
        d.display_weight = f.int("display_weight")?;
        d.can_abort = f.int("can_abort")?;
        d.flags_1 = f.hex("flags_1")?;
        d.flags_2 = f.hex("flags_2")?;
        Self::check_id("misn", self.mission_ids, mission.id, &mission.name)?;
        Ok(mission)
    }
}

/// Build a misn export line from its parts, filling scalars with zeros.
///
/// Used by tests and benchmarks to produce realistic input.
pub fn mission_line(id: i32, name: &str, expressions: [&str; 7]) -> String {
    let mut line = format!("\"misn\"\t{id}\t\"{name}\"");
    for i in 0..36 {
        line.push_str(if i == 11 { "\t0x0" } else { "\t0" });
    }
    for expr in expressions {
        line.push_str(&format!("\t\"{expr}\""));
    }
    line.push_str("\t0\t0\t\"\"\t\"\"\t0\t0\t0\t0\t\"EOR\"");
    line
}

/// Build a cron export line from its parts, filling scalars with zeros.
pub fn cron_line(id: i32, name: &str, enable_on: &str, on_start: &str, on_end: &str) -> String {
    let mut line = format!("\"cron\"\t{id}\t\"{name}\"");
    for _ in 0..10 {
        line.push_str("\t0");
    }
    line.push_str(&format!("\t\"{enable_on}\"\t\"{on_start}\"\t\"{on_end}\""));
    line.push_str("\t0\t0");
    for _ in 0..9 {
        line.push_str("\t-1");
    }
    line.push_str("\t0\t\"EOR\"");
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quoted_and_empty() {
        assert_eq!(tokenize("\"misn\" 200 \"A B\" \"\" 0x1F"), vec!["misn", "200", "A B", "", "0x1F"]);
        assert!(tokenize("   \t").is_empty());
    }

    #[test]
    fn test_decode_mission() {
        let line = mission_line(200, "Courier <rush>", ["b1", "b2 s201", "", "!b3", "b4", "a202", ""]);
        let Some(Record::Mission(m)) = RecordDecoder::default().decode(&line).unwrap() else {
            panic!("expected mission");
        };
        assert_eq!(m.id, 200);
        assert_eq!(m.name, "Courier <rush>");
        assert_eq!(m.available_bits, "b1");
        assert_eq!(m.on_accept, "b2 s201");
        assert_eq!(m.on_success, "!b3");
        assert_eq!(m.on_failure, "b4");
        assert_eq!(m.on_abort, "a202");
        assert!(m.b_accept.is_empty());
    }

    #[test]
    fn test_decode_cron() {
        let line = cron_line(300, "Reset", "b10", "", "!b10");
        let record = RecordDecoder::default().decode(&line).unwrap().unwrap();
        assert_eq!(record.kind(), "cron");
        assert_eq!(record.id(), 300);
        let Record::Cron(c) = record else { panic!("expected cron") };
        assert_eq!(c.enable_on, "b10");
        assert_eq!(c.on_start, "");
        assert_eq!(c.on_end, "!b10");
        assert_eq!(c.details.government_4, -1);
    }

    #[test]
    fn test_hex_fields() {
        let line = mission_line(200, "Hex", [""; 7]).replace("\t0x0\t", "\t0x10\t");
        let Some(Record::Mission(m)) = RecordDecoder::default().decode(&line).unwrap() else {
            panic!("expected mission");
        };
        assert_eq!(m.details.scan_mask, 16);
    }

    #[test]
    fn test_blank_line() {
        assert!(RecordDecoder::default().decode("").unwrap().is_none());
    }

    #[test]
    fn test_rejections() {
        let decoder = RecordDecoder::default();
        assert!(matches!(decoder.decode("\"desc\" 128 \"x\""), Err(RecordError::UnknownTag(t)) if t == "desc"));
        assert!(matches!(decoder.decode("\"cron\" 300 \"x\" \"EOR\""), Err(RecordError::Arity { kind: "cron", .. })));

        let unterminated = cron_line(300, "x", "", "", "").replace("\"EOR\"", "\"EOF\"");
        assert_eq!(decoder.decode(&unterminated).unwrap_err(), RecordError::Unterminated { kind: "cron" });

        let bad = cron_line(300, "x", "", "", "").replacen("\t0\t", "\tzero\t", 1);
        assert!(matches!(decoder.decode(&bad), Err(RecordError::BadField { field: "first_day", .. })));

        let low = mission_line(5, "low", [""; 7]);
        assert!(matches!(decoder.decode(&low), Err(RecordError::IdOutOfRange { id: 5, .. })));
        let high = cron_line(2048, "high", "", "", "");
        assert!(matches!(decoder.decode(&high), Err(RecordError::IdOutOfRange { kind: "cron", .. })));
    }
}
