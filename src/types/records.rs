//! Bit, mission and cron records.
//!
//! Missions and crons carry raw expression strings copied from the export
//! and the clusters parsed out of them. Bits carry only back-references:
//! which missions/crons, in which phase, set or clear them.
//!
//! Expression fields are reached through [`ExpressionRecord`], a small
//! static table of field tags plus per-tag accessors, so the builder,
//! normalizer and emitter can walk every field of a record kind uniformly.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cluster::Cluster;

/// Expression field of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionField {
    /// Availability test.
    Available,
    /// Run on accept.
    Accept,
    /// Run on refuse.
    Refuse,
    /// Run on success.
    Success,
    /// Run on abort.
    Abort,
    /// Run when the special ships are done.
    Ship,
}

/// Expression field of a cron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronField {
    /// Enable test.
    Enable,
    /// Run on start.
    Start,
    /// Run on end.
    End,
}

/// Any expression field, used to select a bit back-reference cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// A mission field.
    Mission(MissionField),
    /// A cron field.
    Cron(CronField),
}

impl MissionField {
    /// Port / field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Accept => "accept",
            Self::Refuse => "refuse",
            Self::Success => "success",
            Self::Abort => "abort",
            Self::Ship => "ship",
        }
    }
}

impl CronField {
    /// Port / field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

impl Phase {
    /// Field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mission(f) => f.name(),
            Self::Cron(f) => f.name(),
        }
    }

    /// Test fields read bits; every other field writes them.
    pub fn is_test(&self) -> bool {
        matches!(self, Self::Mission(MissionField::Available) | Self::Cron(CronField::Enable))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mission(field) => write!(f, "misn.{}", field.name()),
            Self::Cron(field) => write!(f, "cron.{}", field.name()),
        }
    }
}

/// Uniform access to the expression fields of a record kind.
pub trait ExpressionRecord {
    /// Field tag type.
    type Field: Copy + fmt::Debug + 'static;

    /// Every expression field, in parse order.
    const FIELDS: &'static [Self::Field];

    /// Record id.
    fn id(&self) -> i32;

    /// Raw expression text of `field`.
    fn expression(&self, field: Self::Field) -> &str;

    /// Parsed bit terms of `field`.
    fn bits(&self, field: Self::Field) -> &Cluster;

    /// Mutable bit terms of `field`.
    fn bits_mut(&mut self, field: Self::Field) -> &mut Cluster;

    /// Mission-trigger terms of `field`, if the field can start/abort missions.
    fn triggers(&self, field: Self::Field) -> Option<&Cluster>;

    /// Mutable bit and mission-trigger terms of `field`, borrowed together.
    fn clusters_mut(&mut self, field: Self::Field) -> (&mut Cluster, Option<&mut Cluster>);

    /// Back-reference cluster on [`Bit`] fed by `field`.
    fn phase(field: Self::Field) -> Phase;
}

/// One global flag and everything that reads or writes it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bit {
    /// Bit id.
    pub id: i32,
    /// Missions testing this bit for availability.
    pub misn_available: Cluster,
    /// Missions writing it on accept.
    pub misn_accept: Cluster,
    /// Missions writing it on refuse.
    pub misn_refuse: Cluster,
    /// Missions writing it on success.
    pub misn_success: Cluster,
    /// Missions writing it on abort.
    pub misn_abort: Cluster,
    /// Missions writing it when ships are done.
    pub misn_ship: Cluster,
    /// Crons testing it to enable.
    pub cron_enable: Cluster,
    /// Crons writing it on start.
    pub cron_start: Cluster,
    /// Crons writing it on end.
    pub cron_end: Cluster,
}

impl Bit {
    /// Create a bit with empty back-references.
    pub fn new(id: i32) -> Self {
        Self { id, ..Self::default() }
    }

    /// Back-reference cluster for `phase`.
    pub fn cluster(&self, phase: Phase) -> &Cluster {
        match phase {
            Phase::Mission(MissionField::Available) => &self.misn_available,
            Phase::Mission(MissionField::Accept) => &self.misn_accept,
            Phase::Mission(MissionField::Refuse) => &self.misn_refuse,
            Phase::Mission(MissionField::Success) => &self.misn_success,
            Phase::Mission(MissionField::Abort) => &self.misn_abort,
            Phase::Mission(MissionField::Ship) => &self.misn_ship,
            Phase::Cron(CronField::Enable) => &self.cron_enable,
            Phase::Cron(CronField::Start) => &self.cron_start,
            Phase::Cron(CronField::End) => &self.cron_end,
        }
    }

    /// Mutable back-reference cluster for `phase`.
    pub fn cluster_mut(&mut self, phase: Phase) -> &mut Cluster {
        match phase {
            Phase::Mission(MissionField::Available) => &mut self.misn_available,
            Phase::Mission(MissionField::Accept) => &mut self.misn_accept,
            Phase::Mission(MissionField::Refuse) => &mut self.misn_refuse,
            Phase::Mission(MissionField::Success) => &mut self.misn_success,
            Phase::Mission(MissionField::Abort) => &mut self.misn_abort,
            Phase::Mission(MissionField::Ship) => &mut self.misn_ship,
            Phase::Cron(CronField::Enable) => &mut self.cron_enable,
            Phase::Cron(CronField::Start) => &mut self.cron_start,
            Phase::Cron(CronField::End) => &mut self.cron_end,
        }
    }
}

/// Scalar mission fields, copied verbatim from the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MissionDetails {
    pub available_stellar: i32,
    pub available_location: i32,
    pub available_record: i32,
    pub available_rating: i32,
    pub available_random: i32,
    pub travel_stellar: i32,
    pub return_stellar: i32,
    pub cargo_type: i32,
    pub cargo_amount: i32,
    pub cargo_pickup_mode: i32,
    pub cargo_dropoff_mode: i32,
    pub scan_mask: u32,
    pub pay_value: i32,
    pub ship_count: i32,
    pub ship_system: i32,
    pub ship_dude: i32,
    pub ship_goal: i32,
    pub ship_behavior: i32,
    pub ship_name: i32,
    pub ship_start: i32,
    pub completion_government: i32,
    pub completion_reward: i32,
    pub ship_subtitle: i32,
    pub briefing_desc: i32,
    pub quick_briefing_desc: i32,
    pub load_cargo_desc: i32,
    pub dropoff_cargo_desc: i32,
    pub completion_desc: i32,
    pub failing_desc: i32,
    pub ship_done_desc: i32,
    pub refusing_desc: i32,
    /// -1 or 0 means no limit.
    pub time_limit: i32,
    pub aux_ship_count: i32,
    pub aux_ship_dude: i32,
    pub aux_ship_syst: i32,
    pub available_ship_type: i32,
    pub require_bits: u32,
    pub date_increment: i32,
    pub accept_button: String,
    pub refuse_button: String,
    pub display_weight: i32,
    pub can_abort: i32,
    pub flags_1: u32,
    pub flags_2: u32,
}

/// A mission record.
#[derive(Debug, Clone, Default)]
pub struct Mission {
    /// Mission id.
    pub id: i32,
    /// Name as exported.
    pub name: String,
    /// Missions folded into this one by the merge pass, in merge order.
    pub merged: Vec<(i32, String)>,
    /// Scalar fields.
    pub details: MissionDetails,

    /// Raw availability expression.
    pub available_bits: String,
    /// Raw on-accept expression.
    pub on_accept: String,
    /// Raw on-refuse expression.
    pub on_refuse: String,
    /// Raw on-success expression.
    pub on_success: String,
    /// Raw on-failure expression. Kept as exported; never parsed.
    pub on_failure: String,
    /// Raw on-abort expression.
    pub on_abort: String,
    /// Raw on-ship-done expression.
    pub on_ship_done: String,

    /// Parsed bit terms, one cluster per field.
    pub b_available: Cluster,
    #[allow(missing_docs)]
    pub b_accept: Cluster,
    #[allow(missing_docs)]
    pub b_refuse: Cluster,
    #[allow(missing_docs)]
    pub b_success: Cluster,
    /// Always empty: `on_failure` is not a parsed field.
    pub b_failure: Cluster,
    #[allow(missing_docs)]
    pub b_abort: Cluster,
    #[allow(missing_docs)]
    pub b_ship: Cluster,

    /// Parsed start (set) / abort (clear) mission terms, one per non-test field.
    pub misn_accept: Cluster,
    #[allow(missing_docs)]
    pub misn_refuse: Cluster,
    #[allow(missing_docs)]
    pub misn_success: Cluster,
    /// Always empty, like `b_failure`.
    pub misn_failure: Cluster,
    #[allow(missing_docs)]
    pub misn_abort: Cluster,
    #[allow(missing_docs)]
    pub misn_ship: Cluster,
}

impl Mission {
    /// Create a mission with empty expressions.
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }

    /// Name including every merged mission, e.g. `Rescue / 301: Rescue II`.
    pub fn display_name(&self) -> String {
        let mut label = self.name.clone();
        for (id, name) in &self.merged {
            label.push_str(&format!(" / {id}: {name}"));
        }
        label
    }

    /// Total bit terms over every field.
    pub fn out_degree(&self) -> usize {
        Self::FIELDS.iter().map(|&f| self.bits(f).len()).sum()
    }
}

impl ExpressionRecord for Mission {
    type Field = MissionField;

    const FIELDS: &'static [MissionField] = &[
        MissionField::Available,
        MissionField::Accept,
        MissionField::Refuse,
        MissionField::Success,
        MissionField::Abort,
        MissionField::Ship,
    ];

    fn id(&self) -> i32 {
        self.id
    }

    fn expression(&self, field: MissionField) -> &str {
        match field {
            MissionField::Available => &self.available_bits,
            MissionField::Accept => &self.on_accept,
            MissionField::Refuse => &self.on_refuse,
            MissionField::Success => &self.on_success,
            MissionField::Abort => &self.on_abort,
            MissionField::Ship => &self.on_ship_done,
        }
    }

    fn bits(&self, field: MissionField) -> &Cluster {
        match field {
            MissionField::Available => &self.b_available,
            MissionField::Accept => &self.b_accept,
            MissionField::Refuse => &self.b_refuse,
            MissionField::Success => &self.b_success,
            MissionField::Abort => &self.b_abort,
            MissionField::Ship => &self.b_ship,
        }
    }

    fn bits_mut(&mut self, field: MissionField) -> &mut Cluster {
        match field {
            MissionField::Available => &mut self.b_available,
            MissionField::Accept => &mut self.b_accept,
            MissionField::Refuse => &mut self.b_refuse,
            MissionField::Success => &mut self.b_success,
            MissionField::Abort => &mut self.b_abort,
            MissionField::Ship => &mut self.b_ship,
        }
    }

    fn triggers(&self, field: MissionField) -> Option<&Cluster> {
        match field {
            MissionField::Available => None,
            MissionField::Accept => Some(&self.misn_accept),
            MissionField::Refuse => Some(&self.misn_refuse),
            MissionField::Success => Some(&self.misn_success),
            MissionField::Abort => Some(&self.misn_abort),
            MissionField::Ship => Some(&self.misn_ship),
        }
    }

    fn clusters_mut(&mut self, field: MissionField) -> (&mut Cluster, Option<&mut Cluster>) {
        match field {
            MissionField::Available => (&mut self.b_available, None),
            MissionField::Accept => (&mut self.b_accept, Some(&mut self.misn_accept)),
            MissionField::Refuse => (&mut self.b_refuse, Some(&mut self.misn_refuse)),
            MissionField::Success => (&mut self.b_success, Some(&mut self.misn_success)),
            MissionField::Abort => (&mut self.b_abort, Some(&mut self.misn_abort)),
            MissionField::Ship => (&mut self.b_ship, Some(&mut self.misn_ship)),
        }
    }

    fn phase(field: MissionField) -> Phase {
        Phase::Mission(field)
    }
}

/// Scalar cron fields, copied verbatim from the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CronDetails {
    pub first_day: i32,
    pub first_month: i32,
    pub first_year: i32,
    pub last_day: i32,
    pub last_month: i32,
    pub last_year: i32,
    pub random: i32,
    pub duration: i32,
    pub pre_holdoff: i32,
    pub post_holdoff: i32,
    pub contribute: u32,
    pub require: u32,
    pub government_1: i32,
    pub government_news_1: i32,
    pub government_2: i32,
    pub government_news_2: i32,
    pub government_3: i32,
    pub government_news_3: i32,
    pub government_4: i32,
    pub government_news_4: i32,
    pub independent_news: i32,
    pub flags: i32,
}

/// A timed trigger record.
#[derive(Debug, Clone, Default)]
pub struct Cron {
    /// Cron id.
    pub id: i32,
    /// Name as exported.
    pub name: String,
    /// Scalar fields.
    pub details: CronDetails,

    /// Raw enable expression.
    pub enable_on: String,
    /// Raw on-start expression.
    pub on_start: String,
    /// Raw on-end expression.
    pub on_end: String,

    /// Parsed enable terms.
    pub b_enable: Cluster,
    /// Parsed start terms.
    pub b_start: Cluster,
    /// Parsed end terms.
    pub b_end: Cluster,
}

impl Cron {
    /// Create a cron with empty expressions.
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }
}

impl ExpressionRecord for Cron {
    type Field = CronField;

    const FIELDS: &'static [CronField] = &[CronField::Enable, CronField::Start, CronField::End];

    fn id(&self) -> i32 {
        self.id
    }

    fn expression(&self, field: CronField) -> &str {
        match field {
            CronField::Enable => &self.enable_on,
            CronField::Start => &self.on_start,
            CronField::End => &self.on_end,
        }
    }

    fn bits(&self, field: CronField) -> &Cluster {
        match field {
            CronField::Enable => &self.b_enable,
            CronField::Start => &self.b_start,
            CronField::End => &self.b_end,
        }
    }

    fn bits_mut(&mut self, field: CronField) -> &mut Cluster {
        match field {
            CronField::Enable => &mut self.b_enable,
            CronField::Start => &mut self.b_start,
            CronField::End => &mut self.b_end,
        }
    }

    fn triggers(&self, _field: CronField) -> Option<&Cluster> {
        None
    }

    fn clusters_mut(&mut self, field: CronField) -> (&mut Cluster, Option<&mut Cluster>) {
        (self.bits_mut(field), None)
    }

    fn phase(field: CronField) -> Phase {
        Phase::Cron(field)
    }
}
