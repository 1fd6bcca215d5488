//! Core data types: term lists, clusters, records and registry slots.

pub mod term_list;
pub mod cluster;
pub mod records;
pub mod slot;

pub use term_list::{TermList, TermIter, TermListError};
pub use cluster::{Cluster, Polarity, Term};
pub use records::{Bit, Cron, CronDetails, CronField, ExpressionRecord, Mission, MissionDetails, MissionField, Phase};
pub use slot::{Slot, SlotState};
