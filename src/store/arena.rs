//! Fixed-capacity arena indexed directly by id.

use crate::config::IdRange;
use crate::types::{Slot, SlotState};

/// Error type for arena operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Id lies outside the arena's valid range.
    #[error("{kind} {id} is outside the range {range}")]
    OutOfRange {
        /// Record kind.
        kind: &'static str,
        /// Rejected id.
        id: i64,
        /// Valid range.
        range: IdRange,
    },
    /// Slot already holds a record.
    #[error("{kind} {id} is already registered")]
    Occupied {
        /// Record kind.
        kind: &'static str,
        /// Rejected id.
        id: i32,
    },
}

/// Arena of boxed records with stable indices.
///
/// Slots below `range.start` exist but never become valid, so lookups are a
/// direct index.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    kind: &'static str,
    range: IdRange,
    slots: Vec<Slot<T>>,
}

impl<T> Arena<T> {
    /// Create an arena of empty slots for `range`.
    pub fn new(kind: &'static str, range: IdRange) -> Self {
        let size = range.end.max(0) as usize;
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, Slot::default);
        Self { kind, range, slots }
    }

    /// Record kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Valid id range.
    pub fn range(&self) -> IdRange {
        self.range
    }

    /// Check `id` against the valid range.
    pub fn check(&self, id: i64) -> Result<i32, StoreError> {
        if self.range.contains(id) {
            Ok(id as i32)
        } else {
            Err(StoreError::OutOfRange { kind: self.kind, id, range: self.range })
        }
    }

    fn index(&self, id: i32) -> Option<usize> {
        self.range.contains(id as i64).then_some(id as usize)
    }

    /// Place a record in an empty slot.
    pub fn insert(&mut self, id: i32, record: T) -> Result<(), StoreError> {
        let index = self.check(id as i64)? as usize;
        let slot = &mut self.slots[index];
        if !matches!(slot, Slot::Empty) {
            return Err(StoreError::Occupied { kind: self.kind, id });
        }
        *slot = Slot::Live(Box::new(record));
        Ok(())
    }

    /// Slot for `id`, or `None` if out of range.
    pub fn slot(&self, id: i32) -> Option<&Slot<T>> {
        self.index(id).map(|i| &self.slots[i])
    }

    /// State of `id`; out-of-range ids read as empty.
    pub fn state(&self, id: i32) -> SlotState {
        self.slot(id).map_or(SlotState::Empty, Slot::state)
    }

    /// True if `id` names a live record.
    pub fn is_live(&self, id: i32) -> bool {
        self.state(id) == SlotState::Live
    }

    /// Live record at `id`.
    pub fn get(&self, id: i32) -> Option<&T> {
        self.slot(id).and_then(Slot::live)
    }

    /// Live record at `id`, mutably.
    pub fn get_mut(&mut self, id: i32) -> Option<&mut T> {
        let index = self.index(id)?;
        self.slots[index].live_mut()
    }

    /// Live record at `id`, creating it with `make` if the slot is empty.
    ///
    /// Returns `None` for out-of-range ids and for tombstoned slots.
    pub fn get_or_insert_with<F>(&mut self, id: i32, make: F) -> Option<&mut T>
    where
        F: FnOnce() -> T,
    {
        let index = self.index(id)?;
        let slot = &mut self.slots[index];
        if matches!(slot, Slot::Empty) {
            *slot = Slot::Live(Box::new(make()));
        }
        slot.live_mut()
    }

    /// Tombstone a live record. Returns false if it was not live.
    pub fn tombstone(&mut self, id: i32) -> bool {
        match self.index(id) {
            Some(index) => self.slots[index].tombstone(),
            None => false,
        }
    }

    /// Ids of live records, ascending.
    pub fn live_ids(&self) -> Vec<i32> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Live records with their ids, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.live().map(|record| (i as i32, record)))
    }

    /// Live records mutably, ascending.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (i32, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.live_mut().map(|record| (i as i32, record)))
    }

    /// Number of live records.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_live()).count()
    }

    /// Number of tombstoned records.
    pub fn tombstone_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state() == SlotState::Tombstoned).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena<String> {
        Arena::new("misn", IdRange::new(128, 140))
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut a = arena();
        a.insert(130, "a".to_string()).unwrap();
        assert!(a.is_live(130));
        assert_eq!(a.get(130).map(String::as_str), Some("a"));
        assert_eq!(a.state(131), SlotState::Empty);
        assert_eq!(a.live_ids(), vec![130]);
    }

    #[test]
    fn test_insert_rejects_out_of_range_and_duplicates() {
        let mut a = arena();
        assert!(matches!(a.insert(0, "x".into()), Err(StoreError::OutOfRange { id: 0, .. })));
        assert!(matches!(a.insert(140, "x".into()), Err(StoreError::OutOfRange { .. })));
        a.insert(128, "x".into()).unwrap();
        assert_eq!(a.insert(128, "y".into()).unwrap_err(), StoreError::Occupied { kind: "misn", id: 128 });
    }

    #[test]
    fn test_tombstone_hides_record() {
        let mut a = arena();
        a.insert(129, "a".into()).unwrap();
        assert!(a.tombstone(129));
        assert!(a.get(129).is_none());
        assert_eq!(a.state(129), SlotState::Tombstoned);
        assert_eq!(a.slot(129).and_then(Slot::record).map(String::as_str), Some("a"));
        assert_eq!(a.live_count(), 0);
        assert_eq!(a.tombstone_count(), 1);
        assert!(a.get_or_insert_with(129, || "b".into()).is_none());
    }

    #[test]
    fn test_out_of_range_lookups_are_empty() {
        let a = arena();
        assert_eq!(a.state(-5), SlotState::Empty);
        assert_eq!(a.state(5000), SlotState::Empty);
        assert!(a.get(12).is_none());
    }
}
