//! Ordered, duplicate-tolerant list of signed terms.
//!
//! A [`TermList`] is the storage under every [`Cluster`](super::Cluster)
//! side. Insertion order is kept until [`TermList::sort`] is called and the
//! parser never dedupes, so the same id may appear more than once.
//!
//! ## Iteration guard
//!
//! [`TermList::iterate`] locks the list for the lifetime of the returned
//! [`TermIter`]. A second traversal started while the first is alive fails
//! with [`TermListError::Locked`] instead of silently interleaving. Structural
//! mutation takes `&mut self`, so the borrow checker already rules it out
//! while an iterator is held; the lock covers the read side.

use std::cell::Cell;
use std::cmp::Ordering;

use serde::{Serialize, Serializer};

/// Error type for term list operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermListError {
    /// A traversal is already in progress on this list.
    #[error("Term list is locked by an active iteration")]
    Locked,
    /// Backing storage could not grow.
    #[error("Term list could not grow to {requested} elements")]
    Capacity {
        /// Length the list was trying to reach.
        requested: usize,
    },
}

/// Insertion-ordered list of `i32` terms.
///
/// Only traversals check the iteration lock: [`iterate`](Self::iterate),
/// [`contains`](Self::contains) and [`compare`](Self::compare) return
/// [`TermListError::Locked`] while a [`TermIter`] is alive. Plain reads
/// ([`len`](Self::len), [`get`](Self::get), [`as_slice`](Self::as_slice))
/// always succeed; they cannot observe a partial mutation because every
/// mutator takes `&mut self`.
#[derive(Debug, Default)]
pub struct TermList {
    items: Vec<i32>,
    locked: Cell<bool>,
}

impl TermList {
    /// Create an empty list. No storage is allocated until the first append.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term at the end.
    pub fn append(&mut self, value: i32) -> Result<(), TermListError> {
        self.items
            .try_reserve(1)
            .map_err(|_| TermListError::Capacity { requested: self.items.len() + 1 })?;
        self.items.push(value);
        Ok(())
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list holds no terms.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Term at `index`, if any.
    pub fn get(&self, index: usize) -> Option<i32> {
        self.items.get(index).copied()
    }

    /// Borrow the terms in their current order.
    pub fn as_slice(&self) -> &[i32] {
        &self.items
    }

    /// True while a [`TermIter`] over this list is alive.
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Start a traversal in insertion order.
    ///
    /// The list stays locked until the iterator is exhausted or dropped; a
    /// traversal can only be restarted from the beginning.
    pub fn iterate(&self) -> Result<TermIter<'_>, TermListError> {
        if self.locked.replace(true) {
            return Err(TermListError::Locked);
        }
        Ok(TermIter { list: self, pos: 0 })
    }

    /// Membership test.
    pub fn contains(&self, value: i32) -> Result<bool, TermListError> {
        Ok(self.iterate()?.any(|v| v == value))
    }

    /// Remove every term matching `predicate`, returning how many went.
    ///
    /// Survivors keep their relative order (stable compaction).
    pub fn remove_if<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(i32) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|&v| !predicate(v));
        before - self.items.len()
    }

    /// Sort in ascending numeric order.
    pub fn sort(&mut self) {
        self.items.sort_unstable();
    }

    /// Sort with a caller-supplied comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&i32, &i32) -> Ordering,
    {
        self.items.sort_by(compare);
    }

    /// Three-way comparison against `other` using numeric order.
    ///
    /// See [`TermList::compare_by`] for the tie rule.
    pub fn compare(&self, other: &TermList) -> Result<Ordering, TermListError> {
        self.compare_by(other, |a, b| a.cmp(b))
    }

    /// Three-way comparison, element by element in current order.
    ///
    /// The first differing element decides. When one list is a prefix of the
    /// other the shorter list is smaller, so equal means same length and
    /// same elements. Callers wanting set semantics sort both sides first.
    pub fn compare_by<F>(&self, other: &TermList, mut compare: F) -> Result<Ordering, TermListError>
    where
        F: FnMut(&i32, &i32) -> Ordering,
    {
        let left = self.iterate()?;
        let right = other.iterate()?;
        for (a, b) in left.zip(right) {
            match compare(&a, &b) {
                Ordering::Equal => {}
                ord => return Ok(ord),
            }
        }
        Ok(self.len().cmp(&other.len()))
    }
}

impl Clone for TermList {
    /// Clones start unlocked.
    fn clone(&self) -> Self {
        Self::from(self.items.clone())
    }
}

impl PartialEq for TermList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for TermList {}

impl From<Vec<i32>> for TermList {
    fn from(items: Vec<i32>) -> Self {
        Self { items, locked: Cell::new(false) }
    }
}

impl Serialize for TermList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.items)
    }
}

/// Locking iterator returned by [`TermList::iterate`].
#[derive(Debug)]
pub struct TermIter<'a> {
    list: &'a TermList,
    pos: usize,
}

impl Iterator for TermIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let value = self.list.items.get(self.pos).copied()?;
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.list.items.len() - self.pos;
        (rest, Some(rest))
    }
}

impl Drop for TermIter<'_> {
    fn drop(&mut self) {
        self.list.locked.set(false);
    }
}
