//! Set/clear term pairs.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::term_list::{TermList, TermListError};

/// Which side of a cluster a term lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Required true / triggered.
    Set,
    /// Required false / not yet triggered.
    Clear,
}

impl Polarity {
    /// Polarity of a term read under the given negation state.
    pub fn from_negated(negated: bool) -> Self {
        if negated {
            Self::Clear
        } else {
            Self::Set
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Clear => write!(f, "clear"),
        }
    }
}

/// One parsed `(id, polarity)` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Bit or mission id.
    pub id: i32,
    /// Side of the cluster.
    pub polarity: Polarity,
}

impl Term {
    /// Create a new term.
    pub fn new(id: i32, polarity: Polarity) -> Self {
        Self { id, polarity }
    }
}

/// A `{set, clear}` pair of term lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// Ids required set.
    pub set: TermList,
    /// Ids required clear.
    pub clear: TermList,
}

impl Cluster {
    /// Create an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow one side.
    pub fn side(&self, polarity: Polarity) -> &TermList {
        match polarity {
            Polarity::Set => &self.set,
            Polarity::Clear => &self.clear,
        }
    }

    /// Mutably borrow one side.
    pub fn side_mut(&mut self, polarity: Polarity) -> &mut TermList {
        match polarity {
            Polarity::Set => &mut self.set,
            Polarity::Clear => &mut self.clear,
        }
    }

    /// Append `id` to the side named by `polarity`.
    pub fn push(&mut self, polarity: Polarity, id: i32) -> Result<(), TermListError> {
        self.side_mut(polarity).append(id)
    }

    /// Append a parsed term.
    pub fn push_term(&mut self, term: Term) -> Result<(), TermListError> {
        self.push(term.polarity, term.id)
    }

    /// Total terms on both sides.
    pub fn len(&self) -> usize {
        self.set.len() + self.clear.len()
    }

    /// True if both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.clear.is_empty()
    }

    /// All terms, set side first, each side in its current order.
    pub fn terms(&self) -> Vec<Term> {
        let set = self.set.as_slice().iter().map(|&id| Term::new(id, Polarity::Set));
        let clear = self.clear.as_slice().iter().map(|&id| Term::new(id, Polarity::Clear));
        set.chain(clear).collect()
    }

    /// Remove every occurrence of `id` from both sides.
    pub fn remove_id(&mut self, id: i32) -> usize {
        self.set.remove_if(|v| v == id) + self.clear.remove_if(|v| v == id)
    }

    /// Sort both sides numerically.
    pub fn sort(&mut self) {
        self.set.sort();
        self.clear.sort();
    }

    /// Three-way comparison: set sides first, then clear sides.
    pub fn compare(&self, other: &Cluster) -> Result<Ordering, TermListError> {
        match self.set.compare(&other.set)? {
            Ordering::Equal => self.clear.compare(&other.clear),
            ord => Ok(ord),
        }
    }
}

impl fmt::Display for Cluster {
    /// Debug-friendly `<[ 1 2 ],![ 3 ]>` form used in log lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<[")?;
        for v in self.set.as_slice() {
            write!(f, " {v}")?;
        }
        write!(f, " ],![")?;
        for v in self.clear.as_slice() {
            write!(f, " {v}")?;
        }
        write!(f, " ]>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_routes_by_polarity() {
        let mut c = Cluster::new();
        c.push(Polarity::Set, 5).unwrap();
        c.push(Polarity::Clear, 6).unwrap();
        c.push_term(Term::new(7, Polarity::Set)).unwrap();
        assert_eq!(c.set.as_slice(), &[5, 7]);
        assert_eq!(c.clear.as_slice(), &[6]);
        assert_eq!(c.len(), 3);
        assert_eq!(
            c.terms(),
            vec![
                Term::new(5, Polarity::Set),
                Term::new(7, Polarity::Set),
                Term::new(6, Polarity::Clear),
            ]
        );
    }

    #[test]
    fn test_remove_id_hits_both_sides() {
        let mut c = Cluster::new();
        for (p, id) in [(Polarity::Set, 4), (Polarity::Clear, 4), (Polarity::Set, 9)] {
            c.push(p, id).unwrap();
        }
        assert_eq!(c.remove_id(4), 2);
        assert_eq!(c.set.as_slice(), &[9]);
        assert!(c.clear.is_empty());
    }

    #[test]
    fn test_compare_set_side_dominates() {
        let mut a = Cluster::new();
        let mut b = Cluster::new();
        a.push(Polarity::Set, 1).unwrap();
        b.push(Polarity::Set, 1).unwrap();
        b.push(Polarity::Clear, 0).unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
        a.push(Polarity::Clear, 0).unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_display_form() {
        let mut c = Cluster::new();
        c.push(Polarity::Set, 1).unwrap();
        c.push(Polarity::Clear, 2).unwrap();
        assert_eq!(c.to_string(), "<[ 1 ],![ 2 ]>");
    }
}
