//! Single-pass expression parser.
//!
//! Turns one EV-style test/set expression such as `!(b12 | b13) & s200` into
//! signed bit and mission terms. There is no operator precedence: `&`, `|`
//! and whitespace are scanned past, and only negation is tracked.
//!
//! ## Grammar
//!
//! - `(` opens a negation scope whose base is the pending negation XOR the
//!   enclosing scope's base; `)` closes it.
//! - `!` toggles the pending negation for the next term.
//! - `bN` is a bit term: set when not negated, clear when negated.
//! - `sN` starts mission N (set side), `aN` aborts it (clear side).
//! - `p g q t x` are flags the graph does not model; they only reset the
//!   pending negation.
//! - Any other letter marks the expression as partly unrecognized.
//!
//! Letters are case-insensitive. Ids are unsigned decimal.
//!
//! ## Atomicity
//!
//! Terms are buffered in a [`ParsedExpression`] and only reach a cluster
//! through [`ParsedExpression::commit`] after the whole expression scanned
//! cleanly. Any [`ParseError`] leaves every cluster untouched.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use tracing::warn;

use crate::config::{IdRange, PipelineConfig};
use crate::types::{Cluster, Polarity, Term, TermListError};

/// Error type for expression parsing.
///
/// Every text error carries the offending expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Parenthesis nesting deeper than the configured limit.
    #[error("<{expr}> more than {max} nested parentheses")]
    TooDeep {
        /// Expression text.
        expr: String,
        /// Depth limit.
        max: usize,
    },
    /// `)` with no open scope.
    #[error("<{expr}> mismatched parenthesis at byte {pos}")]
    UnbalancedClose {
        /// Expression text.
        expr: String,
        /// Byte offset of the `)`.
        pos: usize,
    },
    /// Expression ended inside a scope.
    #[error("<{expr}> ends with {open} unclosed parenthesis")]
    Unterminated {
        /// Expression text.
        expr: String,
        /// Scopes left open.
        open: usize,
    },
    /// Bit id outside the bit table.
    #[error("<{expr}> bit {id} is outside the range [0, {capacity})")]
    BitOutOfRange {
        /// Expression text.
        expr: String,
        /// Rejected id.
        id: i64,
        /// Bit table size.
        capacity: i32,
    },
    /// A destination cluster could not grow while committing.
    #[error("Cannot store parsed terms: {0}")]
    Capacity(#[from] TermListError),
}

impl ParseError {
    /// The expression that failed, if the failure was in the text.
    pub fn expression(&self) -> Option<&str> {
        match self {
            Self::TooDeep { expr, .. }
            | Self::UnbalancedClose { expr, .. }
            | Self::Unterminated { expr, .. }
            | Self::BitOutOfRange { expr, .. } => Some(expr),
            Self::Capacity(_) => None,
        }
    }

    /// True for nesting errors.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::TooDeep { .. } | Self::UnbalancedClose { .. } | Self::Unterminated { .. })
    }

    /// True if the run cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }
}

/// Bounds the parser checks ids and nesting against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Bit ids are `[0, bit_capacity)`.
    pub bit_capacity: i32,
    /// Valid mission ids for start/abort terms.
    pub mission_ids: IdRange,
    /// Maximum open scopes.
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ParseLimits {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            bit_capacity: config.bit_capacity,
            mission_ids: config.mission_ids,
            max_depth: config.max_paren_depth,
        }
    }
}

/// Terms buffered from one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedExpression {
    /// Bit terms in scan order.
    pub bits: Vec<Term>,
    /// Start (set) and abort (clear) mission terms in scan order.
    pub missions: Vec<Term>,
    /// Some letter was not understood.
    pub unrecognized: bool,
    /// Terms dropped: letters with no id, or mission terms out of range or in a test field.
    pub dropped: usize,
}

/// Result of committing one expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOutcome {
    /// Bit and mission terms recorded.
    pub terms: usize,
    /// Some letter was not understood.
    pub unrecognized: bool,
}

impl ParsedExpression {
    /// Bit plus mission terms.
    pub fn term_count(&self) -> usize {
        self.bits.len() + self.missions.len()
    }

    /// Write the buffered terms into the destination clusters.
    ///
    /// Mission terms are only present when the scan was told the field
    /// accepts them, so a missing `missions_out` simply drops nothing.
    pub fn commit(
        &self,
        bits_out: &mut Cluster,
        missions_out: Option<&mut Cluster>,
    ) -> Result<ParseOutcome, TermListError> {
        for &term in &self.bits {
            bits_out.push_term(term)?;
        }
        let mut terms = self.bits.len();
        if let Some(missions_out) = missions_out {
            for &term in &self.missions {
                missions_out.push_term(term)?;
            }
            terms += self.missions.len();
        }
        Ok(ParseOutcome { terms, unrecognized: self.unrecognized })
    }
}

impl fmt::Display for ParsedExpression {
    /// Canonical text that re-parses to the same terms: `b1 !b2 s3 a4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.bits.iter().map(|t| match t.polarity {
            Polarity::Set => format!("b{}", t.id),
            Polarity::Clear => format!("!b{}", t.id),
        });
        let missions = self.missions.iter().map(|t| match t.polarity {
            Polarity::Set => format!("s{}", t.id),
            Polarity::Clear => format!("a{}", t.id),
        });
        let words: Vec<String> = bits.chain(missions).collect();
        write!(f, "{}", words.join(" "))
    }
}

/// Expression parser bound to a set of limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionParser {
    limits: ParseLimits,
}

impl ExpressionParser {
    /// Create a parser with the given limits.
    pub fn new(limits: ParseLimits) -> Self {
        Self { limits }
    }

    /// Limits in use.
    pub fn limits(&self) -> &ParseLimits {
        &self.limits
    }

    /// Parse `expr` straight into clusters.
    ///
    /// `missions_out` is `None` for test fields; start/abort terms found
    /// there are warned about and dropped. On a text error nothing is
    /// written; [`ParseError::Capacity`] may leave a partial commit and is
    /// fatal to the run.
    pub fn parse(
        &self,
        expr: &str,
        bits_out: &mut Cluster,
        missions_out: Option<&mut Cluster>,
    ) -> Result<ParseOutcome, ParseError> {
        let parsed = self.scan(expr, missions_out.is_some())?;
        Ok(parsed.commit(bits_out, missions_out)?)
    }

    /// Scan `expr` into a buffer without touching any cluster.
    pub fn scan(&self, expr: &str, accepts_missions: bool) -> Result<ParsedExpression, ParseError> {
        let mut out = ParsedExpression::default();
        // Base negation of each open scope.
        let mut scopes: Vec<bool> = Vec::with_capacity(self.limits.max_depth);
        let mut pending = false;
        let mut chars = expr.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            let base = scopes.last().copied().unwrap_or(false);
            match c {
                '(' => {
                    if scopes.len() >= self.limits.max_depth {
                        return Err(ParseError::TooDeep { expr: expr.to_string(), max: self.limits.max_depth });
                    }
                    scopes.push(pending ^ base);
                    pending = false;
                }
                ')' => {
                    if scopes.pop().is_none() {
                        return Err(ParseError::UnbalancedClose { expr: expr.to_string(), pos });
                    }
                    pending = false;
                }
                '!' => pending = !pending,
                'b' | 'B' => {
                    let Some(id) = read_id(&mut chars) else {
                        warn!(expr, term = %c, pos, "term has no id, ignoring");
                        out.dropped += 1;
                        pending = false;
                        continue;
                    };
                    if id >= self.limits.bit_capacity as i64 {
                        return Err(ParseError::BitOutOfRange {
                            expr: expr.to_string(),
                            id,
                            capacity: self.limits.bit_capacity,
                        });
                    }
                    out.bits.push(Term::new(id as i32, Polarity::from_negated(pending ^ base)));
                    pending = false;
                }
                // Mission terms ignore negation and leave it pending.
                'a' | 'A' | 's' | 'S' => {
                    let Some(id) = read_id(&mut chars) else {
                        warn!(expr, term = %c, pos, "term has no id, ignoring");
                        out.dropped += 1;
                        continue;
                    };
                    let polarity = if c.eq_ignore_ascii_case(&'s') { Polarity::Set } else { Polarity::Clear };
                    if !accepts_missions {
                        warn!(expr, term = %c, id, "mission term in a test field, ignoring");
                        out.dropped += 1;
                    } else if !self.limits.mission_ids.contains(id) {
                        warn!(expr, id, range = %self.limits.mission_ids, "mission term out of range, ignoring");
                        out.dropped += 1;
                    } else {
                        out.missions.push(Term::new(id as i32, polarity));
                    }
                }
                'p' | 'P' | 'g' | 'G' | 'q' | 'Q' | 't' | 'T' | 'x' | 'X' => pending = false,
                other => {
                    if other.is_alphabetic() {
                        out.unrecognized = true;
                    }
                    pending = false;
                }
            }
        }

        if !scopes.is_empty() {
            return Err(ParseError::Unterminated { expr: expr.to_string(), open: scopes.len() });
        }
        if out.unrecognized {
            warn!(expr, "expression not entirely understood");
        }
        Ok(out)
    }
}

/// Read the decimal id following a term letter, `None` if there are no
/// digits. Saturates on overflow so the caller's range check rejects it.
fn read_id(chars: &mut Peekable<CharIndices<'_>>) -> Option<i64> {
    let mut id: Option<i64> = None;
    while let Some(&(_, c)) = chars.peek() {
        let Some(digit) = c.to_digit(10) else { break };
        id = Some(id.unwrap_or(0).saturating_mul(10).saturating_add(digit as i64));
        chars.next();
    }
    id
}
