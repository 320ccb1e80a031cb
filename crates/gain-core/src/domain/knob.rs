//! Knob vocabulary and identifier parsing.
//!
//! A knob identifier is a five-character token built from three components:
//!
//! ```text
//!   p o s x p
//!   └─┬─┘ │ │
//!   group │ └ gain term  (p | i | d)
//!         └── axis       (x | y | z)
//!   group ∈ { pos, att }
//! ```
//!
//! Matching is case-insensitive: `"POSXP"`, `"PosXp"` and `"posxp"` all name
//! the same knob.  The canonical spelling (used in topics and logs) is
//! lowercase.
//!
//! # Why a compositional scheme?
//!
//! Every component appears verbatim in the identifier, so validation can name
//! exactly which component was wrong, and two different knobs can never
//! collapse onto the same topic.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required length of a knob identifier, in characters.
pub const KNOB_ID_LEN: usize = 5;

// ── Error type ────────────────────────────────────────────────────────────────

/// A knob identifier could not be parsed.
///
/// Each variant names the component that failed so the UI can show a precise
/// message.  Components are checked in order (length, group, axis, term) and
/// the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentifierError {
    /// The identifier is not exactly [`KNOB_ID_LEN`] characters long.
    #[error("invalid knob identifier length: expected {KNOB_ID_LEN} characters, got {len}")]
    Length {
        /// Number of characters actually supplied.
        len: usize,
    },

    /// The first three characters are not `pos` or `att`.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// The fourth character is not `x`, `y` or `z`.
    #[error("unknown axis: {0}")]
    UnknownAxis(String),

    /// The fifth character is not `p`, `i` or `d`.
    #[error("unknown gain: {0}")]
    UnknownTerm(String),
}

// ── Vocabulary enums ──────────────────────────────────────────────────────────

/// One of the two independent control loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisGroup {
    /// Position loop (token `pos`).
    Position,
    /// Attitude loop (token `att`).
    Attitude,
}

impl AxisGroup {
    /// Both groups, in a stable order.
    pub const ALL: [AxisGroup; 2] = [AxisGroup::Position, AxisGroup::Attitude];

    /// The three-letter token used in identifiers, topics and UI channels.
    pub fn token(self) -> &'static str {
        match self {
            AxisGroup::Position => "pos",
            AxisGroup::Attitude => "att",
        }
    }

    /// Looks up a group by its lowercase token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "pos" => Some(AxisGroup::Position),
            "att" => Some(AxisGroup::Attitude),
            _ => None,
        }
    }
}

impl fmt::Display for AxisGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialAxis {
    X,
    Y,
    Z,
}

impl SpatialAxis {
    pub const ALL: [SpatialAxis; 3] = [SpatialAxis::X, SpatialAxis::Y, SpatialAxis::Z];

    pub fn token(self) -> &'static str {
        match self {
            SpatialAxis::X => "x",
            SpatialAxis::Y => "y",
            SpatialAxis::Z => "z",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "x" => Some(SpatialAxis::X),
            "y" => Some(SpatialAxis::Y),
            "z" => Some(SpatialAxis::Z),
            _ => None,
        }
    }
}

/// A PID coefficient category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GainTerm {
    Proportional,
    Integral,
    Derivative,
}

impl GainTerm {
    pub const ALL: [GainTerm; 3] = [
        GainTerm::Proportional,
        GainTerm::Integral,
        GainTerm::Derivative,
    ];

    pub fn token(self) -> &'static str {
        match self {
            GainTerm::Proportional => "p",
            GainTerm::Integral => "i",
            GainTerm::Derivative => "d",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "p" => Some(GainTerm::Proportional),
            "i" => Some(GainTerm::Integral),
            "d" => Some(GainTerm::Derivative),
            _ => None,
        }
    }
}

// ── KnobId ────────────────────────────────────────────────────────────────────

/// A validated knob identifier.
///
/// Construct one with [`KnobId::parse`] (from UI input) or directly from its
/// components (in code and tests).  Once built it is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnobId {
    pub group: AxisGroup,
    pub axis: SpatialAxis,
    pub term: GainTerm,
}

impl KnobId {
    /// Creates a knob identifier from its components.
    pub fn new(group: AxisGroup, axis: SpatialAxis, term: GainTerm) -> Self {
        Self { group, axis, term }
    }

    /// Parses a raw identifier such as `"posxp"` or `"ATTZD"`.
    ///
    /// # Errors
    ///
    /// Returns the [`InvalidIdentifierError`] variant naming the first
    /// component that failed validation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gain_core::{AxisGroup, GainTerm, KnobId, SpatialAxis};
    ///
    /// let knob = KnobId::parse("PosYi").unwrap();
    /// assert_eq!(knob.group, AxisGroup::Position);
    /// assert_eq!(knob.axis, SpatialAxis::Y);
    /// assert_eq!(knob.term, GainTerm::Integral);
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifierError> {
        // Work on chars, not bytes: slicing a multi-byte UTF-8 string at a
        // fixed byte offset would panic.
        let chars: Vec<char> = raw.chars().collect();
        if chars.len() != KNOB_ID_LEN {
            return Err(InvalidIdentifierError::Length { len: chars.len() });
        }

        let group_tok = chars[..3].iter().collect::<String>().to_ascii_lowercase();
        let axis_tok = chars[3].to_ascii_lowercase().to_string();
        let term_tok = chars[4].to_ascii_lowercase().to_string();

        let group = AxisGroup::from_token(&group_tok)
            .ok_or(InvalidIdentifierError::UnknownGroup(group_tok))?;
        let axis = SpatialAxis::from_token(&axis_tok)
            .ok_or(InvalidIdentifierError::UnknownAxis(axis_tok))?;
        let term = GainTerm::from_token(&term_tok)
            .ok_or(InvalidIdentifierError::UnknownTerm(term_tok))?;

        Ok(Self { group, axis, term })
    }

    /// Every valid knob, in group → axis → term order (18 in total).
    pub fn all() -> impl Iterator<Item = KnobId> {
        AxisGroup::ALL.into_iter().flat_map(|group| {
            SpatialAxis::ALL.into_iter().flat_map(move |axis| {
                GainTerm::ALL
                    .into_iter()
                    .map(move |term| KnobId::new(group, axis, term))
            })
        })
    }
}

impl fmt::Display for KnobId {
    /// Writes the canonical lowercase token, e.g. `posxp`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.group.token(),
            self.axis.token(),
            self.term.token()
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
