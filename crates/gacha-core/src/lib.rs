#![deny(warnings)]

//! Core domain models and invariants for the gacha reward economy.
//!
//! This crate defines the item grade catalog, the per-level draw-rate
//! tables and the quantity vector that the economic engines operate on.
//! Everything here is validated once at construction and read-only
//! afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

mod catalog;
mod config;
mod yields;

pub use catalog::{Band, Catalog, CatalogError, RateTable};
pub use config::{BandSpec, CatalogSpec, GachaLevelSpec, GradeSpec, RuleSpec};
pub use yields::YieldVector;

/// Rarity class of a grade, ordered from lowest to highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Lowest drawable class.
    Legend,
    /// Second class, drawn at high gacha levels only.
    Star,
    /// Reached through synthesis only.
    Galaxy,
    /// Top class.
    Universe,
}

impl Tier {
    /// Leading letter used in grade codes ("L4", "S1", ...).
    pub fn letter(self) -> char {
        match self {
            Tier::Legend => 'L',
            Tier::Star => 'S',
            Tier::Galaxy => 'G',
            Tier::Universe => 'U',
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Legend => "Legend",
            Tier::Star => "Star",
            Tier::Galaxy => "Galaxy",
            Tier::Universe => "Universe",
        };
        f.write_str(name)
    }
}

/// Largest number of grades one catalog can hold.
pub const MAX_GRADES: usize = u16::MAX as usize + 1;

/// Canonical grade identifier: the grade's position in the conversion order
/// of the catalog that issued it. Lower ids convert into higher ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeId(u16);

impl GradeId {
    /// `index` must be below [`MAX_GRADES`]; catalogs with more grades are rejected.
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index < MAX_GRADES);
        GradeId(index as u16)
    }

    /// Index into per-grade arrays laid out in conversion order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Selector of a draw-rate table, e.g. gacha level 13.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GachaLevel(pub u8);

impl fmt::Display for GachaLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Forward synthesis rule: `count` units of a grade combine into one unit of `output`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionRule {
    /// Required input quantity (> 0).
    pub count: u32,
    /// Grade produced by one conversion.
    pub output: GradeId,
}

/// An immutable catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Grade {
    /// Position in the conversion order.
    pub id: GradeId,
    /// Short unique code, e.g. "S3".
    pub code: String,
    /// Rarity class.
    pub tier: Tier,
    /// Rank within the tier; 1 is the highest rank.
    pub level: Option<u8>,
    /// Value in units of the reference grade (> 0).
    pub equivalence: Decimal,
    /// Outgoing synthesis rule, `None` for the terminal grade.
    pub rule: Option<ConversionRule>,
}

impl Grade {
    /// True for the grade at the end of the conversion chain.
    pub fn is_terminal(&self) -> bool {
        self.rule.is_none()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
