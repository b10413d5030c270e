#![deny(warnings)]

//! Economic models for the gacha reward economy.
//!
//! This crate provides validated utilities for:
//! - The per-level probability distribution over grades
//! - Expected yield of a number of draws
//! - Cascading synthesis of expected quantities up the conversion chain
//! - A seeded random-sampling simulator with the same shape

use gacha_core::GradeId;
use thiserror::Error;

mod analysis;
mod model;
mod sampler;
mod synthesis;

pub use analysis::{analyze, Analysis, RawRow};
pub use model::{distribution, expected_yield, Distribution};
pub use sampler::{analyze_sampled, sample_draws, SampledAnalysis};
pub use synthesis::{cascade, synthesize, Synthesis};

/// Invalid input errors produced by the economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Draw counts must be non-negative.
    #[error("draw count must be non-negative")]
    NegativeDrawCount,
    /// Quantities must be non-negative.
    #[error("negative quantity for grade {0:?}")]
    NegativeQuantity(GradeId),
    /// The grade id does not belong to the catalog in use.
    #[error("unknown grade {0:?}")]
    UnknownGrade(GradeId),
    /// A result does not fit in a decimal quantity.
    #[error("{0} overflows")]
    Overflow(&'static str),
}
