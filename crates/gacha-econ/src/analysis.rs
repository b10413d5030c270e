//! Full analysis: expectation, synthesis cascade and spend for one batch of draws.

use crate::{cascade, distribution, expected_yield, EconError};
use gacha_core::{Catalog, GachaLevel, GradeId, YieldVector};
use rust_decimal::Decimal;
use tracing::debug;

/// One grade's direct draw outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawRow {
    pub grade: GradeId,
    pub probability: Decimal,
    pub expected: Decimal,
}

/// Expected outcome of a batch of draws, before and after synthesis.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub level: GachaLevel,
    pub draws: Decimal,
    /// Premium currency spent on the draws.
    pub cost: Decimal,
    /// Per-grade rows, most likely grade first.
    pub rows: Vec<RawRow>,
    pub raw_yield: YieldVector,
    pub final_yield: YieldVector,
    /// Base-unit value of the final inventory; equal to that of the raw yield.
    pub final_value: Decimal,
}

/// Expected yield at `level` for `draws` draws, then the full synthesis cascade.
pub fn analyze(catalog: &Catalog, level: GachaLevel, draws: Decimal) -> Result<Analysis, EconError> {
    let raw_yield = expected_yield(catalog, level, draws)?;
    let cost = draws
        .checked_mul(catalog.cost_per_draw())
        .ok_or(EconError::Overflow("draw cost"))?;

    let mut rows: Vec<RawRow> = distribution(catalog, level)
        .into_iter()
        .map(|(grade, probability)| RawRow {
            grade,
            probability,
            expected: raw_yield.get(grade),
        })
        .collect();
    rows.sort_by(|a, b| b.probability.cmp(&a.probability).then(a.grade.cmp(&b.grade)));

    let final_yield = cascade(catalog, &raw_yield)?;
    let final_value = catalog
        .base_value(&final_yield)
        .ok_or(EconError::Overflow("final value"))?;
    debug!(%level, %draws, %final_value, "analysis complete");

    Ok(Analysis {
        level,
        draws,
        cost,
        rows,
        raw_yield,
        final_yield,
        final_value,
    })
}
