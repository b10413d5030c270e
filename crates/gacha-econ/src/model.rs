//! Probability model and expectation engine.

use crate::EconError;
use gacha_core::{Catalog, GachaLevel, GradeId, YieldVector};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

/// Realized draw probability per grade. Grades that cannot drop are absent.
pub type Distribution = BTreeMap<GradeId, Decimal>;

/// Probability of each grade at `level`: band rate times the grade's share
/// in the band, summed over bands.
///
/// An unknown level yields an empty distribution, which callers treat as
/// zero yield everywhere.
pub fn distribution(catalog: &Catalog, level: GachaLevel) -> Distribution {
    let mut probs = Distribution::new();
    let Some(table) = catalog.rate_table(level) else {
        warn!(%level, "unknown gacha level, using empty distribution");
        return probs;
    };
    for band in &table.bands {
        for &(id, share) in &band.shares {
            if share.is_zero() {
                continue;
            }
            *probs.entry(id).or_insert(Decimal::ZERO) += band.rate * share;
        }
    }
    probs.retain(|_, p| !p.is_zero());
    probs
}

/// Expected count per grade after `draws` draws. Fractional draw counts are
/// accepted and scale linearly; no rounding happens here.
pub fn expected_yield(
    catalog: &Catalog,
    level: GachaLevel,
    draws: Decimal,
) -> Result<YieldVector, EconError> {
    if draws < Decimal::ZERO {
        return Err(EconError::NegativeDrawCount);
    }
    Ok(distribution(catalog, level)
        .into_iter()
        .map(|(id, p)| (id, draws * p))
        .collect())
}
