//! Per-grade quantity vectors for yields and inventories.

use crate::{Catalog, Grade, GradeId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Sparse per-grade quantity vector. Zero entries are never stored, so two
/// vectors compare equal whenever they agree on every grade.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct YieldVector(BTreeMap<GradeId, Decimal>);

impl YieldVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held for `id`; zero when absent.
    pub fn get(&self, id: GradeId) -> Decimal {
        self.0.get(&id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, id: GradeId, quantity: Decimal) {
        if quantity.is_zero() {
            self.0.remove(&id);
        } else {
            self.0.insert(id, quantity);
        }
    }

    pub fn add(&mut self, id: GradeId, quantity: Decimal) {
        let total = self.get(id) + quantity;
        self.set(id, total);
    }

    /// Non-zero entries in conversion order.
    pub fn iter(&self) -> impl Iterator<Item = (GradeId, Decimal)> + '_ {
        self.0.iter().map(|(id, q)| (*id, *q))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every grade holds zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of raw quantities across grades.
    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    /// Entries strictly above `threshold`, for display of meaningful amounts.
    pub fn significant(&self, threshold: Decimal) -> YieldVector {
        self.iter().filter(|(_, q)| *q > threshold).collect()
    }

    /// Entries ordered from the most to the least valuable grade.
    pub fn ranked<'c>(&self, catalog: &'c Catalog) -> Vec<(&'c Grade, Decimal)> {
        let mut rows: Vec<(&Grade, Decimal)> = self
            .iter()
            .filter_map(|(id, q)| catalog.grade(id).map(|g| (g, q)))
            .collect();
        rows.sort_by(|a, b| b.0.equivalence.cmp(&a.0.equivalence).then(b.0.id.cmp(&a.0.id)));
        rows
    }
}

impl FromIterator<(GradeId, Decimal)> for YieldVector {
    fn from_iter<I: IntoIterator<Item = (GradeId, Decimal)>>(iter: I) -> Self {
        let mut v = YieldVector::new();
        for (id, q) in iter {
            v.add(id, q);
        }
        v
    }
}
