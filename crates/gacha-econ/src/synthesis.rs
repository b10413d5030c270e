//! Synthesis: single conversion steps and the chain-wide cascade.

use crate::EconError;
use gacha_core::{Catalog, GradeId, YieldVector};
use rust_decimal::Decimal;
use tracing::trace;

/// Outcome of applying one grade's conversion rule to a quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Synthesis {
    /// Grade produced, `None` when nothing converts.
    pub output: Option<GradeId>,
    /// Whole units of the output grade produced.
    pub produced: Decimal,
    /// Input units consumed (`produced × count`).
    pub used: Decimal,
    /// Input units left over, always below the rule's count.
    pub remaining: Decimal,
}

impl Synthesis {
    fn none(quantity: Decimal) -> Self {
        Synthesis {
            output: None,
            produced: Decimal::ZERO,
            used: Decimal::ZERO,
            remaining: quantity,
        }
    }
}

/// Convert as many whole multiples of the rule's count as `quantity` allows.
///
/// Terminal grades and quantities below the required count convert nothing.
pub fn synthesize(
    catalog: &Catalog,
    grade: GradeId,
    quantity: Decimal,
) -> Result<Synthesis, EconError> {
    let g = catalog.grade(grade).ok_or(EconError::UnknownGrade(grade))?;
    if quantity < Decimal::ZERO {
        return Err(EconError::NegativeQuantity(grade));
    }
    let Some(rule) = g.rule else {
        return Ok(Synthesis::none(quantity));
    };
    let count = Decimal::from(rule.count);
    if quantity < count {
        return Ok(Synthesis::none(quantity));
    }
    let produced = (quantity / count).floor();
    let used = produced * count;
    Ok(Synthesis {
        output: Some(rule.output),
        produced,
        used,
        remaining: quantity - used,
    })
}

/// Fold every grade's convertible surplus up the chain, lowest grade first.
///
/// Each grade is processed once, after its predecessor has pushed its
/// output into it, so direct yield and incoming conversions are both
/// counted before the grade's own step runs. Leftovers stay where they are;
/// the terminal grade only accumulates.
pub fn cascade(catalog: &Catalog, initial: &YieldVector) -> Result<YieldVector, EconError> {
    let mut work = vec![Decimal::ZERO; catalog.len()];
    for (id, q) in initial.iter() {
        if catalog.grade(id).is_none() {
            return Err(EconError::UnknownGrade(id));
        }
        if q < Decimal::ZERO {
            return Err(EconError::NegativeQuantity(id));
        }
        work[id.index()] = q;
    }

    for grade in catalog.conversion_order() {
        let q = work[grade.id.index()];
        if q.is_zero() {
            continue;
        }
        let step = synthesize(catalog, grade.id, q)?;
        work[grade.id.index()] = step.remaining;
        if let Some(out) = step.output {
            work[out.index()] = work[out.index()]
                .checked_add(step.produced)
                .ok_or(EconError::Overflow("synthesized quantity"))?;
            trace!(
                from = %grade.code,
                produced = %step.produced,
                remaining = %step.remaining,
                "synthesis step"
            );
        }
    }

    Ok(catalog
        .grades()
        .iter()
        .map(|g| (g.id, work[g.id.index()]))
        .collect())
}
