#![deny(warnings)]

//! Goal planning on top of the grade catalog.
//!
//! Provides base-unit equivalence lookups, equivalence ratios between any
//! two grades, the forward conversion chain between grades, and a goal
//! planner that turns a target and an inventory into a shortfall and an
//! estimated number of days.

use chrono::{Days, NaiveDate};
use gacha_core::{Catalog, Grade, GradeId, YieldVector};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors produced by planning helpers.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    /// The grade id does not belong to this catalog.
    #[error("unknown grade {0:?}")]
    UnknownGrade(GradeId),
    /// `to` cannot be reached by converting forward from `from`.
    #[error("no conversion path from {from} to {to}")]
    NoPath { from: String, to: String },
    #[error("target quantity must be non-negative")]
    NegativeTarget,
    #[error("inventory quantity for {0} must be non-negative")]
    NegativeInventory(String),
    #[error("daily rate must be non-negative")]
    NegativeRate,
    /// A base-unit amount does not fit in a decimal.
    #[error("{0} overflows")]
    Overflow(&'static str),
}

fn lookup(catalog: &Catalog, id: GradeId) -> Result<&Grade, PlanError> {
    catalog.grade(id).ok_or(PlanError::UnknownGrade(id))
}

/// How many reference units one unit of `grade` is worth.
pub fn equivalence(catalog: &Catalog, grade: GradeId) -> Result<Decimal, PlanError> {
    Ok(lookup(catalog, grade)?.equivalence)
}

/// Units of `b` that one unit of `a` is worth.
pub fn equivalence_ratio(catalog: &Catalog, a: GradeId, b: GradeId) -> Result<Decimal, PlanError> {
    let a = lookup(catalog, a)?;
    let b = lookup(catalog, b)?;
    a.equivalence
        .checked_div(b.equivalence)
        .ok_or(PlanError::Overflow("equivalence ratio"))
}

/// One forward conversion: `count` of `source` make one `result`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainStep<'c> {
    pub source: &'c Grade,
    pub count: u32,
    pub result: &'c Grade,
}

impl fmt::Display for ChainStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} -> {}", self.source, self.count, self.result)
    }
}

/// Ordered conversions leading from `from` up to `to`.
///
/// Empty when `from == to`. Fails with [`PlanError::NoPath`] when `to`
/// ranks below `from`.
pub fn conversion_chain<'c>(
    catalog: &'c Catalog,
    from: GradeId,
    to: GradeId,
) -> Result<Vec<ChainStep<'c>>, PlanError> {
    let start = lookup(catalog, from)?;
    let end = lookup(catalog, to)?;
    let mut steps = Vec::new();
    let mut cur = start;
    while cur.id != end.id {
        let Some(rule) = cur.rule else {
            return Err(PlanError::NoPath {
                from: start.code.clone(),
                to: end.code.clone(),
            });
        };
        let next = lookup(catalog, rule.output)?;
        steps.push(ChainStep {
            source: cur,
            count: rule.count,
            result: next,
        });
        cur = next;
    }
    Ok(steps)
}

/// A target to reach and the resources available for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Goal {
    pub target: GradeId,
    pub quantity: Decimal,
    pub inventory: YieldVector,
    /// Base units gained per day.
    pub daily_rate: Decimal,
}

/// Days until a goal is met.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DaysNeeded {
    Days(u64),
    /// The daily rate is zero.
    Undefined,
}

impl fmt::Display for DaysNeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaysNeeded::Days(d) => write!(f, "{d}"),
            DaysNeeded::Undefined => f.write_str("undefined"),
        }
    }
}

/// Result of [`plan_goal`]. All amounts are in base units.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalPlan {
    pub required: Decimal,
    pub owned: Decimal,
    pub shortfall: Decimal,
    pub days: DaysNeeded,
    /// Owned over required, 0..=100.
    pub progress_percent: u8,
}

impl GoalPlan {
    /// Date the goal is met when starting on `start`.
    pub fn completion_date(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self.days {
            DaysNeeded::Days(d) => start.checked_add_days(Days::new(d)),
            DaysNeeded::Undefined => None,
        }
    }
}

/// Compare what a goal needs against what the inventory is worth.
pub fn plan_goal(catalog: &Catalog, goal: &Goal) -> Result<GoalPlan, PlanError> {
    let target = lookup(catalog, goal.target)?;
    if goal.quantity < Decimal::ZERO {
        return Err(PlanError::NegativeTarget);
    }
    if goal.daily_rate < Decimal::ZERO {
        return Err(PlanError::NegativeRate);
    }
    for (id, q) in goal.inventory.iter() {
        let g = lookup(catalog, id)?;
        if q < Decimal::ZERO {
            return Err(PlanError::NegativeInventory(g.code.clone()));
        }
    }

    let required = goal
        .quantity
        .checked_mul(target.equivalence)
        .ok_or(PlanError::Overflow("required amount"))?;
    let owned = catalog
        .base_value(&goal.inventory)
        .ok_or(PlanError::Overflow("inventory value"))?;
    let shortfall = (required - owned).max(Decimal::ZERO);

    // Quotients too large for a decimal saturate like oversized day counts.
    let days = if goal.daily_rate.is_zero() {
        DaysNeeded::Undefined
    } else {
        let d = shortfall
            .checked_div(goal.daily_rate)
            .and_then(|d| d.ceil().to_u64())
            .unwrap_or(u64::MAX);
        DaysNeeded::Days(d)
    };

    let progress_percent = if required > Decimal::ZERO {
        owned
            .checked_div(required)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |pct| {
                pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .min(Decimal::ONE_HUNDRED)
            })
            .to_u8()
            .unwrap_or(100)
    } else {
        0
    };

    debug!(target = %target.code, %required, %owned, %shortfall, %days, "goal planned");
    Ok(GoalPlan {
        required,
        owned,
        shortfall,
        days,
        progress_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    fn id(cat: &Catalog, code: &str) -> GradeId {
        cat.id(code).unwrap()
    }

    #[test]
    fn ratio_of_top_grade_to_reference() {
        let cat = catalog();
        let r = equivalence_ratio(&cat, id(&cat, "U4"), id(&cat, "L1")).unwrap();
        assert_eq!(r, Decimal::new(1728, 0));
        let inv = equivalence_ratio(&cat, id(&cat, "L4"), id(&cat, "L1")).unwrap();
        assert_eq!(inv, Decimal::new(8, 3));
        assert_eq!(equivalence(&cat, id(&cat, "S1")).unwrap(), Decimal::new(54, 0));
    }

    #[test]
    fn chain_from_reference_to_star() {
        let cat = catalog();
        let steps = conversion_chain(&cat, id(&cat, "L2"), id(&cat, "S3")).unwrap();
        let text: Vec<String> = steps.iter().map(|s| s.to_string()).collect();
        assert_eq!(text, ["L2 x 5 -> L1", "L1 x 3 -> S4", "S4 x 3 -> S3"]);
        assert!(conversion_chain(&cat, id(&cat, "G2"), id(&cat, "G2")).unwrap().is_empty());
    }

    #[test]
    fn chain_downward_has_no_path() {
        let cat = catalog();
        let err = conversion_chain(&cat, id(&cat, "S1"), id(&cat, "L1")).unwrap_err();
        assert_eq!(
            err,
            PlanError::NoPath {
                from: "S1".into(),
                to: "L1".into()
            }
        );
    }

    #[test]
    fn chain_counts_multiply_to_ratio() {
        let cat = catalog();
        let steps = conversion_chain(&cat, id(&cat, "L4"), cat.terminal().id).unwrap();
        assert_eq!(steps.len(), 12);
        let product: Decimal = steps.iter().map(|s| Decimal::from(s.count)).product();
        let ratio = equivalence_ratio(&cat, cat.terminal().id, id(&cat, "L4")).unwrap();
        assert_eq!(product, ratio);
    }

    #[test]
    fn goal_with_shortfall() {
        let cat = catalog();
        let mut inventory = YieldVector::new();
        inventory.set(id(&cat, "L1"), Decimal::new(500, 0));
        let plan = plan_goal(
            &cat,
            &Goal {
                target: id(&cat, "U4"),
                quantity: Decimal::ONE,
                inventory,
                daily_rate: Decimal::new(9, 0),
            },
        )
        .unwrap();
        assert_eq!(plan.required, Decimal::new(1728, 0));
        assert_eq!(plan.owned, Decimal::new(500, 0));
        assert_eq!(plan.shortfall, Decimal::new(1228, 0));
        assert_eq!(plan.days, DaysNeeded::Days(137));
        assert_eq!(plan.progress_percent, 29);
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(
            plan.completion_date(start),
            NaiveDate::from_ymd_opt(2026, 5, 18)
        );
    }

    #[test]
    fn zero_rate_is_undefined_not_a_panic() {
        let cat = catalog();
        let plan = plan_goal(
            &cat,
            &Goal {
                target: id(&cat, "G1"),
                quantity: Decimal::TWO,
                inventory: YieldVector::new(),
                daily_rate: Decimal::ZERO,
            },
        )
        .unwrap();
        assert_eq!(plan.days, DaysNeeded::Undefined);
        assert_eq!(plan.completion_date(NaiveDate::MIN), None);
        assert_eq!(plan.progress_percent, 0);
    }

    #[test]
    fn surplus_inventory_caps_progress() {
        let cat = catalog();
        let mut inventory = YieldVector::new();
        inventory.set(id(&cat, "G1"), Decimal::new(3, 0));
        let plan = plan_goal(
            &cat,
            &Goal {
                target: id(&cat, "U4"),
                quantity: Decimal::ONE,
                inventory,
                daily_rate: Decimal::new(9, 0),
            },
        )
        .unwrap();
        assert_eq!(plan.shortfall, Decimal::ZERO);
        assert_eq!(plan.days, DaysNeeded::Days(0));
        assert_eq!(plan.progress_percent, 100);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let cat = catalog();
        let mut inventory = YieldVector::new();
        inventory.set(id(&cat, "S2"), Decimal::new(-1, 0));
        let goal = Goal {
            target: id(&cat, "U4"),
            quantity: Decimal::ONE,
            inventory,
            daily_rate: Decimal::ONE,
        };
        assert_eq!(
            plan_goal(&cat, &goal).unwrap_err(),
            PlanError::NegativeInventory("S2".into())
        );
        let goal = Goal {
            quantity: Decimal::new(-1, 0),
            inventory: YieldVector::new(),
            ..goal
        };
        assert_eq!(plan_goal(&cat, &goal).unwrap_err(), PlanError::NegativeTarget);
        let goal = Goal {
            quantity: Decimal::ONE,
            daily_rate: Decimal::new(-1, 0),
            ..goal
        };
        assert_eq!(plan_goal(&cat, &goal).unwrap_err(), PlanError::NegativeRate);
    }

    #[test]
    fn huge_amounts_saturate_or_fail_cleanly() {
        let cat = catalog();
        let mut inventory = YieldVector::new();
        inventory.set(id(&cat, "L1"), Decimal::new(500, 0));
        let goal = Goal {
            target: id(&cat, "U4"),
            quantity: Decimal::ONE,
            inventory,
            daily_rate: Decimal::new(1, 28),
        };
        let plan = plan_goal(&cat, &goal).unwrap();
        assert_eq!(plan.days, DaysNeeded::Days(u64::MAX));
        assert_eq!(plan.completion_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()), None);

        let too_many = Goal {
            quantity: Decimal::MAX,
            ..goal.clone()
        };
        assert_eq!(
            plan_goal(&cat, &too_many).unwrap_err(),
            PlanError::Overflow("required amount")
        );

        let mut hoard = YieldVector::new();
        hoard.set(cat.terminal().id, Decimal::MAX);
        let rich = Goal {
            inventory: hoard,
            ..goal
        };
        assert_eq!(
            plan_goal(&cat, &rich).unwrap_err(),
            PlanError::Overflow("inventory value")
        );
    }

    #[test]
    fn tiny_target_against_large_inventory_caps_progress() {
        let cat = catalog();
        let mut inventory = YieldVector::new();
        inventory.set(id(&cat, "G1"), Decimal::from(10u64.pow(18)));
        let plan = plan_goal(
            &cat,
            &Goal {
                target: id(&cat, "L4"),
                quantity: Decimal::new(1, 20),
                inventory,
                daily_rate: Decimal::ONE,
            },
        )
        .unwrap();
        assert_eq!(plan.progress_percent, 100);
        assert_eq!(plan.days, DaysNeeded::Days(0));
    }

    #[test]
    fn synthesized_inventory_is_worth_the_same() {
        let cat = catalog();
        let a = gacha_econ::analyze(&cat, gacha_core::GachaLevel(14), Decimal::new(5_000, 0)).unwrap();
        let goal = |inventory| Goal {
            target: id(&cat, "G4"),
            quantity: Decimal::ONE,
            inventory,
            daily_rate: Decimal::new(9, 0),
        };
        let before = plan_goal(&cat, &goal(a.raw_yield.clone())).unwrap();
        let after = plan_goal(&cat, &goal(a.final_yield.clone())).unwrap();
        assert_eq!(before, after);
    }

    proptest! {
        #[test]
        fn ratios_are_reciprocal(a in 0usize..13, b in 0usize..13) {
            let cat = catalog();
            let ga = cat.grades()[a].id;
            let gb = cat.grades()[b].id;
            let ab = equivalence_ratio(&cat, ga, gb).unwrap();
            let ba = equivalence_ratio(&cat, gb, ga).unwrap();
            prop_assert!(ab > Decimal::ZERO);
            let product = ab * ba;
            prop_assert!((product - Decimal::ONE).abs() < Decimal::new(1, 12));
        }

        #[test]
        fn days_cover_the_shortfall(owned in 0i64..2_000, rate in 1i64..50) {
            let cat = catalog();
            let mut inventory = YieldVector::new();
            inventory.set(cat.reference().id, Decimal::new(owned, 0));
            let plan = plan_goal(&cat, &Goal {
                target: cat.terminal().id,
                quantity: Decimal::ONE,
                inventory,
                daily_rate: Decimal::new(rate, 0),
            }).unwrap();
            let DaysNeeded::Days(d) = plan.days else {
                return Err(TestCaseError::fail("expected a finite day count"));
            };
            prop_assert!(Decimal::from(d) * Decimal::new(rate, 0) >= plan.shortfall);
            if d > 0 {
                prop_assert!(Decimal::from(d - 1) * Decimal::new(rate, 0) < plan.shortfall);
            }
        }
    }
}
