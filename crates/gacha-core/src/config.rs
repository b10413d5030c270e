//! Raw, unvalidated catalog configuration as read from YAML or built in code.

use crate::{GachaLevel, Tier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Synthesis rule as written in configuration, referencing the output by code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub count: u32,
    pub output: String,
}

/// One grade entry. Entries may appear in any order; the catalog derives
/// the conversion order from the rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeSpec {
    pub code: String,
    pub tier: Tier,
    #[serde(default)]
    pub level: Option<u8>,
    pub equivalence: Decimal,
    #[serde(default)]
    pub rule: Option<RuleSpec>,
}

/// A band: one outer draw rate split across grades by share.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    pub name: String,
    pub rate: Decimal,
    pub shares: BTreeMap<String, Decimal>,
}

/// Draw-rate table for one gacha level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GachaLevelSpec {
    pub level: GachaLevel,
    pub bands: Vec<BandSpec>,
}

/// Complete economy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    pub grades: Vec<GradeSpec>,
    pub levels: Vec<GachaLevelSpec>,
    /// Premium currency spent per draw.
    #[serde(default = "default_cost_per_draw")]
    pub cost_per_draw: Decimal,
}

fn default_cost_per_draw() -> Decimal {
    Decimal::new(100, 0)
}

fn grade(code: &str, tier: Tier, level: u8, equivalence: Decimal, rule: Option<(u32, &str)>) -> GradeSpec {
    GradeSpec {
        code: code.to_string(),
        tier,
        level: Some(level),
        equivalence,
        rule: rule.map(|(count, output)| RuleSpec {
            count,
            output: output.to_string(),
        }),
    }
}

fn band(name: &str, rate: Decimal, shares: &[(&str, Decimal)]) -> BandSpec {
    BandSpec {
        name: name.to_string(),
        rate,
        shares: shares
            .iter()
            .map(|(code, share)| (code.to_string(), *share))
            .collect(),
    }
}

fn legend_band(rate: Decimal) -> BandSpec {
    band(
        "legend",
        rate,
        &[
            ("L4", Decimal::new(50, 2)),
            ("L3", Decimal::new(30, 2)),
            ("L2", Decimal::new(15, 2)),
            ("L1", Decimal::new(5, 2)),
        ],
    )
}

fn star_band_full(rate: Decimal) -> BandSpec {
    band(
        "star",
        rate,
        &[
            ("S4", Decimal::new(75, 2)),
            ("S3", Decimal::new(14, 2)),
            ("S2", Decimal::new(7, 2)),
            ("S1", Decimal::new(4, 2)),
        ],
    )
}

impl CatalogSpec {
    /// The standard economy: thirteen grades from L4 to U4, gacha levels 8 to 14.
    pub fn standard() -> Self {
        let d = Decimal::new;
        let grades = vec![
            grade("L4", Tier::Legend, 4, d(8, 3), Some((5, "L3"))),
            grade("L3", Tier::Legend, 3, d(4, 2), Some((5, "L2"))),
            grade("L2", Tier::Legend, 2, d(2, 1), Some((5, "L1"))),
            grade("L1", Tier::Legend, 1, d(1, 0), Some((3, "S4"))),
            grade("S4", Tier::Star, 4, d(3, 0), Some((3, "S3"))),
            grade("S3", Tier::Star, 3, d(9, 0), Some((3, "S2"))),
            grade("S2", Tier::Star, 2, d(27, 0), Some((2, "S1"))),
            grade("S1", Tier::Star, 1, d(54, 0), Some((2, "G4"))),
            grade("G4", Tier::Galaxy, 4, d(108, 0), Some((2, "G3"))),
            grade("G3", Tier::Galaxy, 3, d(216, 0), Some((2, "G2"))),
            grade("G2", Tier::Galaxy, 2, d(432, 0), Some((2, "G1"))),
            grade("G1", Tier::Galaxy, 1, d(864, 0), Some((2, "U4"))),
            grade("U4", Tier::Universe, 4, d(1728, 0), None),
        ];

        let low = d(3, 2);
        let high = d(4, 2);
        let levels = vec![
            GachaLevelSpec {
                level: GachaLevel(8),
                bands: vec![legend_band(low)],
            },
            GachaLevelSpec {
                level: GachaLevel(9),
                bands: vec![legend_band(low), band("star", d(5, 4), &[("S4", d(1, 0))])],
            },
            GachaLevelSpec {
                level: GachaLevel(10),
                bands: vec![
                    legend_band(low),
                    band("star", d(1, 3), &[("S4", d(9, 1)), ("S3", d(1, 1))]),
                ],
            },
            GachaLevelSpec {
                level: GachaLevel(11),
                bands: vec![
                    legend_band(low),
                    band(
                        "star",
                        d(1, 3),
                        &[("S4", d(80, 2)), ("S3", d(14, 2)), ("S2", d(6, 2))],
                    ),
                ],
            },
            GachaLevelSpec {
                level: GachaLevel(12),
                bands: vec![legend_band(low), star_band_full(d(1, 3))],
            },
            GachaLevelSpec {
                level: GachaLevel(13),
                bands: vec![legend_band(high), star_band_full(d(12, 4))],
            },
            GachaLevelSpec {
                level: GachaLevel(14),
                bands: vec![legend_band(high), star_band_full(d(16, 4))],
            },
        ];

        CatalogSpec {
            grades,
            levels,
            cost_per_draw: default_cost_per_draw(),
        }
    }
}
