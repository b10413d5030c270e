//! Validated catalog: grades in conversion order plus draw-rate tables.

use crate::config::{BandSpec, CatalogSpec, GachaLevelSpec};
use crate::{ConversionRule, GachaLevel, Grade, GradeId, YieldVector, MAX_GRADES};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors. Any of these refuses to build a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog has no grades")]
    Empty,
    #[error("catalog has {0} grades, more than an id can address")]
    TooManyGrades(usize),
    #[error("grade code must not be empty")]
    EmptyCode,
    #[error("duplicate grade code: {0}")]
    DuplicateGrade(String),
    #[error("grade {0} must have a positive equivalence")]
    NonPositiveEquivalence(String),
    #[error("grade {0} has a conversion count of zero")]
    ZeroConversionCount(String),
    #[error("unknown grade referenced: {0}")]
    UnknownGrade(String),
    #[error("grade {0} is the output of more than one conversion rule")]
    Branching(String),
    #[error("conversion rules form a cycle through {0}")]
    Cycle(String),
    #[error("grade {0} is not on the conversion chain")]
    Disconnected(String),
    #[error("expected exactly one terminal grade, found {0}")]
    TerminalCount(usize),
    #[error("{output} should be worth {expected} base units as the product of {grade}, found {actual}")]
    EquivalenceMismatch {
        grade: String,
        output: String,
        expected: Decimal,
        actual: Decimal,
    },
    #[error("equivalence of {count} x {grade} overflows")]
    EquivalenceOverflow { grade: String, count: u32 },
    #[error("no reference grade with equivalence 1")]
    MissingReference,
    #[error("duplicate gacha level: {0}")]
    DuplicateLevel(u8),
    #[error("band {band} of level {level} has a rate outside [0,1]")]
    InvalidRate { level: u8, band: String },
    #[error("band {band} of level {level} has a share outside [0,1] for {grade}")]
    InvalidShare {
        level: u8,
        band: String,
        grade: String,
    },
    #[error("band {band} of level {level} has shares summing to {sum}, expected 1")]
    SharesNotNormalized { level: u8, band: String, sum: Decimal },
    #[error("level {level} band rates sum to {total}, above 1")]
    LevelOverflow { level: u8, total: Decimal },
    #[error("level {0} covers every grade; drawable grades must be a strict subset")]
    FullCoverage(u8),
    #[error("cost per draw must be non-negative")]
    NegativeCost,
    #[error("yaml error: {0}")]
    Yaml(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Yaml(e.to_string())
    }
}

/// Tolerance for band shares summing to one.
fn share_tolerance() -> Decimal {
    Decimal::new(1, 9)
}

/// A validated band of one rate table.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub name: String,
    /// Outer draw probability of the band.
    pub rate: Decimal,
    /// Share of each grade within the band, summing to 1.
    pub shares: Vec<(GradeId, Decimal)>,
}

/// Validated draw-rate table of one gacha level.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    pub level: GachaLevel,
    pub bands: Vec<Band>,
}

/// Immutable grade registry and draw-rate tables.
#[derive(Clone, Debug)]
pub struct Catalog {
    grades: Vec<Grade>,
    by_code: BTreeMap<String, GradeId>,
    reference: GradeId,
    tables: BTreeMap<GachaLevel, RateTable>,
    cost_per_draw: Decimal,
}

impl Catalog {
    /// Build the standard economy.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_spec(&CatalogSpec::standard())
    }

    /// Parse a YAML catalog document and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let spec: CatalogSpec = serde_yaml::from_str(text)?;
        Self::from_spec(&spec)
    }

    /// Read, parse and validate a YAML catalog file.
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path.as_ref())?;
        info!(path = %path.as_ref().display(), "loading catalog");
        Self::from_yaml_str(&text)
    }

    /// Validate a raw configuration and derive the conversion order.
    pub fn from_spec(spec: &CatalogSpec) -> Result<Self, CatalogError> {
        let order = conversion_order(spec)?;

        // Re-key codes by their position in the conversion order.
        let mut by_code = BTreeMap::new();
        for (pos, &spec_idx) in order.iter().enumerate() {
            by_code.insert(spec.grades[spec_idx].code.clone(), GradeId::from_index(pos));
        }

        let mut grades = Vec::with_capacity(order.len());
        for (pos, &spec_idx) in order.iter().enumerate() {
            let g = &spec.grades[spec_idx];
            let rule = g.rule.as_ref().map(|r| ConversionRule {
                count: r.count,
                output: by_code[&r.output],
            });
            grades.push(Grade {
                id: GradeId::from_index(pos),
                code: g.code.clone(),
                tier: g.tier,
                level: g.level,
                equivalence: g.equivalence,
                rule,
            });
        }

        for g in &grades {
            if let Some(rule) = g.rule {
                let out = &grades[rule.output.index()];
                let expected = g
                    .equivalence
                    .checked_mul(Decimal::from(rule.count))
                    .ok_or_else(|| CatalogError::EquivalenceOverflow {
                        grade: g.code.clone(),
                        count: rule.count,
                    })?;
                if out.equivalence != expected {
                    return Err(CatalogError::EquivalenceMismatch {
                        grade: g.code.clone(),
                        output: out.code.clone(),
                        expected,
                        actual: out.equivalence,
                    });
                }
            }
        }

        let reference = grades
            .iter()
            .find(|g| g.equivalence == Decimal::ONE)
            .map(|g| g.id)
            .ok_or(CatalogError::MissingReference)?;

        if spec.cost_per_draw < Decimal::ZERO {
            return Err(CatalogError::NegativeCost);
        }

        let mut tables = BTreeMap::new();
        for level in &spec.levels {
            let table = build_rate_table(level, &by_code, grades.len())?;
            if tables.insert(level.level, table).is_some() {
                return Err(CatalogError::DuplicateLevel(level.level.0));
            }
        }

        info!(
            grades = grades.len(),
            levels = tables.len(),
            reference = %grades[reference.index()].code,
            "catalog built"
        );

        Ok(Catalog {
            grades,
            by_code,
            reference,
            tables,
            cost_per_draw: spec.cost_per_draw,
        })
    }

    /// All grades in conversion order, terminal last.
    pub fn grades(&self) -> &[Grade] {
        &self.grades
    }

    /// Non-terminal grades, lowest to highest.
    pub fn conversion_order(&self) -> &[Grade] {
        &self.grades[..self.grades.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.get(id.index())
    }

    /// Look up a grade id by code.
    pub fn id(&self, code: &str) -> Option<GradeId> {
        self.by_code.get(code).copied()
    }

    /// Look up a grade by code.
    pub fn by_code(&self, code: &str) -> Option<&Grade> {
        self.id(code).and_then(|id| self.grade(id))
    }

    /// The grade worth exactly one base unit.
    pub fn reference(&self) -> &Grade {
        &self.grades[self.reference.index()]
    }

    /// The grade at the end of the chain.
    pub fn terminal(&self) -> &Grade {
        &self.grades[self.grades.len() - 1]
    }

    /// Grades worth at least one base unit; the sensible goals for planning.
    pub fn goal_targets(&self) -> impl Iterator<Item = &Grade> {
        self.grades.iter().filter(|g| g.equivalence >= Decimal::ONE)
    }

    pub fn rate_table(&self, level: GachaLevel) -> Option<&RateTable> {
        self.tables.get(&level)
    }

    /// Configured gacha levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = GachaLevel> + '_ {
        self.tables.keys().copied()
    }

    pub fn cost_per_draw(&self) -> Decimal {
        self.cost_per_draw
    }

    /// Total base-unit value of a quantity vector, `None` if it overflows.
    /// Unknown ids contribute nothing.
    pub fn base_value(&self, quantities: &YieldVector) -> Option<Decimal> {
        quantities
            .iter()
            .filter_map(|(id, q)| self.grade(id).map(|g| (g.equivalence, q)))
            .try_fold(Decimal::ZERO, |acc, (eq, q)| acc.checked_add(eq.checked_mul(q)?))
    }
}

/// Check the per-grade fields and the rule graph, returning indices into `spec.grades`
/// ordered along the single conversion path.
fn conversion_order(spec: &CatalogSpec) -> Result<Vec<usize>, CatalogError> {
    if spec.grades.is_empty() {
        return Err(CatalogError::Empty);
    }
    if spec.grades.len() > MAX_GRADES {
        return Err(CatalogError::TooManyGrades(spec.grades.len()));
    }

    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, g) in spec.grades.iter().enumerate() {
        if g.code.trim().is_empty() {
            return Err(CatalogError::EmptyCode);
        }
        if index.insert(g.code.as_str(), i).is_some() {
            return Err(CatalogError::DuplicateGrade(g.code.clone()));
        }
    }

    let mut next: Vec<Option<usize>> = vec![None; spec.grades.len()];
    let mut incoming = vec![0usize; spec.grades.len()];
    for (i, g) in spec.grades.iter().enumerate() {
        if g.equivalence <= Decimal::ZERO {
            return Err(CatalogError::NonPositiveEquivalence(g.code.clone()));
        }
        if let Some(rule) = &g.rule {
            if rule.count == 0 {
                return Err(CatalogError::ZeroConversionCount(g.code.clone()));
            }
            let out = *index
                .get(rule.output.as_str())
                .ok_or_else(|| CatalogError::UnknownGrade(rule.output.clone()))?;
            if out == i {
                return Err(CatalogError::Cycle(g.code.clone()));
            }
            incoming[out] += 1;
            if incoming[out] > 1 {
                return Err(CatalogError::Branching(rule.output.clone()));
            }
            next[i] = Some(out);
        }
    }

    let terminals = next.iter().filter(|n| n.is_none()).count();
    if terminals != 1 {
        return Err(CatalogError::TerminalCount(terminals));
    }

    let starts: Vec<usize> = (0..spec.grades.len()).filter(|&i| incoming[i] == 0).collect();
    let start = match starts.as_slice() {
        [] => return Err(CatalogError::Cycle(spec.grades[0].code.clone())),
        [s] => *s,
        [_, extra, ..] => return Err(CatalogError::Disconnected(spec.grades[*extra].code.clone())),
    };

    let mut order = Vec::with_capacity(spec.grades.len());
    let mut seen = vec![false; spec.grades.len()];
    let mut cur = Some(start);
    while let Some(i) = cur {
        if seen[i] {
            return Err(CatalogError::Cycle(spec.grades[i].code.clone()));
        }
        seen[i] = true;
        order.push(i);
        cur = next[i];
    }

    // Grades off the path have one rule in and one rule out, so they sit on a cycle.
    if let Some(i) = seen.iter().position(|s| !s) {
        return Err(CatalogError::Cycle(spec.grades[i].code.clone()));
    }
    Ok(order)
}

fn build_rate_table(
    spec: &GachaLevelSpec,
    by_code: &BTreeMap<String, GradeId>,
    grade_count: usize,
) -> Result<RateTable, CatalogError> {
    let level = spec.level.0;
    let mut covered: BTreeSet<GradeId> = BTreeSet::new();
    let mut total = Decimal::ZERO;
    let mut bands = Vec::with_capacity(spec.bands.len());

    for b in &spec.bands {
        let band = build_band(level, b, by_code)?;
        covered.extend(band.shares.iter().map(|(id, _)| *id));
        total += band.rate;
        bands.push(band);
    }

    if total > Decimal::ONE {
        return Err(CatalogError::LevelOverflow { level, total });
    }
    if covered.len() >= grade_count {
        return Err(CatalogError::FullCoverage(level));
    }
    Ok(RateTable {
        level: spec.level,
        bands,
    })
}

fn build_band(
    level: u8,
    spec: &BandSpec,
    by_code: &BTreeMap<String, GradeId>,
) -> Result<Band, CatalogError> {
    if spec.rate < Decimal::ZERO || spec.rate > Decimal::ONE {
        return Err(CatalogError::InvalidRate {
            level,
            band: spec.name.clone(),
        });
    }

    let mut shares = Vec::with_capacity(spec.shares.len());
    let mut sum = Decimal::ZERO;
    for (code, &share) in &spec.shares {
        let id = *by_code
            .get(code)
            .ok_or_else(|| CatalogError::UnknownGrade(code.clone()))?;
        if share < Decimal::ZERO || share > Decimal::ONE {
            return Err(CatalogError::InvalidShare {
                level,
                band: spec.name.clone(),
                grade: code.clone(),
            });
        }
        sum += share;
        shares.push((id, share));
    }

    if (sum - Decimal::ONE).abs() > share_tolerance() {
        return Err(CatalogError::SharesNotNormalized {
            level,
            band: spec.name.clone(),
            sum,
        });
    }
    shares.sort_by_key(|(id, _)| *id);
    Ok(Band {
        name: spec.name.clone(),
        rate: spec.rate,
        shares,
    })
}
