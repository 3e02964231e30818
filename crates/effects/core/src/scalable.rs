//! Level-parameterized scalars and the curve tables they sample.

use std::collections::HashMap;

use crate::error::{EffectsError, ErrorSeverity};
use crate::name::Name;

/// Row of a curve table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveHandle {
    pub table: Name,
    pub row: Name,
}

impl CurveHandle {
    pub fn new(table: &str, row: &str) -> Self {
        Self {
            table: Name::new(table),
            row: Name::new(row),
        }
    }
}

/// Failure to sample a curve. Always an authoring mistake.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("curve table `{table}` does not exist")]
    MissingTable { table: Name },

    #[error("curve table `{table}` has no row `{row}`")]
    MissingRow { table: Name, row: Name },

    #[error("curve `{table}.{row}` has no keys")]
    EmptyCurve { table: Name, row: Name },

    #[error("curve `{table}.{row}` sampled without a valid level")]
    NoLevel { table: Name, row: Name },
}

impl EffectsError for CurveError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Content
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTable { .. } => "CURVE_MISSING_TABLE",
            Self::MissingRow { .. } => "CURVE_MISSING_ROW",
            Self::EmptyCurve { .. } => "CURVE_EMPTY",
            Self::NoLevel { .. } => "CURVE_NO_LEVEL",
        }
    }
}

/// Lookup interface for curve data.
pub trait CurveSource {
    fn sample(&self, handle: CurveHandle, level: f64) -> Result<f64, CurveError>;
}

/// A magnitude that is either a constant or a coefficient applied to a
/// curve sampled at the spec's level.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "ScalableRepr", into = "ScalableRepr")
)]
pub struct ScalableValue {
    pub value: f64,
    pub curve: Option<CurveHandle>,
}

impl ScalableValue {
    pub const fn constant(value: f64) -> Self {
        Self { value, curve: None }
    }

    /// `coefficient * table.row(level)`.
    pub fn curve(coefficient: f64, table: &str, row: &str) -> Self {
        Self {
            value: coefficient,
            curve: Some(CurveHandle::new(table, row)),
        }
    }

    pub fn is_static(&self) -> bool {
        self.curve.is_none()
    }

    /// Replaces the value and detaches any curve.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.curve = None;
    }

    /// Static values ignore `level` entirely.
    pub fn evaluate(&self, level: Option<f64>, curves: &dyn CurveSource) -> Result<f64, CurveError> {
        let Some(handle) = self.curve else {
            return Ok(self.value);
        };
        let level = level.ok_or(CurveError::NoLevel {
            table: handle.table,
            row: handle.row,
        })?;
        Ok(self.value * curves.sample(handle, level)?)
    }
}

impl Default for ScalableValue {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl From<f64> for ScalableValue {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum ScalableRepr {
    Constant(f64),
    Scaled { value: f64, curve: CurveHandle },
}

#[cfg(feature = "serde")]
impl From<ScalableRepr> for ScalableValue {
    fn from(repr: ScalableRepr) -> Self {
        match repr {
            ScalableRepr::Constant(value) => Self::constant(value),
            ScalableRepr::Scaled { value, curve } => Self {
                value,
                curve: Some(curve),
            },
        }
    }
}

#[cfg(feature = "serde")]
impl From<ScalableValue> for ScalableRepr {
    fn from(value: ScalableValue) -> Self {
        match value.curve {
            None => Self::Constant(value.value),
            Some(curve) => Self::Scaled {
                value: value.value,
                curve,
            },
        }
    }
}

// ============================================================================
// Curve data
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveKey {
    pub level: f64,
    pub value: f64,
}

/// Piecewise-linear curve, keys sorted by level.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")
)]
pub struct Curve {
    keys: Vec<CurveKey>,
}

impl Curve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.level.total_cmp(&b.level));
        Self { keys }
    }

    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(level, value)| CurveKey { level, value })
                .collect(),
        )
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Linear interpolation between neighbouring keys, clamped to the first
    /// and last key outside the authored range.
    pub fn eval(&self, level: f64) -> Option<f64> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if level <= first.level {
            return Some(first.value);
        }
        if level >= last.level {
            return Some(last.value);
        }
        let upper = self.keys.partition_point(|key| key.level <= level);
        let lo = self.keys[upper - 1];
        let hi = self.keys[upper];
        let span = hi.level - lo.level;
        if span <= 0.0 {
            return Some(hi.value);
        }
        let alpha = (level - lo.level) / span;
        Some(lo.value + (hi.value - lo.value) * alpha)
    }
}

impl From<Vec<CurveKey>> for Curve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<CurveKey> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

/// Named rows of curves.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CurveTable {
    rows: HashMap<Name, Curve>,
}

impl CurveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(mut self, row: &str, curve: Curve) -> Self {
        self.insert(row, curve);
        self
    }

    pub fn insert(&mut self, row: &str, curve: Curve) {
        self.rows.insert(Name::new(row), curve);
    }

    pub fn row(&self, row: Name) -> Option<&Curve> {
        self.rows.get(&row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (Name, &Curve)> {
        self.rows.iter().map(|(name, curve)| (*name, curve))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All curve tables known to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CurveRegistry {
    tables: HashMap<Name, CurveTable>,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: CurveTable) -> Self {
        self.insert(name, table);
        self
    }

    pub fn insert(&mut self, name: &str, table: CurveTable) {
        self.tables.insert(Name::new(name), table);
    }

    pub fn table(&self, name: Name) -> Option<&CurveTable> {
        self.tables.get(&name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (Name, &CurveTable)> {
        self.tables.iter().map(|(name, table)| (*name, table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl CurveSource for CurveRegistry {
    fn sample(&self, handle: CurveHandle, level: f64) -> Result<f64, CurveError> {
        let table = self.tables.get(&handle.table).ok_or(CurveError::MissingTable {
            table: handle.table,
        })?;
        let curve = table.row(handle.row).ok_or(CurveError::MissingRow {
            table: handle.table,
            row: handle.row,
        })?;
        curve.eval(level).ok_or(CurveError::EmptyCurve {
            table: handle.table,
            row: handle.row,
        })
    }
}
