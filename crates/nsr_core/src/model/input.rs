//! Evaluation inputs and the closed set of variables that can be swept or
//! goal-sought.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MetalPrices;
use super::defaults::*;

/// Economic parameters for one NSR evaluation.
///
/// Optional commercial terms and prices fall back to the default deck when
/// read through [`Variable::get`]; the external evaluator applies the same
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub mine: String,
    /// Recovery area within the mine
    pub area: String,

    /// Copper head grade (%)
    pub cu_grade: f64,
    /// Gold head grade (g/t)
    #[serde(default)]
    pub au_grade: f64,
    /// Silver head grade (g/t)
    #[serde(default)]
    pub ag_grade: f64,

    #[serde(default = "default_ore_tonnage")]
    pub ore_tonnage: f64,
    #[serde(default = "default_mine_dilution")]
    pub mine_dilution: f64,
    #[serde(default = "default_ore_recovery")]
    pub ore_recovery: f64,

    /// $/lb
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu_price: Option<f64>,
    /// $/oz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub au_price: Option<f64>,
    /// $/oz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ag_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu_tc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu_rc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu_freight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cu_penalties: Option<f64>,
}

fn default_ore_tonnage() -> f64 {
    DEFAULT_ORE_TONNAGE
}

fn default_mine_dilution() -> f64 {
    DEFAULT_MINE_DILUTION
}

fn default_ore_recovery() -> f64 {
    DEFAULT_ORE_RECOVERY
}

impl EvaluationInput {
    /// Create an input for a mine area with a copper grade and default terms
    pub fn new(mine: impl Into<String>, area: impl Into<String>, cu_grade: f64) -> Self {
        Self {
            mine: mine.into(),
            area: area.into(),
            cu_grade,
            au_grade: 0.0,
            ag_grade: 0.0,
            ore_tonnage: DEFAULT_ORE_TONNAGE,
            mine_dilution: DEFAULT_MINE_DILUTION,
            ore_recovery: DEFAULT_ORE_RECOVERY,
            cu_price: None,
            au_price: None,
            ag_price: None,
            cu_tc: None,
            cu_rc: None,
            cu_freight: None,
            cu_penalties: None,
        }
    }

    /// Return a copy with exactly one variable replaced
    #[must_use]
    pub fn with(&self, variable: Variable, value: f64) -> Self {
        let mut modified = self.clone();
        variable.set(&mut modified, value);
        modified
    }

    /// Return a copy priced with the given deck
    #[must_use]
    pub fn with_prices(&self, prices: &MetalPrices) -> Self {
        Self {
            cu_price: Some(prices.cu_price),
            au_price: Some(prices.au_price),
            ag_price: Some(prices.ag_price),
            ..self.clone()
        }
    }
}

/// Whether raising a variable raises or lowers NSR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lever {
    /// NSR increases with the variable (prices, grades)
    Revenue,
    /// NSR decreases with the variable (charges, dilution)
    Cost,
}

/// Variables that can be swept or solved for.
///
/// Each variant owns an accessor/mutator pair over [`EvaluationInput`], so an
/// unsupported variable cannot be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    CuPrice,
    AuPrice,
    AgPrice,
    CuGrade,
    AuGrade,
    AgGrade,
    CuTc,
    CuRc,
    CuFreight,
    CuPenalties,
    MineDilution,
}

impl Variable {
    pub const ALL: [Variable; 11] = [
        Variable::CuPrice,
        Variable::AuPrice,
        Variable::AgPrice,
        Variable::CuGrade,
        Variable::AuGrade,
        Variable::AgGrade,
        Variable::CuTc,
        Variable::CuRc,
        Variable::CuFreight,
        Variable::CuPenalties,
        Variable::MineDilution,
    ];

    /// Stable snake_case key, matching the serde representation
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Variable::CuPrice => "cu_price",
            Variable::AuPrice => "au_price",
            Variable::AgPrice => "ag_price",
            Variable::CuGrade => "cu_grade",
            Variable::AuGrade => "au_grade",
            Variable::AgGrade => "ag_grade",
            Variable::CuTc => "cu_tc",
            Variable::CuRc => "cu_rc",
            Variable::CuFreight => "cu_freight",
            Variable::CuPenalties => "cu_penalties",
            Variable::MineDilution => "mine_dilution",
        }
    }

    /// Human-readable label for chart axes
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Variable::CuPrice => "Cu Price",
            Variable::AuPrice => "Au Price",
            Variable::AgPrice => "Ag Price",
            Variable::CuGrade => "Cu Grade",
            Variable::AuGrade => "Au Grade",
            Variable::AgGrade => "Ag Grade",
            Variable::CuTc => "Treatment Charge",
            Variable::CuRc => "Cu Refining Charge",
            Variable::CuFreight => "Freight",
            Variable::CuPenalties => "Penalties",
            Variable::MineDilution => "Mine Dilution",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Variable::CuPrice | Variable::CuRc => "$/lb",
            Variable::AuPrice | Variable::AgPrice => "$/oz",
            Variable::CuGrade => "%",
            Variable::AuGrade | Variable::AgGrade => "g/t",
            Variable::CuTc | Variable::CuFreight | Variable::CuPenalties => "$/dmt",
            Variable::MineDilution => "decimal",
        }
    }

    #[must_use]
    pub fn lever(self) -> Lever {
        match self {
            Variable::CuPrice
            | Variable::AuPrice
            | Variable::AgPrice
            | Variable::CuGrade
            | Variable::AuGrade
            | Variable::AgGrade => Lever::Revenue,
            Variable::CuTc
            | Variable::CuRc
            | Variable::CuFreight
            | Variable::CuPenalties
            | Variable::MineDilution => Lever::Cost,
        }
    }

    /// Search domain used by the goal-seek solver, `(lower, upper)`
    #[must_use]
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Variable::CuPrice => (0.01, 50.0),
            Variable::AuPrice => (1.0, 50_000.0),
            Variable::AgPrice => (0.01, 5_000.0),
            Variable::CuGrade => (0.001, 20.0),
            Variable::AuGrade => (0.001, 100.0),
            Variable::AgGrade => (0.001, 500.0),
            Variable::CuTc => (0.0, 1_000.0),
            Variable::CuRc => (0.0, 50.0),
            Variable::CuFreight => (0.0, 500.0),
            Variable::CuPenalties => (0.0, 500.0),
            Variable::MineDilution => (0.0, 0.99),
        }
    }

    /// Read the value the evaluator will see, defaults resolved
    #[must_use]
    pub fn get(self, input: &EvaluationInput) -> f64 {
        match self {
            Variable::CuPrice => input.cu_price.unwrap_or(DEFAULT_CU_PRICE_PER_LB),
            Variable::AuPrice => input.au_price.unwrap_or(DEFAULT_AU_PRICE_PER_OZ),
            Variable::AgPrice => input.ag_price.unwrap_or(DEFAULT_AG_PRICE_PER_OZ),
            Variable::CuGrade => input.cu_grade,
            Variable::AuGrade => input.au_grade,
            Variable::AgGrade => input.ag_grade,
            Variable::CuTc => input.cu_tc.unwrap_or(DEFAULT_CU_TC),
            Variable::CuRc => input.cu_rc.unwrap_or(DEFAULT_CU_RC),
            Variable::CuFreight => input.cu_freight.unwrap_or(DEFAULT_CU_FREIGHT),
            Variable::CuPenalties => input.cu_penalties.unwrap_or(DEFAULT_CU_PENALTIES),
            Variable::MineDilution => input.mine_dilution,
        }
    }

    pub fn set(self, input: &mut EvaluationInput, value: f64) {
        match self {
            Variable::CuPrice => input.cu_price = Some(value),
            Variable::AuPrice => input.au_price = Some(value),
            Variable::AgPrice => input.ag_price = Some(value),
            Variable::CuGrade => input.cu_grade = value,
            Variable::AuGrade => input.au_grade = value,
            Variable::AgGrade => input.ag_grade = value,
            Variable::CuTc => input.cu_tc = Some(value),
            Variable::CuRc => input.cu_rc = Some(value),
            Variable::CuFreight => input.cu_freight = Some(value),
            Variable::CuPenalties => input.cu_penalties = Some(value),
            Variable::MineDilution => input.mine_dilution = value,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when parsing an unsupported variable key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported variable '{0}'")]
pub struct UnknownVariable(pub String);

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Variable::ALL
            .into_iter()
            .find(|v| v.key() == key)
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}
