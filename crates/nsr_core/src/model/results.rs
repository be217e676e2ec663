//! Evaluation results returned by the external NSR service

use serde::{Deserialize, Serialize};

/// NSR breakdown for one evaluation.
///
/// Treated as an opaque value object: produced by the evaluator, read by the
/// analysis stages, never modified. All values are $/t ore unless noted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub nsr_cu: f64,
    pub nsr_au: f64,
    pub nsr_ag: f64,

    /// Before mine factors, recovery and selling costs
    pub nsr_mineral_resources: f64,
    /// After mine factors
    pub nsr_mine: f64,
    /// After metallurgical recovery, before selling costs
    pub nsr_processing: f64,
    /// Final NSR per tonne of ore
    pub nsr_per_tonne: f64,

    #[serde(default)]
    pub dilution_loss: f64,
    #[serde(default)]
    pub recovery_loss: f64,

    /// Tonnes of concentrate per tonne of ore
    #[serde(default)]
    pub conc_ratio: f64,
    #[serde(default)]
    pub cu_recovery: f64,
    #[serde(default)]
    pub au_recovery: f64,
    #[serde(default)]
    pub ag_recovery: f64,

    /// Revenue for the evaluated tonnage ($)
    #[serde(default)]
    pub revenue_total: f64,
}
