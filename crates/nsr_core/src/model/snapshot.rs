//! Per-snapshot data for the viability timeline

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

use super::{Block, MetalPrices};

/// A recomputed block population at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub date: DateTime,
    /// Cutoff the population was evaluated against, $/t
    pub cutoff: f64,
    pub prices: MetalPrices,
    pub blocks: Vec<Block>,
}

/// Classification totals for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAggregate {
    pub date: DateTime,
    pub cutoff: f64,

    pub viable_tonnage: f64,
    pub marginal_tonnage: f64,
    pub inviable_tonnage: f64,

    pub viable_count: usize,
    pub marginal_count: usize,
    pub inviable_count: usize,
    /// Blocks without an NSR; excluded from every bucket
    pub unevaluated_count: usize,

    /// Unweighted mean NSR over evaluated blocks
    pub avg_nsr: f64,
    pub min_nsr: f64,
    pub max_nsr: f64,

    pub metal_prices: MetalPrices,
}

impl SnapshotAggregate {
    #[must_use]
    pub fn total_tonnage(&self) -> f64 {
        self.viable_tonnage + self.marginal_tonnage + self.inviable_tonnage
    }

    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.viable_count + self.marginal_count + self.inviable_count
    }
}
