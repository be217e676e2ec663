//! Block viability classification and per-snapshot totals.

use serde::{Deserialize, Serialize};

use crate::model::Block;

/// Coarse viability of an evaluated block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViabilityBucket {
    Viable,
    Marginal,
    Inviable,
}

impl ViabilityBucket {
    pub const ALL: [ViabilityBucket; 3] = [
        ViabilityBucket::Viable,
        ViabilityBucket::Marginal,
        ViabilityBucket::Inviable,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ViabilityBucket::Viable => "Viable",
            ViabilityBucket::Marginal => "Marginal",
            ViabilityBucket::Inviable => "Inviable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViabilityThresholds {
    /// Blocks at or below `cutoff * marginal_multiplier` are marginal
    pub marginal_multiplier: f64,
}

impl Default for ViabilityThresholds {
    fn default() -> Self {
        Self {
            marginal_multiplier: 1.1,
        }
    }
}

/// Bucket for an NSR against a cutoff.
///
/// `is_viable` is the externally computed flag; when absent it is derived as
/// `nsr >= cutoff`. Precedence: non-positive NSR, then a negative flag, then
/// the marginal band.
#[must_use]
pub fn bucket_for(
    nsr: f64,
    is_viable: Option<bool>,
    cutoff: f64,
    thresholds: &ViabilityThresholds,
) -> ViabilityBucket {
    let flagged_viable = is_viable.unwrap_or(nsr >= cutoff);
    if nsr <= 0.0 || !flagged_viable {
        ViabilityBucket::Inviable
    } else if nsr <= cutoff * thresholds.marginal_multiplier {
        ViabilityBucket::Marginal
    } else {
        ViabilityBucket::Viable
    }
}

/// Bucket for a block, `None` if it has not been evaluated
#[must_use]
pub fn classify_block(
    block: &Block,
    cutoff: f64,
    thresholds: &ViabilityThresholds,
) -> Option<ViabilityBucket> {
    block
        .nsr_per_tonne
        .map(|nsr| bucket_for(nsr, block.is_viable, cutoff, thresholds))
}

/// Totals for one classified population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub cutoff: f64,

    pub viable_count: usize,
    pub marginal_count: usize,
    pub inviable_count: usize,
    pub unevaluated_count: usize,

    pub viable_tonnage: f64,
    pub marginal_tonnage: f64,
    pub inviable_tonnage: f64,

    /// Unweighted arithmetic mean over evaluated blocks
    pub avg_nsr: f64,
    /// Mean weighted by tonnage; equals `avg_nsr` when no block has tonnage
    pub weighted_avg_nsr: f64,
    pub min_nsr: f64,
    pub max_nsr: f64,
}

impl ClassificationSummary {
    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.viable_count + self.marginal_count + self.inviable_count
    }

    #[must_use]
    pub fn total_tonnage(&self) -> f64 {
        self.viable_tonnage + self.marginal_tonnage + self.inviable_tonnage
    }

    #[must_use]
    pub fn count(&self, bucket: ViabilityBucket) -> usize {
        match bucket {
            ViabilityBucket::Viable => self.viable_count,
            ViabilityBucket::Marginal => self.marginal_count,
            ViabilityBucket::Inviable => self.inviable_count,
        }
    }

    #[must_use]
    pub fn tonnage(&self, bucket: ViabilityBucket) -> f64 {
        match bucket {
            ViabilityBucket::Viable => self.viable_tonnage,
            ViabilityBucket::Marginal => self.marginal_tonnage,
            ViabilityBucket::Inviable => self.inviable_tonnage,
        }
    }

    /// Share of evaluated tonnage in a bucket, 0 for an empty population
    #[must_use]
    pub fn tonnage_share(&self, bucket: ViabilityBucket) -> f64 {
        let total = self.total_tonnage();
        if total > 0.0 {
            self.tonnage(bucket) / total
        } else {
            0.0
        }
    }
}

/// Blocks partitioned by bucket, borrowing from the population
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub viable: Vec<&'a Block>,
    pub marginal: Vec<&'a Block>,
    pub inviable: Vec<&'a Block>,
    pub unevaluated: Vec<&'a Block>,
    pub summary: ClassificationSummary,
}

impl<'a> Classification<'a> {
    #[must_use]
    pub fn blocks(&self, bucket: ViabilityBucket) -> &[&'a Block] {
        match bucket {
            ViabilityBucket::Viable => &self.viable,
            ViabilityBucket::Marginal => &self.marginal,
            ViabilityBucket::Inviable => &self.inviable,
        }
    }
}

/// Partition a population into buckets and total it up
#[must_use]
pub fn classify<'a>(
    blocks: &'a [Block],
    cutoff: f64,
    thresholds: &ViabilityThresholds,
) -> Classification<'a> {
    let mut viable = Vec::new();
    let mut marginal = Vec::new();
    let mut inviable = Vec::new();
    let mut unevaluated = Vec::new();

    let mut nsr_sum = 0.0;
    let mut weighted_sum = 0.0;
    let mut weight = 0.0;
    let mut min_nsr = f64::INFINITY;
    let mut max_nsr = f64::NEG_INFINITY;

    for block in blocks {
        let Some(nsr) = block.nsr_per_tonne else {
            unevaluated.push(block);
            continue;
        };

        match bucket_for(nsr, block.is_viable, cutoff, thresholds) {
            ViabilityBucket::Viable => viable.push(block),
            ViabilityBucket::Marginal => marginal.push(block),
            ViabilityBucket::Inviable => inviable.push(block),
        }

        let tonnage = block.tonnage_or_zero();
        nsr_sum += nsr;
        weighted_sum += nsr * tonnage;
        weight += tonnage;
        min_nsr = min_nsr.min(nsr);
        max_nsr = max_nsr.max(nsr);
    }

    let evaluated = viable.len() + marginal.len() + inviable.len();
    let avg_nsr = if evaluated > 0 {
        nsr_sum / evaluated as f64
    } else {
        0.0
    };
    let weighted_avg_nsr = if weight > 0.0 {
        weighted_sum / weight
    } else {
        avg_nsr
    };
    if evaluated == 0 {
        min_nsr = 0.0;
        max_nsr = 0.0;
    }

    let tonnage = |group: &[&Block]| group.iter().map(|b| b.tonnage_or_zero()).sum::<f64>();

    let summary = ClassificationSummary {
        cutoff,
        viable_count: viable.len(),
        marginal_count: marginal.len(),
        inviable_count: inviable.len(),
        unevaluated_count: unevaluated.len(),
        viable_tonnage: tonnage(&viable),
        marginal_tonnage: tonnage(&marginal),
        inviable_tonnage: tonnage(&inviable),
        avg_nsr,
        weighted_avg_nsr,
        min_nsr,
        max_nsr,
    };

    Classification {
        viable,
        marginal,
        inviable,
        unevaluated,
        summary,
    }
}

/// Totals only, without the per-bucket block lists
#[must_use]
pub fn summarize(
    blocks: &[Block],
    cutoff: f64,
    thresholds: &ViabilityThresholds,
) -> ClassificationSummary {
    classify(blocks, cutoff, thresholds).summary
}

/// Reassign `is_viable` and `margin` for every evaluated block after a cutoff
/// change. Unevaluated blocks are left untouched.
pub fn recompute_viability(blocks: &mut [Block], cutoff: f64) {
    for block in blocks.iter_mut() {
        if let Some(nsr) = block.nsr_per_tonne {
            block.assign_nsr(nsr, cutoff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockId;

    const CUTOFF: f64 = 45.0;

    fn block(id: u32, nsr: Option<f64>, flag: Option<bool>) -> Block {
        let mut b = Block::new(BlockId(id), 0.0, 0.0, 0.0, 1.0).with_tonnage(100.0);
        b.nsr_per_tonne = nsr;
        b.is_viable = flag;
        b
    }

    #[test]
    fn test_precedence() {
        let t = ViabilityThresholds::default();
        // Non-positive NSR beats an externally viable flag
        assert_eq!(bucket_for(0.0, Some(true), CUTOFF, &t), ViabilityBucket::Inviable);
        assert_eq!(bucket_for(-3.0, None, CUTOFF, &t), ViabilityBucket::Inviable);
        // A negative flag beats a high NSR
        assert_eq!(bucket_for(200.0, Some(false), CUTOFF, &t), ViabilityBucket::Inviable);
        // Missing flag is derived from the cutoff
        assert_eq!(bucket_for(44.0, None, CUTOFF, &t), ViabilityBucket::Inviable);
        assert_eq!(bucket_for(45.0, None, CUTOFF, &t), ViabilityBucket::Marginal);
        assert_eq!(bucket_for(49.5, None, CUTOFF, &t), ViabilityBucket::Marginal);
        assert_eq!(bucket_for(49.6, None, CUTOFF, &t), ViabilityBucket::Viable);
        // An external flag can keep a sub-cutoff block in the marginal band
        assert_eq!(bucket_for(30.0, Some(true), CUTOFF, &t), ViabilityBucket::Marginal);
    }

    #[test]
    fn test_well_above_band_is_viable() {
        let t = ViabilityThresholds::default();
        for i in 0..100 {
            let nsr = 1.5 * CUTOFF + 0.01 + f64::from(i) * 3.7;
            assert_eq!(bucket_for(nsr, None, CUTOFF, &t), ViabilityBucket::Viable);
        }
    }

    #[test]
    fn test_unevaluated_blocks_are_excluded() {
        let blocks = vec![
            block(1, Some(100.0), None),
            block(2, None, None),
            block(3, Some(-10.0), None),
        ];
        let c = classify(&blocks, CUTOFF, &ViabilityThresholds::default());

        assert_eq!(c.unevaluated.len(), 1);
        assert_eq!(c.summary.unevaluated_count, 1);
        assert_eq!(c.summary.evaluated_count(), 2);
        assert_eq!(c.summary.total_tonnage(), 200.0);
        assert_eq!(c.summary.avg_nsr, 45.0);
        assert_eq!(c.summary.min_nsr, -10.0);
        assert_eq!(c.summary.max_nsr, 100.0);
    }

    #[test]
    fn test_weighted_average_differs_from_plain_mean() {
        let blocks = vec![
            block(1, Some(100.0), None).with_tonnage(300.0),
            block(2, Some(20.0), None).with_tonnage(100.0),
        ];
        let s = summarize(&blocks, CUTOFF, &ViabilityThresholds::default());
        assert_eq!(s.avg_nsr, 60.0);
        assert_eq!(s.weighted_avg_nsr, 80.0);
    }

    #[test]
    fn test_empty_population() {
        let s = summarize(&[], CUTOFF, &ViabilityThresholds::default());
        assert_eq!(s.evaluated_count(), 0);
        assert_eq!(s.avg_nsr, 0.0);
        assert_eq!(s.tonnage_share(ViabilityBucket::Viable), 0.0);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let blocks: Vec<Block> = (0..50)
            .map(|i| block(i, Some(f64::from(i) * 2.5 - 10.0), None))
            .collect();
        let t = ViabilityThresholds::default();
        assert_eq!(
            classify(&blocks, CUTOFF, &t).summary,
            classify(&blocks, CUTOFF, &t).summary
        );
    }

    #[test]
    fn test_recompute_viability_after_cutoff_change() {
        let mut blocks = vec![block(1, Some(50.0), None), block(2, None, None)];
        recompute_viability(&mut blocks, 45.0);
        assert_eq!(blocks[0].is_viable, Some(true));
        assert_eq!(blocks[0].margin, Some(5.0));

        recompute_viability(&mut blocks, 60.0);
        assert_eq!(blocks[0].is_viable, Some(false));
        assert_eq!(blocks[0].margin, Some(-10.0));
        assert_eq!(blocks[1].is_viable, None);

        let s = summarize(&blocks, 60.0, &ViabilityThresholds::default());
        assert_eq!(s.inviable_count, 1);
    }
}
