//! Explicit recomputation stages over a block population.
//!
//! A price or cutoff change does not ripple through anything on its own. The
//! caller runs [`Pipeline::recompute`] and then whichever of the read-only
//! stages it needs.

use std::time::Instant;

use jiff::civil::DateTime;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::classify::{Classification, classify};
use crate::config::EconomicConfig;
use crate::evaluate::NsrEvaluator;
use crate::model::{Block, EvaluationInput, SnapshotAggregate};
use crate::projection::{Heatmap, Viewport};
use crate::timeline::aggregate_blocks;

/// Outcome of one recomputation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecomputeReport {
    pub evaluated: usize,
    /// Blocks whose evaluation failed; they are left without an NSR
    pub failed: usize,
    pub cutoff: f64,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub config: EconomicConfig,
}

impl Pipeline {
    pub fn new(config: EconomicConfig) -> Self {
        Self { config }
    }

    /// Input for one block: grades and tonnage substituted into `template`,
    /// priced from the configured deck
    #[must_use]
    pub fn input_for(&self, block: &Block, template: &EvaluationInput) -> EvaluationInput {
        let mut input = template.with_prices(&self.config.prices.prices());
        input.cu_grade = block.cu_grade;
        input.au_grade = block.au_grade.unwrap_or(0.0);
        input.ag_grade = block.ag_grade.unwrap_or(0.0);
        if let Some(tonnage) = block.tonnage {
            input.ore_tonnage = tonnage;
        }
        input
    }

    /// Evaluate every block and replace the population in one step.
    ///
    /// The new population is built completely before `blocks` is touched, so
    /// a reader never sees a mix of old and new NSR values.
    pub fn recompute<E>(
        &self,
        blocks: &mut Vec<Block>,
        evaluator: &E,
        template: &EvaluationInput,
    ) -> RecomputeReport
    where
        E: NsrEvaluator + ?Sized,
    {
        let started = Instant::now();
        let cutoff = self.config.cutoff;

        let evaluate_block = |block: &Block| -> Block {
            let mut next = block.clone();
            match evaluator.nsr_per_tonne(&self.input_for(block, template)) {
                Ok(nsr) => next.assign_nsr(nsr, cutoff),
                Err(e) => {
                    tracing::debug!(block = %block.id, error = %e, "Block evaluation failed");
                    next.clear_nsr();
                }
            }
            next
        };

        #[cfg(feature = "parallel")]
        let next: Vec<Block> = blocks.par_iter().map(evaluate_block).collect();

        #[cfg(not(feature = "parallel"))]
        let next: Vec<Block> = blocks.iter().map(evaluate_block).collect();

        let failed = next.iter().filter(|b| !b.is_evaluated()).count();
        let evaluated = next.len() - failed;
        *blocks = next;

        let report = RecomputeReport {
            evaluated,
            failed,
            cutoff,
            elapsed_ms: started.elapsed().as_millis(),
        };
        tracing::info!(
            evaluated = report.evaluated,
            failed = report.failed,
            cutoff,
            elapsed_ms = report.elapsed_ms as u64,
            "Recomputed block population"
        );
        report
    }

    pub fn classify<'a>(&self, blocks: &'a [Block]) -> Classification<'a> {
        let started = Instant::now();
        let classification = classify(blocks, self.config.cutoff, &self.config.thresholds);
        tracing::debug!(
            blocks = blocks.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Classified population"
        );
        classification
    }

    pub fn aggregate_snapshot(&self, date: DateTime, blocks: &[Block]) -> SnapshotAggregate {
        aggregate_blocks(
            date,
            self.config.cutoff,
            self.config.prices.prices(),
            blocks,
            &self.config.thresholds,
        )
    }

    pub fn heatmap(&self, blocks: &[Block], z: f64, viewport: Viewport) -> Option<Heatmap> {
        let started = Instant::now();
        let heatmap = Heatmap::build(blocks, z, viewport, self.config.cutoff, &self.config.palette);
        tracing::debug!(
            z,
            cells = heatmap.as_ref().map_or(0, |h| h.cells.len()),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Projected level"
        );
        heatmap
    }
}
