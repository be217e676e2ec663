//! Sweep evaluator: runs the NSR evaluator at each offset of a sweep.
//!
//! Points are independent, so with the `parallel` feature they are fanned out
//! over rayon. Completion order does not matter; samples are sorted by input
//! value before they are returned.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::evaluate::NsrEvaluator;
use crate::model::EvaluationInput;

use super::{BreakEven, SweepConfig, find_break_even, find_crossing};

/// Progress tracking for a running sweep
#[derive(Debug, Clone)]
pub struct SweepProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl SweepProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of completed points
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get the total number of points
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Increment the completed count
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset progress for a new sweep
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

/// One evaluated point of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySample {
    /// Value of the swept variable at this point
    pub input_value: f64,
    /// Offset from the base value, in percent
    pub offset_percent: f64,
    /// NSR per tonne returned by the evaluator
    pub nsr: f64,
    /// Chart label, `"Base"` at zero offset
    #[serde(default)]
    pub label: String,
}

/// Samples from a completed sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub config: SweepConfig,
    /// Successful points, ascending by `input_value`
    pub samples: Vec<SensitivitySample>,
    /// Points whose evaluation failed and were left out
    pub skipped: usize,
}

impl SweepOutcome {
    #[must_use]
    pub fn requested(&self) -> usize {
        self.config.point_count
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }

    /// Where NSR crosses zero within the swept range
    #[must_use]
    pub fn break_even(&self) -> BreakEven {
        find_break_even(&self.samples)
    }

    /// Where NSR crosses `target` within the swept range
    #[must_use]
    pub fn crossing(&self, target: f64) -> BreakEven {
        find_crossing(&self.samples, target)
    }
}

/// Sweep one variable of `base_input` and collect the successful samples
pub fn sweep<E>(
    evaluator: &E,
    base_input: &EvaluationInput,
    config: &SweepConfig,
) -> Result<SweepOutcome, SweepError>
where
    E: NsrEvaluator + ?Sized,
{
    sweep_with_progress(evaluator, base_input, config, None)
}

/// Same as [`sweep`], reporting progress and honouring cancellation.
///
/// A cancelled sweep discards whatever it had computed.
pub fn sweep_with_progress<E>(
    evaluator: &E,
    base_input: &EvaluationInput,
    config: &SweepConfig,
    progress: Option<&SweepProgress>,
) -> Result<SweepOutcome, SweepError>
where
    E: NsrEvaluator + ?Sized,
{
    config.validate()?;

    let offsets = config.offsets();
    if let Some(p) = progress {
        p.reset(offsets.len());
    }

    let evaluate_point = |offset: f64| -> Option<SensitivitySample> {
        if progress.is_some_and(SweepProgress::is_cancelled) {
            return None;
        }
        let input_value = config.value_at(offset);
        let input = base_input.with(config.variable, input_value);
        let result = evaluator.nsr_per_tonne(&input);
        if let Some(p) = progress {
            p.increment();
        }
        match result {
            Ok(nsr) if !nsr.is_finite() => {
                tracing::debug!(
                    variable = %config.variable,
                    input_value,
                    nsr,
                    "Skipping sweep point with non-finite NSR"
                );
                None
            }
            Ok(nsr) => Some(SensitivitySample {
                input_value,
                offset_percent: offset,
                nsr,
                label: config.label_for(offset),
            }),
            Err(e) => {
                tracing::debug!(
                    variable = %config.variable,
                    input_value,
                    error = %e,
                    "Skipping sweep point"
                );
                None
            }
        }
    };

    #[cfg(feature = "parallel")]
    let points: Vec<Option<SensitivitySample>> =
        offsets.par_iter().map(|&offset| evaluate_point(offset)).collect();

    #[cfg(not(feature = "parallel"))]
    let points: Vec<Option<SensitivitySample>> =
        offsets.iter().map(|&offset| evaluate_point(offset)).collect();

    if progress.is_some_and(SweepProgress::is_cancelled) {
        return Err(SweepError::Cancelled);
    }

    let requested = points.len();
    let mut samples: Vec<SensitivitySample> = points.into_iter().flatten().collect();
    samples.sort_by(|a, b| a.input_value.total_cmp(&b.input_value));
    let skipped = requested - samples.len();

    if skipped > 0 {
        tracing::debug!(
            variable = %config.variable,
            skipped,
            requested,
            "Sweep finished with skipped points"
        );
    }

    Ok(SweepOutcome {
        config: config.clone(),
        samples,
        skipped,
    })
}
