//! NSR evaluation client seam.
//!
//! The NSR formula lives in an external service. Everything in this crate
//! talks to it through [`NsrEvaluator`], which is implemented for any
//! `Fn(&EvaluationInput) -> Result<EvaluationResult, EvaluationError>`.
//! A single evaluation either succeeds or fails; timeouts and retries are the
//! service's concern, never this crate's.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EvaluationError;
use crate::model::{EvaluationInput, EvaluationResult};

/// A pure function from inputs to an NSR breakdown.
///
/// Implementations must be side-effect free with respect to the caller:
/// evaluating the same input twice yields the same result. `Sync` is required
/// so sweeps can fan evaluations out across threads.
pub trait NsrEvaluator: Sync {
    fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError>;

    /// Convenience accessor for the final NSR per tonne
    fn nsr_per_tonne(&self, input: &EvaluationInput) -> Result<f64, EvaluationError> {
        self.evaluate(input).map(|result| result.nsr_per_tonne)
    }
}

impl<F> NsrEvaluator for F
where
    F: Fn(&EvaluationInput) -> Result<EvaluationResult, EvaluationError> + Sync,
{
    fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError> {
        self(input)
    }
}

/// Wraps an evaluator and counts calls and failures.
///
/// Counters are atomics so the wrapper can be shared across a parallel sweep.
#[derive(Debug)]
pub struct CountingEvaluator<E> {
    inner: E,
    calls: AtomicUsize,
    failures: AtomicUsize,
}

impl<E: NsrEvaluator> CountingEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Fraction of calls that failed, 0 when nothing was called
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let calls = self.calls();
        if calls == 0 {
            0.0
        } else {
            self.failures() as f64 / calls as f64
        }
    }
}

impl<E: NsrEvaluator> NsrEvaluator for CountingEvaluator<E> {
    fn evaluate(&self, input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.evaluate(input);
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

/// Build a result carrying only a final NSR; used by test doubles and
/// table-driven evaluators.
#[must_use]
pub fn result_with_nsr(nsr_per_tonne: f64) -> EvaluationResult {
    EvaluationResult {
        nsr_per_tonne,
        nsr_processing: nsr_per_tonne,
        nsr_mine: nsr_per_tonne,
        nsr_mineral_resources: nsr_per_tonne,
        nsr_cu: nsr_per_tonne,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variable;

    fn grade_linear(input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError> {
        if input.cu_grade < 0.0 {
            return Err(EvaluationError::InvalidInput {
                field: "cu_grade",
                reason: "negative".to_string(),
            });
        }
        Ok(result_with_nsr(input.cu_grade * 50.0))
    }

    #[test]
    fn test_closure_is_an_evaluator() {
        let input = EvaluationInput::new("Caraiba", "UG03", 2.0);
        assert_eq!(grade_linear.nsr_per_tonne(&input), Ok(100.0));
    }

    #[test]
    fn test_counting_evaluator_tracks_failures() {
        let counting = CountingEvaluator::new(grade_linear);
        let input = EvaluationInput::new("Caraiba", "UG03", 2.0);

        assert!(counting.evaluate(&input).is_ok());
        assert!(counting.evaluate(&input.with(Variable::CuGrade, -1.0)).is_err());

        assert_eq!(counting.calls(), 2);
        assert_eq!(counting.failures(), 1);
        assert!((counting.failure_rate() - 0.5).abs() < 1e-12);
    }
}
