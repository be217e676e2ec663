//! Configuration types for sensitivity sweeps.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::model::{EvaluationInput, Variable};

/// One-dimensional sweep of a single variable around its base value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Variable to perturb
    pub variable: Variable,
    /// Value the percentage offsets are relative to
    pub base_value: f64,
    /// Half-width of the sweep in percent; offsets span `[-range, +range]`
    pub range_percent: f64,
    /// Number of points, both endpoints included
    pub point_count: usize,
}

impl SweepConfig {
    pub fn new(variable: Variable, base_value: f64, range_percent: f64, point_count: usize) -> Self {
        Self {
            variable,
            base_value,
            range_percent,
            point_count,
        }
    }

    /// Sweep a variable around the value it currently has in `input`
    pub fn around(
        variable: Variable,
        input: &EvaluationInput,
        range_percent: f64,
        point_count: usize,
    ) -> Self {
        Self::new(variable, variable.get(input), range_percent, point_count)
    }

    /// Reject configurations whose offsets or break-even would be undefined
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.point_count < 2 {
            return Err(SweepError::InvalidConfig(format!(
                "point count must be at least 2, got {}",
                self.point_count
            )));
        }
        if !self.range_percent.is_finite() || self.range_percent <= 0.0 {
            return Err(SweepError::InvalidConfig(format!(
                "range percent must be finite and positive, got {}",
                self.range_percent
            )));
        }
        if !self.base_value.is_finite() {
            return Err(SweepError::InvalidConfig(format!(
                "base value must be finite, got {}",
                self.base_value
            )));
        }
        if self.base_value == 0.0 {
            return Err(SweepError::ZeroBaseValue(self.variable));
        }
        Ok(())
    }

    /// Percentage offsets, evenly spaced and inclusive of both ends.
    ///
    /// Endpoints are assigned directly so they equal `-range` and `+range`
    /// exactly instead of accumulating rounding error.
    #[must_use]
    pub fn offsets(&self) -> Vec<f64> {
        match self.point_count {
            0 => Vec::new(),
            1 => vec![0.0],
            n => {
                let range = self.range_percent;
                let step = 2.0 * range / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        if i == 0 {
                            -range
                        } else if i == n - 1 {
                            range
                        } else {
                            -range + step * i as f64
                        }
                    })
                    .collect()
            }
        }
    }

    /// Value of the variable at an offset, floored at zero
    #[must_use]
    pub fn value_at(&self, offset_percent: f64) -> f64 {
        (self.base_value * (1.0 + offset_percent / 100.0)).max(0.0)
    }

    /// Chart label for a sample at an offset
    #[must_use]
    pub fn label_for(&self, offset_percent: f64) -> String {
        if offset_percent == 0.0 {
            "Base".to_string()
        } else {
            format!("{offset_percent:+.0}%")
        }
    }
}
