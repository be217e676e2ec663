//! Break-even detection over a swept sample sequence.

use serde::{Deserialize, Serialize};

use super::SensitivitySample;

/// Where the NSR curve crosses a target within the swept range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BreakEven {
    /// Linear interpolation between two adjacent samples
    Found {
        /// Interpolated value of the swept variable
        value: f64,
        /// Interpolated offset from the base value, in percent
        offset_percent: f64,
        /// Input values of the bracketing samples
        lower: f64,
        upper: f64,
    },
    /// No sign change in range; the variable would need to move further
    /// than tested
    NotFoundInRange,
}

impl BreakEven {
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            BreakEven::Found { value, .. } => Some(*value),
            BreakEven::NotFoundInRange => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, BreakEven::Found { .. })
    }
}

/// Zero crossing of NSR; see [`find_crossing`]
#[must_use]
pub fn find_break_even(samples: &[SensitivitySample]) -> BreakEven {
    find_crossing(samples, 0.0)
}

/// First crossing of `target` scanning adjacent pairs in sweep order.
///
/// A pair qualifies when `nsr - target` changes sign or either side is exactly
/// on target. Pairs with a non-finite side are passed over. Samples must
/// already be ordered by `input_value`.
#[must_use]
pub fn find_crossing(samples: &[SensitivitySample], target: f64) -> BreakEven {
    for pair in samples.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let prev_f = prev.nsr - target;
        let curr_f = curr.nsr - target;
        if !prev_f.is_finite() || !curr_f.is_finite() {
            continue;
        }

        if prev_f == 0.0 {
            return found_at(prev, prev, curr);
        }
        if curr_f == 0.0 {
            return found_at(curr, prev, curr);
        }
        if prev_f.signum() != curr_f.signum() {
            // Opposite signs guarantee a non-zero denominator
            let fraction = -prev_f / (curr_f - prev_f);
            let value = prev.input_value + fraction * (curr.input_value - prev.input_value);
            let offset_percent =
                prev.offset_percent + fraction * (curr.offset_percent - prev.offset_percent);
            return BreakEven::Found {
                value,
                offset_percent,
                lower: prev.input_value,
                upper: curr.input_value,
            };
        }
    }
    BreakEven::NotFoundInRange
}

fn found_at(at: &SensitivitySample, prev: &SensitivitySample, curr: &SensitivitySample) -> BreakEven {
    BreakEven::Found {
        value: at.input_value,
        offset_percent: at.offset_percent,
        lower: prev.input_value,
        upper: curr.input_value,
    }
}
