//! Goal-seek result interpretation.
//!
//! The bisection solver is an external collaborator. This module only turns
//! its outcome into a verdict the UI or CLI can present: whether the current
//! inputs are viable, how far they sit from the threshold, and what a bound
//! hit means for the chosen variable.

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::model::{EvaluationInput, Lever, Variable};

/// Which end of the variable's search domain the solver ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundHit {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "lower")]
    Lower,
    #[serde(rename = "upper")]
    Upper,
}

impl BoundHit {
    #[must_use]
    pub fn is_hit(self) -> bool {
        self != BoundHit::None
    }
}

/// Raw solver output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSeekOutcome {
    pub target_variable: Variable,
    pub target_nsr: f64,
    /// Value of the variable at which NSR equals the target, or the bound
    /// that was hit
    pub threshold_value: f64,
    pub current_value: f64,
    pub current_nsr: f64,
    #[serde(default)]
    pub bound_hit: BoundHit,

    #[serde(default)]
    pub converged: bool,
    #[serde(default)]
    pub iterations: usize,
    /// |NSR(threshold) - target| when the solver stopped, $/t
    #[serde(default)]
    pub tolerance_achieved: f64,
}

/// Contract of the external bisection solver
pub trait GoalSeekSolver {
    fn solve(
        &self,
        base_input: &EvaluationInput,
        variable: Variable,
        target_nsr: f64,
    ) -> Result<GoalSeekOutcome, EvaluationError>;
}

/// Meaning of the threshold for the chosen variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// NSR crosses the target at this value
    Crossing { value: f64 },
    /// Target is met across the whole search domain
    AlwaysViable { bound: f64 },
    /// Target cannot be met anywhere in the search domain
    Unreachable { bound: f64 },
}

/// Whether the current value sits on the good side of the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Headroom {
    Favorable,
    Unfavorable,
    AtThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSeekInterpretation {
    pub variable: Variable,
    pub lever: Lever,
    pub unit: &'static str,
    pub threshold: Threshold,
    pub current_value: f64,
    pub is_currently_viable: bool,
    /// `(current - threshold) / threshold * 100`; absent on a bound hit or a
    /// zero threshold
    pub delta_percent: Option<f64>,
}

impl GoalSeekInterpretation {
    /// Direction-aware colouring: above the threshold is good for a revenue
    /// lever and bad for a cost lever.
    #[must_use]
    pub fn headroom(&self) -> Headroom {
        match self.delta_percent {
            None => {
                if self.is_currently_viable {
                    Headroom::Favorable
                } else {
                    Headroom::Unfavorable
                }
            }
            Some(delta) if delta == 0.0 => Headroom::AtThreshold,
            Some(delta) => {
                let above = delta > 0.0;
                match (self.lever, above) {
                    (Lever::Revenue, true) | (Lever::Cost, false) => Headroom::Favorable,
                    _ => Headroom::Unfavorable,
                }
            }
        }
    }

    /// Short human-readable verdict
    #[must_use]
    pub fn summary(&self) -> String {
        let label = self.variable.label();
        match self.threshold {
            Threshold::Crossing { value } => match self.delta_percent {
                Some(delta) => format!(
                    "{label} threshold {value:.4} {unit} ({delta:+.1}% from current)",
                    unit = self.unit
                ),
                None => format!("{label} threshold {value:.4} {}", self.unit),
            },
            Threshold::AlwaysViable { bound } => {
                let towards = match self.lever {
                    Lever::Revenue => "down to",
                    Lever::Cost => "up to",
                };
                format!("viable for every {label} {towards} {bound} {}", self.unit)
            }
            Threshold::Unreachable { bound } => {
                format!("target unreachable even at {label} = {bound} {}", self.unit)
            }
        }
    }
}

/// Interpret a solver outcome for display
#[must_use]
pub fn interpret(outcome: &GoalSeekOutcome) -> GoalSeekInterpretation {
    let variable = outcome.target_variable;
    let lever = variable.lever();
    let bound = outcome.threshold_value;

    let threshold = match (outcome.bound_hit, lever) {
        (BoundHit::None, _) => Threshold::Crossing { value: bound },
        (BoundHit::Lower, Lever::Revenue) | (BoundHit::Upper, Lever::Cost) => {
            Threshold::AlwaysViable { bound }
        }
        (BoundHit::Upper, Lever::Revenue) | (BoundHit::Lower, Lever::Cost) => {
            Threshold::Unreachable { bound }
        }
    };

    let delta_percent = if outcome.bound_hit.is_hit() || outcome.threshold_value == 0.0 {
        None
    } else {
        Some((outcome.current_value - outcome.threshold_value) / outcome.threshold_value * 100.0)
    };

    GoalSeekInterpretation {
        variable,
        lever,
        unit: variable.unit(),
        threshold,
        current_value: outcome.current_value,
        is_currently_viable: outcome.current_nsr >= outcome.target_nsr,
        delta_percent,
    }
}

/// True when NSR moved from below `target` to at or above it.
///
/// Without a previous reading nothing has been crossed.
#[must_use]
pub fn crossed_up(previous: Option<f64>, current: f64, target: f64) -> bool {
    previous.is_some_and(|prev| prev < target && current >= target)
}

/// Remembers the last NSR seen for one scenario and reports upward crossings
/// of its target, one per crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingWatch {
    pub target_nsr: f64,
    #[serde(default)]
    pub last_nsr: Option<f64>,
}

impl CrossingWatch {
    #[must_use]
    pub fn new(target_nsr: f64) -> Self {
        Self {
            target_nsr,
            last_nsr: None,
        }
    }

    /// Record a reading; true when it crossed the target upward
    pub fn observe(&mut self, current: f64) -> bool {
        let crossed = crossed_up(self.last_nsr, current, self.target_nsr);
        self.last_nsr = Some(current);
        if crossed {
            tracing::info!(target_nsr = self.target_nsr, current, "NSR crossed target");
        }
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_previous_reading_never_crosses() {
        assert!(!crossed_up(None, 80.0, 45.0));
    }

    #[test]
    fn test_staying_above_target_does_not_cross() {
        assert!(!crossed_up(Some(50.0), 60.0, 45.0));
        assert!(!crossed_up(Some(45.0), 46.0, 45.0));
    }

    #[test]
    fn test_upward_crossing() {
        assert!(crossed_up(Some(40.0), 45.0, 45.0));
        assert!(crossed_up(Some(-3.0), 70.0, 45.0));
        assert!(!crossed_up(Some(60.0), 40.0, 45.0));
    }

    #[test]
    fn test_watch_fires_once_per_crossing() {
        let mut watch = CrossingWatch::new(45.0);
        let fired: Vec<bool> = [40.0, 50.0, 55.0, 30.0, 46.0]
            .into_iter()
            .map(|nsr| watch.observe(nsr))
            .collect();
        assert_eq!(fired, vec![false, true, false, false, true]);
        assert_eq!(watch.last_nsr, Some(46.0));
    }

    fn outcome(variable: Variable, threshold: f64, current: f64, nsr: f64) -> GoalSeekOutcome {
        GoalSeekOutcome {
            target_variable: variable,
            target_nsr: 0.0,
            threshold_value: threshold,
            current_value: current,
            current_nsr: nsr,
            bound_hit: BoundHit::None,
            converged: true,
            iterations: 20,
            tolerance_achieved: 0.004,
        }
    }

    #[test]
    fn test_crossing_with_delta() {
        let result = interpret(&outcome(Variable::CuPrice, 3.0, 4.0, 120.0));
        assert_eq!(result.threshold, Threshold::Crossing { value: 3.0 });
        assert!(result.is_currently_viable);
        let delta = result.delta_percent.unwrap();
        assert!((delta - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.headroom(), Headroom::Favorable);
    }

    #[test]
    fn test_lower_bound_on_revenue_lever_is_always_viable() {
        let mut o = outcome(Variable::CuPrice, 0.01, 4.0, 250.0);
        o.bound_hit = BoundHit::Lower;
        let result = interpret(&o);

        assert_eq!(result.threshold, Threshold::AlwaysViable { bound: 0.01 });
        assert!(result.is_currently_viable);
        assert_eq!(result.delta_percent, None);
        assert_eq!(result.headroom(), Headroom::Favorable);
    }

    #[test]
    fn test_upper_bound_on_revenue_lever_is_unreachable() {
        let mut o = outcome(Variable::CuGrade, 20.0, 0.4, -30.0);
        o.bound_hit = BoundHit::Upper;
        let result = interpret(&o);
        assert_eq!(result.threshold, Threshold::Unreachable { bound: 20.0 });
        assert!(!result.is_currently_viable);
        assert_eq!(result.headroom(), Headroom::Unfavorable);
    }

    #[test]
    fn test_cost_lever_bounds_are_mirrored() {
        let mut o = outcome(Variable::CuTc, 1000.0, 40.0, 80.0);
        o.bound_hit = BoundHit::Upper;
        assert_eq!(
            interpret(&o).threshold,
            Threshold::AlwaysViable { bound: 1000.0 }
        );

        o.bound_hit = BoundHit::Lower;
        o.threshold_value = 0.0;
        assert_eq!(interpret(&o).threshold, Threshold::Unreachable { bound: 0.0 });
    }

    #[test]
    fn test_cost_lever_above_threshold_is_unfavorable() {
        let result = interpret(&outcome(Variable::CuFreight, 80.0, 100.0, -5.0));
        assert_eq!(result.headroom(), Headroom::Unfavorable);

        let result = interpret(&outcome(Variable::CuFreight, 120.0, 100.0, 5.0));
        assert_eq!(result.headroom(), Headroom::Favorable);
    }

    #[test]
    fn test_zero_threshold_has_no_delta() {
        let result = interpret(&outcome(Variable::CuPenalties, 0.0, 10.0, -1.0));
        assert_eq!(result.delta_percent, None);
    }

    #[test]
    fn test_bound_hit_wire_format() {
        let json = r#"{
            "target_variable": "cu_price",
            "target_nsr": 0.0,
            "threshold_value": 0.01,
            "current_value": 4.0,
            "current_nsr": 120.0,
            "bound_hit": "lower"
        }"#;
        let parsed: GoalSeekOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.bound_hit, BoundHit::Lower);

        let unset = json.replace(r#""lower""#, r#""""#);
        let parsed: GoalSeekOutcome = serde_json::from_str(&unset).unwrap();
        assert_eq!(parsed.bound_hit, BoundHit::None);
    }
}
