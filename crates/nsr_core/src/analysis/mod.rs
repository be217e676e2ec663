//! Sensitivity analysis: one-dimensional sweeps and break-even detection.
//!
//! ```ignore
//! use nsr_core::analysis::{SweepConfig, sweep};
//!
//! let config = SweepConfig::around(Variable::CuPrice, &input, 20.0, 9);
//! let outcome = sweep(&evaluator, &input, &config)?;
//!
//! match outcome.break_even() {
//!     BreakEven::Found { value, .. } => println!("break-even at {value}"),
//!     BreakEven::NotFoundInRange => println!("no break-even within ±20%"),
//! }
//! ```

mod break_even;
mod config;
mod evaluator;

pub use break_even::*;
pub use config::*;
pub use evaluator::*;
