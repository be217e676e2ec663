//! Scenario tests for the NSR analysis engine
//!
//! Tests are organized by topic:
//! - `sensitivity` - Sweeps and break-even detection end to end
//! - `viability` - Classification of full block populations
//! - `goal_seek` - Interpretation of solver outcomes
//! - `block_model` - Import, recompute, project and aggregate

mod block_model;
