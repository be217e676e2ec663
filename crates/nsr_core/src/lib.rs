//! NSR economic viability analysis library
//!
//! Turns NSR evaluations from an external calculator into decisions about a
//! mine's block model:
//! - Sensitivity sweeps of one economic variable with break-even detection
//! - Interpretation of goal-seek outcomes, including bound hits
//! - Viability classification of blocks against a cutoff cost
//! - Plan-view projection of one level for heat-map rendering
//! - Per-snapshot aggregation into a viability timeline
//!
//! The NSR formula itself is not implemented here; every evaluation goes
//! through [`evaluate::NsrEvaluator`].
//!
//! ```ignore
//! use nsr_core::{EconomicConfig, Pipeline};
//!
//! let pipeline = Pipeline::new(EconomicConfig::default());
//! pipeline.recompute(&mut blocks, &evaluator, &template);
//!
//! let classification = pipeline.classify(&blocks);
//! println!("{} viable blocks", classification.summary.viable_count);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod classify;
pub mod error;
pub mod evaluate;
pub mod goal_seek;
pub mod mapping;
pub mod pipeline;
pub mod projection;
pub mod timeline;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{EconomicConfig, PriceDeck};
pub use pipeline::Pipeline;
