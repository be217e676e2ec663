//! Command-line front end for the NSR viability library.
//!
//! Reads block models, snapshots and solver outputs from disk, runs them
//! through `nsr_core` and reports the result as JSON.

pub mod commands;
pub mod io;
mod logging;

pub use logging::{LogTarget, init_logging};
