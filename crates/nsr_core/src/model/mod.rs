//! Data model shared by every analysis stage

mod block;
pub mod defaults;
mod ids;
mod input;
mod prices;
mod results;
mod snapshot;

pub use block::Block;
pub use ids::BlockId;
pub use input::{EvaluationInput, Lever, UnknownVariable, Variable};
pub use prices::MetalPrices;
pub use results::EvaluationResult;
pub use snapshot::{RawSnapshot, SnapshotAggregate};
