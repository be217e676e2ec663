//! Viability over time: one aggregate per recomputed snapshot.

use jiff::civil::DateTime;

use crate::classify::{ViabilityThresholds, summarize};
use crate::goal_seek::CrossingWatch;
use crate::model::{Block, MetalPrices, RawSnapshot, SnapshotAggregate};

/// Aggregate each snapshot in the order given.
///
/// The caller owns ordering; out-of-order input is reported but never
/// re-sorted.
#[must_use]
pub fn aggregate(
    snapshots: &[RawSnapshot],
    thresholds: &ViabilityThresholds,
) -> Vec<SnapshotAggregate> {
    let aggregates: Vec<SnapshotAggregate> = snapshots
        .iter()
        .map(|snapshot| aggregate_one(snapshot, thresholds))
        .collect();

    if !is_chronological(&aggregates) {
        tracing::warn!(
            snapshots = aggregates.len(),
            "Timeline snapshots are not in chronological order"
        );
    }

    aggregates
}

/// Aggregate for a single snapshot
#[must_use]
pub fn aggregate_one(snapshot: &RawSnapshot, thresholds: &ViabilityThresholds) -> SnapshotAggregate {
    aggregate_blocks(
        snapshot.date,
        snapshot.cutoff,
        snapshot.prices,
        &snapshot.blocks,
        thresholds,
    )
}

/// Aggregate a borrowed population without building a [`RawSnapshot`]
#[must_use]
pub fn aggregate_blocks(
    date: DateTime,
    cutoff: f64,
    prices: MetalPrices,
    blocks: &[Block],
    thresholds: &ViabilityThresholds,
) -> SnapshotAggregate {
    let summary = summarize(blocks, cutoff, thresholds);
    SnapshotAggregate {
        date,
        cutoff,
        viable_tonnage: summary.viable_tonnage,
        marginal_tonnage: summary.marginal_tonnage,
        inviable_tonnage: summary.inviable_tonnage,
        viable_count: summary.viable_count,
        marginal_count: summary.marginal_count,
        inviable_count: summary.inviable_count,
        unevaluated_count: summary.unevaluated_count,
        avg_nsr: summary.avg_nsr,
        min_nsr: summary.min_nsr,
        max_nsr: summary.max_nsr,
        metal_prices: prices,
    }
}

/// True when dates never decrease
#[must_use]
pub fn is_chronological(aggregates: &[SnapshotAggregate]) -> bool {
    aggregates.windows(2).all(|w| w[0].date <= w[1].date)
}

/// Dates at which the average NSR rose from below `target_nsr` to at or
/// above it, in timeline order
#[must_use]
pub fn upward_crossings(aggregates: &[SnapshotAggregate], target_nsr: f64) -> Vec<DateTime> {
    let mut watch = CrossingWatch::new(target_nsr);
    aggregates
        .iter()
        .filter(|a| a.evaluated_count() > 0)
        .filter_map(|a| watch.observe(a.avg_nsr).then_some(a.date))
        .collect()
}
