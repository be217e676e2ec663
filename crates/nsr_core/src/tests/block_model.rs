//! Block model scenarios from import to timeline
//!
//! These tests verify that:
//! - Rows read through an auto-detected mapping produce usable blocks
//! - A price change only shows up after an explicit recompute
//! - Every level of an imported model can be projected

use jiff::civil::date;

use crate::config::{EconomicConfig, StaticPrices};
use crate::error::EvaluationError;
use crate::evaluate::result_with_nsr;
use crate::mapping::{RowReader, auto_detect_mapping};
use crate::model::{
    Block, BlockId, EvaluationInput, EvaluationResult, MetalPrices, RawSnapshot, Variable,
};
use crate::pipeline::Pipeline;
use crate::projection::{Viewport, levels};
use crate::timeline::{aggregate, is_chronological};

const HEADERS: [&str; 7] = ["XCENTRE", "YCENTRE", "ZCENTRE", "XINC", "YINC", "CU_PCT", "TONNES"];

fn import() -> Vec<Block> {
    let rows = [
        ["1000", "5000", "300", "10", "10", "0.4", "2700"],
        ["1010", "5000", "300", "10", "10", "1.05", "2700"],
        ["1020", "5000", "300", "10", "10", "2.5", "2700"],
        ["1000", "5010", "290", "10", "10", "0.9", "2650"],
        ["1010", "5010", "290", "10", "10", "1.8", "2650"],
    ];
    let mapping = auto_detect_mapping(&HEADERS);
    let reader = RowReader::new(&mapping, &HEADERS).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, row)| reader.read(BlockId(i as u32), i + 2, row).unwrap())
        .collect()
}

/// 45 $/t per % Cu at 6.28 $/lb, linear in price
fn linear(input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError> {
    let price = Variable::CuPrice.get(input);
    Ok(result_with_nsr(45.0 * input.cu_grade * price / 6.28))
}

#[test]
fn test_import_and_recompute() {
    let mut blocks = import();
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[2].dx, Some(10.0));
    assert_eq!(blocks[3].tonnage, Some(2650.0));

    let pipeline = Pipeline::default();
    let template = EvaluationInput::new("Caraiba", "R22", 0.0);
    let report = pipeline.recompute(&mut blocks, &linear, &template);
    assert_eq!(report.failed, 0);

    let s = pipeline.classify(&blocks).summary;
    assert_eq!(s.inviable_count, 2);
    assert_eq!(s.marginal_count, 1);
    assert_eq!(s.viable_count, 2);
}

#[test]
fn test_price_change_requires_recompute() {
    let template = EvaluationInput::new("Caraiba", "R22", 0.0);
    let mut pipeline = Pipeline::new(EconomicConfig::default());
    let mut blocks = import();
    pipeline.recompute(&mut blocks, &linear, &template);
    let before = pipeline.aggregate_snapshot(date(2025, 1, 1).at(0, 0, 0, 0), &blocks);

    let cheap_copper = MetalPrices {
        cu_price: 3.14,
        ..MetalPrices::default()
    };
    pipeline.config.prices.refresh(&StaticPrices::new(cheap_copper)).unwrap();

    // Stale until recomputed
    let unchanged = pipeline.aggregate_snapshot(date(2025, 2, 1).at(0, 0, 0, 0), &blocks);
    assert_eq!(unchanged.viable_count, before.viable_count);

    pipeline.recompute(&mut blocks, &linear, &template);
    let after = pipeline.aggregate_snapshot(date(2025, 2, 1).at(0, 0, 0, 0), &blocks);
    assert!(after.viable_tonnage < before.viable_tonnage);
    assert_eq!(after.metal_prices.cu_price, 3.14);

    let timeline = aggregate(
        &[
            RawSnapshot {
                date: before.date,
                cutoff: before.cutoff,
                prices: before.metal_prices,
                blocks: import(),
            },
            RawSnapshot {
                date: after.date,
                cutoff: after.cutoff,
                prices: after.metal_prices,
                blocks: blocks.clone(),
            },
        ],
        &pipeline.config.thresholds,
    );
    assert!(is_chronological(&timeline));
    assert_eq!(timeline[0].unevaluated_count, 5);
    assert_eq!(timeline[1].viable_count, after.viable_count);
}

#[test]
fn test_every_level_projects() {
    let pipeline = Pipeline::default();
    let mut blocks = import();
    pipeline.recompute(&mut blocks, &linear, &EvaluationInput::new("Caraiba", "R22", 0.0));

    let zs = levels(&blocks);
    assert_eq!(zs, vec![290.0, 300.0]);
    for z in zs {
        let heatmap = pipeline.heatmap(&blocks, z, Viewport::new(800.0, 600.0)).unwrap();
        assert!(heatmap.cells.iter().all(|c| c.tier.is_some()));
        assert!(heatmap.cells.iter().all(|c| c.rect.w > 0.0 && c.rect.h > 0.0));
    }
}
