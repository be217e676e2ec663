//! Subcommand implementations. Each returns a serializable report; printing
//! is left to `main`.

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::{WrapErr, bail};
use jiff::civil::DateTime;
use nsr_core::EconomicConfig;
use nsr_core::analysis::{BreakEven, SensitivitySample, find_crossing};
use nsr_core::classify::{ClassificationSummary, ViabilityBucket, classify, recompute_viability};
use nsr_core::goal_seek::{GoalSeekInterpretation, GoalSeekOutcome, Headroom, interpret};
use nsr_core::mapping::{ColumnMapping, auto_detect_mapping, validate_mapping};
use nsr_core::model::{BlockId, Lever, RawSnapshot, SnapshotAggregate, Variable};
use nsr_core::projection::{ColorTier, Heatmap, Viewport, levels};
use nsr_core::timeline::{aggregate, is_chronological, upward_crossings};
use serde::Serialize;

use crate::io::{read_blocks, read_csv_headers, read_document};

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub summary: ClassificationSummary,
    pub skipped_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<BTreeMap<ViabilityBucket, Vec<BlockId>>>,
}

/// Classify a block file against the configured cutoff.
///
/// With `reflag`, stored viability flags are recomputed from the cutoff
/// first instead of being treated as authoritative.
pub fn classify_blocks(
    config: &EconomicConfig,
    path: &Path,
    mapping: Option<&ColumnMapping>,
    reflag: bool,
    list_blocks: bool,
) -> color_eyre::Result<ClassifyReport> {
    let mut import = read_blocks(path, mapping)?;
    if reflag {
        recompute_viability(&mut import.blocks, config.cutoff);
    }

    let classification = classify(&import.blocks, config.cutoff, &config.thresholds);
    let blocks = list_blocks.then(|| {
        ViabilityBucket::ALL
            .into_iter()
            .map(|bucket| {
                let ids = classification.blocks(bucket).iter().map(|b| b.id).collect();
                (bucket, ids)
            })
            .collect()
    });

    tracing::info!(
        viable = classification.summary.viable_count,
        marginal = classification.summary.marginal_count,
        inviable = classification.summary.inviable_count,
        unevaluated = classification.summary.unevaluated_count,
        "Classified blocks"
    );

    Ok(ClassifyReport {
        summary: classification.summary,
        skipped_rows: import.skipped_rows,
        blocks,
    })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HeatmapReport {
    /// No level requested: the levels available
    Levels { levels: Vec<f64> },
    Level {
        #[serde(flatten)]
        heatmap: Heatmap,
        tiers: Vec<TierCount>,
    },
}

#[derive(Debug, Serialize)]
pub struct TierCount {
    pub tier: ColorTier,
    pub color: String,
    pub cells: usize,
}

/// Project one level, or list the levels when none is given
pub fn heatmap(
    config: &EconomicConfig,
    path: &Path,
    mapping: Option<&ColumnMapping>,
    level: Option<f64>,
    viewport: Viewport,
) -> color_eyre::Result<HeatmapReport> {
    let import = read_blocks(path, mapping)?;
    let Some(z) = level else {
        return Ok(HeatmapReport::Levels {
            levels: levels(&import.blocks),
        });
    };

    let Some(heatmap) = Heatmap::build(&import.blocks, z, viewport, config.cutoff, &config.palette)
    else {
        bail!(
            "no blocks at level {z} (or the {}x{} viewport is empty)",
            viewport.width,
            viewport.height
        );
    };
    let tiers = heatmap
        .tier_counts()
        .into_iter()
        .map(|(tier, cells)| TierCount {
            tier,
            color: tier.hex(),
            cells,
        })
        .collect();

    Ok(HeatmapReport::Level { heatmap, tiers })
}

#[derive(Debug, Serialize)]
pub struct TimelineReport {
    pub chronological: bool,
    pub snapshots: Vec<SnapshotAggregate>,
    /// Dates where the average NSR rose through the alert level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossings: Option<Vec<DateTime>>,
}

/// Aggregate a YAML or JSON list of snapshots, keeping file order.
///
/// With `alert_nsr`, also reports where the average NSR crossed it upward.
pub fn timeline(
    config: &EconomicConfig,
    path: &Path,
    alert_nsr: Option<f64>,
) -> color_eyre::Result<TimelineReport> {
    let snapshots: Vec<RawSnapshot> = read_document(path)?;
    let snapshots = aggregate(&snapshots, &config.thresholds);
    let crossings = alert_nsr.map(|target| upward_crossings(&snapshots, target));
    Ok(TimelineReport {
        chronological: is_chronological(&snapshots),
        snapshots,
        crossings,
    })
}

#[derive(Debug, Serialize)]
pub struct GoalSeekReport {
    #[serde(flatten)]
    pub interpretation: GoalSeekInterpretation,
    pub headroom: Headroom,
    pub summary: String,
}

/// Interpret a solver outcome file
pub fn goal_seek(path: &Path) -> color_eyre::Result<GoalSeekReport> {
    let outcome: GoalSeekOutcome = read_document(path)?;
    let interpretation = interpret(&outcome);
    Ok(GoalSeekReport {
        headroom: interpretation.headroom(),
        summary: interpretation.summary(),
        interpretation,
    })
}

#[derive(Debug, Serialize)]
pub struct BreakEvenReport {
    pub target: f64,
    pub samples: usize,
    #[serde(flatten)]
    pub result: BreakEven,
}

/// Find where a sample curve crosses `target`
pub fn break_even(path: &Path, target: f64) -> color_eyre::Result<BreakEvenReport> {
    let mut samples: Vec<SensitivitySample> = read_document(path)?;
    if samples.len() < 2 {
        bail!("need at least two samples, found {}", samples.len());
    }
    samples.sort_by(|a, b| a.input_value.total_cmp(&b.input_value));

    Ok(BreakEvenReport {
        target,
        samples: samples.len(),
        result: find_crossing(&samples, target),
    })
}

#[derive(Debug, Serialize)]
pub struct MappingReport {
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub unmapped: Vec<String>,
    pub errors: Vec<String>,
}

/// Suggest a column mapping for a CSV header row
pub fn detect_mapping(path: &Path) -> color_eyre::Result<MappingReport> {
    let headers = read_csv_headers(path)?;
    let mapping = auto_detect_mapping(&headers);
    let errors = match validate_mapping(&mapping) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };
    let unmapped = headers
        .iter()
        .filter(|h| !mapping.contains_key(h.as_str()))
        .cloned()
        .collect();

    Ok(MappingReport {
        headers,
        mapping,
        unmapped,
        errors,
    })
}

/// Load a column mapping file (`header: field` pairs)
pub fn load_mapping(path: &Path) -> color_eyre::Result<ColumnMapping> {
    read_document(path).wrap_err("Failed to load column mapping")
}

#[derive(Debug, Serialize)]
pub struct VariableInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub lever: Lever,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Catalogue of variables that can be swept or goal-sought
#[must_use]
pub fn variables() -> Vec<VariableInfo> {
    Variable::ALL
        .into_iter()
        .map(|v| {
            let (lower_bound, upper_bound) = v.bounds();
            VariableInfo {
                key: v.key(),
                label: v.label(),
                unit: v.unit(),
                lever: v.lever(),
                lower_bound,
                upper_bound,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const BLOCKS_CSV: &str = "\
XC,YC,ZC,XINC,YINC,CU,TONNES
0,0,100,10,10,0.5,1000
10,0,100,10,10,1.0,1000
20,0,100,10,10,2.0,1000
0,0,90,10,10,1.5,1000
";

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn evaluated_blocks_yaml() -> &'static str {
        "\
- id: 0
  x: 0.0
  y: 0.0
  z: 100.0
  cu_grade: 0.5
  tonnage: 1000.0
  nsr_per_tonne: 20.0
- id: 1
  x: 10.0
  y: 0.0
  z: 100.0
  cu_grade: 1.0
  tonnage: 1000.0
  nsr_per_tonne: 47.0
- id: 2
  x: 20.0
  y: 0.0
  z: 100.0
  cu_grade: 2.0
  tonnage: 1000.0
  nsr_per_tonne: 95.0
  is_viable: false
"
    }

    #[test]
    fn test_classify_respects_stored_flags_unless_reflagged() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "blocks.yaml", evaluated_blocks_yaml());
        let config = EconomicConfig::default();

        let report = classify_blocks(&config, &path, None, false, true).unwrap();
        assert_eq!(report.summary.inviable_count, 2);
        assert_eq!(report.summary.marginal_count, 1);
        let buckets = report.blocks.unwrap();
        assert_eq!(buckets[&ViabilityBucket::Inviable], vec![BlockId(0), BlockId(2)]);

        let report = classify_blocks(&config, &path, None, true, false).unwrap();
        assert_eq!(report.summary.viable_count, 1);
        assert!(report.blocks.is_none());
    }

    #[test]
    fn test_classify_csv_without_nsr_is_all_unevaluated() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "blocks.csv", BLOCKS_CSV);
        let report = classify_blocks(&EconomicConfig::default(), &path, None, false, false).unwrap();
        assert_eq!(report.summary.unevaluated_count, 4);
        assert_eq!(report.summary.evaluated_count(), 0);
    }

    #[test]
    fn test_heatmap_lists_levels_then_projects_one() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "blocks.yaml", evaluated_blocks_yaml());
        let config = EconomicConfig::default();
        let viewport = Viewport::new(300.0, 100.0);

        match heatmap(&config, &path, None, None, viewport).unwrap() {
            HeatmapReport::Levels { levels } => assert_eq!(levels, vec![100.0]),
            other => panic!("expected levels, got {other:?}"),
        }

        match heatmap(&config, &path, None, Some(100.0), viewport).unwrap() {
            HeatmapReport::Level { heatmap, tiers } => {
                assert_eq!(heatmap.cells.len(), 3);
                assert_eq!(tiers.iter().map(|t| t.cells).sum::<usize>(), 3);
            }
            other => panic!("expected a level, got {other:?}"),
        }

        assert!(heatmap(&config, &path, None, Some(50.0), viewport).is_err());
    }

    #[test]
    fn test_timeline_reports_alert_crossings() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "snapshots.yaml",
            "\
- date: \"2025-01-31T00:00:00\"
  cutoff: 45.0
  prices: { cu_price: 4.2 }
  blocks:
    - { id: 0, x: 0.0, y: 0.0, z: 0.0, cu_grade: 1.0, nsr_per_tonne: 30.0 }
- date: \"2025-02-28T00:00:00\"
  cutoff: 45.0
  prices: { cu_price: 4.2 }
  blocks:
    - { id: 0, x: 0.0, y: 0.0, z: 0.0, cu_grade: 1.0, nsr_per_tonne: 55.0 }
",
        );
        let config = EconomicConfig::default();

        let report = timeline(&config, &path, None).unwrap();
        assert_eq!(report.snapshots.len(), 2);
        assert!(report.chronological);
        assert!(report.crossings.is_none());

        let report = timeline(&config, &path, Some(45.0)).unwrap();
        let crossings = report.crossings.unwrap();
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0], report.snapshots[1].date);
    }

    #[test]
    fn test_break_even_sorts_samples() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "samples.yaml",
            "\
- { input_value: 4.8, offset_percent: 20.0, nsr: 90.0 }
- { input_value: 3.2, offset_percent: -20.0, nsr: -5.0 }
- { input_value: 4.0, offset_percent: 0.0, nsr: 50.0 }
- { input_value: 3.6, offset_percent: -10.0, nsr: 15.0 }
- { input_value: 4.4, offset_percent: 10.0, nsr: 70.0 }
",
        );

        let report = break_even(&path, 0.0).unwrap();
        assert_eq!(report.samples, 5);
        match report.result {
            BreakEven::Found { offset_percent, .. } => {
                assert!((offset_percent + 17.5).abs() < 1e-9);
            }
            BreakEven::NotFoundInRange => panic!("expected a crossing"),
        }
    }

    #[test]
    fn test_goal_seek_report() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "outcome.json",
            r#"{"target_variable":"cu_tc","target_nsr":0.0,"threshold_value":120.0,
                "current_value":40.0,"current_nsr":55.0,"bound_hit":""}"#,
        );
        let report = goal_seek(&path).unwrap();
        assert_eq!(report.headroom, Headroom::Favorable);
        assert!(report.interpretation.is_currently_viable);
    }

    #[test]
    fn test_detect_mapping_reports_gaps() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "partial.csv", "EAST,NORTH,CU,COMMENT\n1,2,0.4,x\n");
        let report = detect_mapping(&path).unwrap();

        assert_eq!(report.mapping.len(), 3);
        assert_eq!(report.unmapped, vec!["COMMENT".to_string()]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("'z'"));
    }

    #[test]
    fn test_variable_catalogue() {
        let catalogue = variables();
        assert_eq!(catalogue.len(), 11);
        let tc = catalogue.iter().find(|v| v.key == "cu_tc").unwrap();
        assert_eq!(tc.lever, Lever::Cost);
        assert_eq!(tc.upper_bound, 1000.0);
    }
}
