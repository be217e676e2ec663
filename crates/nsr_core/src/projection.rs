//! Plan-view projection of one block-model level onto a 2-D viewport.
//!
//! World coordinates are block centres in metres with Y pointing north.
//! Screen coordinates have their origin at the top-left corner with Y
//! pointing down, so every projected rectangle is flipped vertically.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{Block, BlockId};

/// Z values closer than this are treated as the same bench
pub const LEVEL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Screen-space rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl DrawRect {
    #[must_use]
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }
}

/// Uniform-scale mapping from world XY to a viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub viewport: Viewport,
    /// World position of the viewport's bottom-left content corner
    pub origin_x: f64,
    pub origin_y: f64,
    /// Footprint used for blocks that carry no `dx`/`dy`
    pub default_dx: f64,
    pub default_dy: f64,
    /// Pixels per metre, identical on both axes
    pub scale: f64,
    /// Centering margins
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Projection {
    /// Fit every block into the viewport. `None` for an empty population or a
    /// viewport with no area.
    #[must_use]
    pub fn fit<'a, I>(blocks: I, viewport: Viewport) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Block>,
    {
        if !viewport.is_drawable() {
            return None;
        }

        let mut bounds = Bounds::default();
        for block in blocks {
            bounds.include(block);
        }
        if bounds.count == 0 {
            return None;
        }
        let span_x = bounds.max_x - bounds.min_x;
        let span_y = bounds.max_y - bounds.min_y;

        let estimate = estimate_footprint(span_x, span_y, bounds.count);
        let default_dx = bounds.dx.mean().unwrap_or(estimate);
        let default_dy = bounds.dy.mean().unwrap_or(estimate);

        // Pad by the widest footprint so edge blocks are drawn whole
        let pad_x = bounds.dx.max.max(default_dx);
        let pad_y = bounds.dy.max.max(default_dy);
        let range_x = span_x + pad_x;
        let range_y = span_y + pad_y;
        let scale = (viewport.width / range_x).min(viewport.height / range_y);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }

        Some(Self {
            viewport,
            origin_x: bounds.min_x - pad_x / 2.0,
            origin_y: bounds.min_y - pad_y / 2.0,
            default_dx,
            default_dy,
            scale,
            offset_x: (viewport.width - range_x * scale) / 2.0,
            offset_y: (viewport.height - range_y * scale) / 2.0,
        })
    }

    /// Screen rectangle for a block
    #[must_use]
    pub fn rect(&self, block: &Block) -> DrawRect {
        let w = block.dx.unwrap_or(self.default_dx) * self.scale;
        let h = block.dy.unwrap_or(self.default_dy) * self.scale;
        let x = self.offset_x + (block.x - self.origin_x) * self.scale - w / 2.0;
        let projected_y = self.offset_y + (block.y - self.origin_y) * self.scale - h / 2.0;
        DrawRect {
            x,
            y: self.viewport.height - projected_y - h,
            w,
            h,
        }
    }

    /// World centre of a rectangle produced by [`Projection::rect`]
    #[must_use]
    pub fn to_world(&self, rect: &DrawRect) -> (f64, f64) {
        let x = (rect.x - self.offset_x) / self.scale + self.origin_x + rect.w / (2.0 * self.scale);
        let projected_y = self.viewport.height - rect.y - rect.h;
        let y =
            (projected_y - self.offset_y) / self.scale + self.origin_y + rect.h / (2.0 * self.scale);
        (x, y)
    }
}

/// Side length for blocks without dimensions, assuming a roughly uniform grid
fn estimate_footprint(span_x: f64, span_y: f64, count: usize) -> f64 {
    let area = span_x * span_y;
    if area > 0.0 {
        return (area / count as f64).sqrt();
    }
    let span = span_x.max(span_y);
    if span > 0.0 && count > 1 {
        span / (count - 1) as f64
    } else {
        1.0
    }
}

/// Running statistics over explicit footprint dimensions
#[derive(Debug, Default)]
struct Dimension {
    sum: f64,
    count: usize,
    max: f64,
}

impl Dimension {
    fn include(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite() && *v > 0.0) {
            self.sum += v;
            self.count += 1;
            self.max = self.max.max(v);
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Single-pass extent of a level
#[derive(Debug)]
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    count: usize,
    dx: Dimension,
    dy: Dimension,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            count: 0,
            dx: Dimension::default(),
            dy: Dimension::default(),
        }
    }
}

impl Bounds {
    fn include(&mut self, block: &Block) {
        self.min_x = self.min_x.min(block.x);
        self.max_x = self.max_x.max(block.x);
        self.min_y = self.min_y.min(block.y);
        self.max_y = self.max_y.max(block.y);
        self.count += 1;
        self.dx.include(block.dx);
        self.dy.include(block.dy);
    }
}

/// Six-step colour scale for NSR relative to the cutoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTier {
    Loss,
    Deficit,
    NearCutoff,
    Marginal,
    Profitable,
    HighMargin,
}

impl ColorTier {
    pub const ALL: [ColorTier; 6] = [
        ColorTier::Loss,
        ColorTier::Deficit,
        ColorTier::NearCutoff,
        ColorTier::Marginal,
        ColorTier::Profitable,
        ColorTier::HighMargin,
    ];

    #[must_use]
    pub fn rgb(self) -> [u8; 3] {
        match self {
            ColorTier::Loss => [220, 38, 38],
            ColorTier::Deficit => [249, 115, 22],
            ColorTier::NearCutoff => [250, 204, 21],
            ColorTier::Marginal => [163, 230, 53],
            ColorTier::Profitable => [34, 197, 94],
            ColorTier::HighMargin => [21, 128, 61],
        }
    }

    #[must_use]
    pub fn hex(self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Tier boundaries as multiples of the cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteThresholds {
    pub deficit: f64,
    pub near_cutoff: f64,
    pub marginal: f64,
    pub profitable: f64,
}

impl Default for PaletteThresholds {
    fn default() -> Self {
        Self {
            deficit: 0.9,
            near_cutoff: 1.0,
            marginal: 1.1,
            profitable: 1.5,
        }
    }
}

impl PaletteThresholds {
    #[must_use]
    pub fn tier(&self, nsr: f64, cutoff: f64) -> ColorTier {
        if nsr <= 0.0 {
            ColorTier::Loss
        } else if nsr < self.deficit * cutoff {
            ColorTier::Deficit
        } else if nsr < self.near_cutoff * cutoff {
            ColorTier::NearCutoff
        } else if nsr < self.marginal * cutoff {
            ColorTier::Marginal
        } else if nsr < self.profitable * cutoff {
            ColorTier::Profitable
        } else {
            ColorTier::HighMargin
        }
    }
}

/// Distinct Z levels, ascending
#[must_use]
pub fn levels(blocks: &[Block]) -> Vec<f64> {
    let mut zs: Vec<f64> = blocks.iter().map(|b| b.z).filter(|z| z.is_finite()).collect();
    zs.sort_by(f64::total_cmp);
    zs.dedup_by(|a, b| (*a - *b).abs() <= LEVEL_TOLERANCE);
    zs
}

/// Blocks on the bench at `z`
#[must_use]
pub fn blocks_at_level(blocks: &[Block], z: f64) -> Vec<&Block> {
    blocks
        .iter()
        .filter(|b| (b.z - z).abs() <= LEVEL_TOLERANCE)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub id: BlockId,
    pub rect: DrawRect,
    pub nsr_per_tonne: Option<f64>,
    /// `None` for blocks that have not been evaluated
    pub tier: Option<ColorTier>,
}

/// Projected, coloured cells for one level
#[derive(Debug, Clone, Serialize)]
pub struct Heatmap {
    pub z: f64,
    pub cutoff: f64,
    pub projection: Projection,
    pub cells: Vec<HeatmapCell>,
    #[serde(skip)]
    index: FxHashMap<BlockId, usize>,
}

impl Heatmap {
    /// Project the blocks at `z`. The projection is fitted to that level
    /// only, so each bench fills the viewport.
    #[must_use]
    pub fn build(
        blocks: &[Block],
        z: f64,
        viewport: Viewport,
        cutoff: f64,
        palette: &PaletteThresholds,
    ) -> Option<Self> {
        let level = blocks_at_level(blocks, z);
        let projection = Projection::fit(level.iter().copied(), viewport)?;

        let cells: Vec<HeatmapCell> = level
            .iter()
            .map(|&block| HeatmapCell {
                id: block.id,
                rect: projection.rect(block),
                nsr_per_tonne: block.nsr_per_tonne,
                tier: block.nsr_per_tonne.map(|nsr| palette.tier(nsr, cutoff)),
            })
            .collect();
        let index = cells.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

        Some(Self {
            z,
            cutoff,
            projection,
            cells,
            index,
        })
    }

    #[must_use]
    pub fn cell(&self, id: BlockId) -> Option<&HeatmapCell> {
        self.index.get(&id).map(|&i| &self.cells[i])
    }

    /// Cell under a screen position, for tooltips
    #[must_use]
    pub fn hit_test(&self, px: f64, py: f64) -> Option<&HeatmapCell> {
        self.cells.iter().find(|c| c.rect.contains(px, py))
    }

    /// Number of cells per tier, in tier order
    #[must_use]
    pub fn tier_counts(&self) -> Vec<(ColorTier, usize)> {
        ColorTier::ALL
            .iter()
            .map(|&tier| {
                let n = self.cells.iter().filter(|c| c.tier == Some(tier)).count();
                (tier, n)
            })
            .collect()
    }
}
