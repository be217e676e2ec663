//! Block-model units

use serde::{Deserialize, Serialize};

use super::BlockId;

/// One volumetric unit of the block model.
///
/// Position is the block centre. Footprint dimensions are optional because
/// many exports omit them; projection falls back to an estimated size.
/// `nsr_per_tonne`, `is_viable` and `margin` are only ever assigned together
/// by a full recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Identifier carried over from the mine-planning export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dz: Option<f64>,

    /// %
    pub cu_grade: f64,
    /// g/t
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub au_grade: Option<f64>,
    /// g/t
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ag_grade: Option<f64>,
    /// t/m3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tonnage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rock_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsr_per_tonne: Option<f64>,
    /// Externally computed flag; authoritative when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_viable: Option<bool>,
    /// `nsr_per_tonne - cutoff` at the last recomputation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
}

impl Block {
    pub fn new(id: BlockId, x: f64, y: f64, z: f64, cu_grade: f64) -> Self {
        Self {
            id,
            source_id: None,
            x,
            y,
            z,
            dx: None,
            dy: None,
            dz: None,
            cu_grade,
            au_grade: None,
            ag_grade: None,
            density: None,
            tonnage: None,
            zone: None,
            rock_type: None,
            nsr_per_tonne: None,
            is_viable: None,
            margin: None,
        }
    }

    #[must_use]
    pub fn with_tonnage(mut self, tonnage: f64) -> Self {
        self.tonnage = Some(tonnage);
        self
    }

    #[must_use]
    pub fn with_footprint(mut self, dx: f64, dy: f64, dz: f64) -> Self {
        self.dx = Some(dx);
        self.dy = Some(dy);
        self.dz = Some(dz);
        self
    }

    /// Attach an NSR without a viability flag
    #[must_use]
    pub fn with_nsr(mut self, nsr_per_tonne: f64) -> Self {
        self.nsr_per_tonne = Some(nsr_per_tonne);
        self
    }

    /// Tonnage, treating a missing value as zero
    #[must_use]
    pub fn tonnage_or_zero(&self) -> f64 {
        self.tonnage.unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.nsr_per_tonne.is_some()
    }

    /// Assign the outcome of an evaluation against a cutoff
    pub fn assign_nsr(&mut self, nsr_per_tonne: f64, cutoff: f64) {
        self.nsr_per_tonne = Some(nsr_per_tonne);
        self.is_viable = Some(nsr_per_tonne >= cutoff);
        self.margin = Some(nsr_per_tonne - cutoff);
    }

    /// Forget any previous evaluation
    pub fn clear_nsr(&mut self) {
        self.nsr_per_tonne = None;
        self.is_viable = None;
        self.margin = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_nsr_sets_flag_and_margin() {
        let mut block = Block::new(BlockId(1), 0.0, 0.0, 100.0, 1.2);
        block.assign_nsr(40.0, 45.0);

        assert_eq!(block.nsr_per_tonne, Some(40.0));
        assert_eq!(block.is_viable, Some(false));
        assert_eq!(block.margin, Some(-5.0));

        block.clear_nsr();
        assert!(!block.is_evaluated());
        assert_eq!(block.is_viable, None);
    }

    #[test]
    fn test_serde_skips_missing_optionals() {
        let block = Block::new(BlockId(7), 1.0, 2.0, 3.0, 0.8);
        let json = serde_json::to_string(&block).unwrap();
        assert!(!json.contains("tonnage"));

        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
