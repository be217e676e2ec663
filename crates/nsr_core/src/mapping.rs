//! Column mapping for block-model imports.
//!
//! Exports from mine-planning packages name their columns inconsistently
//! (`XCENTRE`, `XC`, `EAST`, ...). A mapping ties each header to one block
//! field; [`auto_detect_mapping`] proposes one and [`validate_mapping`] checks
//! a user-edited one before rows are read with [`RowReader`].

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::MappingError;
use crate::model::{Block, BlockId};

/// Header → field key, e.g. `"XCENTRE" → "x"`
pub type ColumnMapping = BTreeMap<String, String>;

/// Block fields an import column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockField {
    X,
    Y,
    Z,
    Dx,
    Dy,
    Dz,
    CuGrade,
    AuGrade,
    AgGrade,
    Density,
    Tonnage,
    RockType,
    Zone,
    SourceId,
}

impl BlockField {
    pub const ALL: [BlockField; 14] = [
        BlockField::X,
        BlockField::Y,
        BlockField::Z,
        BlockField::Dx,
        BlockField::Dy,
        BlockField::Dz,
        BlockField::CuGrade,
        BlockField::AuGrade,
        BlockField::AgGrade,
        BlockField::Density,
        BlockField::Tonnage,
        BlockField::RockType,
        BlockField::Zone,
        BlockField::SourceId,
    ];

    pub const REQUIRED: [BlockField; 4] =
        [BlockField::X, BlockField::Y, BlockField::Z, BlockField::CuGrade];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            BlockField::X => "x",
            BlockField::Y => "y",
            BlockField::Z => "z",
            BlockField::Dx => "dx",
            BlockField::Dy => "dy",
            BlockField::Dz => "dz",
            BlockField::CuGrade => "cu_grade",
            BlockField::AuGrade => "au_grade",
            BlockField::AgGrade => "ag_grade",
            BlockField::Density => "density",
            BlockField::Tonnage => "tonnage",
            BlockField::RockType => "rock_type",
            BlockField::Zone => "zone",
            BlockField::SourceId => "source_id",
        }
    }
}

impl FromStr for BlockField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or(())
    }
}

/// Known header spellings, normalized to upper case with `_` for spaces.
///
/// `VOLUME` is recognized but has no block field, so a mapping that keeps it
/// fails validation until the user drops or remaps it.
const HEURISTICS: &[(&str, &str)] = &[
    ("XCENTRE", "x"),
    ("YCENTRE", "y"),
    ("ZCENTRE", "z"),
    ("XC", "x"),
    ("YC", "y"),
    ("ZC", "z"),
    ("XWORLD", "x"),
    ("YWORLD", "y"),
    ("ZWORLD", "z"),
    ("CENTROID_X", "x"),
    ("CENTROID_Y", "y"),
    ("CENTROID_Z", "z"),
    ("EAST", "x"),
    ("NORTH", "y"),
    ("RL", "z"),
    ("ELEVATION", "z"),
    ("XINC", "dx"),
    ("YINC", "dy"),
    ("ZINC", "dz"),
    ("DX", "dx"),
    ("DY", "dy"),
    ("DZ", "dz"),
    ("XSIZE", "dx"),
    ("YSIZE", "dy"),
    ("ZSIZE", "dz"),
    ("CU", "cu_grade"),
    ("CU_PCT", "cu_grade"),
    ("CU%", "cu_grade"),
    ("CU_GRADE", "cu_grade"),
    ("COPPER", "cu_grade"),
    ("AU", "au_grade"),
    ("AU_GPT", "au_grade"),
    ("AU_GRADE", "au_grade"),
    ("GOLD", "au_grade"),
    ("AG", "ag_grade"),
    ("AG_GPT", "ag_grade"),
    ("AG_GRADE", "ag_grade"),
    ("SILVER", "ag_grade"),
    ("DENSITY", "density"),
    ("SG", "density"),
    ("SPECIFIC_GRAVITY", "density"),
    ("TONNES", "tonnage"),
    ("TONNAGE", "tonnage"),
    ("TONS", "tonnage"),
    ("WEIGHT", "tonnage"),
    ("VOLUME", "volume"),
    ("ROCKTYPE", "rock_type"),
    ("ROCK_TYPE", "rock_type"),
    ("ROCK", "rock_type"),
    ("LITH", "rock_type"),
    ("LITHOLOGY", "rock_type"),
    ("ZONE", "zone"),
    ("DOMAIN", "zone"),
    ("GEOLOGICAL_DOMAIN", "zone"),
    ("BLOCK_ID", "source_id"),
    ("BLOCKID", "source_id"),
    ("ID", "source_id"),
    ("IJK", "source_id"),
];

fn normalize_header(header: &str) -> String {
    header.trim().to_uppercase().replace(' ', "_")
}

/// Suggest a mapping for the recognized headers. The first header claiming a
/// field wins; later synonyms are left unmapped.
#[must_use]
pub fn auto_detect_mapping<S: AsRef<str>>(headers: &[S]) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    let mut used: Vec<&str> = Vec::new();

    for header in headers {
        let header = header.as_ref();
        let key = normalize_header(header);
        let Some(&(_, field)) = HEURISTICS.iter().find(|(known, _)| *known == key) else {
            continue;
        };
        if used.contains(&field) {
            continue;
        }
        used.push(field);
        mapping.insert(header.trim().to_string(), field.to_string());
    }

    mapping
}

/// Every problem with a mapping; `Ok` when rows can be read with it
pub fn validate_mapping(mapping: &ColumnMapping) -> Result<(), Vec<MappingError>> {
    let mut errors = Vec::new();

    for required in BlockField::REQUIRED {
        if !mapping.values().any(|field| field == required.key()) {
            errors.push(MappingError::MissingRequired(required.key()));
        }
    }
    for (column, field) in mapping {
        if field.parse::<BlockField>().is_err() {
            errors.push(MappingError::UnknownField {
                column: column.clone(),
                field: field.clone(),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Reads blocks from delimited rows using a validated mapping
#[derive(Debug, Clone)]
pub struct RowReader {
    columns: Vec<(BlockField, usize)>,
}

impl RowReader {
    /// Resolve mapped headers to column positions.
    ///
    /// Fails on the first mapping problem, or when a mapped header is not in
    /// the header row.
    pub fn new<S: AsRef<str>>(mapping: &ColumnMapping, headers: &[S]) -> Result<Self, MappingError> {
        if let Err(mut errors) = validate_mapping(mapping) {
            return Err(errors.remove(0));
        }

        let mut columns = Vec::with_capacity(mapping.len());
        for (column, field) in mapping {
            let field = field
                .parse::<BlockField>()
                .map_err(|()| MappingError::UnknownField {
                    column: column.clone(),
                    field: field.clone(),
                })?;
            let position = headers
                .iter()
                .position(|h| h.as_ref().trim() == column)
                .ok_or_else(|| MappingError::MissingColumn(column.clone()))?;
            columns.push((field, position));
        }
        Ok(Self { columns })
    }

    /// Build a block from one data row. `row` is the 1-based line number used
    /// in error messages.
    pub fn read<S: AsRef<str>>(&self, id: BlockId, row: usize, values: &[S]) -> Result<Block, MappingError> {
        let mut block = Block::new(id, 0.0, 0.0, 0.0, 0.0);

        for &(field, position) in &self.columns {
            let raw = values.get(position).map_or("", |v| v.as_ref().trim());
            let required = BlockField::REQUIRED.contains(&field);
            if raw.is_empty() {
                if required {
                    return Err(MappingError::EmptyRequired { row, field: field.key() });
                }
                continue;
            }

            match field {
                BlockField::RockType => block.rock_type = Some(raw.to_string()),
                BlockField::Zone => block.zone = Some(raw.to_string()),
                BlockField::SourceId => block.source_id = Some(raw.to_string()),
                numeric => {
                    let value: f64 = raw.parse().map_err(|_| MappingError::InvalidNumber {
                        row,
                        field: numeric.key(),
                        value: raw.to_string(),
                    })?;
                    assign_number(&mut block, numeric, value);
                }
            }
        }

        Ok(block)
    }
}

fn assign_number(block: &mut Block, field: BlockField, value: f64) {
    match field {
        BlockField::X => block.x = value,
        BlockField::Y => block.y = value,
        BlockField::Z => block.z = value,
        BlockField::Dx => block.dx = Some(value),
        BlockField::Dy => block.dy = Some(value),
        BlockField::Dz => block.dz = Some(value),
        BlockField::CuGrade => block.cu_grade = value,
        BlockField::AuGrade => block.au_grade = Some(value),
        BlockField::AgGrade => block.ag_grade = Some(value),
        BlockField::Density => block.density = Some(value),
        BlockField::Tonnage => block.tonnage = Some(value),
        BlockField::RockType | BlockField::Zone | BlockField::SourceId => {}
    }
}
