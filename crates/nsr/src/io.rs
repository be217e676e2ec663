//! File loading and output for the command line.
//!
//! Data directory layout:
//! ~/.nsr/
//!   config.yaml          # Economic configuration (cutoff, prices, thresholds)
//!   nsr.log              # Log file when `--log-file` is not given a path

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{WrapErr, bail, eyre};
use nsr_core::EconomicConfig;
use nsr_core::mapping::{BlockField, ColumnMapping, RowReader, auto_detect_mapping, validate_mapping};
use nsr_core::model::{Block, BlockId};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const CONFIG_FILE: &str = "config.yaml";
pub const LOG_FILE: &str = "nsr.log";

#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nsr")
}

/// Supported data file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> color_eyre::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => bail!("unsupported file extension '{other}' for {}", path.display()),
        }
    }
}

/// Read and deserialize a YAML or JSON document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> color_eyre::Result<T> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    match Format::from_path(path)? {
        Format::Yaml => serde_saphyr::from_str(&content)
            .map_err(|e| eyre!("{e}"))
            .wrap_err_with(|| format!("Failed to parse YAML in {}", path.display())),
        Format::Json => serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse JSON in {}", path.display())),
        Format::Csv => bail!("{} is CSV; expected a YAML or JSON document", path.display()),
    }
}

/// Load the economic configuration.
///
/// An explicit path must exist. Otherwise `config.yaml` in the data directory
/// is used when present, and the built-in defaults when not.
pub fn load_config(explicit: Option<&Path>, data_dir: &Path) -> color_eyre::Result<EconomicConfig> {
    let config = match explicit {
        Some(path) => read_document(path)?,
        None => {
            let path = data_dir.join(CONFIG_FILE);
            if path.exists() {
                read_document(&path)?
            } else {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                EconomicConfig::default()
            }
        }
    };
    config.validate().wrap_err("Invalid economic configuration")?;
    Ok(config)
}

/// Blocks read from an import file
#[derive(Debug, Clone)]
pub struct BlockImport {
    pub blocks: Vec<Block>,
    /// Rows that could not be converted; CSV only
    pub skipped_rows: usize,
}

/// Read blocks from CSV (with a column mapping), YAML or JSON
pub fn read_blocks(path: &Path, mapping: Option<&ColumnMapping>) -> color_eyre::Result<BlockImport> {
    match Format::from_path(path)? {
        Format::Csv => {
            let file = fs::File::open(path)
                .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
            read_blocks_csv(file, mapping)
                .wrap_err_with(|| format!("Failed to import blocks from {}", path.display()))
        }
        Format::Yaml | Format::Json => {
            let blocks: Vec<Block> = read_document(path)?;
            Ok(BlockImport {
                blocks,
                skipped_rows: 0,
            })
        }
    }
}

/// Parse a block-model CSV. Rows that fail conversion are logged and
/// skipped; an import with no valid rows is an error.
pub fn read_blocks_csv<R: io::Read>(
    reader: R,
    mapping: Option<&ColumnMapping>,
) -> color_eyre::Result<BlockImport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .wrap_err("CSV has no header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mapping = match mapping {
        Some(m) => m.clone(),
        None => {
            let mut detected = auto_detect_mapping(&headers);
            detected.retain(|column, field| {
                let known = field.parse::<BlockField>().is_ok();
                if !known {
                    tracing::debug!(column = %column, field = %field, "Ignoring column with no block field");
                }
                known
            });
            detected
        }
    };
    if let Err(errors) = validate_mapping(&mapping) {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("column mapping is invalid: {}", messages.join("; "));
    }
    let row_reader = RowReader::new(&mapping, &headers)?;

    let mut blocks = Vec::new();
    let mut skipped_rows = 0;
    for (index, record) in csv_reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping unreadable row");
                skipped_rows += 1;
                continue;
            }
        };
        let values: Vec<&str> = record.iter().collect();
        match row_reader.read(BlockId(blocks.len() as u32), line, &values) {
            Ok(block) => blocks.push(block),
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping row");
                skipped_rows += 1;
            }
        }
    }

    if blocks.is_empty() {
        bail!("no valid blocks found");
    }
    tracing::info!(blocks = blocks.len(), skipped_rows, "Imported block model");

    Ok(BlockImport {
        blocks,
        skipped_rows,
    })
}

/// Header row of a CSV file
pub fn read_csv_headers(path: &Path) -> color_eyre::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
    Ok(reader
        .headers()
        .wrap_err("CSV has no header row")?
        .iter()
        .map(str::to_string)
        .collect())
}

/// Write content to a file atomically using write-then-rename pattern.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Pretty JSON to a file, or to stdout when no path is given
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> color_eyre::Result<()> {
    let json = serde_json::to_string_pretty(value).wrap_err("Failed to serialize output")?;
    match output {
        Some(path) => atomic_write(path, &(json + "\n"))
            .wrap_err_with(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").wrap_err("Failed to write to stdout")
        }
    }
}
