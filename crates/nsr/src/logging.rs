use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Size-based truncation applied to the log file before it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotation {
    /// File size that triggers truncation
    pub max_bytes: u64,
    /// Tail kept after truncation, trimmed to whole lines
    pub keep_bytes: u64,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            keep_bytes: 1024 * 1024,
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error, leaving stdout for command output
    Stderr,
    /// Append to a size-rotated file
    File(PathBuf),
}

const ROTATION_MARKER: &[u8] = b"--- nsr log truncated, older entries removed ---\n";

/// Truncate the log to its recent tail once it outgrows `rotation.max_bytes`.
/// Returns whether the file was rewritten.
fn rotate_log_if_needed(log_path: &Path, rotation: LogRotation) -> io::Result<bool> {
    let len = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if len <= rotation.max_bytes {
        return Ok(false);
    }

    let tail = {
        let mut file = File::open(log_path)?;
        file.seek(SeekFrom::Start(len.saturating_sub(rotation.keep_bytes)))?;
        let mut tail = Vec::new();
        file.read_to_end(&mut tail)?;
        tail
    };
    // Drop the partial first line
    let start = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(tail.len(), |i| i + 1);

    let mut file = File::create(log_path)?;
    file.write_all(ROTATION_MARKER)?;
    file.write_all(&tail[start..])?;
    Ok(true)
}

/// A writer factory that produces writers for the shared log file
#[derive(Clone)]
struct LogWriterFactory {
    file: Arc<Mutex<File>>,
}

impl LogWriterFactory {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

/// A writer that holds a reference to the shared file
struct LogWriter {
    file: Arc<Mutex<File>>,
}

impl LogWriter {
    fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        f(&mut file)
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            file: self.file.clone(),
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let default_filter = format!("nsr={level},nsr_core=warn");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize logging.
///
/// The level applies to this crate; `nsr_core` logs at `warn` unless
/// `RUST_LOG` says otherwise. File logs are rotated before opening: past 5 MB
/// only the last 1 MB is kept.
pub fn init_logging(target: &LogTarget, level: &str) -> color_eyre::Result<()> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter(level))
                .with(fmt::layer().with_writer(io::stderr).with_target(false))
                .init();
        }
        LogTarget::File(log_path) => {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            let rotated = rotate_log_if_needed(log_path, LogRotation::default());

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            tracing_subscriber::registry()
                .with(env_filter(level))
                .with(
                    fmt::layer()
                        .with_writer(LogWriterFactory::new(file))
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(false),
                )
                .init();

            match rotated {
                Ok(true) => tracing::info!(log_path = %log_path.display(), "Log file truncated"),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to rotate log file"),
            }
            tracing::debug!(log_path = %log_path.display(), "Logging initialized");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SMALL: LogRotation = LogRotation {
        max_bytes: 1000,
        keep_bytes: 250,
    };

    #[test]
    fn test_small_log_is_not_rotated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nsr.log");
        fs::write(&path, "line one\nline two\n").unwrap();

        assert!(!rotate_log_if_needed(&path, SMALL).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_large_log_keeps_recent_whole_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nsr.log");
        let content: String = (0..100).map(|i| format!("entry {i:03} ........\n")).collect();
        fs::write(&path, &content).unwrap();

        assert!(rotate_log_if_needed(&path, SMALL).unwrap());
        let rotated = fs::read_to_string(&path).unwrap();
        let mut lines = rotated.lines();
        assert!(lines.next().unwrap().starts_with("--- nsr log truncated"));
        let kept: Vec<&str> = lines.collect();
        assert!(!kept.is_empty());
        assert!(kept.iter().all(|l| l.starts_with("entry ") && l.len() == 18));
        assert_eq!(*kept.last().unwrap(), "entry 099 ........");
        assert!(rotated.len() as u64 <= SMALL.keep_bytes + ROTATION_MARKER.len() as u64);
    }

    #[test]
    fn test_default_rotation_sizes() {
        let rotation = LogRotation::default();
        assert_eq!(rotation.max_bytes, 5 * 1024 * 1024);
        assert_eq!(rotation.keep_bytes, 1024 * 1024);
    }

    #[test]
    fn test_missing_log_is_fine() {
        let dir = tempdir().unwrap();
        assert!(!rotate_log_if_needed(&dir.path().join("absent.log"), SMALL).unwrap());
    }
}
