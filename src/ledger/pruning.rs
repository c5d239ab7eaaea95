/// Size-bounded retention for ledger files
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{LedgerError, Result};

/// Prune once the ledger holds more than this many ids
pub const LEDGER_HIGH_WATER: usize = 600;
/// Number of most recent ids kept by a prune
pub const LEDGER_LOW_WATER: usize = 500;

/// High/low-water marks for ledger pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub high_water: usize,
    pub low_water: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            high_water: LEDGER_HIGH_WATER,
            low_water: LEDGER_LOW_WATER,
        }
    }
}

impl RetentionPolicy {
    pub fn needs_prune(&self, len: usize) -> bool {
        len > self.high_water
    }
}

/// Pruning statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneStats {
    pub before: usize,
    pub kept: usize,
    pub pruned: usize,
    /// Whether the ledger file was rewritten successfully
    pub persisted: bool,
}

/// Replace the ledger file with `ids`, one per line.
///
/// Writes a sibling temp file and renames it over the original so a crash
/// mid-rewrite leaves either the old or the new ledger.
pub fn rewrite<'a>(path: &Path, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let tmp = temp_path(path);

    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        for id in ids {
            writeln!(writer, "{}", id)?;
        }
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&tmp);
        LedgerError::io(path, e)
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
