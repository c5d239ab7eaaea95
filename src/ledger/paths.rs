/// Ledger file naming
use std::path::{Path, PathBuf};

use crate::item::ItemKind;

/// Default ledger file for a stream: `processed_<kind>_<stream>.txt` under `dir`
pub fn default_ledger_path(dir: &Path, kind: ItemKind, stream: &str) -> PathBuf {
    dir.join(format!("processed_{}_{}.txt", kind.as_str(), stream))
}
