use std::collections::{HashSet, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::error::{LedgerError, Result};
use super::pruning::{self, PruneStats, RetentionPolicy};

/// File-backed, insertion-ordered set of processed item ids
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    order: VecDeque<String>,
    index: HashSet<String>,
    policy: RetentionPolicy,
}

impl Ledger {
    /// Load a ledger from `path` with the default retention policy.
    ///
    /// A missing or unreadable file yields an empty ledger and a warning.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_with_policy(path, RetentionPolicy::default())
    }

    pub fn load_with_policy<P: AsRef<Path>>(path: P, policy: RetentionPolicy) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut ledger = Self {
            path,
            order: VecDeque::new(),
            index: HashSet::new(),
            policy,
        };

        match ledger.read_existing() {
            Ok(count) => {
                info!(path = %ledger.path.display(), count, "Loaded processed ids");
            }
            Err(e) => {
                warn!(error = %e, "Ledger could not be read, starting empty");
            }
        }

        ledger
    }

    fn read_existing(&mut self) -> Result<usize> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Ledger file does not exist yet");
                return Ok(0);
            }
            Err(e) => return Err(LedgerError::io(&self.path, e)),
        };

        for line in contents.lines() {
            let id = line.trim();
            if !id.is_empty() {
                self.insert(id);
            }
        }
        Ok(self.order.len())
    }

    fn insert(&mut self, id: &str) -> bool {
        if self.index.contains(id) {
            return false;
        }
        self.index.insert(id.to_string());
        self.order.push_back(id.to_string());
        true
    }

    /// Whether `id` was loaded at startup or recorded since
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Mark `id` as processed and append it to the ledger file.
    ///
    /// A failed append is logged; the id stays recorded in memory.
    pub fn record(&mut self, id: &str) {
        if !self.insert(id) {
            debug!(id, "Id already recorded");
            return;
        }

        if let Err(e) = self.append(id) {
            error!(id, error = %e, "Failed to persist processed id");
        }
    }

    fn append(&self, id: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::io(&self.path, e))?;
        writeln!(file, "{}", id).map_err(|e| LedgerError::io(&self.path, e))
    }

    /// Cut the ledger back to the most recent low-water-mark ids once it
    /// exceeds the high-water mark. Returns `None` when nothing was pruned.
    pub fn prune_if_needed(&mut self) -> Option<PruneStats> {
        if !self.policy.needs_prune(self.order.len()) {
            return None;
        }

        let before = self.order.len();
        let excess = before.saturating_sub(self.policy.low_water);
        for id in self.order.drain(..excess) {
            self.index.remove(&id);
        }

        let persisted = match pruning::rewrite(&self.path, self.order.iter().map(String::as_str)) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to rewrite pruned ledger");
                false
            }
        };

        let stats = PruneStats {
            before,
            kept: self.order.len(),
            pruned: excess,
            persisted,
        };
        info!(path = %self.path.display(), ?stats, "Pruned ledger");
        Some(stats)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in insertion order, oldest first
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(temp: &TempDir) -> Ledger {
        Ledger::load(temp.path().join("processed_comments_test.txt"))
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let ledger = ledger_in(&temp);
        assert!(ledger.is_empty());
        assert!(!ledger.contains("abc"));
    }

    #[test]
    fn test_unreadable_path_starts_empty() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be read as a ledger file
        let ledger = Ledger::load(temp.path());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_appends_line() {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);

        ledger.record("c1");
        ledger.record("c2");

        assert!(ledger.contains("c1"));
        assert!(ledger.contains("c2"));
        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, "c1\nc2\n");
    }

    #[test]
    fn test_record_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);

        ledger.record("c1");
        ledger.record("c1");

        assert_eq!(ledger.len(), 1);
        assert_eq!(fs::read_to_string(ledger.path()).unwrap(), "c1\n");
    }

    #[test]
    fn test_reload_sees_recorded_ids() {
        let temp = TempDir::new().unwrap();
        {
            let mut ledger = ledger_in(&temp);
            ledger.record("a");
            ledger.record("b");
        }

        let ledger = ledger_in(&temp);
        assert_eq!(ledger.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_skips_blank_lines_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.txt");
        fs::write(&path, "a\n\n b \na\nc").unwrap();

        let ledger = Ledger::load(&path);
        assert_eq!(ledger.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_write_failure_keeps_id_in_memory() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::load(temp.path().join("missing").join("ledger.txt"));

        ledger.record("x");

        assert!(ledger.contains("x"));
    }

    #[test]
    fn test_prune_after_601_records() {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);

        let ids: Vec<String> = (0..601).map(|i| format!("id{:04}", i)).collect();
        let mut prunes = Vec::new();
        for id in &ids {
            ledger.record(id);
            if let Some(stats) = ledger.prune_if_needed() {
                prunes.push(stats);
            }
        }

        assert_eq!(prunes.len(), 1);
        assert_eq!(prunes[0].before, 601);
        assert_eq!(prunes[0].pruned, 101);
        assert!(prunes[0].persisted);

        assert_eq!(ledger.len(), 500);
        for id in &ids[..101] {
            assert!(!ledger.contains(id));
        }
        for id in &ids[101..] {
            assert!(ledger.contains(id));
        }

        let expected: Vec<&str> = ids[101..].iter().map(String::as_str).collect();
        assert_eq!(ledger.ids().collect::<Vec<_>>(), expected);

        let on_disk = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(on_disk.lines().collect::<Vec<_>>(), expected);

        let reloaded = ledger_in(&temp);
        assert_eq!(reloaded.len(), 500);
        assert!(!reloaded.contains("id0100"));
        assert!(reloaded.contains("id0101"));
    }

    #[test]
    fn test_no_prune_at_high_water() {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);

        for i in 0..600 {
            ledger.record(&i.to_string());
            assert!(ledger.prune_if_needed().is_none());
        }
        assert_eq!(ledger.len(), 600);
    }

    #[test]
    fn test_custom_policy() {
        let temp = TempDir::new().unwrap();
        let policy = RetentionPolicy {
            high_water: 3,
            low_water: 2,
        };
        let mut ledger = Ledger::load_with_policy(temp.path().join("l.txt"), policy);

        for id in ["a", "b", "c", "d"] {
            ledger.record(id);
            ledger.prune_if_needed();
        }

        assert_eq!(ledger.ids().collect::<Vec<_>>(), vec!["c", "d"]);
    }
}
