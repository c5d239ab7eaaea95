//! Deduplication ledger of processed item ids
//!
//! Each stream engine owns exactly one ledger backed by a plain text file
//! with one item id per line. The file is appended to after every processed
//! item and rewritten when the ledger is pruned.
//!
//! ## Retention
//!
//! When the ledger grows past the high-water mark (600 ids by default) it is
//! cut back to the most recent low-water-mark ids (500), in memory and on
//! disk. Ids dropped by pruning are old enough that the live stream no
//! longer delivers them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use goldtbot::ledger::Ledger;
//!
//! let mut ledger = Ledger::load("processed_comments_de.txt");
//! if !ledger.contains("abc123") {
//!     // ... process the item ...
//!     ledger.record("abc123");
//!     ledger.prune_if_needed();
//! }
//! ```

pub mod error;
pub mod paths;
pub mod pruning;
pub mod store;

pub use error::{LedgerError, Result};
pub use paths::default_ledger_path;
pub use pruning::{PruneStats, RetentionPolicy, LEDGER_HIGH_WATER, LEDGER_LOW_WATER};
pub use store::Ledger;
