//! Stream engine
//!
//! One [`StreamEngine`] per item kind pulls items off the platform stream,
//! skips those its ledger already holds, and hands the rest to an
//! [`ItemHandler`]. Platform faults pause the engine; unexpected errors end
//! it.

pub mod processor;
mod stream;

pub use processor::{ItemHandler, ItemProcessor, Outcome};
pub use stream::{Disposition, EngineConfig, EngineError, EngineState, StreamEngine};
