//! Selection domain module.
//!
//! - `model`: session identifiers and selection records
//! - `store`: the keyed selection store

mod model;
mod store;

pub use model::{SelectionRecord, SessionId, truncate_chars};
pub use store::{DEFAULT_MIN_SELECTION_LEN, SelectionStore};
