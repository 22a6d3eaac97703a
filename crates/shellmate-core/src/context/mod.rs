//! Context aggregation domain module.
//!
//! - `mode`: the user-selectable [`AggregationMode`]
//! - `view`: [`ActiveContextView`] and the pure [`recompute`] function

mod mode;
mod view;

pub use mode::AggregationMode;
pub use view::{ActiveContextView, recompute};
