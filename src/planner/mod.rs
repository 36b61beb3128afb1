//! Turns flow definitions into per-session execution plans.

mod core;
mod errors;

pub use core::FlowPlanner;
pub use errors::PlanningError;
