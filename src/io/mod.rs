//! Input/output helpers: result exports (CSV/JSON).

pub mod export;

pub use export::*;
