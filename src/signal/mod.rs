//! Weather signal construction: climatology, deviations, alignment with prices.

pub mod align;
pub mod climatology;
pub mod deviation;

pub use align::{Alignment, JoinedRow, align};
pub use climatology::{CalendarDay, Climatology, DayStat};
pub use deviation::{abs_deviations, compute_deviations};
