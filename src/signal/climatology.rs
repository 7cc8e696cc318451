//! Calendar-day climatology.
//!
//! The reference period is collapsed to one mean per (month, day), ignoring the
//! year. A key exists for every calendar day that has at least one row in the
//! reference window; its mean is `None` when all of those rows were null.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::WeatherObservation;
use crate::error::AppError;

/// A (month, day) key, year discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CalendarDay {
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl std::fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Aggregated statistics for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayStat {
    /// Mean over non-null observations.
    pub mean: Option<f64>,
    /// Number of non-null observations.
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct Climatology {
    table: HashMap<CalendarDay, DayStat>,
    from: NaiveDate,
    to: NaiveDate,
}

impl Climatology {
    /// Build the table from reference-period observations.
    ///
    /// Fails when the window has no non-null observation at all, since every
    /// later lookup would be meaningless.
    pub fn from_observations(observations: &[WeatherObservation]) -> Result<Self, AppError> {
        let (Some(from), Some(to)) = (
            observations.iter().map(|o| o.date).min(),
            observations.iter().map(|o| o.date).max(),
        ) else {
            return Err(AppError::data_unavailable("Reference period returned no observations."));
        };

        let mut sums: HashMap<CalendarDay, (f64, usize)> = HashMap::with_capacity(366);
        for obs in observations {
            let entry = sums.entry(CalendarDay::from(obs.date)).or_insert((0.0, 0));
            if let Some(v) = obs.value {
                entry.0 += v;
                entry.1 += 1;
            }
        }

        if sums.values().all(|(_, n)| *n == 0) {
            return Err(AppError::data_unavailable(
                "Reference period has no non-null observations for the selected metric.",
            ));
        }

        let table = sums
            .into_iter()
            .map(|(key, (sum, count))| {
                let mean = (count > 0).then(|| sum / count as f64);
                (key, DayStat { mean, count })
            })
            .collect();

        Ok(Self { table, from, to })
    }

    /// Mean for a calendar day.
    ///
    /// `Err` when the reference window never contained that day (e.g. Feb 29
    /// without a leap year); `Ok(None)` when it did but every value was null.
    pub fn lookup(&self, key: CalendarDay) -> Result<Option<f64>, AppError> {
        self.table.get(&key).map(|s| s.mean).ok_or_else(|| {
            AppError::alignment(format!(
                "No climatology entry for {key} in reference window {}..{}.",
                self.from, self.to
            ))
        })
    }

    pub fn get(&self, key: CalendarDay) -> Option<&DayStat> {
        self.table.get(&key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.from, self.to)
    }

    /// Entries in calendar order.
    pub fn sorted(&self) -> BTreeMap<CalendarDay, DayStat> {
        self.table.iter().map(|(k, v)| (*k, *v)).collect()
    }
}
