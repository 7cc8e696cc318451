//! Observed-minus-climatology deviations.

use crate::domain::{DeviationRecord, WeatherObservation};
use crate::error::AppError;
use crate::signal::climatology::{CalendarDay, Climatology};

/// Compute `observed - climatology[(month, day)]` for every row.
///
/// Runs over the full analysis-period series (non-trading days included). A
/// calendar day absent from the climatology fails the whole run; a null
/// observation or null climatology mean yields a null deviation.
pub fn compute_deviations(
    series: &[WeatherObservation],
    climatology: &Climatology,
) -> Result<Vec<DeviationRecord>, AppError> {
    series
        .iter()
        .map(|obs| {
            let historical_avg = climatology.lookup(CalendarDay::from(obs.date))?;
            let deviation = match (obs.value, historical_avg) {
                (Some(v), Some(avg)) => Some(v - avg),
                _ => None,
            };
            Ok(DeviationRecord {
                date: obs.date,
                observed: obs.value,
                historical_avg,
                deviation,
            })
        })
        .collect()
}

/// Absolute deviations of every non-null row.
pub fn abs_deviations(records: &[DeviationRecord]) -> Vec<f64> {
    records.iter().filter_map(|r| r.deviation).map(f64::abs).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(y: i32, m: u32, d: u32, value: Option<f64>) -> WeatherObservation {
        WeatherObservation {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            value,
        }
    }

    fn reference() -> Climatology {
        Climatology::from_observations(&[
            obs(2021, 1, 3, Some(4.0)),
            obs(2022, 1, 3, Some(6.0)),
            obs(2021, 1, 4, Some(3.0)),
            obs(2022, 1, 4, Some(3.5)),
        ])
        .unwrap()
    }

    #[test]
    fn deviation_is_observed_minus_mean() {
        let series = vec![obs(2023, 1, 3, Some(6.5)), obs(2023, 1, 4, Some(-2.75))];
        let out = compute_deviations(&series, &reference()).unwrap();

        assert_eq!(out.len(), 2);
        assert!((out[0].historical_avg.unwrap() - 5.0).abs() < 1e-12);
        assert!((out[0].deviation.unwrap() - 1.5).abs() < 1e-9);
        assert!((out[1].deviation.unwrap() - (-6.0)).abs() < 1e-9);
    }

    #[test]
    fn null_observation_gives_null_deviation() {
        let series = vec![obs(2023, 1, 3, None)];
        let out = compute_deviations(&series, &reference()).unwrap();
        assert_eq!(out[0].deviation, None);
        assert_eq!(out[0].historical_avg, Some(5.0));
    }

    #[test]
    fn unknown_calendar_day_fails() {
        let series = vec![obs(2023, 1, 3, Some(1.0)), obs(2023, 1, 5, Some(1.0))];
        assert!(compute_deviations(&series, &reference()).is_err());
    }

    #[test]
    fn abs_deviations_skip_nulls() {
        let series = vec![obs(2023, 1, 3, Some(3.0)), obs(2023, 1, 4, None)];
        let out = compute_deviations(&series, &reference()).unwrap();
        assert_eq!(abs_deviations(&out), vec![2.0]);
    }
}
