//! Log returns over the combined (trading-day) series.

use crate::domain::CombinedRecord;
use crate::signal::JoinedRow;

/// Attach `ln(close_t / close_{t-1})` to each row; the first row gets `None`.
///
/// Returns are taken between consecutive *combined* rows, so a trading day
/// dropped for missing weather widens the following return's span.
pub fn with_log_returns(rows: &[JoinedRow]) -> Vec<CombinedRecord> {
    let mut out = Vec::with_capacity(rows.len());
    let mut prev_close: Option<f64> = None;
    for row in rows {
        let log_return = prev_close.map(|prev| (row.close / prev).ln());
        out.push(CombinedRecord {
            date: row.date,
            close: row.close,
            deviation: row.deviation,
            log_return,
        });
        prev_close = Some(row.close);
    }
    out
}
