//! Hourly-load heatmap grid construction.
//!
//! Pure data shaping, separated from HTTP and SQL: takes per-hour request
//! counts (UTC buckets) and distributes them over a `[hour][day]` grid in
//! the viewer's timezone. The grid is rendered as a color-coded chart where
//! darker cells mean more requests in that hour.

use chrono::{Duration, NaiveDate, Timelike};
use chrono_tz::Tz;

use crate::db::repos::RequestCount;

/// A day-by-hour grid of request counts.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    /// Every date from start to end, inclusive. X axis.
    pub days: Vec<NaiveDate>,
    /// `00:00` through `23:00`. Y axis.
    pub hours: Vec<String>,
    /// Counts indexed as `z[hour][day]`, zero where nothing happened.
    pub z: Vec<Vec<i64>>,
}

/// Y-axis labels: `00:00` through `23:00`.
pub fn hour_labels() -> Vec<String> {
    (0..24).map(|h| format!("{h:02}:00")).collect()
}

/// Build the `[hour][day]` grid for an inclusive date range.
///
/// Each UTC hour bucket is converted to the display timezone; the count
/// lands in the local hour and local day-offset cell. Rows outside the
/// range are dropped. Counts are accumulated, not assigned: around a
/// daylight-saving fall-back two distinct UTC hours map to the same local
/// cell.
pub fn build_grid(start: NaiveDate, end: NaiveDate, tz: Tz, rows: &[RequestCount]) -> HeatmapGrid {
    let num_days = ((end - start).num_days().max(0) as usize) + 1;
    let days: Vec<NaiveDate> = start.iter_days().take(num_days).collect();

    let mut z = vec![vec![0i64; num_days]; 24];
    for row in rows {
        let local = row.hour.with_timezone(&tz);
        let day = (local.date_naive() - start).num_days();
        if (0..num_days as i64).contains(&day) {
            z[local.hour() as usize][day as usize] += row.count;
        }
    }

    HeatmapGrid {
        days,
        hours: hour_labels(),
        z,
    }
}

/// X-axis display range: noon of the day before the range through noon of
/// the last day, so the first and last day columns render centered.
pub fn x_axis_range(start: NaiveDate, end: NaiveDate) -> (String, String) {
    let lower = start - Duration::days(1);
    (
        format!("{} 12:00:00", lower.format("%Y-%m-%d")),
        format!("{} 12:00:00", end.format("%Y-%m-%d")),
    )
}
