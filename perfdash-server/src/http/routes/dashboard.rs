//! Server-rendered dashboard pages.
//!
//! `GET|POST /hourly_load` renders the request-count heatmap for a date
//! range; `GET /` is the endpoint overview table. Both are mounted under
//! the configured CUSTOM_LINK prefix.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::db::repos::{EndpointAccess, MeasurementRepo, RuleRepo};
use crate::heatmap;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::plot;

const TITLE: &str = "Hourly load of the number of requests";

const AXES_INFO: &str = "The X-axis presents a number of days. \
    The Y-axis presents every hour of the day.";

const CONTENT_INFO: &str = "The color of the cell presents the number of requests \
    that the application received in a single hour. The darker the cell, the more \
    requests it has processed. This can be used to find the moment of the day \
    where the application processes the most requests.";

/// Longest selectable range; keeps the grid a sane size.
const MAX_RANGE_DAYS: i64 = 366;

/// Date-range selection, from query parameters (GET) or a form body (POST).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeForm {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub timezone: Option<String>,
}

/// Resolved date range in a display timezone.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub tz: Tz,
}

impl DateRangeForm {
    /// Apply defaults (UTC, the 7 days ending today) and validate.
    pub fn resolve(self) -> Result<DateRange, ApiError> {
        let tz: Tz = match self.timezone {
            Some(name) => name
                .parse()
                .map_err(|_| ApiError::bad_request(format!("unknown timezone '{name}'")))?,
            None => chrono_tz::UTC,
        };

        let end = self
            .end_date
            .unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
        let start = self.start_date.unwrap_or(end - Duration::days(6));

        if start > end {
            return Err(ApiError::bad_request(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        if (end - start).num_days() >= MAX_RANGE_DAYS {
            return Err(ApiError::bad_request(format!(
                "date range is limited to {MAX_RANGE_DAYS} days"
            )));
        }

        Ok(DateRange { start, end, tz })
    }
}

impl DateRange {
    /// UTC instants covering the local days `[start, end]`: from local
    /// midnight of `start` up to (exclusive) local midnight after `end`.
    pub fn utc_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            local_midnight_utc(self.start, self.tz),
            local_midnight_utc(self.end + Duration::days(1), self.tz),
        )
    }
}

/// UTC instant of local midnight on `date` in `tz`.
///
/// Around DST transitions midnight can be ambiguous (take the earlier) or
/// skipped entirely (the day starts an hour later).
fn local_midnight_utc(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

async fn hourly_load_get(
    State(state): State<Arc<AppState>>,
    Query(form): Query<DateRangeForm>,
) -> Result<Html<String>, ApiError> {
    hourly_load(state, form).await
}

async fn hourly_load_post(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DateRangeForm>,
) -> Result<Html<String>, ApiError> {
    hourly_load(state, form).await
}

/// Query per-hour request counts and render them as a heatmap page.
async fn hourly_load(state: Arc<AppState>, form: DateRangeForm) -> Result<Html<String>, ApiError> {
    let range = form.resolve()?;
    let (from, to) = range.utc_window();

    let rows = MeasurementRepo::new(&state.pool)
        .request_counts(None, from, to)
        .await?;

    let grid = heatmap::build_grid(range.start, range.end, range.tz, &rows);
    let figure = plot::heatmap_figure(&grid, heatmap::x_axis_range(range.start, range.end));

    let information = format!("{AXES_INFO} {CONTENT_INFO}");
    Ok(Html(plot::render_page(TITLE, &information, &figure)))
}

/// GET / - overview of monitored endpoints and their last accessed times.
async fn overview(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let rows = RuleRepo::new(&state.pool).last_accessed_times().await?;
    Ok(Html(overview_page(&rows)))
}

fn overview_page(rows: &[EndpointAccess]) -> String {
    let mut body = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Monitored endpoints</title>\n</head>\n<body>\n\
         <h1>Monitored endpoints</h1>\n<table>\n\
         <tr><th>Endpoint</th><th>Monitoring</th><th>Last accessed</th></tr>\n",
    );
    for row in rows {
        let last_accessed = row
            .last_accessed
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            plot::escape(&row.endpoint),
            if row.monitor { "on" } else { "off" },
            last_accessed,
        ));
    }
    body.push_str("</table>\n</body>\n</html>\n");
    body
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(overview))
        .route("/hourly_load", get(hourly_load_get).post(hourly_load_post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn resolve_defaults_to_a_week_in_utc() {
        let range = DateRangeForm::default().resolve().unwrap();
        assert_eq!(range.tz, chrono_tz::UTC);
        assert_eq!((range.end - range.start).num_days(), 6);
    }

    #[test]
    fn resolve_rejects_unknown_timezone() {
        let form = DateRangeForm {
            timezone: Some("Mars/Olympus".to_string()),
            ..Default::default()
        };
        assert!(form.resolve().is_err());
    }

    #[test]
    fn resolve_rejects_inverted_range() {
        let form = DateRangeForm {
            start_date: Some(date(2024, 6, 10)),
            end_date: Some(date(2024, 6, 1)),
            timezone: None,
        };
        assert!(form.resolve().is_err());
    }

    #[test]
    fn resolve_rejects_oversized_range() {
        let form = DateRangeForm {
            start_date: Some(date(2020, 1, 1)),
            end_date: Some(date(2024, 1, 1)),
            timezone: None,
        };
        assert!(form.resolve().is_err());
    }

    #[test]
    fn utc_window_shifts_with_timezone() {
        let range = DateRange {
            start: date(2024, 6, 15),
            end: date(2024, 6, 15),
            tz: New_York,
        };
        let (from, to) = range.utc_window();
        // New York midnight is 04:00 UTC during EDT
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 6, 15, 4, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 6, 16, 4, 0, 0).unwrap());
    }

    #[test]
    fn utc_window_handles_dst_transition_day() {
        // 2024-03-10 has 23 local hours in New York
        let range = DateRange {
            start: date(2024, 3, 10),
            end: date(2024, 3, 10),
            tz: New_York,
        };
        let (from, to) = range.utc_window();
        assert_eq!((to - from).num_hours(), 23);
    }

    #[test]
    fn overview_page_lists_endpoints_and_escapes() {
        let rows = vec![
            EndpointAccess {
                endpoint: "/users/<id>".to_string(),
                monitor: true,
                last_accessed: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
            },
            EndpointAccess {
                endpoint: "/orders".to_string(),
                monitor: false,
                last_accessed: None,
            },
        ];

        let page = overview_page(&rows);
        assert!(page.contains("/users/&lt;id&gt;"));
        assert!(page.contains("2024-06-01 12:00:00"));
        assert!(page.contains("never"));
        assert!(page.contains("<td>off</td>"));
    }
}
