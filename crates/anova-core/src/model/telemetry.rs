// ── Telemetry export ──

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use url::Url;

use super::device::DeviceId;
use crate::error::CoreError;

/// Longest range a single export may cover, in days.
pub const MAX_EXPORT_SPAN_DAYS: i64 = 14;
/// How far back the service keeps telemetry, in days.
pub const MAX_EXPORT_AGE_DAYS: i64 = 90;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl ExportRange {
    /// Validate a range relative to `today`.
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::invalid(format!(
                "end date {end} is before start date {start}"
            )));
        }
        if end - start > TimeDelta::days(MAX_EXPORT_SPAN_DAYS) {
            return Err(CoreError::invalid(format!(
                "date range cannot exceed {MAX_EXPORT_SPAN_DAYS} days"
            )));
        }
        if today - start > TimeDelta::days(MAX_EXPORT_AGE_DAYS) {
            return Err(CoreError::invalid(format!(
                "start date cannot be more than {MAX_EXPORT_AGE_DAYS} days in the past"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` strings and validate them.
    pub fn parse(start: &str, end: &str, today: NaiveDate) -> Result<Self, CoreError> {
        Self::new(parse_date(start)?, parse_date(end)?, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub(crate) fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub(crate) fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::invalid(format!("invalid date '{}' (use YYYY-MM-DD)", s.trim())))
}

/// Download links returned by a successful export, in service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryExport {
    pub device: DeviceId,
    pub urls: Vec<Url>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn accepts_valid_range() {
        let range = ExportRange::parse("2026-10-01", "2026-10-14", date("2026-10-16")).unwrap();
        assert_eq!(range.start_param(), "2026-10-01");
        assert_eq!(range.end_param(), "2026-10-14");
    }

    #[test]
    fn single_day_range_is_valid() {
        assert!(ExportRange::parse("2026-10-16", "2026-10-16", date("2026-10-16")).is_ok());
    }

    #[test]
    fn rejects_reversed_range() {
        let err = ExportRange::parse("2026-10-10", "2026-10-01", date("2026-10-16")).unwrap_err();
        assert!(err.to_string().contains("before"));
    }

    #[test]
    fn rejects_span_over_fourteen_days() {
        assert!(ExportRange::parse("2026-10-01", "2026-10-15", date("2026-10-16")).is_ok());
        let err = ExportRange::parse("2026-10-01", "2026-10-16", date("2026-10-16")).unwrap_err();
        assert!(err.to_string().contains("14 days"));
    }

    #[test]
    fn rejects_start_older_than_ninety_days() {
        assert!(ExportRange::parse("2026-07-18", "2026-07-20", date("2026-10-16")).is_ok());
        let err = ExportRange::parse("2026-07-17", "2026-07-20", date("2026-10-16")).unwrap_err();
        assert!(err.to_string().contains("90 days"));
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["2026/10/01", "yesterday", "2026-13-01", ""] {
            assert!(
                matches!(
                    ExportRange::parse(bad, "2026-10-02", date("2026-10-16")),
                    Err(CoreError::InvalidParameters { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
