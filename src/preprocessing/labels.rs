//! Ground-truth delay labels from scheduled and actual timestamps

use crate::error::{DelayError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use polars::prelude::*;

/// Scheduled date and time of the flight
pub const FECHA_I: &str = "Fecha-I";
/// Actual date and time of operation
pub const FECHA_O: &str = "Fecha-O";

/// A flight counts as delayed strictly above this many minutes
pub const DELAY_THRESHOLD_MINUTES: f64 = 15.0;

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Label every row 1 when `Fecha-O - Fecha-I` exceeds 15 minutes, else 0.
pub fn delay_labels(data: &DataFrame) -> Result<Vec<i32>> {
    let scheduled = timestamps(data, FECHA_I)?;
    let actual = timestamps(data, FECHA_O)?;

    Ok(scheduled
        .iter()
        .zip(actual.iter())
        .map(|(scheduled, actual)| {
            i32::from(elapsed_minutes(*actual - *scheduled) > DELAY_THRESHOLD_MINUTES)
        })
        .collect())
}

/// Minutes between two timestamps at nanosecond precision, falling back to
/// milliseconds for spans too wide for an `i64` of nanoseconds.
fn elapsed_minutes(delta: Duration) -> f64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 60_000_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// [`delay_labels`] as an `Int32` column called `name`
pub fn delay_label_column(data: &DataFrame, name: &str) -> Result<Column> {
    let labels = delay_labels(data)?;
    Ok(Series::new(name.into(), labels).into())
}

/// Parse a timestamp the way the raw flight exports write them
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|ts| ts.naive_utc())
        })
}

fn timestamps(data: &DataFrame, name: &str) -> Result<Vec<NaiveDateTime>> {
    let column = data
        .column(name)
        .map_err(|_| DelayError::MissingColumn(name.to_string()))?;

    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value {
                Some(text) => parse_timestamp(text).ok_or_else(|| invalid(name, row, text)),
                None => Err(invalid(name, row, "null")),
            })
            .collect(),
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = column.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value
                        .and_then(|v| from_epoch(v, unit))
                        .ok_or_else(|| invalid(name, row, "null"))
                })
                .collect()
        }
        other => Err(DelayError::InvalidInput(format!(
            "column {} has type {}, expected timestamps",
            name, other
        ))),
    }
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Nanoseconds => value.div_euclid(1_000),
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value.checked_mul(1_000)?,
    };
    DateTime::<Utc>::from_timestamp_micros(micros).map(|ts| ts.naive_utc())
}

fn invalid(column: &str, row: usize, value: &str) -> DelayError {
    DelayError::InvalidTimestamp {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flights(scheduled: &[&str], actual: &[&str]) -> DataFrame {
        df!(FECHA_I => scheduled, FECHA_O => actual).unwrap()
    }

    #[test]
    fn test_threshold_is_strict() {
        let data = flights(
            &["2017-01-01 23:30:00", "2017-01-01 23:30:00", "2017-01-01 23:30:00"],
            &["2017-01-01 23:44:00", "2017-01-01 23:46:00", "2017-01-01 23:45:00"],
        );
        assert_eq!(delay_labels(&data).unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn test_threshold_keeps_sub_millisecond_precision() {
        let data = flights(
            &["2017-01-01 10:00:00", "2017-01-01 10:00:00", "2017-01-01 10:00:00"],
            &["2017-01-01 10:15:00.000500", "2017-01-01 10:15:00.000000", "2017-01-01 10:14:59.999999"],
        );
        assert_eq!(delay_labels(&data).unwrap(), vec![1, 0, 0]);
    }

    #[test]
    fn test_delay_across_midnight() {
        let data = flights(&["2017-01-31 23:55:00"], &["2017-02-01 00:20:00"]);
        assert_eq!(delay_labels(&data).unwrap(), vec![1]);
    }

    #[test]
    fn test_early_departure_is_on_time() {
        let data = flights(&["2017-03-10 08:00:00"], &["2017-03-10 07:50:00"]);
        assert_eq!(delay_labels(&data).unwrap(), vec![0]);
    }

    #[test]
    fn test_fractional_seconds_count() {
        let data = flights(&["2017-01-01 10:00:00"], &["2017-01-01 10:15:00.500"]);
        assert_eq!(delay_labels(&data).unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_column() {
        let data = df!(FECHA_I => &["2017-01-01 10:00:00"]).unwrap();
        let err = delay_labels(&data).unwrap_err();
        assert!(matches!(err, DelayError::MissingColumn(ref c) if c == FECHA_O));
    }

    #[test]
    fn test_unparseable_timestamp() {
        let data = flights(&["2017-01-01 10:00:00", "not a date"], &["2017-01-01 10:05:00", "2017-01-01 10:05:00"]);
        let err = delay_labels(&data).unwrap_err();
        assert!(matches!(err, DelayError::InvalidTimestamp { row: 1, .. }));
    }

    #[test]
    fn test_datetime_columns() {
        let minute = 60_000i64;
        let scheduled = Series::new(FECHA_I.into(), vec![0i64, 0])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let actual = Series::new(FECHA_O.into(), vec![16 * minute, 14 * minute])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let data = DataFrame::new(vec![scheduled.into(), actual.into()]).unwrap();

        assert_eq!(delay_labels(&data).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_label_column_name() {
        let data = flights(&["2017-01-01 10:00:00"], &["2017-01-01 10:30:00"]);
        let column = delay_label_column(&data, "delay").unwrap();
        assert_eq!(column.name().as_str(), "delay");
        assert_eq!(column.len(), 1);
    }

    #[test]
    fn test_parse_formats() {
        assert!(parse_timestamp("2017-01-01 23:30:00").is_some());
        assert!(parse_timestamp("2017-01-01T23:30:00").is_some());
        assert!(parse_timestamp("2017-01-01 23:30").is_some());
        assert!(parse_timestamp("2017-01-01T23:30:00Z").is_some());
        assert!(parse_timestamp("01/01/2017").is_none());
    }
}
