use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::models::{ForecastPoint, PredictionRecord, TimeSeriesPoint};
use crate::stats::round_to;

pub const FORECAST_POINTS: usize = 12;
pub const DISTRICT_SERIES_POINTS: usize = 20;

/// Synthetic calendar used to label sampled rows, which carry no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabels {
    /// 30-day steps from Jan 2024, labelled like "Mar 2024".
    Monthly,
    /// 15-day steps from 2024-01-01, labelled as ISO dates.
    Fortnightly,
}

impl DateLabels {
    fn step_days(&self) -> i64 {
        match self {
            DateLabels::Monthly => 30,
            DateLabels::Fortnightly => 15,
        }
    }

    fn format(&self) -> &'static str {
        match self {
            DateLabels::Monthly => "%b %Y",
            DateLabels::Fortnightly => "%Y-%m-%d",
        }
    }

    pub fn label(&self, position: usize) -> String {
        let offset = Duration::days(self.step_days() * position as i64);
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|base| base.checked_add_signed(offset))
            .map(|date| date.format(self.format()).to_string())
            .unwrap_or_default()
    }
}

/// Picks `n` evenly spaced indices across `0..len`, inclusive of both ends,
/// rounding each interpolated position to the nearest index.
pub fn sample_indices(len: usize, n: usize) -> Result<Vec<usize>> {
    if len > 0 && n > len {
        return Err(AnalyticsError::InvalidArgument(format!(
            "cannot sample {n} points from {len} rows"
        )));
    }
    Ok(spread_indices(len, n))
}

/// Same spacing as `sample_indices` but lets `n` exceed `len`, repeating
/// rows to fill the series.
fn spread_indices(len: usize, n: usize) -> Vec<usize> {
    match (len, n) {
        (0, _) | (_, 0) => Vec::new(),
        (_, 1) => vec![0],
        _ => {
            let step = (len - 1) as f64 / (n - 1) as f64;
            (0..n)
                .map(|i| ((i as f64 * step).round() as usize).min(len - 1))
                .collect()
        }
    }
}

/// Selected rows in their stored order, each paired with its sample position.
fn pick<'a>(
    rows: &'a [PredictionRecord],
    indices: Vec<usize>,
) -> impl Iterator<Item = (usize, &'a PredictionRecord)> {
    debug!(rows = rows.len(), n = indices.len(), "sampling rows");
    indices.into_iter().map(move |index| &rows[index]).enumerate()
}

pub fn sample(
    rows: &[PredictionRecord],
    n: usize,
    labels: DateLabels,
) -> Result<Vec<TimeSeriesPoint>> {
    let indices = sample_indices(rows.len(), n)?;
    Ok(pick(rows, indices)
        .map(|(position, row)| TimeSeriesPoint {
            date: labels.label(position),
            actual: round_to(row.actual_level, 2),
            predicted: round_to(row.predicted_level, 2),
        })
        .collect())
}

/// Dashboard chart series. Always twelve points over a non-empty table,
/// repeating rows when there are fewer than twelve.
pub fn forecast(rows: &[PredictionRecord]) -> Vec<ForecastPoint> {
    pick(rows, spread_indices(rows.len(), FORECAST_POINTS))
        .map(|(position, row)| ForecastPoint {
            month: DateLabels::Monthly.label(position),
            historical: round_to(row.actual_level, 2),
            predicted: round_to(row.predicted_level, 2),
            district: row.district.clone(),
        })
        .collect()
}

/// Detail series, shortened to the row count when the district has fewer
/// than twenty predictions.
pub fn district_series(rows: &[PredictionRecord]) -> Vec<TimeSeriesPoint> {
    let n = DISTRICT_SERIES_POINTS.min(rows.len());
    sample(rows, n, DateLabels::Fortnightly).unwrap_or_default()
}
