use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::{
    Coordinates, DashboardSummary, DistrictDetail, DistrictMetrics, DistrictSummary,
    LocationRecord, ModelMetricsRecord, ModelMetricsSummary, PredictionPage, PredictionRecord,
    PredictionRow, RiskStatus, SplitValues, SummaryStatisticRecord, SummaryStatistics, Trend,
};
use crate::risk;
use crate::sampler;

/// Stand-in for a regional rainfall feed, which is not modeled.
pub const RAINFALL_INDEX: f64 = 78.5;

pub const STATE: &str = "Haryana";

/// Halves go to the even neighbour: 0.125 -> 0.12, 0.375 -> 0.38.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

pub fn dashboard_stats(
    locations: &[LocationRecord],
    test_predictions: &[PredictionRecord],
) -> Result<DashboardSummary> {
    let avg_actual = mean(test_predictions.iter().map(|p| p.actual_level))
        .ok_or_else(|| AnalyticsError::EmptyDataset("test predictions table is empty".into()))?;
    let avg_predicted = mean(test_predictions.iter().map(|p| p.predicted_level))
        .ok_or_else(|| AnalyticsError::EmptyDataset("test predictions table is empty".into()))?;

    if avg_actual == 0.0 {
        return Err(AnalyticsError::DivideByZero(
            "average actual water level is zero, change rate is undefined".into(),
        ));
    }

    // Counts use RMSE alone; per-location status uses RMSE and MAE.
    let (mut critical, mut warning, mut safe) = (0, 0, 0);
    for location in locations {
        match risk::rmse_band(location.rmse) {
            RiskStatus::Critical => critical += 1,
            RiskStatus::Warning => warning += 1,
            RiskStatus::Safe => safe += 1,
        }
    }

    let forecast_trend = if avg_predicted < avg_actual {
        Trend::Declining
    } else {
        Trend::Improving
    };
    let change_rate = (avg_predicted - avg_actual) / avg_actual * 100.0;

    debug!(avg_actual, avg_predicted, change_rate, "computed dashboard stats");

    Ok(DashboardSummary {
        avg_level: round_to(avg_actual, 2),
        avg_predicted_level: round_to(avg_predicted, 2),
        critical_districts: critical,
        warning_districts: warning,
        safe_districts: safe,
        total_districts: locations.len(),
        forecast_trend,
        rainfall_index: RAINFALL_INDEX,
        change_rate: round_to(change_rate, 2),
    })
}

/// Case-insensitive exact match on district; the first record in table order
/// wins when several share the name.
pub fn find_location<'a>(locations: &'a [LocationRecord], name: &str) -> Option<&'a LocationRecord> {
    let needle = name.trim().to_lowercase();
    locations
        .iter()
        .find(|location| location.district.to_lowercase() == needle)
}

pub fn district_detail(
    locations: &[LocationRecord],
    detailed_predictions: &[PredictionRecord],
    name: &str,
) -> Result<DistrictDetail> {
    let Some(location) = find_location(locations, name) else {
        warn!(district = name, "district lookup missed");
        return Err(AnalyticsError::NotFound(format!("District {name} not found")));
    };

    let needle = name.trim().to_lowercase();
    let district_rows: Vec<PredictionRecord> = detailed_predictions
        .iter()
        .filter(|p| p.district.to_lowercase() == needle)
        .cloned()
        .collect();

    let status = location.status();

    Ok(DistrictDetail {
        district: location.district.clone(),
        block: location.block.clone(),
        village: location.village.clone(),
        location: Coordinates {
            lat: location.lat,
            lng: location.lng,
        },
        metrics: DistrictMetrics {
            mean_actual: round_to(location.mean_actual, 2),
            mean_predicted: round_to(location.mean_predicted, 2),
            rmse: round_to(location.rmse, 2),
            mae: round_to(location.mae, 2),
            r2: location.r2.map(|r2| round_to(r2, 3)),
            n_predictions: location.n_predictions,
        },
        status,
        advisory: status.advisory().to_string(),
        time_series: sampler::district_series(&district_rows),
    })
}

pub fn district_summaries(locations: &[LocationRecord], limit: Option<usize>) -> Vec<DistrictSummary> {
    let take = limit.unwrap_or(locations.len());
    locations
        .iter()
        .take(take)
        .map(|location| DistrictSummary {
            id: location.location_id.to_string(),
            name: location.district.clone(),
            block: location.block.clone(),
            village: location.village.clone(),
            state: STATE.to_string(),
            level: location.mean_actual,
            predicted_level: location.mean_predicted,
            status: location.status(),
            lat: location.lat,
            lng: location.lng,
            rmse: location.rmse,
            mae: location.mae,
            r2: location.r2,
            n_predictions: location.n_predictions,
        })
        .collect()
}

/// Sorted, de-duplicated district names.
pub fn district_names(locations: &[LocationRecord]) -> Vec<String> {
    locations
        .iter()
        .map(|location| location.district.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Unique district names in order of first appearance.
pub fn known_names(locations: &[LocationRecord]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    locations
        .iter()
        .filter(|location| seen.insert(location.district.as_str()))
        .map(|location| location.district.clone())
        .collect()
}

pub fn model_metrics(rows: &[ModelMetricsRecord]) -> Vec<ModelMetricsSummary> {
    rows.iter()
        .map(|row| ModelMetricsSummary {
            dataset: row.dataset.clone(),
            rmse: round_to(row.rmse, 4),
            mae: round_to(row.mae, 4),
            r2_score: round_to(row.r2_score, 4),
            n_samples: row.n_samples,
        })
        .collect()
}

/// "Mean Actual Water Level (m)" becomes "mean_actual_water_level_m".
pub fn metric_key(metric: &str) -> String {
    metric
        .replace(' ', "_")
        .replace(['(', ')'], "")
        .replace('²', "2")
        .to_lowercase()
}

pub fn summary_statistics(rows: &[SummaryStatisticRecord]) -> SummaryStatistics {
    rows.iter()
        .map(|row| {
            (
                metric_key(&row.metric),
                SplitValues {
                    train: row.train,
                    validation: row.validation,
                    test: row.test,
                },
            )
        })
        .collect()
}

pub fn paginate(rows: &[PredictionRecord], offset: usize, limit: usize) -> PredictionPage {
    let predictions = rows
        .iter()
        .skip(offset)
        .take(limit)
        .map(|row| PredictionRow {
            actual: round_to(row.actual_level, 2),
            predicted: round_to(row.predicted_level, 2),
            error: row.error.map(|v| round_to(v, 2)),
            absolute_error: row.absolute_error.map(|v| round_to(v, 2)),
            squared_error: row.squared_error.map(|v| round_to(v, 2)),
            dataset: row.dataset,
        })
        .collect();

    PredictionPage {
        total: rows.len(),
        limit,
        offset,
        predictions,
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub id: String,
    pub name: String,
    pub block: String,
    pub village: String,
    pub level: f64,
    pub predicted_level: f64,
    pub status: RiskStatus,
    pub rmse: f64,
    pub mae: f64,
}

/// Point features with stored coordinates passed through as `[lng, lat]`.
pub fn geojson(locations: &[LocationRecord]) -> FeatureCollection {
    let features = locations
        .iter()
        .map(|location| Feature {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: [location.lng, location.lat],
            },
            properties: FeatureProperties {
                id: location.location_id.to_string(),
                name: location.district.clone(),
                block: location.block.clone(),
                village: location.village.clone(),
                level: round_to(location.mean_actual, 2),
                predicted_level: round_to(location.mean_predicted, 2),
                status: location.status(),
                rmse: round_to(location.rmse, 2),
                mae: round_to(location.mae, 2),
            },
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}
