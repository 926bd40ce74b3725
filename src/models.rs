use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One monitored well location and its precomputed prediction-quality metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub location_id: i64,
    pub district: String,
    pub block: String,
    pub village: String,
    pub lat: f64,
    pub lng: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: Option<f64>,
    pub mean_actual: f64,
    pub mean_predicted: f64,
    pub n_predictions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Train,
    Validation,
    Test,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Train => "train",
            Dataset::Validation => "validation",
            Dataset::Test => "test",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dataset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Dataset::Train),
            "validation" => Ok(Dataset::Validation),
            "test" => Ok(Dataset::Test),
            other => Err(format!("unknown dataset '{other}'")),
        }
    }
}

/// A single actual-vs-predicted observation, kept in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub district: String,
    pub actual_level: f64,
    pub predicted_level: f64,
    pub error: Option<f64>,
    pub absolute_error: Option<f64>,
    pub squared_error: Option<f64>,
    pub dataset: Option<Dataset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetricsRecord {
    pub dataset: String,
    pub rmse: f64,
    pub mae: f64,
    pub r2_score: f64,
    pub n_samples: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatisticRecord {
    pub metric: String,
    pub train: Option<f64>,
    pub validation: Option<f64>,
    pub test: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskStatus {
    Safe,
    Warning,
    Critical,
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskStatus::Safe => write!(f, "Safe"),
            RiskStatus::Warning => write!(f, "Warning"),
            RiskStatus::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub avg_level: f64,
    pub avg_predicted_level: f64,
    pub critical_districts: usize,
    pub warning_districts: usize,
    pub safe_districts: usize,
    pub total_districts: usize,
    pub forecast_trend: Trend,
    pub rainfall_index: f64,
    pub change_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub month: String,
    pub historical: f64,
    pub predicted: f64,
    pub district: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub actual: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummary {
    pub id: String,
    pub name: String,
    pub block: String,
    pub village: String,
    pub state: String,
    pub level: f64,
    pub predicted_level: f64,
    pub status: RiskStatus,
    pub lat: f64,
    pub lng: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: Option<f64>,
    pub n_predictions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictMetrics {
    pub mean_actual: f64,
    pub mean_predicted: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: Option<f64>,
    pub n_predictions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDetail {
    pub district: String,
    pub block: String,
    pub village: String,
    pub location: Coordinates,
    pub metrics: DistrictMetrics,
    pub status: RiskStatus,
    pub advisory: String,
    pub time_series: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetricsSummary {
    pub dataset: String,
    pub rmse: f64,
    pub mae: f64,
    pub r2_score: f64,
    pub n_samples: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitValues {
    pub train: Option<f64>,
    pub validation: Option<f64>,
    pub test: Option<f64>,
}

pub type SummaryStatistics = BTreeMap<String, SplitValues>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    pub actual: f64,
    pub predicted: f64,
    pub error: Option<f64>,
    pub absolute_error: Option<f64>,
    pub squared_error: Option<f64>,
    pub dataset: Option<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionPage {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub predictions: Vec<PredictionRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Found(String),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    AskForDistrict,
    DistrictNotFound,
    CriticalWarning,
    Warning,
    SafeToProceed,
}

/// Rounded per-district figures attached to a chat context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSnapshot {
    pub district: String,
    pub block: String,
    pub village: String,
    pub mean_actual: f64,
    pub mean_predicted: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: Option<f64>,
    pub n_predictions: u64,
    pub status: RiskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatContext {
    pub district_found: Option<String>,
    pub district_data: Option<DistrictSnapshot>,
    pub context: String,
    pub suggestion: Suggestion,
}
