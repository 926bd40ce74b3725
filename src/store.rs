use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::models::{
    Dataset, LocationRecord, ModelMetricsRecord, PredictionRecord, SummaryStatisticRecord,
};

pub const LOCATIONS_FILE: &str = "district_wise_performance.csv";
pub const TEST_PREDICTIONS_FILE: &str = "test_predictions.csv";
pub const DETAILED_PREDICTIONS_FILE: &str = "test_predictions_detailed.csv";
pub const ALL_PREDICTIONS_FILE: &str = "all_predictions.csv";
pub const MODEL_METRICS_FILE: &str = "model_performance_metrics.csv";
pub const SUMMARY_STATISTICS_FILE: &str = "prediction_summary_statistics.csv";

const HEALTH_FILES: [&str; 3] = [TEST_PREDICTIONS_FILE, LOCATIONS_FILE, MODEL_METRICS_FILE];

/// A typed table row with validated construction from its raw CSV shape.
pub trait TableRow: Sized + Send + Sync + 'static {
    type Raw: DeserializeOwned;

    fn validate(raw: Self::Raw) -> std::result::Result<Self, String>;
}

/// Load-once cache of the prediction tables under one data directory.
///
/// Tables are handed out as `Arc` snapshots, so a caller keeps a stable view
/// for as long as it holds the handle.
pub struct TableStore {
    data_dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub data_files: BTreeMap<String, bool>,
    pub timestamp: String,
}

impl TableStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn locations(&self) -> Result<Arc<Vec<LocationRecord>>> {
        self.get(LOCATIONS_FILE)
    }

    pub fn test_predictions(&self) -> Result<Arc<Vec<PredictionRecord>>> {
        self.get(TEST_PREDICTIONS_FILE)
    }

    pub fn detailed_predictions(&self) -> Result<Arc<Vec<PredictionRecord>>> {
        self.get(DETAILED_PREDICTIONS_FILE)
    }

    /// Per-split predictions live in their own file; without a split the
    /// combined table is returned.
    pub fn predictions(&self, dataset: Option<Dataset>) -> Result<Arc<Vec<PredictionRecord>>> {
        match dataset {
            Some(dataset) => self.get(&format!("{dataset}_predictions.csv")),
            None => self.get(ALL_PREDICTIONS_FILE),
        }
    }

    pub fn model_metrics(&self) -> Result<Arc<Vec<ModelMetricsRecord>>> {
        self.get(MODEL_METRICS_FILE)
    }

    pub fn summary_statistics(&self) -> Result<Arc<Vec<SummaryStatisticRecord>>> {
        self.get(SUMMARY_STATISTICS_FILE)
    }

    /// Header names of a table file, read straight from disk.
    pub fn columns(&self, file: &str) -> Result<Vec<String>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "file {file} not found in {}",
                self.data_dir.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        Ok(reader.headers()?.iter().map(str::to_string).collect())
    }

    /// Reports which core files exist without loading them.
    pub fn health(&self) -> HealthReport {
        let data_files = HEALTH_FILES
            .iter()
            .map(|file| (file.to_string(), self.data_dir.join(file).exists()))
            .collect();

        HealthReport {
            status: "healthy".to_string(),
            data_files,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn get<T: TableRow>(&self, file: &str) -> Result<Arc<Vec<T>>> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(table) = cache.get(file) {
            debug!(file, "table cache hit");
            return Arc::clone(table).downcast::<Vec<T>>().map_err(|_| {
                AnalyticsError::InvalidArgument(format!(
                    "{file} is cached with a different row type"
                ))
            });
        }

        let rows = Arc::new(self.read_rows::<T>(file)?);
        info!(file, rows = rows.len(), "loaded table");
        cache.insert(file.to_string(), rows.clone() as Arc<dyn Any + Send + Sync>);
        Ok(rows)
    }

    fn read_rows<T: TableRow>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Err(AnalyticsError::DataUnavailable(format!(
                "file {file} not found in {}",
                self.data_dir.display()
            )));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();

        // Line 1 is the header.
        for (index, result) in reader.deserialize::<T::Raw>().enumerate() {
            let line = index as u64 + 2;
            let raw = result.map_err(|err| AnalyticsError::Malformed {
                file: file.to_string(),
                line: err.position().map(|pos| pos.line()).unwrap_or(line),
                reason: err.to_string(),
            })?;
            let row = T::validate(raw).map_err(|reason| AnalyticsError::Malformed {
                file: file.to_string(),
                line,
                reason,
            })?;
            rows.push(row);
        }

        Ok(rows)
    }
}

fn non_negative(name: &str, value: f64) -> std::result::Result<f64, String> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{name} must be a finite non-negative number, got {value}"))
    }
}

fn finite(name: &str, value: f64) -> std::result::Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{name} must be finite, got {value}"))
    }
}

/// NaN and infinities in optional columns mean "no value".
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
pub struct LocationRow {
    location_id: i64,
    district: String,
    block: String,
    village: String,
    latitude: f64,
    longitude: f64,
    rmse: f64,
    mae: f64,
    r2: Option<f64>,
    mean_actual: f64,
    mean_predicted: f64,
    n_predictions: u64,
}

impl TableRow for LocationRecord {
    type Raw = LocationRow;

    fn validate(raw: LocationRow) -> std::result::Result<Self, String> {
        let district = raw.district.trim().to_string();
        if district.is_empty() {
            return Err("district must not be empty".to_string());
        }

        Ok(LocationRecord {
            location_id: raw.location_id,
            district,
            block: raw.block,
            village: raw.village,
            lat: finite("latitude", raw.latitude)?,
            lng: finite("longitude", raw.longitude)?,
            rmse: non_negative("rmse", raw.rmse)?,
            mae: non_negative("mae", raw.mae)?,
            r2: present(raw.r2),
            mean_actual: finite("mean_actual", raw.mean_actual)?,
            mean_predicted: finite("mean_predicted", raw.mean_predicted)?,
            n_predictions: raw.n_predictions,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictionRow {
    #[serde(default)]
    district: String,
    actual_water_level: f64,
    predicted_water_level: f64,
    #[serde(default)]
    error: Option<f64>,
    #[serde(default)]
    absolute_error: Option<f64>,
    #[serde(default)]
    squared_error: Option<f64>,
    #[serde(default)]
    dataset: Option<String>,
}

impl TableRow for PredictionRecord {
    type Raw = PredictionRow;

    fn validate(raw: PredictionRow) -> std::result::Result<Self, String> {
        let dataset = match raw.dataset.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tag) => Some(tag.parse::<Dataset>()?),
        };

        Ok(PredictionRecord {
            district: raw.district,
            actual_level: finite("actual_water_level", raw.actual_water_level)?,
            predicted_level: finite("predicted_water_level", raw.predicted_water_level)?,
            error: present(raw.error),
            absolute_error: present(raw.absolute_error),
            squared_error: present(raw.squared_error),
            dataset,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelMetricsRow {
    dataset: String,
    rmse: f64,
    mae: f64,
    r2_score: f64,
    n_samples: u64,
}

impl TableRow for ModelMetricsRecord {
    type Raw = ModelMetricsRow;

    fn validate(raw: ModelMetricsRow) -> std::result::Result<Self, String> {
        Ok(ModelMetricsRecord {
            dataset: raw.dataset,
            rmse: non_negative("rmse", raw.rmse)?,
            mae: non_negative("mae", raw.mae)?,
            r2_score: finite("r2_score", raw.r2_score)?,
            n_samples: raw.n_samples,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryStatisticRow {
    metric: String,
    train: Option<f64>,
    validation: Option<f64>,
    test: Option<f64>,
}

impl TableRow for SummaryStatisticRecord {
    type Raw = SummaryStatisticRow;

    fn validate(raw: SummaryStatisticRow) -> std::result::Result<Self, String> {
        if raw.metric.trim().is_empty() {
            return Err("metric must not be empty".to_string());
        }

        Ok(SummaryStatisticRecord {
            metric: raw.metric,
            train: present(raw.train),
            validation: present(raw.validation),
            test: present(raw.test),
        })
    }
}
