//! End-to-end runs over CSV tables on disk: load through the store, then
//! derive stats, series and chat context the way the CLI does.

use groundwater_analytics::extract::{chat_context, extract};
use groundwater_analytics::models::{ExtractionResult, RiskStatus, Suggestion, Trend};
use groundwater_analytics::store::{
    DETAILED_PREDICTIONS_FILE, LOCATIONS_FILE, TEST_PREDICTIONS_FILE,
};
use groundwater_analytics::{sampler, stats, AnalyticsError, TableStore};
use tempfile::TempDir;

const LOCATIONS: &str = "\
location_id,district,block,village,latitude,longitude,rmse,mae,r2,mean_actual,mean_predicted,n_predictions
11,Dadri,Dadri,Atela,28.59,76.27,1.8,1.1,0.93,18.40,18.10,42
12,Charkhi Dadri,Badhra,Jhojhu,28.60,76.10,5.4,4.3,0.41,24.12,22.87,39
13,Hisar,Hansi,Sorkhi,29.10,75.96,2.9,2.7,,14.20,14.05,44
14,Hisar,Barwala,Khedar,29.36,75.91,6.0,4.8,0.20,19.00,17.20,36
";

fn predictions_csv(count: usize) -> String {
    let mut csv = String::from(
        "district,actual_water_level,predicted_water_level,error,absolute_error,squared_error,dataset\n",
    );
    for i in 0..count {
        let district = if i % 2 == 0 { "Hisar" } else { "Charkhi Dadri" };
        let actual = 15.0 + (i % 7) as f64;
        let predicted = actual - 0.5;
        csv.push_str(&format!(
            "{district},{actual},{predicted},-0.5,0.5,0.25,test\n"
        ));
    }
    csv
}

fn store_with_tables() -> (TempDir, TableStore) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(LOCATIONS_FILE), LOCATIONS).unwrap();
    std::fs::write(dir.path().join(TEST_PREDICTIONS_FILE), predictions_csv(100)).unwrap();
    std::fs::write(dir.path().join(DETAILED_PREDICTIONS_FILE), predictions_csv(100)).unwrap();
    let store = TableStore::new(dir.path());
    (dir, store)
}

#[test]
fn dashboard_from_disk() {
    let (_dir, store) = store_with_tables();
    let locations = store.locations().unwrap();
    let test_predictions = store.test_predictions().unwrap();

    let summary = stats::dashboard_stats(&locations, &test_predictions).unwrap();
    assert_eq!(summary.total_districts, 4);
    // RMSE-only counts: 1.8 and 2.9 safe, 5.4 and 6.0 critical.
    assert_eq!(summary.safe_districts, 2);
    assert_eq!(summary.warning_districts, 0);
    assert_eq!(summary.critical_districts, 2);
    assert_eq!(summary.forecast_trend, Trend::Declining);
    assert!(summary.change_rate < 0.0);

    // The joint rule disagrees for Hisar/Hansi (MAE 2.7).
    assert_eq!(locations[2].status(), RiskStatus::Warning);
}

#[test]
fn forecast_and_detail_series() {
    let (_dir, store) = store_with_tables();
    let rows = store.detailed_predictions().unwrap();

    let forecast = sampler::forecast(&rows);
    assert_eq!(forecast.len(), 12);
    assert_eq!(forecast[0].month, "Jan 2024");
    assert_eq!(forecast[11].month, "Nov 2024");

    let locations = store.locations().unwrap();
    let detail = stats::district_detail(&locations, &rows, "HISAR").unwrap();
    assert_eq!(detail.block, "Hansi");
    assert_eq!(detail.metrics.r2, None);
    assert_eq!(detail.time_series.len(), 20);
    assert_eq!(detail.time_series[19].date, "2024-10-12");
}

#[test]
fn chat_context_from_disk() {
    let (_dir, store) = store_with_tables();
    let locations = store.locations().unwrap();
    let known = stats::known_names(&locations);
    assert_eq!(known, vec!["Dadri", "Charkhi Dadri", "Hisar"]);

    let extraction = extract("Can I dig a borewell in Charkhi Dadri?", &known, None).unwrap();
    assert_eq!(extraction, ExtractionResult::Found("Charkhi Dadri".to_string()));

    let context = chat_context(&extraction, &locations);
    assert_eq!(context.suggestion, Suggestion::CriticalWarning);
    assert!(context.context.contains("Location: Jhojhu, Badhra Block"));

    let extraction = extract("Is the water fine?", &known, None).unwrap();
    assert_eq!(chat_context(&extraction, &locations).suggestion, Suggestion::AskForDistrict);
}

#[test]
fn missing_tables_do_not_poison_the_store() {
    let dir = TempDir::new().unwrap();
    let store = TableStore::new(dir.path());

    assert!(matches!(store.locations(), Err(AnalyticsError::DataUnavailable(_))));

    std::fs::write(dir.path().join(LOCATIONS_FILE), LOCATIONS).unwrap();
    assert_eq!(store.locations().unwrap().len(), 4);
}
