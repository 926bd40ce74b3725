use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::DistrictDetail;

pub fn build_report(detail: &DistrictDetail, generated_on: NaiveDate) -> String {
    let mut output = String::new();
    let metrics = &detail.metrics;

    let _ = writeln!(output, "# Groundwater Analysis Report");
    let _ = writeln!(
        output,
        "{} District ({} Block, {}), generated {}",
        detail.district, detail.block, detail.village, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Current Status");
    let _ = writeln!(output, "| Metric | Value |");
    let _ = writeln!(output, "| --- | --- |");
    let _ = writeln!(output, "| Water Depth | {:.2} m |", metrics.mean_actual);
    let _ = writeln!(output, "| Predicted Depth | {:.2} m |", metrics.mean_predicted);
    let _ = writeln!(output, "| Risk Level | {} |", detail.status);
    let _ = writeln!(output, "| Prediction Accuracy (RMSE) | {:.2} m |", metrics.rmse);
    let _ = writeln!(output, "| Mean Absolute Error | {:.2} m |", metrics.mae);
    match metrics.r2 {
        Some(r2) => {
            let _ = writeln!(output, "| R² Score | {:.3} |", r2);
        }
        None => {
            let _ = writeln!(output, "| R² Score | N/A |");
        }
    }
    let _ = writeln!(output, "| Predictions | {} |", metrics.n_predictions);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Advisory");
    let _ = writeln!(output, "{}", detail.advisory);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Predictions");

    if detail.time_series.is_empty() {
        let _ = writeln!(output, "No prediction records for this district.");
    } else {
        let _ = writeln!(output, "| Date | Actual (m) | Predicted (m) | Difference (m) |");
        let _ = writeln!(output, "| --- | --- | --- | --- |");
        for point in detail.time_series.iter() {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {:+.2} |",
                point.date,
                point.actual,
                point.predicted,
                point.predicted - point.actual
            );
        }
    }

    output
}
