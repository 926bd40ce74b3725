use crate::error::{AnalyticsError, Result};
use crate::models::{LocationRecord, RiskStatus, Suggestion};

pub const CRITICAL_RMSE: f64 = 5.0;
pub const CRITICAL_MAE: f64 = 4.0;
pub const WARNING_RMSE: f64 = 3.0;
pub const WARNING_MAE: f64 = 2.5;

/// Classifies a location from its error metrics, rejecting values the loader
/// would never have accepted.
pub fn classify(rmse: f64, mae: f64) -> Result<RiskStatus> {
    for (name, value) in [("rmse", rmse), ("mae", mae)] {
        if value.is_nan() || value < 0.0 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
    }
    Ok(classify_unchecked(rmse, mae))
}

/// Either metric alone can escalate the status. Thresholds are exclusive.
pub fn classify_unchecked(rmse: f64, mae: f64) -> RiskStatus {
    if rmse > CRITICAL_RMSE || mae > CRITICAL_MAE {
        RiskStatus::Critical
    } else if rmse > WARNING_RMSE || mae > WARNING_MAE {
        RiskStatus::Warning
    } else {
        RiskStatus::Safe
    }
}

/// RMSE-only banding used for the dashboard district counts. It can disagree
/// with `classify` for the same location when MAE is high.
pub fn rmse_band(rmse: f64) -> RiskStatus {
    match rmse {
        r if r > CRITICAL_RMSE => RiskStatus::Critical,
        r if r > WARNING_RMSE => RiskStatus::Warning,
        _ => RiskStatus::Safe,
    }
}

impl LocationRecord {
    pub fn status(&self) -> RiskStatus {
        classify_unchecked(self.rmse, self.mae)
    }
}

impl RiskStatus {
    /// Advisory shown on the district detail view.
    pub fn advisory(&self) -> &'static str {
        match self {
            RiskStatus::Critical => "Immediate action required. Groundwater levels critically low. Implement water conservation measures and restrict non-essential usage.",
            RiskStatus::Warning => "Monitor closely. Water levels declining. Consider rainwater harvesting and reduced irrigation.",
            RiskStatus::Safe => "Water levels stable. Continue sustainable practices.",
        }
    }

    /// Advisory embedded in the conversational context block.
    pub fn chat_advisory(&self) -> &'static str {
        match self {
            RiskStatus::Critical => "CRITICAL: Groundwater levels critically low. Immediate action required. Restrict extraction and implement conservation measures.",
            RiskStatus::Warning => "WARNING: Water levels declining. Monitor closely. Consider rainwater harvesting and reduced irrigation.",
            RiskStatus::Safe => "SAFE: Water levels stable. Continue sustainable practices.",
        }
    }

    pub fn suggestion(&self) -> Suggestion {
        match self {
            RiskStatus::Critical => Suggestion::CriticalWarning,
            RiskStatus::Warning => Suggestion::Warning,
            RiskStatus::Safe => Suggestion::SafeToProceed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exclusive_on_the_high_side() {
        assert_eq!(classify(5.0, 0.0).unwrap(), RiskStatus::Warning);
        assert_eq!(classify(5.01, 0.0).unwrap(), RiskStatus::Critical);
        assert_eq!(classify(3.0, 2.5).unwrap(), RiskStatus::Safe);
        assert_eq!(classify(3.01, 0.0).unwrap(), RiskStatus::Warning);
    }

    #[test]
    fn mae_alone_can_escalate() {
        assert_eq!(classify(0.5, 4.0).unwrap(), RiskStatus::Warning);
        assert_eq!(classify(0.5, 4.01).unwrap(), RiskStatus::Critical);
        assert_eq!(classify(1.0, 2.51).unwrap(), RiskStatus::Warning);
    }

    #[test]
    fn rejects_negative_and_nan_metrics() {
        assert!(matches!(
            classify(-0.1, 1.0),
            Err(AnalyticsError::InvalidArgument(_))
        ));
        assert!(matches!(
            classify(1.0, f64::NAN),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rmse_band_ignores_mae() {
        assert_eq!(rmse_band(2.0), RiskStatus::Safe);
        assert_eq!(rmse_band(3.0), RiskStatus::Safe);
        assert_eq!(rmse_band(5.0), RiskStatus::Warning);
        assert_eq!(rmse_band(5.5), RiskStatus::Critical);
        // Same location, two rules.
        assert_eq!(classify_unchecked(2.0, 4.5), RiskStatus::Critical);
    }

    #[test]
    fn suggestions_follow_status() {
        assert_eq!(RiskStatus::Critical.suggestion(), Suggestion::CriticalWarning);
        assert_eq!(RiskStatus::Warning.suggestion(), Suggestion::Warning);
        assert_eq!(RiskStatus::Safe.suggestion(), Suggestion::SafeToProceed);
    }
}
