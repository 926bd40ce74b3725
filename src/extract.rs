use std::cmp::Reverse;
use std::fmt::Write;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::{
    ChatContext, DistrictSnapshot, ExtractionResult, LocationRecord, Suggestion,
};
use crate::stats::{find_location, round_to};

pub const NO_DISTRICT_CONTEXT: &str =
    "No specific district mentioned. Please specify which district you're asking about.";

const INSTRUCTIONS: &str = "\
INSTRUCTIONS:
- Use the REAL-TIME DATA above to answer the user's question
- Cite actual numbers (water level, RMSE, status)
- If status is \"Critical\" -> strongly advise AGAINST extraction
- If status is \"Warning\" -> suggest caution + monitoring
- If status is \"Safe\" -> approve with sustainable practices
- Keep answer under 150 words
- Be specific and helpful";

/// Known location names compiled into whole-word patterns, longest first so a
/// compound name wins over a name it contains.
pub struct LocationMatcher {
    candidates: Vec<(String, Regex)>,
}

impl LocationMatcher {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut names: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
        // Stable, so equal lengths keep their given order.
        names.sort_by_key(|name| Reverse(name.chars().count()));

        let candidates = names
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                let pattern = format!(r"\b{}\b", regex::escape(&name.to_lowercase()));
                Regex::new(&pattern)
                    .map(|regex| (name.to_string(), regex))
                    .map_err(|err| {
                        AnalyticsError::InvalidArgument(format!(
                            "cannot build matcher for '{name}': {err}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { candidates })
    }

    pub fn find(&self, message: &str) -> ExtractionResult {
        let message = message.to_lowercase();
        self.candidates
            .iter()
            .find(|(_, regex)| regex.is_match(&message))
            .map(|(name, _)| ExtractionResult::Found(name.clone()))
            .unwrap_or(ExtractionResult::NotFound)
    }
}

/// Resolves the location a message is about. An explicit selection is
/// returned untouched; existence is checked by the lookup that follows. A
/// blank selection counts as no selection.
pub fn extract<S: AsRef<str>>(
    message: &str,
    known_names: &[S],
    preselected: Option<&str>,
) -> Result<ExtractionResult> {
    if let Some(name) = preselected.filter(|name| !name.trim().is_empty()) {
        info!(district = name, "using pre-selected district");
        return Ok(ExtractionResult::Found(name.to_string()));
    }

    let result = LocationMatcher::new(known_names)?.find(message);
    match &result {
        ExtractionResult::Found(name) => debug!(district = %name, "extracted district from message"),
        ExtractionResult::NotFound => warn!("no district found in message"),
    }
    Ok(result)
}

fn snapshot(location: &LocationRecord) -> DistrictSnapshot {
    DistrictSnapshot {
        district: location.district.clone(),
        block: location.block.clone(),
        village: location.village.clone(),
        mean_actual: round_to(location.mean_actual, 2),
        mean_predicted: round_to(location.mean_predicted, 2),
        rmse: round_to(location.rmse, 2),
        mae: round_to(location.mae, 2),
        r2: location.r2.map(|r2| round_to(r2, 3)),
        n_predictions: location.n_predictions,
        status: location.status(),
    }
}

/// Fixed-template block injected ahead of the user's question.
pub fn format_context(name: &str, data: &DistrictSnapshot) -> String {
    let r2 = data
        .r2
        .map(|r2| format!("{r2:.3}"))
        .unwrap_or_else(|| "N/A".to_string());

    let mut output = String::new();
    let _ = writeln!(output, "REAL-TIME DATA FOR {}:", name.to_uppercase());
    let _ = writeln!(output, "Location: {}, {} Block", data.village, data.block);
    let _ = writeln!(output, "Current Water Level: {:.2}m depth", data.mean_actual);
    let _ = writeln!(output, "Predicted Water Level: {:.2}m", data.mean_predicted);
    let _ = writeln!(output, "Prediction Accuracy (RMSE): {:.2}m", data.rmse);
    let _ = writeln!(output, "Mean Absolute Error (MAE): {:.2}m", data.mae);
    let _ = writeln!(output, "Model Fit Quality (R²): {r2}");
    let _ = writeln!(output, "Number of Predictions: {}", data.n_predictions);
    let _ = writeln!(output, "Risk Status: {}", data.status);
    let _ = writeln!(output);
    let _ = writeln!(output, "OFFICIAL ADVISORY: {}", data.status.chat_advisory());
    let _ = writeln!(output);
    output.push_str(INSTRUCTIONS);
    output
}

/// Turns an extraction into the context block and suggestion tag handed to
/// the conversational model.
pub fn chat_context(extraction: &ExtractionResult, locations: &[LocationRecord]) -> ChatContext {
    let name = match extraction {
        ExtractionResult::NotFound => {
            return ChatContext {
                district_found: None,
                district_data: None,
                context: NO_DISTRICT_CONTEXT.to_string(),
                suggestion: Suggestion::AskForDistrict,
            }
        }
        ExtractionResult::Found(name) => name,
    };

    let Some(location) = find_location(locations, name) else {
        warn!(district = %name, "district not in database");
        return ChatContext {
            district_found: Some(name.clone()),
            district_data: None,
            context: format!("District '{name}' not found in our database."),
            suggestion: Suggestion::DistrictNotFound,
        };
    };

    let data = snapshot(location);
    ChatContext {
        district_found: Some(name.clone()),
        context: format_context(name, &data),
        suggestion: data.status.suggestion(),
        district_data: Some(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskStatus;
    use crate::stats::tests::location;

    const NAMES: [&str; 3] = ["Dadri", "Charkhi Dadri", "Hisar"];

    #[test]
    fn prefers_the_longest_name() {
        let result = extract("Can I dig in Charkhi Dadri?", &NAMES, None).unwrap();
        assert_eq!(result, ExtractionResult::Found("Charkhi Dadri".to_string()));

        let result = extract("What about dadri then", &NAMES, None).unwrap();
        assert_eq!(result, ExtractionResult::Found("Dadri".to_string()));
    }

    #[test]
    fn no_mention_is_not_found() {
        let result = extract("Can I dig here?", &NAMES, None).unwrap();
        assert_eq!(result, ExtractionResult::NotFound);

        let context = chat_context(&result, &[]);
        assert_eq!(context.suggestion, Suggestion::AskForDistrict);
        assert_eq!(context.context, NO_DISTRICT_CONTEXT);
        assert!(context.district_found.is_none());
    }

    #[test]
    fn preselection_overrides_message() {
        let names = ["Panipat", "Hisar"];
        let result = extract("Is Panipat safe?", &names, Some("Hisar")).unwrap();
        assert_eq!(result, ExtractionResult::Found("Hisar".to_string()));

        // Not validated at this layer.
        let result = extract("Is Panipat safe?", &names, Some("Atlantis")).unwrap();
        assert_eq!(result, ExtractionResult::Found("Atlantis".to_string()));
    }

    #[test]
    fn blank_preselection_falls_back_to_message() {
        let names = ["Panipat", "Hisar"];
        let result = extract("Can I dig in Hisar?", &names, Some("")).unwrap();
        assert_eq!(result, ExtractionResult::Found("Hisar".to_string()));

        let result = extract("Can I dig here?", &names, Some("   ")).unwrap();
        assert_eq!(result, ExtractionResult::NotFound);
    }

    #[test]
    fn requires_word_boundaries() {
        let result = extract("Wells near Hisarganj are dry", &NAMES, None).unwrap();
        assert_eq!(result, ExtractionResult::NotFound);

        let result = extract("wells near HISAR, are they dry", &NAMES, None).unwrap();
        assert_eq!(result, ExtractionResult::Found("Hisar".to_string()));
    }

    #[test]
    fn names_with_regex_metacharacters_are_literal() {
        let names = ["Kurukshetra (Thanesar)", "Sirsa"];
        let matcher = LocationMatcher::new(&names).unwrap();
        assert_eq!(
            matcher.find("how is kurukshetra (thanesar) doing"),
            ExtractionResult::NotFound,
            "trailing ')' has no word boundary after it"
        );
        assert_eq!(
            matcher.find("and sirsa?"),
            ExtractionResult::Found("Sirsa".to_string())
        );
        assert_eq!(matcher.find("kurukshetra thanesar"), ExtractionResult::NotFound);
    }

    #[test]
    fn equal_lengths_keep_given_order() {
        let matcher = LocationMatcher::new(&["Jind", "Hisr", "Ambala"]).unwrap();
        assert_eq!(
            matcher.find("jind or hisr or ambala"),
            ExtractionResult::Found("Ambala".to_string())
        );
        assert_eq!(
            matcher.find("jind or hisr"),
            ExtractionResult::Found("Jind".to_string())
        );
    }

    #[test]
    fn context_for_known_district() {
        let locations = vec![location(1, "Kaithal", 5.5, 1.0)];
        let extraction = ExtractionResult::Found("kaithal".to_string());

        let context = chat_context(&extraction, &locations);
        assert_eq!(context.suggestion, Suggestion::CriticalWarning);
        assert_eq!(context.district_found.as_deref(), Some("kaithal"));

        let data = context.district_data.unwrap();
        assert_eq!(data.status, RiskStatus::Critical);
        assert_eq!(data.mean_actual, 14.26);
        assert!(context.context.starts_with("REAL-TIME DATA FOR KAITHAL:\n"));
        assert!(context.context.contains("Location: Kaithal Village, Kaithal Block Block"));
        assert!(context.context.contains("Current Water Level: 14.26m depth"));
        assert!(context.context.contains("Model Fit Quality (R²): 0.877"));
        assert!(context.context.contains("Risk Status: Critical"));
        assert!(context
            .context
            .contains(&format!("OFFICIAL ADVISORY: {}", RiskStatus::Critical.chat_advisory())));
        assert!(context.context.ends_with("- Be specific and helpful"));
    }

    #[test]
    fn context_uses_joint_rule_not_rmse_band() {
        // RMSE alone says Safe; MAE pushes it to Critical.
        let locations = vec![location(1, "Rohtak", 2.0, 4.5)];
        let context = chat_context(&ExtractionResult::Found("Rohtak".to_string()), &locations);
        assert_eq!(context.suggestion, Suggestion::CriticalWarning);
    }

    #[test]
    fn context_for_unknown_district() {
        let locations = vec![location(1, "Kaithal", 1.0, 1.0)];
        let context = chat_context(&ExtractionResult::Found("Atlantis".to_string()), &locations);
        assert_eq!(context.suggestion, Suggestion::DistrictNotFound);
        assert_eq!(context.context, "District 'Atlantis' not found in our database.");
        assert!(context.district_data.is_none());
    }

    #[test]
    fn missing_r2_reads_as_not_available() {
        let mut record = location(1, "Safidon", 1.0, 1.0);
        record.r2 = None;
        let context = chat_context(&ExtractionResult::Found("Safidon".to_string()), &[record]);
        assert_eq!(context.suggestion, Suggestion::SafeToProceed);
        assert!(context.context.contains("Model Fit Quality (R²): N/A"));
    }
}
