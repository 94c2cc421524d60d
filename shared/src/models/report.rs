//! Weather report models

use serde::{Deserialize, Serialize};

/// Locations a weather report can be requested for
pub const US_STATES: [&str; 50] = [
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// Resolve a state name case-insensitively to its canonical spelling
pub fn find_us_state(name: &str) -> Option<&'static str> {
    let name = name.trim();
    US_STATES
        .iter()
        .copied()
        .find(|state| state.eq_ignore_ascii_case(name))
}

/// Prompt sent to the text model for a location
pub fn weather_report_prompt(location: &str) -> String {
    format!(
        "Give me a general weather news report for {} like a TV weather reporter.",
        location
    )
}

/// Outcome of one side effect of a report dispatch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded { detail: String },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded { .. })
    }
}

/// Per-step result of storing and emailing a report. The steps are
/// independent: one failing never undoes the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub object_name: String,
    pub storage: StepOutcome,
    pub email: StepOutcome,
}

impl DispatchReport {
    pub fn fully_delivered(&self) -> bool {
        self.storage.is_success() && self.email.is_success()
    }
}
