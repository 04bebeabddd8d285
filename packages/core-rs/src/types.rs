use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const NOT_FOUND: &str = "Not found";

const UNKNOWN_MEASURE: &str = "N/A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Negotiating,
    Converted,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Negotiating,
        LeadStatus::Converted,
    ];

    /// The next stage of the pipeline. `Converted` wraps back to `New`.
    pub fn next(self) -> LeadStatus {
        match self {
            LeadStatus::New => LeadStatus::Contacted,
            LeadStatus::Contacted => LeadStatus::Negotiating,
            LeadStatus::Negotiating => LeadStatus::Converted,
            LeadStatus::Converted => LeadStatus::New,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Negotiating => "Negotiating",
            LeadStatus::Converted => "Closed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Negotiating => "negotiating",
            LeadStatus::Converted => "converted",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown status '{}' (expected new, contacted, negotiating or converted)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for LeadStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_lowercase();
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// A figure the search backend may or may not have been able to read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Measure<T> {
    Known(T),
    Unknown(String),
}

impl<T> Measure<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Measure::Known(value) => Some(value),
            Measure::Unknown(_) => None,
        }
    }
}

impl<T> Default for Measure<T> {
    fn default() -> Self {
        Measure::Unknown(UNKNOWN_MEASURE.to_string())
    }
}

impl<T: fmt::Display> fmt::Display for Measure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Known(value) => value.fmt(f),
            Measure::Unknown(label) => f.write_str(label),
        }
    }
}

/// Accepts whatever the backend put in a numeric slot. Strings become the
/// sentinel label, `null` and absent fields become the default, and numbers
/// that do not fit `T` are kept as their text.
fn lenient_measure<'de, D, T>(deserializer: D) -> Result<Measure<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let measure = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Measure::default(),
        Some(Value::String(label)) => Measure::Unknown(label),
        Some(other) => match T::deserialize(&other) {
            Ok(value) => Measure::Known(value),
            Err(_) => Measure::Unknown(other.to_string()),
        },
    };
    Ok(measure)
}

pub type Rating = Measure<f64>;
pub type ReviewCount = Measure<f64>;

/// A candidate business returned by a discovery query, not yet saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_measure")]
    pub rating: Rating,
    #[serde(default, deserialize_with = "lenient_measure")]
    pub reviews: ReviewCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub insight: String,
}

impl ScanResult {
    pub fn has_website(&self) -> bool {
        self.website
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn contact_handle(&self) -> Option<&str> {
        self.whatsapp
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(flatten)]
    pub details: ScanResult,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub date_added: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub registration_id: Option<String>,
    #[serde(default)]
    pub admin_contact: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
    #[serde(default)]
    pub neighborhood_comparison: Option<String>,
    #[serde(default)]
    pub best_opportunity: Option<String>,
}

/// Renders an optional report field, substituting [`NOT_FOUND`] for blanks.
pub fn field_or_placeholder(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(NOT_FOUND)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PitchMessage {
    pub message: String,
}
