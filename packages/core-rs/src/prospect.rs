use crate::ai::{GenerationRequest, GenerativeBackend};
use crate::config::{Config, DEFAULT_DEEP_MODEL, DEFAULT_FAST_MODEL, DEFAULT_RETRY_DELAY};
use crate::error::ProspectError;
use crate::types::{AnalysisReport, PitchMessage, ScanResult};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

pub const DISCOVERY_BATCH: usize = 10;

const MIN_REVIEWS: u32 = 50;
const MAX_REVIEWS: u32 = 350;
const MIN_RATING: f64 = 3.7;
const MAX_RATING: f64 = 4.4;

#[derive(Debug, Clone)]
pub struct Models {
    pub scan: String,
    pub analysis: String,
    pub pitch: String,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            scan: DEFAULT_FAST_MODEL.to_string(),
            analysis: DEFAULT_DEEP_MODEL.to_string(),
            pitch: DEFAULT_FAST_MODEL.to_string(),
        }
    }
}

/// Stateless front for the three prospecting tasks. Each call is a single
/// round trip, except discovery which retries once on quota errors.
pub struct ProspectingClient<B> {
    backend: B,
    models: Models,
    retry_delay: Duration,
}

impl<B: GenerativeBackend> ProspectingClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            models: Models::default(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        Self {
            backend,
            models: Models {
                scan: config.scan_model.clone(),
                analysis: config.analysis_model.clone(),
                pitch: config.pitch_model.clone(),
            },
            retry_delay: config.retry_delay,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Finds up to ten sweet-spot businesses, skipping every name in
    /// `exclude`. Unparseable output counts as no results.
    pub fn discover(
        &self,
        niche: &str,
        location: &str,
        exclude: &[String],
    ) -> Result<Vec<ScanResult>, ProspectError> {
        let request = GenerationRequest {
            model: self.models.scan.clone(),
            prompt: discovery_prompt(niche, location, exclude),
            schema: discovery_schema(),
            grounded: true,
        };

        let text = match self.backend.generate(&request) {
            Err(error) if error.is_quota() => {
                log::warn!(
                    "discovery hit the API quota, retrying once in {:?}",
                    self.retry_delay
                );
                thread::sleep(self.retry_delay);
                self.backend.generate(&request)?
            }
            other => other?,
        };

        Ok(filter_fresh(parse_discovery(&text), exclude))
    }

    pub fn analyze(&self, lead_name: &str, location: &str) -> Result<AnalysisReport, ProspectError> {
        let request = GenerationRequest {
            model: self.models.analysis.clone(),
            prompt: analysis_prompt(lead_name, location),
            schema: analysis_schema(),
            grounded: true,
        };
        let text = self.backend.generate(&request)?;
        parse_structured("analysis", &text)
    }

    pub fn pitch(&self, lead_name: &str, insight: &str) -> Result<PitchMessage, ProspectError> {
        let request = GenerationRequest {
            model: self.models.pitch.clone(),
            prompt: pitch_prompt(lead_name, insight),
            schema: pitch_schema(),
            grounded: false,
        };
        let text = self.backend.generate(&request)?;
        parse_structured("pitch", &text)
    }
}

fn parse_structured<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    text: &str,
) -> Result<T, ProspectError> {
    if text.trim().is_empty() {
        return Err(ProspectError::MalformedResponse {
            operation,
            detail: "empty response".to_string(),
        });
    }
    serde_json::from_str(text).map_err(|error| ProspectError::MalformedResponse {
        operation,
        detail: error.to_string(),
    })
}

/// Parses a discovery batch record by record, so one bad entry does not
/// cost the rest of the batch.
pub fn parse_discovery(text: &str) -> Vec<ScanResult> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let records: Vec<Value> = match serde_json::from_str(text) {
        Ok(records) => records,
        Err(error) => {
            log::warn!("discarding unparseable discovery output: {error}");
            return Vec::new();
        }
    };
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(result) => Some(result),
            Err(error) => {
                log::warn!("skipping discovery record {index}: {error}");
                None
            }
        })
        .collect()
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Drops excluded names, in-batch duplicates and nameless records, keeping
/// at most [`DISCOVERY_BATCH`] entries.
pub fn filter_fresh(results: Vec<ScanResult>, exclude: &[String]) -> Vec<ScanResult> {
    let mut seen: HashSet<String> = exclude.iter().map(|name| normalize_name(name)).collect();
    results
        .into_iter()
        .filter(|result| {
            let key = normalize_name(&result.name);
            !key.is_empty() && seen.insert(key)
        })
        .take(DISCOVERY_BATCH)
        .collect()
}

pub fn discovery_prompt(niche: &str, location: &str, exclude: &[String]) -> String {
    let mut prompt = format!(
        "Act as a sales intelligence specialist. Find {DISCOVERY_BATCH} REAL \"{niche}\" businesses in \"{location}\".\n\n\
         SWEET SPOT CRITERIA:\n\
         1. MATURITY: between {MIN_REVIEWS} and {MAX_REVIEWS} Google reviews.\n\
         2. OPERATION: focused on delivery or takeout.\n\
         3. GAPS: rating between {MIN_RATING} and {MAX_RATING}, no official website or only an amateur online presence.\n"
    );
    if !exclude.is_empty() {
        prompt.push_str(&format!(
            "\nIMPORTANT: do not return any of these businesses I already found: {}. Look for new targets.\n",
            exclude.join(", ")
        ));
    }
    prompt.push_str(&format!(
        "\nReturn exactly {DISCOVERY_BATCH} unique, verifiable results that are a good fit for paid-traffic \
         prospecting and online presence management. Write the insight in the language spoken in {location}."
    ));
    prompt
}

pub fn analysis_prompt(lead_name: &str, location: &str) -> String {
    format!(
        "Run a deep investigation of the business \"{lead_name}\" at \"{location}\".\n\n\
         TASKS:\n\
         1. Locate company records (business registration number, owner or partner name, admin contact).\n\
         2. Competitive analysis: compare it with 2-3 neighbouring competitors.\n\
         3. Detailed SWOT analysis.\n\
         4. Estimate the revenue lost to missing online traffic and name the single best opportunity."
    )
}

pub fn pitch_prompt(lead_name: &str, insight: &str) -> String {
    format!(
        "Write a high-conversion WhatsApp pitch for the owner of \"{lead_name}\". \
         Insight: \"{insight}\". Be direct, human and focused on ROI."
    )
}

pub fn discovery_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "address": { "type": "STRING" },
                "rating": { "type": "NUMBER" },
                "reviews": { "type": "INTEGER" },
                "whatsapp": { "type": "STRING" },
                "website": { "type": "STRING" },
                "insight": { "type": "STRING" }
            },
            "required": ["name", "address", "rating", "reviews", "insight"]
        }
    })
}

pub fn analysis_schema() -> Value {
    let list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "owner": { "type": "STRING" },
            "registrationId": { "type": "STRING" },
            "adminContact": { "type": "STRING" },
            "strengths": list,
            "weaknesses": list,
            "opportunities": list,
            "threats": list,
            "neighborhoodComparison": { "type": "STRING" },
            "bestOpportunity": { "type": "STRING" }
        },
        "required": [
            "strengths",
            "weaknesses",
            "opportunities",
            "threats",
            "bestOpportunity",
            "neighborhoodComparison"
        ]
    })
}

pub fn pitch_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "message": { "type": "STRING" }
        },
        "required": ["message"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ScanResult {
        ScanResult {
            name: name.to_string(),
            ..ScanResult::default()
        }
    }

    #[test]
    fn filter_drops_excluded_and_repeated_names() {
        let results = vec![named("Pizza Bella"), named(" pizza bella "), named("Forno"), named("Roma")];
        let fresh = filter_fresh(results, &["ROMA".to_string()]);
        let names: Vec<&str> = fresh.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Bella", "Forno"]);
    }

    #[test]
    fn filter_caps_batch_size() {
        let results = (0..14).map(|i| named(&format!("Shop {i}"))).collect();
        assert_eq!(filter_fresh(results, &[]).len(), DISCOVERY_BATCH);
    }

    #[test]
    fn bad_record_does_not_sink_the_batch() {
        let text = r#"[
            {"name":"Pizza Bella","rating":4.0,"reviews":120,"insight":"No site"},
            {"name":"Forno","rating":3.9,"reviews":95.0,"insight":"Instagram only"},
            {"address":"no name here"},
            "not an object",
            {"name":"Roma","reviews":null}
        ]"#;
        let names: Vec<String> = parse_discovery(text).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Pizza Bella", "Forno", "Roma"]);
        assert!(parse_discovery("{\"name\":\"A\"}").is_empty());
    }

    #[test]
    fn discovery_prompt_lists_exclusions_only_when_present() {
        let plain = discovery_prompt("Pizzaria", "Recife, PE", &[]);
        assert!(!plain.contains("already found"));
        assert!(plain.contains("between 50 and 350"));
        assert!(plain.contains("between 3.7 and 4.4"));

        let more = discovery_prompt("Pizzaria", "Recife, PE", &["A".to_string(), "B".to_string()]);
        assert!(more.contains("already found: A, B."));
    }

    #[test]
    fn structured_parse_rejects_blank_text() {
        let error = parse_structured::<PitchMessage>("pitch", "  ").unwrap_err();
        assert!(matches!(
            error,
            ProspectError::MalformedResponse { operation: "pitch", .. }
        ));
    }
}
