use thiserror::Error;

const QUOTA_HINTS: &[&str] = &["quota", "resource_exhausted", "rate limit", "too many requests"];
const AUTH_HINTS: &[&str] = &["api key", "api_key", "credential"];

#[derive(Debug, Error)]
pub enum ProspectError {
    #[error("request to the generation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("{operation} response was malformed: {detail}")]
    MalformedResponse {
        operation: &'static str,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Quota,
    Authentication,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub explanation: String,
}

impl ProspectError {
    fn status(&self) -> Option<u16> {
        match self {
            ProspectError::Transport(error) => error.status().map(|status| status.as_u16()),
            ProspectError::Api { status, .. } => Some(*status),
            ProspectError::MalformedResponse { .. } => None,
        }
    }

    pub fn classification(&self) -> Classification {
        classify(self.status(), &self.to_string())
    }

    pub fn category(&self) -> ErrorCategory {
        self.classification().category
    }

    pub fn is_quota(&self) -> bool {
        self.category() == ErrorCategory::Quota
    }
}

/// Maps a failure onto a user-facing category. Quota wins over authentication
/// when both match.
pub fn classify(status: Option<u16>, message: &str) -> Classification {
    let lowered = message.to_lowercase();

    if status == Some(429) || QUOTA_HINTS.iter().any(|hint| lowered.contains(hint)) {
        return Classification {
            category: ErrorCategory::Quota,
            explanation: "The generation API quota (requests per minute or per day) is exhausted. \
                          Wait a minute and try again, or upgrade the API plan."
                .to_string(),
        };
    }

    if status == Some(401) || AUTH_HINTS.iter().any(|hint| lowered.contains(hint)) {
        return Classification {
            category: ErrorCategory::Authentication,
            explanation: "The API key was rejected or is missing. \
                          Check GEMINI_API_KEY in the environment."
                .to_string(),
        };
    }

    Classification {
        category: ErrorCategory::Unclassified,
        explanation: format!("Unexpected failure talking to the generation API: {message}"),
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to write lead store: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to serialize lead store: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("{action} failed: {reason}")]
pub struct HandoffError {
    pub action: &'static str,
    pub reason: String,
}
