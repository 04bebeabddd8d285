use dirs::data_dir;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_DEEP_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub scan_model: String,
    pub analysis_model: String,
    pub pitch_model: String,
    pub data_dir: PathBuf,
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            scan_model: DEFAULT_FAST_MODEL.to_string(),
            analysis_model: DEFAULT_DEEP_MODEL.to_string(),
            pitch_model: DEFAULT_FAST_MODEL.to_string(),
            data_dir: default_data_dir(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_data_dir() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("leadscout"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// A missing API key is only logged: requests are still attempted and
    /// fail with an authentication classification.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        let api_key = non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("API_KEY"));
        if api_key.is_none() {
            log::warn!("GEMINI_API_KEY is not set; generation requests will be rejected");
        }

        let retry_delay = non_empty_var("LEADSCOUT_RETRY_DELAY_MS")
            .and_then(|value| match value.parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(error) => {
                    log::warn!("ignoring LEADSCOUT_RETRY_DELAY_MS={value}: {error}");
                    None
                }
            })
            .unwrap_or(defaults.retry_delay);

        Self {
            api_key,
            scan_model: non_empty_var("LEADSCOUT_SCAN_MODEL").unwrap_or(defaults.scan_model),
            analysis_model: non_empty_var("LEADSCOUT_ANALYSIS_MODEL")
                .unwrap_or(defaults.analysis_model),
            pitch_model: non_empty_var("LEADSCOUT_PITCH_MODEL").unwrap_or(defaults.pitch_model),
            data_dir: non_empty_var("LEADSCOUT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            retry_delay,
        }
    }
}
