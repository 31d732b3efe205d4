use crate::{Error, Result};
use rand::Rng;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_OUTPUT_DIR: &str = "generated_articles";
const DEFAULT_SECTION_LANGUAGE: &str = "english";
const DEFAULT_MAX_ATTEMPTS: usize = 4;
const DEFAULT_MAX_AGENT_STEPS: usize = 12;

/// Inclusive range of whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// Uniformly random whole-second delay inside the range.
    pub fn sample(&self) -> Duration {
        let (min, max) = (self.min.as_secs(), self.max.as_secs());
        if min >= max {
            return self.min;
        }
        Duration::from_secs(rand::rng().random_range(min..=max))
    }

    /// Exponential backoff for the given 1-based attempt: `min * 2^(attempt-1)`
    /// capped at `max`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.min.saturating_mul(2u32.pow(exponent)).min(self.max)
    }

    fn parse(key: &str, value: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("{key} must look like `60-180`, got `{value}`"));

        let (min, max) = match value.split_once('-') {
            Some((min, max)) => (min.trim(), max.trim()),
            None => (value.trim(), value.trim()),
        };
        let min: u64 = min.parse().map_err(|_| invalid())?;
        let max: u64 = max.parse().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }

        Ok(Self::from_secs(min, max))
    }
}

pub struct Config {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub tavily_api_key: String,
    pub output_dir: PathBuf,
    pub section_language: String,
    pub pacing: DelayRange,
    pub max_attempts: usize,
    pub backoff: DelayRange,
    pub max_agent_steps: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("tavily_api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("section_language", &self.section_language)
            .field("pacing", &self.pacing)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("max_agent_steps", &self.max_agent_steps)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} must be set in the environment")))
        };
        let delay = |key: &str, default: DelayRange| match get(key) {
            Some(value) => DelayRange::parse(key, &value),
            None => Ok(default),
        };
        let count = |key: &str, default: usize| match get(key) {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(Error::Config(format!(
                    "{key} must be a positive integer, got `{value}`"
                ))),
            },
            None => Ok(default),
        };

        Ok(Self {
            api_key: required("OPENAI_API_KEY")?,
            api_base: get("OPENAI_BASE_URL"),
            model: get("ARTICLES_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            tavily_api_key: required("TAVILY_API_KEY")?,
            output_dir: get("ARTICLES_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            section_language: get("ARTICLES_SECTION_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SECTION_LANGUAGE.to_string()),
            pacing: delay("ARTICLES_PACING_SECS", DelayRange::from_secs(60, 180))?,
            max_attempts: count("ARTICLES_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            backoff: delay("ARTICLES_BACKOFF_SECS", DelayRange::from_secs(60, 180))?,
            max_agent_steps: count("ARTICLES_MAX_AGENT_STEPS", DEFAULT_MAX_AGENT_STEPS)?,
        })
    }
}
