//! Grader configuration and config file loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Keyword coverage needed for a theory answer to pass keyword grading.
pub const DEFAULT_KEYWORD_THRESHOLD: f64 = 0.6;

/// How theory answers are scored by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheoryStrategy {
    /// Case-insensitive, trimmed exact match against the reference answer.
    #[default]
    ExactMatch,
    /// Keyword overlap when the question lists `expectedKeywords`, exact match otherwise.
    Keywords,
}

impl fmt::Display for TheoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryStrategy::ExactMatch => write!(f, "exact_match"),
            TheoryStrategy::Keywords => write!(f, "keywords"),
        }
    }
}

impl FromStr for TheoryStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact_match" | "exact-match" | "exact" => Ok(TheoryStrategy::ExactMatch),
            "keywords" | "keyword" => Ok(TheoryStrategy::Keywords),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// What to do when the answer list and question list differ in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Grade only the answered prefix; extra answers are an error.
    #[default]
    Lenient,
    /// Reject any count mismatch and any out-of-place `questionIndex`.
    Strict,
}

impl fmt::Display for LengthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthPolicy::Lenient => write!(f, "lenient"),
            LengthPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for LengthPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(LengthPolicy::Lenient),
            "strict" => Ok(LengthPolicy::Strict),
            other => Err(ConfigError::UnknownLengthPolicy(other.to_string())),
        }
    }
}

/// Settings that change how a submission is graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub theory_strategy: TheoryStrategy,
    /// Fraction of keywords that must appear, used by [`TheoryStrategy::Keywords`].
    #[serde(default = "default_keyword_threshold")]
    pub keyword_threshold: f64,
    #[serde(default)]
    pub length_policy: LengthPolicy,
}

fn default_keyword_threshold() -> f64 {
    DEFAULT_KEYWORD_THRESHOLD
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            theory_strategy: TheoryStrategy::default(),
            keyword_threshold: DEFAULT_KEYWORD_THRESHOLD,
            length_policy: LengthPolicy::default(),
        }
    }
}

impl GraderConfig {
    pub fn with_theory_strategy(mut self, strategy: TheoryStrategy) -> Self {
        self.theory_strategy = strategy;
        self
    }

    pub fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    pub fn with_keyword_threshold(mut self, threshold: f64) -> Self {
        self.keyword_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.keyword_threshold > 0.0 && self.keyword_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.keyword_threshold));
        }
        Ok(())
    }
}

/// Top-level LearnHub grader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnhubConfig {
    #[serde(default)]
    pub grading: GraderConfig,
    /// Where attempt records are persisted.
    #[serde(default = "default_attempts_dir")]
    pub attempts_dir: PathBuf,
    /// Max concurrent submissions in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_attempts_dir() -> PathBuf {
    PathBuf::from("./learnhub-attempts")
}

fn default_parallelism() -> usize {
    4
}

impl Default for LearnhubConfig {
    fn default() -> Self {
        Self {
            grading: GraderConfig::default(),
            attempts_dir: default_attempts_dir(),
            parallelism: default_parallelism(),
        }
    }
}

impl LearnhubConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grading.validate()?;
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidParallelism);
        }
        Ok(())
    }

    /// Apply `LEARNHUB_*` overrides using the given variable lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(strategy) = lookup("LEARNHUB_THEORY_STRATEGY") {
            self.grading.theory_strategy = strategy.parse()?;
        }
        if let Some(policy) = lookup("LEARNHUB_LENGTH_POLICY") {
            self.grading.length_policy = policy.parse()?;
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the well-known paths.
///
/// Search order without a path:
/// 1. `learnhub.toml` in the current directory
/// 2. `~/.config/learnhub/config.toml`
///
/// Environment variable overrides: `LEARNHUB_THEORY_STRATEGY`, `LEARNHUB_LENGTH_POLICY`.
pub fn load_config_from(path: Option<&Path>) -> Result<LearnhubConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("learnhub.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LearnhubConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;

    Ok(config)
}

/// Parse a TOML config document and expand `${VAR}` references in paths.
pub fn parse_config_str(content: &str) -> Result<LearnhubConfig> {
    let mut config: LearnhubConfig = toml::from_str(content)?;
    config.attempts_dir = PathBuf::from(resolve_env_vars(&config.attempts_dir.to_string_lossy()));
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("learnhub"))
}
