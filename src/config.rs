//! Matching configuration, persisted as JSON.
//!
//! Lookup order for the config file:
//! 1. NAMEMATCH_CONFIG env var
//! 2. ~/.namematch/config.json
//!
//! A missing file means defaults. Missing fields take their defaults and
//! unknown strategy names fall back to the default strategy with a warning.
//!
//! CHANGELOG:
//! - 06/02/2026 - Token threshold, weights and index reuse keys
//! - 02/02/2026 - Initial implementation

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::index::{IndexKind, IndexReuse};
use crate::preprocess::{NicknameTable, Preprocessor};
use crate::scoring::{NameScorer, NameScorerKind, PositionalWeights, StringScorer};

/// Result-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionMode {
    /// Keep results on the right side of `threshold`.
    Threshold,
    /// Keep the first `max_count` results (all when `max_count <= 0`).
    #[default]
    TopN,
}

impl SelectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Threshold => "THRESHOLD",
            SelectionMode::TopN => "TOP_N",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "THRESHOLD" => Some(SelectionMode::Threshold),
            "TOP_N" | "TOPN" | "MAX" | "MAX_COUNT" => Some(SelectionMode::TopN),
            _ => None,
        }
    }
}

impl From<String> for SelectionMode {
    fn from(name: String) -> Self {
        Self::parse(&name).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(choice = %name, fallback = fallback.name(), "unknown selection mode, using default");
            fallback
        })
    }
}

impl From<SelectionMode> for String {
    fn from(mode: SelectionMode) -> Self {
        mode.name().to_string()
    }
}

/// Everything a matching call reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stage name or `PIPELINE:A,B,...`.
    pub preprocessor: String,
    /// CSV nickname table used by the NICKNAME stage.
    pub nickname_file: Option<PathBuf>,
    pub index_strategy: IndexKind,
    pub name_scorer: NameScorerKind,
    /// Only consulted by name scorers that wrap a string scorer.
    pub string_scorer: StringScorer,
    pub selection_mode: SelectionMode,
    pub threshold: f64,
    pub max_count: i32,
    pub weights: PositionalWeights,
    /// Minimum per-token similarity for a bag-of-words match.
    pub token_match_threshold: f64,
    pub index_reuse: IndexReuse,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preprocessor: "PIPELINE:TOKENIZE,LOWERCASE".to_string(),
            nickname_file: None,
            index_strategy: IndexKind::default(),
            name_scorer: NameScorerKind::default(),
            string_scorer: StringScorer::default(),
            selection_mode: SelectionMode::default(),
            threshold: 0.85,
            max_count: 20,
            weights: PositionalWeights::default(),
            token_match_threshold: 0.8,
            index_reuse: IndexReuse::default(),
        }
    }
}

/// Keys accepted by [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "preprocessor",
    "nickname_file",
    "index_strategy",
    "name_scorer",
    "string_scorer",
    "selection_mode",
    "threshold",
    "max_count",
    "weights.first",
    "weights.last",
    "weights.middle",
    "token_match_threshold",
    "index_reuse",
];

/// Default config file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("NAMEMATCH_CONFIG") {
        return PathBuf::from(shellexpand::tilde(&path).into_owned());
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".namematch")
        .join("config.json")
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Load from the default path, or defaults when no file exists.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))
    }

    /// Set one field from its string form.
    ///
    /// Strategy names that do not parse are rejected here rather than
    /// silently replaced, since the caller typed them.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "preprocessor" => self.preprocessor = value.to_string(),
            "nickname_file" => {
                self.nickname_file = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(PathBuf::from(shellexpand::tilde(value).into_owned()))
                }
            }
            "index_strategy" | "index" => {
                self.index_strategy = IndexKind::parse(value)
                    .with_context(|| format!("Unknown index strategy: {}", value))?
            }
            "name_scorer" => {
                self.name_scorer = NameScorerKind::parse(value)
                    .with_context(|| format!("Unknown name scorer: {}", value))?
            }
            "string_scorer" => {
                self.string_scorer = StringScorer::parse(value)
                    .with_context(|| format!("Unknown string scorer: {}", value))?
            }
            "selection_mode" => {
                self.selection_mode = SelectionMode::parse(value)
                    .with_context(|| format!("Unknown selection mode: {}", value))?
            }
            "threshold" => self.threshold = parse_number(key, value)?,
            "max_count" | "max" => self.max_count = parse_number(key, value)?,
            "weights.first" => self.weights.first = parse_number(key, value)?,
            "weights.last" => self.weights.last = parse_number(key, value)?,
            "weights.middle" => self.weights.middle = parse_number(key, value)?,
            "token_match_threshold" => self.token_match_threshold = parse_number(key, value)?,
            "index_reuse" => {
                self.index_reuse = IndexReuse::parse(value).with_context(|| {
                    format!("Unknown index reuse policy: {} (expected HANDLE or CONTENT)", value)
                })?
            }
            _ => bail!("Unknown config key: {} (expected one of: {})", key, CONFIG_KEYS.join(", ")),
        }
        Ok(())
    }

    /// Name scorer described by this configuration.
    pub fn name_scorer(&self) -> NameScorer {
        NameScorer::new(
            self.name_scorer,
            self.string_scorer,
            self.weights,
            self.token_match_threshold,
        )
    }

    /// Preprocessor described by this configuration.
    ///
    /// An unreadable nickname file only disables nickname normalization.
    pub fn preprocessor(&self) -> Preprocessor {
        let nicknames = self
            .nickname_file
            .as_ref()
            .map(NicknameTable::load_or_empty)
            .unwrap_or_default();
        Preprocessor::parse(&self.preprocessor, Arc::new(nicknames))
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("Invalid number for {}: {}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index_strategy, IndexKind::Full);
        assert_eq!(config.selection_mode, SelectionMode::TopN);
        assert_eq!(config.max_count, 20);
        assert_eq!(config.name_scorer().name(), "PASS_THROUGH(EXACT)");
        assert_eq!(config.preprocessor().name(), "PIPELINE[TOKENIZE,LOWERCASE]");
    }

    #[test]
    fn test_partial_json_and_unknown_names() {
        let config: Config = serde_json::from_str(
            r#"{"index_strategy": "TRIE", "name_scorer": "phonetic", "threshold": 0.5}"#,
        )
        .unwrap();
        assert_eq!(config.index_strategy, IndexKind::PrefixTree);
        assert_eq!(config.name_scorer, NameScorerKind::PassThrough);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.max_count, 20);
    }

    #[test]
    fn test_index_reuse_from_json() {
        let config: Config = serde_json::from_str(r#"{"index_reuse": "content"}"#).unwrap();
        assert_eq!(config.index_reuse, IndexReuse::Content);

        let config: Config =
            serde_json::from_str(r#"{"index_reuse": "SOMETIMES", "max_count": 5}"#).unwrap();
        assert_eq!(config.index_reuse, IndexReuse::Handle);
        assert_eq!(config.max_count, 5);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["index_reuse"], "HANDLE");
    }

    #[test]
    fn test_set() {
        let mut config = Config::default();
        config.set("index_strategy", "dictionary").unwrap();
        config.set("string_scorer", "levenshtein").unwrap();
        config.set("selection_mode", "threshold").unwrap();
        config.set("weights.middle", "0.2").unwrap();
        config.set("index_reuse", "content").unwrap();
        assert_eq!(config.index_strategy, IndexKind::BucketLastToken);
        assert_eq!(config.string_scorer, StringScorer::Levenshtein);
        assert_eq!(config.selection_mode, SelectionMode::Threshold);
        assert_eq!(config.weights.middle, 0.2);
        assert_eq!(config.index_reuse, IndexReuse::Content);

        assert!(config.set("index_strategy", "soundex").is_err());
        assert!(config.set("max_count", "lots").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("namematch-config-{}", std::process::id()))
            .join("config.json");
        let mut config = Config::default();
        config.set("name_scorer", "BAG_OF_WORDS").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
