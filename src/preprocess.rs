//! Name preprocessing: turn raw text into the token list stored on a record.
//!
//! Every stage maps a token list to a token list. A pipeline applies its
//! stages in order, starting from a single token holding the trimmed raw
//! text.
//!
//! CHANGELOG:
//! - 20/10/2026 - Soundex and Metaphone stages
//! - 06/02/2026 - Accent removal via Unicode decomposition
//! - 05/02/2026 - Nickname table loading
//! - 02/02/2026 - Initial implementation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rphonetic::{Encoder, Metaphone, Soundex};
use thiserror::Error;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Errors raised while loading preprocessing resources.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read nickname table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Nickname table
// ============================================================================

/// Nickname to canonical name mapping, keys and values lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicknameTable {
    map: HashMap<String, String>,
}

impl NicknameTable {
    /// Parse CSV lines of the form `canonical,nick1,nick2,...`.
    ///
    /// A nickname keeps the first canonical it was seen with.
    pub fn parse(content: &str) -> Self {
        let mut map = HashMap::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split(',').map(|c| c.trim().to_lowercase());
            let canonical = columns.next().unwrap_or_default();
            if canonical.is_empty() {
                warn!(line = number + 1, "nickname line without a canonical name, skipped");
                continue;
            }
            for nickname in columns.filter(|n| !n.is_empty()) {
                map.entry(nickname).or_insert_with(|| canonical.clone());
            }
        }
        Self { map }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content);
        debug!(path = ?path, mappings = table.len(), "nickname table loaded");
        Ok(table)
    }

    /// Load, or warn and fall back to an empty table.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "nickname normalization disabled");
            Self::default()
        })
    }

    /// Canonical form of `token`, case-insensitively.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.map.get(&token.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ============================================================================
// Stages
// ============================================================================

/// A single preprocessing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Noop,
    Tokenize,
    Lowercase,
    AccentRemover,
    Nickname,
    /// Replace each token with its Soundex code.
    Soundex,
    /// Replace each token with its Metaphone code.
    Metaphone,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Noop,
        Stage::Tokenize,
        Stage::Lowercase,
        Stage::AccentRemover,
        Stage::Nickname,
        Stage::Soundex,
        Stage::Metaphone,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Noop => "NOOP",
            Stage::Tokenize => "TOKENIZE",
            Stage::Lowercase => "LOWERCASE",
            Stage::AccentRemover => "ACCENT_REMOVER",
            Stage::Nickname => "NICKNAME",
            Stage::Soundex => "SOUNDEX_PREPROCESS",
            Stage::Metaphone => "METAPHONE_PREPROCESS",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "NOOP" | "NONE" => Some(Stage::Noop),
            "TOKENIZE" | "TOKENIZER" | "SIMPLE_TOKENIZER" => Some(Stage::Tokenize),
            "LOWERCASE" => Some(Stage::Lowercase),
            "ACCENT_REMOVER" | "ACCENTS" => Some(Stage::AccentRemover),
            "NICKNAME" | "NICKNAME_NORMALIZER" | "HYPOCORISM" => Some(Stage::Nickname),
            "SOUNDEX" | "SOUNDEX_PREPROCESS" => Some(Stage::Soundex),
            "METAPHONE" | "METAPHONE_PREPROCESS" => Some(Stage::Metaphone),
            _ => None,
        }
    }

    fn apply(&self, tokens: Vec<String>, nicknames: &NicknameTable) -> Vec<String> {
        match self {
            Stage::Noop => tokens,
            Stage::Tokenize => tokens
                .iter()
                .flat_map(|t| t.split_whitespace())
                .map(str::to_string)
                .collect(),
            Stage::Lowercase => tokens.into_iter().map(|t| t.to_lowercase()).collect(),
            Stage::AccentRemover => tokens.into_iter().map(|t| strip_accents(&t)).collect(),
            Stage::Nickname => tokens
                .into_iter()
                .map(|t| match nicknames.lookup(&t) {
                    Some(canonical) => canonical.to_string(),
                    None => t,
                })
                .collect(),
            Stage::Soundex => {
                let encoder = Soundex::default();
                tokens.iter().map(|t| phonetic_code(t, &encoder)).collect()
            }
            Stage::Metaphone => {
                let encoder = Metaphone::default();
                tokens.iter().map(|t| phonetic_code(t, &encoder)).collect()
            }
        }
    }
}

/// Phonetic code of the ASCII letters of `token`, empty when it has none.
fn phonetic_code(token: &str, encoder: &impl Encoder) -> String {
    let letters: String = token.chars().filter(char::is_ascii_alphabetic).collect();
    if letters.is_empty() {
        return String::new();
    }
    encoder.encode(&letters)
}

/// Decompose and drop combining marks: "Zoë" becomes "Zoe".
pub fn strip_accents(value: &str) -> String {
    value.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

// ============================================================================
// Preprocessor
// ============================================================================

const PIPELINE_PREFIX: &str = "PIPELINE:";

/// A configured preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    stages: Vec<Stage>,
    pipeline: bool,
    nicknames: Arc<NicknameTable>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            stages: vec![Stage::Noop],
            pipeline: false,
            nicknames: Arc::default(),
        }
    }
}

impl Preprocessor {
    /// Parse a stage name or a `PIPELINE:A,B,...` description.
    ///
    /// Unknown stage names are skipped; a pipeline left with no stages and
    /// an unknown single name both become `NOOP`.
    pub fn parse(description: &str, nicknames: Arc<NicknameTable>) -> Self {
        let description = description.trim();
        let upper = description.to_uppercase();

        let (stages, pipeline) = if let Some(list) = upper.strip_prefix(PIPELINE_PREFIX) {
            let stages: Vec<Stage> = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .filter_map(|name| {
                    let stage = Stage::parse(name);
                    if stage.is_none() {
                        warn!(stage = name, "unknown preprocessing stage, skipped");
                    }
                    stage
                })
                .collect();
            if stages.is_empty() {
                warn!(pipeline = description, "empty preprocessing pipeline, using NOOP");
                (vec![Stage::Noop], false)
            } else {
                (stages, true)
            }
        } else {
            match Stage::parse(description) {
                Some(stage) => (vec![stage], false),
                None => {
                    warn!(choice = description, fallback = "NOOP", "unknown preprocessor, using default");
                    (vec![Stage::Noop], false)
                }
            }
        };

        if stages.contains(&Stage::Nickname) && nicknames.is_empty() {
            warn!("nickname stage configured without any nickname mappings");
        }

        Self {
            stages,
            pipeline,
            nicknames,
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// `PIPELINE[A,B]` for pipelines, the stage name otherwise.
    pub fn name(&self) -> String {
        if self.pipeline {
            let names: Vec<&str> = self.stages.iter().map(Stage::name).collect();
            format!("PIPELINE[{}]", names.join(","))
        } else {
            self.stages
                .first()
                .map(Stage::name)
                .unwrap_or("NOOP")
                .to_string()
        }
    }

    /// Tokens for `raw`. Blank input yields no tokens.
    pub fn preprocess(&self, raw: &str) -> Vec<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        let mut tokens = vec![raw.to_string()];
        for stage in &self.stages {
            tokens = stage.apply(tokens, &self.nicknames);
        }
        tokens.retain(|t| !t.is_empty());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Arc<NicknameTable> {
        Arc::new(NicknameTable::parse(
            "# canonical,nicknames\nrobert,bob,bobby,rob\n\nwilliam,bill,will\n,orphan\nroberta,bobby\n",
        ))
    }

    #[test]
    fn test_nickname_table() {
        let t = table();
        assert_eq!(t.len(), 5);
        assert_eq!(t.lookup("Bob"), Some("robert"));
        assert_eq!(t.lookup("bobby"), Some("robert"));
        assert_eq!(t.lookup("orphan"), None);
        assert_eq!(t.lookup("robert"), None);
    }

    #[test]
    fn test_missing_nickname_file() {
        let path = std::env::temp_dir().join(format!("namematch-missing-{}.csv", std::process::id()));
        assert!(matches!(NicknameTable::load(&path), Err(LoadError::Io { .. })));
        assert!(NicknameTable::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_default_pipeline() {
        let p = Preprocessor::parse("PIPELINE:TOKENIZE,LOWERCASE", Arc::default());
        assert_eq!(p.name(), "PIPELINE[TOKENIZE,LOWERCASE]");
        assert_eq!(p.preprocess("  John   SMITH "), vec!["john", "smith"]);
        assert!(p.preprocess("   ").is_empty());
    }

    #[test]
    fn test_noop_keeps_whole_name() {
        let p = Preprocessor::parse("NOOP", Arc::default());
        assert_eq!(p.preprocess(" John Smith "), vec!["John Smith"]);
        assert_eq!(Preprocessor::default().name(), "NOOP");
    }

    #[test]
    fn test_unknown_names_degrade() {
        let p = Preprocessor::parse("PIPELINE:TOKENIZE,STEMMER,LOWERCASE", Arc::default());
        assert_eq!(p.stages(), &[Stage::Tokenize, Stage::Lowercase]);

        let p = Preprocessor::parse("PIPELINE:", Arc::default());
        assert_eq!(p.stages(), &[Stage::Noop]);

        let p = Preprocessor::parse("DOUBLE_METAPHONE", Arc::default());
        assert_eq!(p.name(), "NOOP");
    }

    #[test]
    fn test_soundex_stage() {
        let p = Preprocessor::parse("PIPELINE:TOKENIZE,SOUNDEX", Arc::default());
        assert_eq!(p.name(), "PIPELINE[TOKENIZE,SOUNDEX_PREPROCESS]");
        assert_eq!(p.preprocess("Robert Smith"), vec!["R163", "S530"]);
        assert_eq!(p.preprocess("rupert smyth"), p.preprocess("Robert Smith"));
        // tokens without ASCII letters drop out
        assert_eq!(p.preprocess("Robert 42"), vec!["R163"]);
    }

    #[test]
    fn test_metaphone_stage() {
        let p = Preprocessor::parse("pipeline:tokenize,accent_remover,metaphone", Arc::default());
        assert_eq!(Stage::parse("METAPHONE_PREPROCESS"), Some(Stage::Metaphone));
        let smith = p.preprocess("Smith");
        assert_eq!(smith.len(), 1);
        assert_eq!(p.preprocess("Smyth"), smith);
        assert_ne!(p.preprocess("Jones"), smith);
        assert_eq!(p.preprocess("Zoë Smith").len(), 2);
    }

    #[test]
    fn test_accents_and_nicknames() {
        let p = Preprocessor::parse("pipeline:tokenize,accent_remover,lowercase,nickname", table());
        assert_eq!(p.preprocess("Bobby Müller"), vec!["robert", "muller"]);
        assert_eq!(strip_accents("Zoë Ångström"), "Zoe Angstrom");
    }
}
