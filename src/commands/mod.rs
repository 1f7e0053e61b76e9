//! Command implementations.
//!
//! CHANGELOG:
//! - 06/02/2026 - Per-call configuration overrides
//! - 02/02/2026 - Initial module structure

pub mod config;
pub mod matching;

use anyhow::Result;

use crate::config::{Config, SelectionMode};

/// Per-invocation overrides of the persisted configuration.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub index: Option<String>,
    pub name_scorer: Option<String>,
    pub string_scorer: Option<String>,
    pub threshold: Option<f64>,
    pub max: Option<i32>,
    pub preprocessor: Option<String>,
}

impl Overrides {
    /// Apply on top of `config`.
    ///
    /// `--threshold` selects threshold mode and `--max` selects top-N mode.
    /// Given both, threshold wins.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(ref index) = self.index {
            config.set("index_strategy", index)?;
        }
        if let Some(ref scorer) = self.name_scorer {
            config.set("name_scorer", scorer)?;
        }
        if let Some(ref scorer) = self.string_scorer {
            config.set("string_scorer", scorer)?;
        }
        if let Some(ref preprocessor) = self.preprocessor {
            config.preprocessor = preprocessor.clone();
        }
        if let Some(max) = self.max {
            config.max_count = max;
            config.selection_mode = SelectionMode::TopN;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
            config.selection_mode = SelectionMode::Threshold;
        }
        Ok(())
    }
}
