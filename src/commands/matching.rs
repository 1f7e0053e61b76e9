//! Matching commands: search, compare, dedupe, strategies.
//!
//! Each command loads its names lists (files or URLs) with the configured
//! preprocessor and runs one engine call. The index is not kept between invocations; the
//! daemon exists for that.
//!
//! CHANGELOG:
//! - 20/10/2026 - Names lists from URLs, one preprocessor per command
//! - 02/02/2026 - Initial implementation

use anyhow::Result;
use serde::Serialize;

use crate::config::{Config, SelectionMode};
use crate::engine::MatchEngine;
use crate::index::IndexKind;
use crate::loader;
use crate::output::OutputControls;
use crate::preprocess::Stage;
use crate::scoring::{NameScorerKind, StringScorer};

/// Search one name against a names list.
pub fn search(query: &str, source: &str, config: &Config, output: &OutputControls) -> Result<()> {
    let preprocessor = config.preprocessor();
    let names = loader::load_source(source, &preprocessor)?;
    let results = MatchEngine::new().search(query, &names, &preprocessor, config);
    output.print_results(&results);
    Ok(())
}

/// Match every name of `source_a` against `source_b`.
pub fn compare(source_a: &str, source_b: &str, config: &Config, output: &OutputControls) -> Result<()> {
    let preprocessor = config.preprocessor();
    let list_a = loader::load_source(source_a, &preprocessor)?;
    let list_b = loader::load_source(source_b, &preprocessor)?;
    let results = MatchEngine::new().compare(&list_a, &list_b, config);
    output.print_results(&results);
    Ok(())
}

/// Likely duplicates within one names list.
pub fn dedupe(source: &str, config: &Config, output: &OutputControls) -> Result<()> {
    let preprocessor = config.preprocessor();
    let names = loader::load_source(source, &preprocessor)?;
    let results = MatchEngine::new().deduplicate(&names, config);
    output.print_results(&results);
    Ok(())
}

/// Every strategy name the configuration accepts.
#[derive(Debug, Serialize)]
pub struct StrategyList {
    pub index_strategies: Vec<&'static str>,
    pub name_scorers: Vec<&'static str>,
    pub string_scorers: Vec<&'static str>,
    pub preprocessing_stages: Vec<&'static str>,
    pub selection_modes: Vec<&'static str>,
}

impl StrategyList {
    pub fn collect() -> Self {
        Self {
            index_strategies: IndexKind::ALL.iter().map(IndexKind::name).collect(),
            name_scorers: NameScorerKind::ALL.iter().map(NameScorerKind::name).collect(),
            string_scorers: StringScorer::ALL.iter().map(StringScorer::name).collect(),
            preprocessing_stages: Stage::ALL.iter().map(Stage::name).collect(),
            selection_modes: vec![SelectionMode::Threshold.name(), SelectionMode::TopN.name()],
        }
    }
}

pub fn strategies(output: &OutputControls) -> Result<()> {
    let list = StrategyList::collect();
    if output.json {
        output.print(&list);
        return Ok(());
    }

    let sections = [
        ("Index strategies", &list.index_strategies),
        ("Name scorers", &list.name_scorers),
        ("String scorers", &list.string_scorers),
        ("Preprocessing stages (combine with PIPELINE:A,B)", &list.preprocessing_stages),
        ("Selection modes", &list.selection_modes),
    ];
    for (title, names) in sections {
        println!("{}:", title);
        for name in names {
            println!("  {}", name);
        }
    }
    Ok(())
}
