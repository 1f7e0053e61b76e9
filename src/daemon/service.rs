//! Daemon service - dispatches requests to the matching engine.
//!
//! Keeps hot resources between requests: the engine with its cached index,
//! the named collections loaded so far, and the preprocessor (with its
//! nickname table). Repeated calls against the same loaded list hand the
//! engine the same collection handle, so the index is built once.
//!
//! Methods: health, load, lists, unload, search, compare, dedupe, config.
//! Matching methods accept config keys as extra params, applied to that
//! request only.
//!
//! CHANGELOG:
//! - 20/10/2026 - Lists loaded from URLs
//! - 06/02/2026 - Per-request config overrides
//! - 02/02/2026 - Initial implementation

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::config::{Config, CONFIG_KEYS};
use crate::engine::{MatchEngine, MatchResult};
use crate::loader;
use crate::preprocess::Preprocessor;
use crate::record::Collection;

type Params = HashMap<String, Value>;

/// Params that name lists or queries rather than config keys.
const RESERVED_PARAMS: &[&str] = &["list", "list_a", "list_b", "query", "name", "path"];

/// A collection loaded from a file or URL under a name.
struct LoadedList {
    collection: Collection,
    source: String,
    loaded_at: String,
}

/// Daemon service with hot resources.
pub struct DaemonService {
    engine: MatchEngine,
    lists: BTreeMap<String, LoadedList>,
    config: Config,
    preprocessor: Preprocessor,
    started_at: String,
    requests: u64,
}

impl DaemonService {
    pub fn new(config: Config) -> Self {
        let preprocessor = config.preprocessor();
        Self {
            engine: MatchEngine::new(),
            lists: BTreeMap::new(),
            config,
            preprocessor,
            started_at: chrono::Utc::now().to_rfc3339(),
            requests: 0,
        }
    }

    /// Dispatch request to appropriate handler.
    pub fn dispatch(&mut self, method: &str, params: Params) -> Result<Value> {
        self.requests += 1;
        match method {
            "health" => self.health(),
            "load" => self.load(params),
            "lists" => self.lists(),
            "unload" => self.unload(params),
            "search" => self.search(params),
            "compare" => self.compare(params),
            "dedupe" => self.dedupe(params),
            "config" => self.configure(params),
            _ => Err(anyhow!("Unknown method: {}", method)),
        }
    }

    // ========================================================================
    // Health / Lists
    // ========================================================================

    fn health(&self) -> Result<Value> {
        Ok(json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": env!("CARGO_PKG_VERSION"),
            "requests": self.requests,
            "lists_loaded": self.lists.len(),
            "index_strategy": self.engine.active_strategy().map(|k| k.name()),
            "index_built": self.engine.is_index_built(),
        }))
    }

    /// Params: name, path (a file or an http(s) URL)
    fn load(&mut self, params: Params) -> Result<Value> {
        let name = str_param(&params, "name")?.to_string();
        let source = str_param(&params, "path")?.to_string();

        let collection = loader::load_source(&source, &self.preprocessor)?;
        let records = collection.len();
        info!(list = %name, records, source = %source, "list loaded");

        let replaced = self
            .lists
            .insert(
                name.clone(),
                LoadedList {
                    collection,
                    source: source.clone(),
                    loaded_at: chrono::Utc::now().to_rfc3339(),
                },
            )
            .is_some();

        Ok(json!({
            "name": name,
            "path": source,
            "records": records,
            "replaced": replaced,
        }))
    }

    fn lists(&self) -> Result<Value> {
        let lists: Vec<Value> = self
            .lists
            .iter()
            .map(|(name, list)| {
                json!({
                    "name": name,
                    "path": list.source,
                    "records": list.collection.len(),
                    "loaded_at": list.loaded_at,
                })
            })
            .collect();
        Ok(json!({ "lists": lists, "count": lists.len() }))
    }

    /// Params: name
    fn unload(&mut self, params: Params) -> Result<Value> {
        let name = str_param(&params, "name")?;
        self.lists
            .remove(name)
            .ok_or_else(|| anyhow!("No list loaded under name: {}", name))?;
        Ok(json!({ "name": name, "unloaded": true }))
    }

    fn list(&self, name: &str) -> Result<Collection> {
        self.lists
            .get(name)
            .map(|list| list.collection.clone())
            .ok_or_else(|| anyhow!("No list loaded under name: {} (use the load method first)", name))
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Params: list, query, plus config overrides
    fn search(&mut self, params: Params) -> Result<Value> {
        let config = self.effective_config(&params)?;
        let names = self.list(str_param(&params, "list")?)?;
        let query_text = str_param(&params, "query")?;

        let results = if config.preprocessor == self.config.preprocessor
            && config.nickname_file == self.config.nickname_file
        {
            self.engine.search(query_text, &names, &self.preprocessor, &config)
        } else {
            self.engine.search(query_text, &names, &config.preprocessor(), &config)
        };
        results_value(&results, &config)
    }

    /// Params: list_a, list_b, plus config overrides
    fn compare(&mut self, params: Params) -> Result<Value> {
        let config = self.effective_config(&params)?;
        let list_a = self.list(str_param(&params, "list_a")?)?;
        let list_b = self.list(str_param(&params, "list_b")?)?;

        let results = self.engine.compare(&list_a, &list_b, &config);
        results_value(&results, &config)
    }

    /// Params: list, plus config overrides
    fn dedupe(&mut self, params: Params) -> Result<Value> {
        let config = self.effective_config(&params)?;
        let names = self.list(str_param(&params, "list")?)?;

        let results = self.engine.deduplicate(&names, &config);
        results_value(&results, &config)
    }

    // ========================================================================
    // Config
    // ========================================================================

    /// Apply overrides to the daemon's config for all later requests.
    ///
    /// Lists already loaded keep the tokens of the preprocessor they were
    /// loaded with.
    fn configure(&mut self, params: Params) -> Result<Value> {
        let config = self.effective_config(&params)?;
        if config.preprocessor != self.config.preprocessor
            || config.nickname_file != self.config.nickname_file
        {
            self.preprocessor = config.preprocessor();
        }
        self.config = config;
        Ok(serde_json::to_value(&self.config)?)
    }

    /// Daemon config with this request's config keys applied.
    fn effective_config(&self, params: &Params) -> Result<Config> {
        let mut config = self.config.clone();
        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            if !CONFIG_KEYS.contains(&key.as_str()) {
                return Err(anyhow!("Unknown param: {}", key));
            }
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            config
                .set(key, &value)
                .with_context(|| format!("Invalid value for {}", key))?;
        }
        Ok(config)
    }
}

fn str_param<'a>(params: &'a Params, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing string param: {}", key))
}

fn results_value(results: &[MatchResult], config: &Config) -> Result<Value> {
    Ok(json!({
        "results": results,
        "count": results.len(),
        "index_strategy": config.index_strategy.name(),
        "measure": config.name_scorer().name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn service_with_list() -> (DaemonService, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "namematch-service-{}-{}.txt",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "john smith\njane smith\npeter jones\n").unwrap();

        let mut service = DaemonService::new(Config::default());
        service
            .dispatch(
                "load",
                params(&[("name", json!("people")), ("path", json!(path.to_string_lossy()))]),
            )
            .unwrap();
        (service, path)
    }

    #[test]
    fn test_load_and_list() {
        let (mut service, path) = service_with_list();
        let lists = service.dispatch("lists", Params::new()).unwrap();
        assert_eq!(lists["count"], 1);
        assert_eq!(lists["lists"][0]["records"], 3);

        service.dispatch("unload", params(&[("name", json!("people"))])).unwrap();
        assert!(service.dispatch("unload", params(&[("name", json!("people"))])).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_dedupe_with_overrides() {
        let (mut service, path) = service_with_list();
        let result = service
            .dispatch(
                "dedupe",
                params(&[
                    ("list", json!("people")),
                    ("index_strategy", json!("BUCKET_LAST_TOKEN")),
                    ("max_count", json!(0)),
                ]),
            )
            .unwrap();
        assert_eq!(result["count"], 1);
        assert_eq!(result["results"][0]["id_a"], "L_1");
        assert_eq!(result["results"][0]["id_b"], "L_2");
        assert_eq!(result["index_strategy"], "BUCKET_LAST_TOKEN");

        // overrides do not stick
        let health = service.dispatch("health", Params::new()).unwrap();
        assert_eq!(health["index_built"], true);
        let config = service.dispatch("config", Params::new()).unwrap();
        assert_eq!(config["index_strategy"], "FULL");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_search_and_config() {
        let (mut service, path) = service_with_list();
        service
            .dispatch("config", params(&[("name_scorer", json!("JACCARD"))]))
            .unwrap();

        let result = service
            .dispatch("search", params(&[("list", json!("people")), ("query", json!("Smith John"))]))
            .unwrap();
        assert_eq!(result["measure"], "JACCARD_TOKEN_SET");
        assert_eq!(result["results"][0]["id_b"], "L_1");
        assert_eq!(result["results"][0]["score"], 1.0);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_requests() {
        let (mut service, path) = service_with_list();
        assert!(service.dispatch("search", params(&[("list", json!("people"))])).is_err());
        assert!(service.dispatch("dedupe", params(&[("list", json!("nobody"))])).is_err());
        assert!(service
            .dispatch("dedupe", params(&[("list", json!("people")), ("colour", json!("red"))]))
            .is_err());
        assert!(service.dispatch("teleport", Params::new()).is_err());
        std::fs::remove_file(path).ok();
    }
}
