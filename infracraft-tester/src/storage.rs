//! Completion history persisted as a single JSON document keyed by scenario id.
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use infracraft_game::{CompletionStore, ScenarioCompletion};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode completion history: {0}")]
    Json(#[from] serde_json::Error),
}

/// Completion history file. Entries are decoded one by one so a malformed
/// record never hides, or drops on rewrite, the rest of the document.
#[derive(Debug, Clone)]
pub struct JsonFileCompletionStore {
    path: PathBuf,
}

impl JsonFileCompletionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file, or one that is not a JSON object, reads as empty.
    fn read_document(&self) -> Result<Map<String, Value>, CompletionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(CompletionStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => {
                log::warn!(
                    "ignoring completion history {}: not a JSON object",
                    self.path.display()
                );
                Ok(Map::new())
            }
            Err(err) => {
                log::warn!(
                    "ignoring unparsable completion history {}: {err}",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }
}

fn decode_entries(scenario_id: &str, entries: Vec<Value>) -> Vec<ScenarioCompletion> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(completion) => Some(completion),
            Err(err) => {
                log::warn!("skipping malformed completion for '{scenario_id}': {err}");
                None
            }
        })
        .collect()
}

impl CompletionStore for JsonFileCompletionStore {
    type Error = CompletionStoreError;

    fn load(&self, scenario_id: &str) -> Result<Vec<ScenarioCompletion>, Self::Error> {
        match self.read_document()?.remove(scenario_id) {
            Some(Value::Array(entries)) => Ok(decode_entries(scenario_id, entries)),
            _ => Ok(Vec::new()),
        }
    }

    fn append(&self, scenario_id: &str, completion: ScenarioCompletion) -> Result<(), Self::Error> {
        let mut document = self.read_document()?;
        let entry = serde_json::to_value(completion)?;
        match document.get_mut(scenario_id) {
            Some(Value::Array(entries)) => entries.push(entry),
            _ => {
                document.insert(scenario_id.to_string(), Value::Array(vec![entry]));
            }
        }
        let payload = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, payload).map_err(|source| CompletionStoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("wrote completion history to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infracraft_game::LayoutMetrics;

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "infracraft-store-{label}-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn completion(scenario_id: &str, completed_at: i64) -> ScenarioCompletion {
        ScenarioCompletion {
            scenario_id: scenario_id.to_string(),
            victory_conditions_met: vec!["campaign-success".to_string()],
            metrics: LayoutMetrics::default(),
            completed_at,
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let store = JsonFileCompletionStore::new(temp_path("missing"));
        assert!(store.load("cpu-burst").unwrap().is_empty());
    }

    #[test]
    fn garbage_file_reads_as_empty() {
        let path = temp_path("garbage");
        fs::write(&path, "not json").unwrap();
        let store = JsonFileCompletionStore::new(&path);
        assert!(store.load("cpu-burst").unwrap().is_empty());
        store.append("cpu-burst", completion("cpu-burst", 5)).unwrap();
        assert_eq!(store.load("cpu-burst").unwrap().len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn append_keeps_order_and_scenarios_apart() {
        let path = temp_path("append");
        let store = JsonFileCompletionStore::new(&path);
        store.append("cpu-burst", completion("cpu-burst", 1)).unwrap();
        store
            .append("bandwidth-crunch", completion("bandwidth-crunch", 2))
            .unwrap();
        store.append("cpu-burst", completion("cpu-burst", 3)).unwrap();

        let reopened = JsonFileCompletionStore::new(&path);
        let history = reopened.load("cpu-burst").unwrap();
        assert_eq!(
            history.iter().map(|c| c.completed_at).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(reopened.load("bandwidth-crunch").unwrap().len(), 1);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cpu-burst"][0]["completedAt"], 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_entry_spares_the_rest_of_the_history() {
        let path = temp_path("malformed");
        let valid = serde_json::to_value(completion("bandwidth-crunch", 7)).unwrap();
        let mut broken = serde_json::to_value(completion("cpu-burst", 8)).unwrap();
        broken["completedAt"] = serde_json::json!(1.5);
        let healthy = serde_json::to_value(completion("cpu-burst", 9)).unwrap();
        let document = serde_json::json!({
            "bandwidth-crunch": [valid],
            "cpu-burst": [broken, healthy],
        });
        fs::write(&path, document.to_string()).unwrap();

        let store = JsonFileCompletionStore::new(&path);
        assert_eq!(store.load("bandwidth-crunch").unwrap().len(), 1);
        let cpu_burst = store.load("cpu-burst").unwrap();
        assert_eq!(
            cpu_burst.iter().map(|c| c.completed_at).collect::<Vec<_>>(),
            vec![9]
        );

        store
            .append("latency-sensitive", completion("latency-sensitive", 10))
            .unwrap();
        assert_eq!(store.load("bandwidth-crunch").unwrap().len(), 1);
        assert_eq!(store.load("latency-sensitive").unwrap().len(), 1);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cpu-burst"].as_array().map(Vec::len), Some(2));
        assert_eq!(raw["cpu-burst"][0]["completedAt"], 1.5);
        let _ = fs::remove_file(path);
    }
}
