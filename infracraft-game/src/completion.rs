//! Completion history records and the storage seam the caller plugs in.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use crate::metrics::LayoutMetrics;

/// A successful run of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCompletion {
    pub scenario_id: String,
    pub victory_conditions_met: Vec<String>,
    pub metrics: LayoutMetrics,
    /// Milliseconds since the Unix epoch
    pub completed_at: i64,
}

/// Trait for abstracting completion history persistence.
/// Platform-specific implementations should provide this.
pub trait CompletionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Completions recorded for a scenario, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn load(&self, scenario_id: &str) -> Result<Vec<ScenarioCompletion>, Self::Error>;

    /// Append a completion to a scenario's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    fn append(&self, scenario_id: &str, completion: ScenarioCompletion) -> Result<(), Self::Error>;
}

/// Process-local store; clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct MemoryCompletionStore {
    completions: Rc<RefCell<HashMap<String, Vec<ScenarioCompletion>>>>,
}

impl MemoryCompletionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionStore for MemoryCompletionStore {
    type Error = Infallible;

    fn load(&self, scenario_id: &str) -> Result<Vec<ScenarioCompletion>, Self::Error> {
        Ok(self
            .completions
            .borrow()
            .get(scenario_id)
            .cloned()
            .unwrap_or_default())
    }

    fn append(&self, scenario_id: &str, completion: ScenarioCompletion) -> Result<(), Self::Error> {
        self.completions
            .borrow_mut()
            .entry(scenario_id.to_string())
            .or_default()
            .push(completion);
        Ok(())
    }
}
