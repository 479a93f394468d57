//! Infracraft Puzzle Engine
//!
//! Platform-agnostic core logic for the Infracraft infrastructure design puzzle.
//! Players place caches, servers, queues and the like; this crate aggregates a
//! layout into metrics and judges it against a scenario's requirements, without
//! UI or storage dependencies.

pub mod aggregator;
pub mod catalog;
pub mod completion;
pub mod metrics;
pub mod progress;
pub mod puzzle;
pub mod validator;

// Re-export commonly used types
pub use aggregator::{apply_component, compute_metrics};
pub use catalog::{CatalogError, ScenarioCatalog};
pub use completion::{CompletionStore, MemoryCompletionStore, ScenarioCompletion};
pub use metrics::{LayoutMetrics, MetricMap, MetricType};
pub use progress::{RequirementProgress, RequirementStatus, VictoryStatus, requirement_progress};
pub use puzzle::{
    Comparator, ComponentConstraint, ComponentDefinition, DEFAULT_QUANTITY, LayoutComponent,
    LayoutCounts, PlayerLayout, PuzzleScenario, Requirement, ScenarioError, ValidationResult,
    VictoryCondition, normalize_quantity,
};
pub use validator::{check_constraints, validate_layout};

use thiserror::Error;

/// Errors surfaced by [`PuzzleEngine`].
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
    #[error("completion storage failed: {0}")]
    Storage(#[source] E),
}

/// Outcome of submitting a layout for a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub validation: ValidationResult,
    /// Whether a completion was appended to the history
    pub recorded: bool,
}

/// Ties a scenario catalog to a completion store.
///
/// Validation itself stays a pure function of layout and scenario; the engine
/// only resolves scenario ids and records successful runs.
pub struct PuzzleEngine<S>
where
    S: CompletionStore,
{
    catalog: ScenarioCatalog,
    store: S,
}

impl<S> PuzzleEngine<S>
where
    S: CompletionStore,
{
    /// Create a new engine with the provided catalog and store
    pub const fn new(catalog: ScenarioCatalog, store: S) -> Self {
        Self { catalog, store }
    }

    /// Create an engine over the embedded fixture scenarios
    pub fn with_default_catalog(store: S) -> Self {
        Self::new(ScenarioCatalog::default_catalog().clone(), store)
    }

    #[must_use]
    pub const fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn scenario(&self, scenario_id: &str) -> Option<&PuzzleScenario> {
        self.catalog.get(scenario_id)
    }

    fn require_scenario(&self, scenario_id: &str) -> Result<&PuzzleScenario, EngineError<S::Error>> {
        self.scenario(scenario_id)
            .ok_or_else(|| EngineError::UnknownScenario(scenario_id.to_string()))
    }

    /// Validate a layout against a catalog scenario
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario id is not in the catalog.
    pub fn validate(
        &self,
        scenario_id: &str,
        layout: &PlayerLayout,
    ) -> Result<ValidationResult, EngineError<S::Error>> {
        let scenario = self.require_scenario(scenario_id)?;
        Ok(validate_layout(layout, scenario))
    }

    /// Validate a layout and record a completion when the run is successful
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario id is unknown or the completion cannot
    /// be stored.
    pub fn submit(
        &self,
        scenario_id: &str,
        layout: &PlayerLayout,
        completed_at: i64,
    ) -> Result<Submission, EngineError<S::Error>> {
        let validation = self.validate(scenario_id, layout)?;
        let recorded = validation.is_successful();
        if recorded {
            let completion = ScenarioCompletion {
                scenario_id: scenario_id.to_string(),
                victory_conditions_met: validation.victory_conditions_met.clone(),
                metrics: validation.metrics.clone(),
                completed_at,
            };
            self.store
                .append(scenario_id, completion)
                .map_err(EngineError::Storage)?;
            log::info!("recorded completion for scenario '{scenario_id}'");
        }
        Ok(Submission {
            validation,
            recorded,
        })
    }

    /// Completion history for a scenario
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be loaded.
    pub fn completions(
        &self,
        scenario_id: &str,
    ) -> Result<Vec<ScenarioCompletion>, EngineError<S::Error>> {
        self.store.load(scenario_id).map_err(EngineError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winning_layout() -> PlayerLayout {
        PlayerLayout::new()
            .with("edge-cache", 4.0)
            .with("app-server", 1.0)
    }

    #[test]
    fn engine_records_only_successful_runs() {
        let store = MemoryCompletionStore::new();
        let engine = PuzzleEngine::with_default_catalog(store.clone());

        let failed = engine
            .submit("cpu-burst", &PlayerLayout::new(), 1_000)
            .unwrap();
        assert!(!failed.recorded);
        assert!(engine.completions("cpu-burst").unwrap().is_empty());

        let won = engine.submit("cpu-burst", &winning_layout(), 2_000).unwrap();
        assert!(won.recorded);
        assert_eq!(won.validation.victory_conditions_met, vec!["campaign-success"]);

        let history = store.load("cpu-burst").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].completed_at, 2_000);
        assert_eq!(history[0].metrics, won.validation.metrics);
    }

    #[test]
    fn victory_with_violation_is_not_recorded() {
        let engine = PuzzleEngine::with_default_catalog(MemoryCompletionStore::new());
        let layout = PlayerLayout::new().with("edge-cache", 5.0);
        let submission = engine.submit("cpu-burst", &layout, 0).unwrap();
        assert!(!submission.validation.victory_conditions_met.is_empty());
        assert!(!submission.recorded);
    }

    #[test]
    fn unknown_scenario_is_an_error() {
        let engine = PuzzleEngine::with_default_catalog(MemoryCompletionStore::new());
        let err = engine.validate("nope", &PlayerLayout::new()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownScenario(ref id) if id == "nope"));
        assert_eq!(err.to_string(), "unknown scenario 'nope'");
    }
}
