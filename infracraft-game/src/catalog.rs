//! Scenario catalog: the static puzzle content shipped with the game.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::puzzle::{PuzzleScenario, ScenarioError};

const DEFAULT_SCENARIO_DATA: &str = include_str!("../assets/scenarios.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scenario content: {0}")]
    Invalid(#[from] ScenarioError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScenarioCatalog {
    #[serde(default)]
    scenarios: Vec<PuzzleScenario>,
}

impl ScenarioCatalog {
    /// Build a catalog from already-parsed scenarios.
    ///
    /// # Errors
    ///
    /// Returns an error if any scenario fails validation or two scenarios
    /// share an id.
    pub fn new(scenarios: Vec<PuzzleScenario>) -> Result<Self, ScenarioError> {
        let catalog = Self { scenarios };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the content is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Catalog built from the embedded fixture data.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_SCENARIO_DATA) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("embedded scenario catalog rejected: {err}");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<ScenarioCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// Check every scenario and that scenario ids are unique.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScenarioError`] found.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut ids = HashSet::new();
        for scenario in &self.scenarios {
            if !ids.insert(scenario.id.as_str()) {
                return Err(ScenarioError::DuplicateScenario {
                    scenario_id: scenario.id.clone(),
                });
            }
            scenario.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, scenario_id: &str) -> Option<&PuzzleScenario> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.id == scenario_id)
    }

    /// Scenario ids in catalog order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.scenarios
            .iter()
            .map(|scenario| scenario.id.as_str())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PuzzleScenario> {
        self.scenarios.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

impl<'a> IntoIterator for &'a ScenarioCatalog {
    type Item = &'a PuzzleScenario;
    type IntoIter = std::slice::Iter<'a, PuzzleScenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
