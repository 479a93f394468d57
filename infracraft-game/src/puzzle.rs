//! Scenario, component and layout data model.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::metrics::{LayoutMetrics, MetricMap, MetricType};

/// Quantity used when a layout entry omits it or carries NaN.
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Comparison applied between an observed metric and a requirement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
    /// Exact floating-point equality, no tolerance. Aggregated metrics rarely
    /// land exactly on a target, so `>=`/`<=` suit anything additive.
    #[serde(rename = "=")]
    Equal,
}

impl Comparator {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
            Self::Equal => "=",
        }
    }

    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn holds(self, observed: f64, target: f64) -> bool {
        match self {
            Self::AtLeast => observed >= target,
            Self::AtMost => observed <= target,
            Self::Equal => observed == target,
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single metric threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    pub metric: MetricType,
    pub comparator: Comparator,
    pub value: f64,
}

impl Requirement {
    /// Metric value this requirement reads from `metrics`.
    #[must_use]
    pub fn observed(&self, metrics: &LayoutMetrics) -> f64 {
        metrics.value(self.metric)
    }

    #[must_use]
    pub fn is_met(&self, metrics: &LayoutMetrics) -> bool {
        self.comparator.holds(self.observed(metrics), self.value)
    }
}

/// Structural rule on how a component may appear in a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentConstraint {
    /// At most `limit` units across the whole layout.
    MaxQuantity { limit: f64 },
    /// The named component must also be present with a positive quantity.
    RequiresComponent {
        #[serde(rename = "componentId")]
        component_id: String,
    },
}

/// A catalog item the player can place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    /// TPS contribution per unit
    pub throughput: f64,
    /// Latency delta in ms per unit; negative values reduce latency
    pub latency_impact: f64,
    /// Per-unit deltas for further metrics. `tps`/`latency` entries are legal
    /// and fold into the dedicated totals.
    #[serde(default, skip_serializing_if = "MetricMap::is_empty")]
    pub modifiers: MetricMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ComponentConstraint>,
}

/// Named group of requirements that must all pass together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryCondition {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// A puzzle instance: baseline metrics, the palette and the win conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleScenario {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Dominant constraint tag (cpu, latency, bandwidth, ...)
    pub bottleneck: String,
    pub baseline_throughput: f64,
    pub baseline_latency: f64,
    #[serde(default, skip_serializing_if = "MetricMap::is_empty")]
    pub baseline_modifiers: MetricMap,
    pub available_components: Vec<ComponentDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_requirements: Vec<Requirement>,
    pub victory_conditions: Vec<VictoryCondition>,
}

/// Content-authoring defects detected when a scenario is loaded.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScenarioError {
    #[error("scenario '{scenario_id}' is declared more than once")]
    DuplicateScenario { scenario_id: String },
    #[error("scenario '{scenario_id}' declares component '{component_id}' more than once")]
    DuplicateComponent {
        scenario_id: String,
        component_id: String,
    },
    #[error(
        "scenario '{scenario_id}': component '{component_id}' requires unknown component '{required}'"
    )]
    UnknownRequiredComponent {
        scenario_id: String,
        component_id: String,
        required: String,
    },
    #[error("scenario '{scenario_id}': component '{component_id}' has invalid limit {limit}")]
    InvalidLimit {
        scenario_id: String,
        component_id: String,
        limit: f64,
    },
    #[error("scenario '{scenario_id}': requirement '{requirement_id}' repeated in {scope}")]
    DuplicateRequirement {
        scenario_id: String,
        scope: String,
        requirement_id: String,
    },
    #[error("scenario '{scenario_id}' has no victory conditions")]
    NoVictoryConditions { scenario_id: String },
}

impl PuzzleScenario {
    #[must_use]
    pub fn find_component(&self, component_id: &str) -> Option<&ComponentDefinition> {
        self.available_components
            .iter()
            .find(|component| component.id == component_id)
    }

    /// Components keyed by id.
    #[must_use]
    pub fn component_lookup(&self) -> HashMap<&str, &ComponentDefinition> {
        self.available_components
            .iter()
            .map(|component| (component.id.as_str(), component))
            .collect()
    }

    /// Metrics with zero components placed.
    #[must_use]
    pub fn baseline_metrics(&self) -> LayoutMetrics {
        LayoutMetrics::from_baseline(
            self.baseline_throughput,
            self.baseline_latency,
            &self.baseline_modifiers,
        )
    }

    /// Check the scenario for authoring defects.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScenarioError`] found.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.victory_conditions.is_empty() {
            return Err(ScenarioError::NoVictoryConditions {
                scenario_id: self.id.clone(),
            });
        }

        let mut component_ids = HashSet::new();
        for component in &self.available_components {
            if !component_ids.insert(component.id.as_str()) {
                return Err(ScenarioError::DuplicateComponent {
                    scenario_id: self.id.clone(),
                    component_id: component.id.clone(),
                });
            }
        }

        for component in &self.available_components {
            for constraint in &component.constraints {
                match constraint {
                    ComponentConstraint::MaxQuantity { limit } => {
                        if !limit.is_finite() || *limit < 0.0 {
                            return Err(ScenarioError::InvalidLimit {
                                scenario_id: self.id.clone(),
                                component_id: component.id.clone(),
                                limit: *limit,
                            });
                        }
                    }
                    ComponentConstraint::RequiresComponent { component_id } => {
                        if !component_ids.contains(component_id.as_str()) {
                            return Err(ScenarioError::UnknownRequiredComponent {
                                scenario_id: self.id.clone(),
                                component_id: component.id.clone(),
                                required: component_id.clone(),
                            });
                        }
                    }
                }
            }
        }

        self.check_unique_requirements("global requirements", &self.global_requirements)?;
        for victory in &self.victory_conditions {
            let scope = format!("victory condition '{}'", victory.id);
            self.check_unique_requirements(&scope, &victory.requirements)?;
        }
        Ok(())
    }

    fn check_unique_requirements(
        &self,
        scope: &str,
        requirements: &[Requirement],
    ) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for requirement in requirements {
            if !seen.insert(requirement.id.as_str()) {
                return Err(ScenarioError::DuplicateRequirement {
                    scenario_id: self.id.clone(),
                    scope: scope.to_string(),
                    requirement_id: requirement.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Normalize a raw layout quantity: absent or NaN becomes
/// [`DEFAULT_QUANTITY`], negatives floor at 0.
#[must_use]
pub fn normalize_quantity(quantity: Option<f64>) -> f64 {
    match quantity {
        Some(value) if !value.is_nan() => value.max(0.0),
        _ => DEFAULT_QUANTITY,
    }
}

/// One entry in a player's layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutComponent {
    pub component_id: String,
    /// Raw quantity. Non-numeric JSON values read as absent.
    #[serde(
        default,
        deserialize_with = "lenient_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<f64>,
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

impl LayoutComponent {
    #[must_use]
    pub fn new(component_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            component_id: component_id.into(),
            quantity: Some(quantity),
        }
    }

    #[must_use]
    pub fn normalized_quantity(&self) -> f64 {
        normalize_quantity(self.quantity)
    }
}

/// A player's chosen components. The same id may appear more than once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerLayout {
    #[serde(default)]
    pub components: Vec<LayoutComponent>,
}

impl PlayerLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry with an explicit quantity.
    #[must_use]
    pub fn with(mut self, component_id: impl Into<String>, quantity: f64) -> Self {
        self.components.push(LayoutComponent::new(component_id, quantity));
        self
    }

    /// Derive a layout from individually placed components, one unit per
    /// placement, grouped by id in first-seen order.
    pub fn from_placements<I, S>(placements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = LayoutCounts::default();
        for component_id in placements {
            counts.add(component_id.as_ref(), 1.0);
        }
        Self {
            components: counts
                .iter()
                .map(|(component_id, quantity)| LayoutComponent::new(component_id, quantity))
                .collect(),
        }
    }

    /// Normalized quantities summed per id.
    #[must_use]
    pub fn consolidated(&self) -> LayoutCounts {
        let mut counts = LayoutCounts::default();
        for entry in &self.components {
            counts.add(&entry.component_id, entry.normalized_quantity());
        }
        counts
    }
}

/// Consolidated per-id quantities, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutCounts {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl LayoutCounts {
    pub fn add(&mut self, component_id: &str, quantity: f64) {
        if let Some(&slot) = self.index.get(component_id) {
            self.entries[slot].1 += quantity;
        } else {
            self.index
                .insert(component_id.to_string(), self.entries.len());
            self.entries.push((component_id.to_string(), quantity));
        }
    }

    /// Quantity for `component_id`, 0 when absent.
    #[must_use]
    pub fn get(&self, component_id: &str) -> f64 {
        self.index
            .get(component_id)
            .map_or(0.0, |&slot| self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(component_id, quantity)| (component_id.as_str(), *quantity))
    }
}

/// Outcome of validating a layout against a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub metrics: LayoutMetrics,
    pub unmet_requirements: Vec<Requirement>,
    pub unknown_components: Vec<String>,
    pub constraint_violations: Vec<String>,
    pub victory_conditions_met: Vec<String>,
}

impl ValidationResult {
    /// Clean run: nothing unmet, violated or unknown, and at least one
    /// victory condition met.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.unmet_requirements.is_empty()
            && self.constraint_violations.is_empty()
            && self.unknown_components.is_empty()
            && !self.victory_conditions_met.is_empty()
    }
}
