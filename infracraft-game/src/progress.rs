//! Per-requirement progress toward a scenario's goals.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::metrics::LayoutMetrics;
use crate::puzzle::{Comparator, PuzzleScenario, Requirement};

/// Observed value and pass/fail state of one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementStatus {
    pub requirement: Requirement,
    pub observed: f64,
    pub met: bool,
}

impl RequirementStatus {
    #[must_use]
    pub fn evaluate(requirement: &Requirement, metrics: &LayoutMetrics) -> Self {
        Self {
            requirement: requirement.clone(),
            observed: requirement.observed(metrics),
            met: requirement.is_met(metrics),
        }
    }

    /// Distance still to cover: the amount missing for `>=`, the amount over
    /// the limit for `<=` (both 0 once met), the absolute gap for `=`.
    #[must_use]
    pub fn shortfall(&self) -> f64 {
        let target = self.requirement.value;
        match self.requirement.comparator {
            Comparator::AtLeast => (target - self.observed).max(0.0),
            Comparator::AtMost => (self.observed - target).max(0.0),
            Comparator::Equal => (self.observed - target).abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryStatus {
    pub id: String,
    pub description: String,
    pub met: bool,
    pub requirements: Vec<RequirementStatus>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequirementProgress {
    pub global: Vec<RequirementStatus>,
    pub victories: Vec<VictoryStatus>,
}

impl RequirementProgress {
    /// Statuses that currently fail, global ones first, without repeats.
    #[must_use]
    pub fn failing(&self) -> Vec<&RequirementStatus> {
        let mut seen: HashSet<String> = HashSet::new();
        self.global
            .iter()
            .chain(self.victories.iter().flat_map(|victory| &victory.requirements))
            .filter(|status| !status.met && seen.insert(status.requirement.id.clone()))
            .collect()
    }
}

/// Evaluate every requirement of `scenario` against `metrics`.
///
/// Statuses are shared by requirement id: the first requirement seen under an
/// id decides the status reported for every later one.
#[must_use]
pub fn requirement_progress(scenario: &PuzzleScenario, metrics: &LayoutMetrics) -> RequirementProgress {
    let mut statuses: HashMap<String, RequirementStatus> = HashMap::new();
    let mut status_for = |requirement: &Requirement| {
        statuses
            .entry(requirement.id.clone())
            .or_insert_with(|| RequirementStatus::evaluate(requirement, metrics))
            .clone()
    };

    let global: Vec<RequirementStatus> = scenario
        .global_requirements
        .iter()
        .map(&mut status_for)
        .collect();

    let victories: Vec<VictoryStatus> = scenario
        .victory_conditions
        .iter()
        .map(|victory| {
            let requirements: Vec<RequirementStatus> =
                victory.requirements.iter().map(&mut status_for).collect();
            VictoryStatus {
                id: victory.id.clone(),
                description: victory.description.clone(),
                met: requirements.iter().all(|status| status.met),
                requirements,
            }
        })
        .collect();

    RequirementProgress { global, victories }
}
