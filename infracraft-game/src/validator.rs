//! Layout validation against a scenario's constraints and requirements.
use std::collections::HashSet;

use crate::aggregator::compute_metrics;
use crate::puzzle::{
    ComponentConstraint, ComponentDefinition, LayoutCounts, PlayerLayout, PuzzleScenario,
    Requirement, ValidationResult,
};

/// Validate `layout` against `scenario`.
///
/// Constraints are checked on the consolidated per-id quantities while the
/// metrics are recomputed from the raw entries. Unmet requirements are
/// deduplicated by id, first occurrence wins, with global requirements
/// evaluated before any victory condition.
#[must_use]
pub fn validate_layout(layout: &PlayerLayout, scenario: &PuzzleScenario) -> ValidationResult {
    let lookup = scenario.component_lookup();
    let counts = layout.consolidated();

    let mut unknown_components = Vec::new();
    let mut constraint_violations = Vec::new();
    for (component_id, quantity) in counts.iter() {
        match lookup.get(component_id) {
            Some(component) => {
                constraint_violations.extend(check_constraints(component, quantity, &counts));
            }
            None => {
                log::debug!(
                    "layout references unknown component '{component_id}' in scenario '{}'",
                    scenario.id
                );
                unknown_components.push(component_id.to_string());
            }
        }
    }

    let metrics = compute_metrics(layout, scenario);
    let mut unmet = UnmetRequirements::default();

    for requirement in &scenario.global_requirements {
        if !requirement.is_met(&metrics) {
            unmet.track(requirement);
        }
    }

    let mut victory_conditions_met = Vec::new();
    for victory in &scenario.victory_conditions {
        let failing: Vec<&Requirement> = victory
            .requirements
            .iter()
            .filter(|requirement| !requirement.is_met(&metrics))
            .collect();
        if failing.is_empty() {
            log::debug!("victory condition '{}' met", victory.id);
            victory_conditions_met.push(victory.id.clone());
        } else {
            for requirement in failing {
                unmet.track(requirement);
            }
        }
    }

    ValidationResult {
        metrics,
        unmet_requirements: unmet.into_inner(),
        unknown_components,
        constraint_violations,
        victory_conditions_met,
    }
}

/// Human-readable violations of `component`'s constraints at `quantity`.
#[must_use]
pub fn check_constraints(
    component: &ComponentDefinition,
    quantity: f64,
    counts: &LayoutCounts,
) -> Vec<String> {
    let mut violations = Vec::new();
    for constraint in &component.constraints {
        match constraint {
            ComponentConstraint::MaxQuantity { limit } => {
                if quantity > *limit {
                    violations.push(format!(
                        "{}: limited to {limit} but received {quantity}",
                        component.name
                    ));
                }
            }
            ComponentConstraint::RequiresComponent { component_id } => {
                if counts.get(component_id) <= 0.0 {
                    violations.push(format!(
                        "{}: requires component '{component_id}'",
                        component.name
                    ));
                }
            }
        }
    }
    if !violations.is_empty() {
        log::debug!("component '{}' violations: {violations:?}", component.id);
    }
    violations
}

#[derive(Default)]
struct UnmetRequirements {
    seen: HashSet<String>,
    requirements: Vec<Requirement>,
}

impl UnmetRequirements {
    fn track(&mut self, requirement: &Requirement) {
        if self.seen.insert(requirement.id.clone()) {
            self.requirements.push(requirement.clone());
        }
    }

    fn into_inner(self) -> Vec<Requirement> {
        self.requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricMap, MetricType};
    use crate::puzzle::{Comparator, VictoryCondition};

    fn requirement(id: &str, metric: MetricType, comparator: Comparator, value: f64) -> Requirement {
        Requirement {
            id: id.to_string(),
            description: format!("{id} requirement"),
            metric,
            comparator,
            value,
        }
    }

    fn component(id: &str, name: &str, constraints: Vec<ComponentConstraint>) -> ComponentDefinition {
        ComponentDefinition {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            throughput: 100.0,
            latency_impact: -10.0,
            modifiers: MetricMap::new(),
            constraints,
        }
    }

    fn scenario() -> PuzzleScenario {
        PuzzleScenario {
            id: "unit".to_string(),
            name: "Unit".to_string(),
            description: String::new(),
            bottleneck: "cpu".to_string(),
            baseline_throughput: 500.0,
            baseline_latency: 100.0,
            baseline_modifiers: MetricMap::new(),
            available_components: vec![
                component(
                    "cache",
                    "Cache",
                    vec![ComponentConstraint::MaxQuantity { limit: 2.0 }],
                ),
                component(
                    "worker",
                    "Worker",
                    vec![ComponentConstraint::RequiresComponent {
                        component_id: "queue".to_string(),
                    }],
                ),
                component("queue", "Queue", Vec::new()),
            ],
            global_requirements: vec![requirement(
                "tps-700",
                MetricType::Tps,
                Comparator::AtLeast,
                700.0,
            )],
            victory_conditions: vec![
                VictoryCondition {
                    id: "fast".to_string(),
                    description: String::new(),
                    requirements: vec![
                        requirement("tps-700", MetricType::Tps, Comparator::AtLeast, 700.0),
                        requirement("latency-90", MetricType::Latency, Comparator::AtMost, 90.0),
                    ],
                },
                VictoryCondition {
                    id: "modest".to_string(),
                    description: String::new(),
                    requirements: vec![requirement(
                        "tps-600",
                        MetricType::Tps,
                        Comparator::AtLeast,
                        600.0,
                    )],
                },
            ],
        }
    }

    #[test]
    fn max_quantity_checks_consolidated_total() {
        let layout = PlayerLayout::new().with("cache", 2.0).with("cache", 1.0);
        let result = validate_layout(&layout, &scenario());
        assert_eq!(
            result.constraint_violations,
            vec!["Cache: limited to 2 but received 3".to_string()]
        );
    }

    #[test]
    fn requires_component_needs_positive_quantity() {
        let layout = PlayerLayout::new().with("worker", 1.0).with("queue", 0.0);
        let result = validate_layout(&layout, &scenario());
        assert_eq!(
            result.constraint_violations,
            vec!["Worker: requires component 'queue'".to_string()]
        );

        let satisfied = PlayerLayout::new().with("worker", 1.0).with("queue", 1.0);
        assert!(validate_layout(&satisfied, &scenario())
            .constraint_violations
            .is_empty());
    }

    #[test]
    fn unknown_components_reported_once_in_first_seen_order() {
        let layout = PlayerLayout::new()
            .with("ghost", 1.0)
            .with("cache", 1.0)
            .with("phantom", 2.0)
            .with("ghost", 5.0);
        let result = validate_layout(&layout, &scenario());
        assert_eq!(result.unknown_components, vec!["ghost", "phantom"]);
    }

    #[test]
    fn shared_requirement_ids_are_deduplicated() {
        let result = validate_layout(&PlayerLayout::new(), &scenario());
        let ids: Vec<_> = result
            .unmet_requirements
            .iter()
            .map(|requirement| requirement.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tps-700", "latency-90", "tps-600"]);
        assert!(result.victory_conditions_met.is_empty());
        assert!(!result.is_successful());
    }

    #[test]
    fn met_victory_conditions_do_not_report_requirements() {
        // 500 + 2 * 100 = 700 TPS, 100 - 2 * 10 = 80 ms
        let layout = PlayerLayout::new().with("cache", 2.0);
        let result = validate_layout(&layout, &scenario());
        assert_eq!(result.victory_conditions_met, vec!["fast", "modest"]);
        assert!(result.unmet_requirements.is_empty());
        assert!(result.is_successful());
    }

    #[test]
    fn victory_with_no_requirements_is_met() {
        let mut scenario = scenario();
        scenario.global_requirements.clear();
        scenario.victory_conditions = vec![VictoryCondition {
            id: "free".to_string(),
            description: String::new(),
            requirements: Vec::new(),
        }];
        let result = validate_layout(&PlayerLayout::new(), &scenario);
        assert_eq!(result.victory_conditions_met, vec!["free"]);
    }

    #[test]
    fn violations_do_not_block_metrics() {
        let layout = PlayerLayout::new().with("cache", 3.0);
        let result = validate_layout(&layout, &scenario());
        assert!((result.metrics.total_throughput - 800.0).abs() < f64::EPSILON);
        assert_eq!(result.constraint_violations.len(), 1);
        assert!(!result.is_successful());
    }
}
