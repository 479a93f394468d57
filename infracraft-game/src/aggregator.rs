//! Layout metric aggregation.
use crate::metrics::LayoutMetrics;
use crate::puzzle::{ComponentDefinition, PlayerLayout, PuzzleScenario};

/// Compute the aggregate metrics for `layout` in `scenario`.
///
/// Every layout entry is applied on its own, even when several share an id.
/// Entries naming a component the scenario does not offer are skipped here;
/// reporting them is the validator's job.
#[must_use]
pub fn compute_metrics(layout: &PlayerLayout, scenario: &PuzzleScenario) -> LayoutMetrics {
    let lookup = scenario.component_lookup();
    let mut metrics = scenario.baseline_metrics();

    for entry in &layout.components {
        let Some(component) = lookup.get(entry.component_id.as_str()) else {
            log::trace!(
                "skipping unknown component '{}' in scenario '{}'",
                entry.component_id,
                scenario.id
            );
            continue;
        };
        apply_component(&mut metrics, component, entry.normalized_quantity());
    }

    metrics
}

/// Add `quantity` units of `component` to `metrics`.
pub fn apply_component(metrics: &mut LayoutMetrics, component: &ComponentDefinition, quantity: f64) {
    metrics.total_throughput += component.throughput * quantity;
    metrics.average_latency += component.latency_impact * quantity;
    // tps/latency modifiers land on the dedicated totals alongside the fields above
    for (&metric, &delta) in &component.modifiers {
        metrics.add(metric, delta * quantity);
    }
}
