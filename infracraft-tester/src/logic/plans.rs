use anyhow::{Result, ensure};

use infracraft_game::{PlayerLayout, ValidationResult};

pub type Expectation = fn(&ValidationResult) -> Result<()>;

/// A scripted layout for one scenario plus the outcome it must produce.
#[derive(Clone)]
pub struct PlaythroughPlan {
    pub key: &'static str,
    pub description: &'static str,
    pub scenario_id: &'static str,
    pub layout: PlayerLayout,
    pub expectations: Vec<Expectation>,
}

impl PlaythroughPlan {
    fn new(
        key: &'static str,
        description: &'static str,
        scenario_id: &'static str,
        layout: PlayerLayout,
    ) -> Self {
        Self {
            key,
            description,
            scenario_id,
            layout,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

pub fn catalog_plans() -> Vec<PlaythroughPlan> {
    vec![
        PlaythroughPlan::new(
            "cpu-burst-win",
            "Four edge caches plus one app server clear the campaign",
            "cpu-burst",
            PlayerLayout::new()
                .with("edge-cache", 4.0)
                .with("app-server", 1.0),
        )
        .with_expectation(expect_success),
        PlaythroughPlan::new(
            "cpu-burst-empty",
            "An empty layout misses every latency and throughput target",
            "cpu-burst",
            PlayerLayout::new(),
        )
        .with_expectation(expect_cpu_burst_empty),
        PlaythroughPlan::new(
            "cpu-burst-cache-overflow",
            "Five edge caches win on metrics but break the cache limit",
            "cpu-burst",
            PlayerLayout::new().with("edge-cache", 5.0),
        )
        .with_expectation(expect_victory_met)
        .with_expectation(expect_cache_limit_violation),
        PlaythroughPlan::new(
            "cpu-burst-orphan-worker",
            "Async workers without a message queue are rejected",
            "cpu-burst",
            PlayerLayout::new().with("async-worker", 1.0),
        )
        .with_expectation(expect_missing_queue),
        PlaythroughPlan::new(
            "latency-sensitive-win",
            "Two FPGAs and an in-memory order book beat the latency target",
            "latency-sensitive",
            PlayerLayout::new()
                .with("fpga-accelerator", 2.0)
                .with("in-memory-db", 1.0),
        )
        .with_expectation(expect_success),
        PlaythroughPlan::new(
            "latency-sensitive-error-budget",
            "FPGAs alone meet the victory but blow the global error budget",
            "latency-sensitive",
            PlayerLayout::new().with("fpga-accelerator", 2.0),
        )
        .with_expectation(expect_victory_met)
        .with_expectation(expect_error_budget_unmet),
        PlaythroughPlan::new(
            "bandwidth-crunch-win",
            "Regional caches offset edge compute bandwidth while scaling TPS",
            "bandwidth-crunch",
            PlayerLayout::new()
                .with("regional-cache", 3.0)
                .with("edge-compute", 2.0),
        )
        .with_expectation(expect_success),
        PlaythroughPlan::new(
            "bandwidth-crunch-partial",
            "Caches and image optimization stop short of 2200 TPS",
            "bandwidth-crunch",
            PlayerLayout::new()
                .with("regional-cache", 2.0)
                .with("image-optimizer", 1.0),
        )
        .with_expectation(expect_tps_2200_only),
        PlaythroughPlan::new(
            "bandwidth-crunch-unknown",
            "Components outside the palette are reported and ignored",
            "bandwidth-crunch",
            PlayerLayout::new()
                .with("quantum-router", 2.0)
                .with("quantum-router", 1.0),
        )
        .with_expectation(expect_single_unknown),
    ]
}

pub fn find_plan(key: &str) -> Option<PlaythroughPlan> {
    catalog_plans().into_iter().find(|plan| plan.key == key)
}

/// Expand `all` and keep the remaining keys in order.
pub fn expand_plan_keys(keys: &[String]) -> Vec<String> {
    let mut expanded = Vec::new();
    for key in keys {
        if key == "all" {
            expanded.extend(catalog_plans().iter().map(|plan| plan.key.to_string()));
        } else {
            expanded.push(key.clone());
        }
    }
    expanded
}

fn unmet_ids(result: &ValidationResult) -> Vec<&str> {
    result
        .unmet_requirements
        .iter()
        .map(|requirement| requirement.id.as_str())
        .collect()
}

fn expect_success(result: &ValidationResult) -> Result<()> {
    ensure!(
        result.is_successful(),
        "expected a clean win, got unmet {:?}, violations {:?}, unknown {:?}",
        unmet_ids(result),
        result.constraint_violations,
        result.unknown_components
    );
    Ok(())
}

fn expect_victory_met(result: &ValidationResult) -> Result<()> {
    ensure!(
        !result.victory_conditions_met.is_empty(),
        "expected at least one victory condition to be met"
    );
    ensure!(
        !result.is_successful(),
        "run should not count as a clean win"
    );
    Ok(())
}

fn expect_cpu_burst_empty(result: &ValidationResult) -> Result<()> {
    let unmet = unmet_ids(result);
    ensure!(
        unmet == ["latency-budget", "tps-target", "latency-target"],
        "unexpected unmet requirements {unmet:?}"
    );
    ensure!(
        result.victory_conditions_met.is_empty(),
        "no victory expected"
    );
    Ok(())
}

fn expect_cache_limit_violation(result: &ValidationResult) -> Result<()> {
    ensure!(
        result.constraint_violations == ["Edge Cache: limited to 4 but received 5"],
        "unexpected violations {:?}",
        result.constraint_violations
    );
    Ok(())
}

fn expect_missing_queue(result: &ValidationResult) -> Result<()> {
    ensure!(
        result
            .constraint_violations
            .iter()
            .any(|violation| violation.contains("'message-queue'")),
        "missing message-queue dependency not reported: {:?}",
        result.constraint_violations
    );
    Ok(())
}

fn expect_error_budget_unmet(result: &ValidationResult) -> Result<()> {
    let unmet = unmet_ids(result);
    ensure!(unmet == ["error-budget"], "unexpected unmet requirements {unmet:?}");
    Ok(())
}

fn expect_tps_2200_only(result: &ValidationResult) -> Result<()> {
    let unmet = unmet_ids(result);
    ensure!(unmet == ["tps-2200"], "unexpected unmet requirements {unmet:?}");
    ensure!(
        result.victory_conditions_met.is_empty(),
        "cost-saver should not be met"
    );
    Ok(())
}

fn expect_single_unknown(result: &ValidationResult) -> Result<()> {
    ensure!(
        result.unknown_components == ["quantum-router"],
        "unexpected unknown components {:?}",
        result.unknown_components
    );
    Ok(())
}
