use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use infracraft_game::{ScenarioCatalog, ValidationResult, validate_layout};

use super::plans::PlaythroughPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub plan_key: String,
    pub scenario_id: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    /// Final validation payload, kept for JSON reports
    pub validation: Option<ValidationResult>,
}

pub struct LogicTester<'a> {
    catalog: &'a ScenarioCatalog,
    verbose: bool,
}

impl<'a> LogicTester<'a> {
    pub const fn new(catalog: &'a ScenarioCatalog, verbose: bool) -> Self {
        Self { catalog, verbose }
    }

    /// Run `plan` `iterations` times. Every iteration must satisfy the plan's
    /// expectations and reproduce the first iteration's result exactly.
    pub fn run_plan(&self, plan: &PlaythroughPlan, iterations: usize) -> PlanResult {
        if self.verbose {
            println!(
                "🧪 Testing plan: {} (scenario: {})",
                plan.key.bright_white(),
                plan.scenario_id
            );
        }

        let Some(scenario) = self.catalog.get(plan.scenario_id) else {
            return PlanResult {
                plan_key: plan.key.to_string(),
                scenario_id: plan.scenario_id.to_string(),
                passed: false,
                iterations_run: 0,
                successful_iterations: 0,
                failures: vec![format!("scenario '{}' not in catalog", plan.scenario_id)],
                average_duration: Duration::ZERO,
                validation: None,
            };
        };

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut first: Option<ValidationResult> = None;

        for i in 0..iterations {
            let start_time = Instant::now();
            let result = validate_layout(&plan.layout, scenario);
            let duration = start_time.elapsed();

            let outcome = evaluate_expectations(plan, &result).or_else(|| {
                first
                    .as_ref()
                    .filter(|baseline| **baseline != result)
                    .map(|_| "result differs from first iteration".to_string())
            });

            if let Some(err) = outcome {
                if self.verbose {
                    println!("  ❌ Iteration {}/{} failed: {}", i + 1, iterations, err.red());
                }
                failures.push(format!("Iteration {}: {err}", i + 1));
            } else {
                successes += 1;
                durations.push(duration);
                if self.verbose {
                    println!("  ✅ Iteration {}/{} passed ({duration:?})", i + 1, iterations);
                }
            }

            if first.is_none() {
                first = Some(result);
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        log::debug!(
            "plan '{}' finished: {successes}/{iterations} iterations passed",
            plan.key
        );

        PlanResult {
            plan_key: plan.key.to_string(),
            scenario_id: plan.scenario_id.to_string(),
            passed: failures.is_empty() && iterations > 0,
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            validation: first,
        }
    }
}

fn evaluate_expectations(plan: &PlaythroughPlan, result: &ValidationResult) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation(result) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
