use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use infracraft_game::{
    MetricType, PuzzleScenario, ScenarioCompletion, ValidationResult, requirement_progress,
};

use super::PlanResult;
use crate::format::{metric_label, metric_value};

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64) * 100.0
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[PlanResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Playthrough Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "Total plans: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed, total))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} {} ({})",
            result.plan_key.bold(),
            result.scenario_id
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[PlanResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(out: &mut W, results: &[PlanResult]) -> Result<()> {
    writeln!(out, "# Infracraft Playthrough Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total plans**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(passed, total))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {}\n", result.plan_key)?;
        writeln!(out, "- **Scenario**: {}", result.scenario_id)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn metric_lines(scenario: &PuzzleScenario, result: &ValidationResult) -> Vec<(MetricType, f64)> {
    let mut metrics = vec![
        (MetricType::Tps, result.metrics.total_throughput),
        (MetricType::Latency, result.metrics.average_latency),
    ];
    for (&metric, &value) in &result.metrics.modifiers {
        metrics.push((metric, value));
    }
    // requirements may target an open metric nothing has touched yet
    for requirement in scenario
        .global_requirements
        .iter()
        .chain(scenario.victory_conditions.iter().flat_map(|v| &v.requirements))
    {
        if !metrics.iter().any(|(metric, _)| *metric == requirement.metric) {
            metrics.push((requirement.metric, result.metrics.value(requirement.metric)));
        }
    }
    metrics
}

pub fn generate_validation_console<W: Write + ?Sized>(
    out: &mut W,
    scenario: &PuzzleScenario,
    result: &ValidationResult,
) -> Result<()> {
    writeln!(
        out,
        "{} {}",
        "🏗️  Scenario:".bright_cyan().bold(),
        scenario.name.bold()
    )?;
    writeln!(out, "   Bottleneck: {}", scenario.bottleneck)?;
    writeln!(out)?;

    writeln!(out, "{}", "Metrics".bright_yellow().bold())?;
    for (metric, value) in metric_lines(scenario, result) {
        writeln!(out, "   {:18} {}", metric_label(metric), metric_value(metric, value))?;
    }
    writeln!(out)?;

    let progress = requirement_progress(scenario, &result.metrics);
    writeln!(out, "{}", "Goals".bright_yellow().bold())?;
    for victory in &progress.victories {
        let mark = if victory.met { "✅".green() } else { "❌".red() };
        writeln!(out, "{mark} {} - {}", victory.id.bold(), victory.description)?;
        for status in &victory.requirements {
            let detail = if status.met {
                "met".green().to_string()
            } else {
                format!(
                    "short by {}",
                    metric_value(status.requirement.metric, status.shortfall())
                )
                .red()
                .to_string()
            };
            writeln!(
                out,
                "     {} {} {} ({}; observed {})",
                status.requirement.id,
                status.requirement.comparator,
                metric_value(status.requirement.metric, status.requirement.value),
                detail,
                metric_value(status.requirement.metric, status.observed)
            )?;
        }
    }
    writeln!(out)?;

    if !result.unmet_requirements.is_empty() {
        writeln!(out, "{}", "Unmet requirements".red().bold())?;
        for requirement in &result.unmet_requirements {
            writeln!(out, "   • {} ({})", requirement.id, requirement.description)?;
        }
    }
    if !result.constraint_violations.is_empty() {
        writeln!(out, "{}", "Constraint violations".red().bold())?;
        for violation in &result.constraint_violations {
            writeln!(out, "   • {violation}")?;
        }
    }
    if !result.unknown_components.is_empty() {
        writeln!(out, "{}", "Unknown components".red().bold())?;
        for component_id in &result.unknown_components {
            writeln!(out, "   • {component_id}")?;
        }
    }

    let verdict = if result.is_successful() {
        "🏆 Layout solves the scenario".green().bold()
    } else {
        "🚧 Layout does not solve the scenario yet".yellow().bold()
    };
    writeln!(out, "{verdict}")?;
    Ok(())
}

pub fn generate_validation_markdown<W: Write + ?Sized>(
    out: &mut W,
    scenario: &PuzzleScenario,
    result: &ValidationResult,
) -> Result<()> {
    writeln!(out, "# {} Validation\n", scenario.name)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "| --- | --- |")?;
    for (metric, value) in metric_lines(scenario, result) {
        writeln!(out, "| {} | {} |", metric_label(metric), metric_value(metric, value))?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "- **Victory conditions met**: {}",
        if result.victory_conditions_met.is_empty() {
            "none".to_string()
        } else {
            result.victory_conditions_met.join(", ")
        }
    )?;
    for requirement in &result.unmet_requirements {
        writeln!(out, "- **Unmet**: {} ({})", requirement.id, requirement.description)?;
    }
    for violation in &result.constraint_violations {
        writeln!(out, "- **Violation**: {violation}")?;
    }
    for component_id in &result.unknown_components {
        writeln!(out, "- **Unknown component**: {component_id}")?;
    }
    writeln!(
        out,
        "\n**Result**: {}",
        if result.is_successful() { "solved" } else { "unsolved" }
    )?;
    Ok(())
}

pub fn generate_history_report<W: Write + ?Sized>(
    out: &mut W,
    scenario_id: &str,
    completions: &[ScenarioCompletion],
) -> Result<()> {
    writeln!(
        out,
        "{} {} ({} completion{})",
        "📜 History for".bright_cyan().bold(),
        scenario_id.bold(),
        completions.len(),
        if completions.len() == 1 { "" } else { "s" }
    )?;
    for completion in completions {
        let when = chrono::DateTime::from_timestamp_millis(completion.completed_at)
            .map_or_else(|| completion.completed_at.to_string(), |ts| ts.to_rfc3339());
        writeln!(
            out,
            "   {when}  goals: {}  throughput: {}  latency: {}",
            completion.victory_conditions_met.join(", "),
            metric_value(MetricType::Tps, completion.metrics.total_throughput),
            metric_value(MetricType::Latency, completion.metrics.average_latency)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use infracraft_game::{PlayerLayout, ScenarioCatalog, validate_layout};

    fn sample_result(passed: bool) -> PlanResult {
        PlanResult {
            plan_key: "cpu-burst-win".to_string(),
            scenario_id: "cpu-burst".to_string(),
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2: boom".to_string()]
            },
            average_duration: Duration::from_micros(15),
            validation: None,
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures() {
        let results = [sample_result(true), sample_result(false)];
        let text = render(|out| generate_console_report(out, &results, Duration::from_millis(1)));
        assert!(text.contains("Total plans: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("Iteration 2: boom"));
    }

    #[test]
    fn markdown_report_has_sections() {
        let text = render(|out| generate_markdown_report(out, &[sample_result(true)]));
        assert!(text.contains("# Infracraft Playthrough Results"));
        assert!(text.contains("### ✅ cpu-burst-win"));
    }

    #[test]
    fn json_report_is_an_array() {
        let text = render(|out| generate_json_report(out, &[sample_result(true)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn validation_console_shows_shortfall() {
        let scenario = ScenarioCatalog::default_catalog()
            .get("bandwidth-crunch")
            .unwrap();
        let layout = PlayerLayout::new()
            .with("regional-cache", 2.0)
            .with("image-optimizer", 1.0);
        let result = validate_layout(&layout, scenario);
        let text = render(|out| generate_validation_console(out, scenario, &result));
        assert!(text.contains("1800 TPS"));
        assert!(text.contains("short by 400 TPS"));
        assert!(text.contains("tps-2200"));
        assert!(text.contains("does not solve"));
    }

    #[test]
    fn validation_markdown_tabulates_error_rate() {
        let scenario = ScenarioCatalog::default_catalog()
            .get("latency-sensitive")
            .unwrap();
        let result = validate_layout(&PlayerLayout::new(), scenario);
        let text = render(|out| generate_validation_markdown(out, scenario, &result));
        assert!(text.contains("| Error Rate | 1.50% |"));
        assert!(text.contains("**Result**: unsolved"));
    }

    #[test]
    fn history_report_counts_completions() {
        let completion = ScenarioCompletion {
            scenario_id: "cpu-burst".to_string(),
            victory_conditions_met: vec!["campaign-success".to_string()],
            metrics: infracraft_game::LayoutMetrics::default(),
            completed_at: 0,
        };
        let text = render(|out| generate_history_report(out, "cpu-burst", &[completion]));
        assert!(text.contains("(1 completion)"));
        assert!(text.contains("1970-01-01T00:00:00"));
        assert!(text.contains("campaign-success"));
    }
}
