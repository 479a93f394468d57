//! Human-readable metric labels and values for reports.
use infracraft_game::MetricType;

pub fn metric_label(metric: MetricType) -> &'static str {
    match metric {
        MetricType::Tps => "Total Throughput",
        MetricType::Latency => "Average Latency",
        MetricType::Bandwidth => "Bandwidth",
        MetricType::ErrorRate => "Error Rate",
    }
}

pub fn metric_value(metric: MetricType, value: f64) -> String {
    match metric {
        MetricType::Tps => format!("{value:.0} TPS"),
        MetricType::Latency => format!("{value:.0} ms"),
        MetricType::Bandwidth => format!("{value:.0} Mbps"),
        MetricType::ErrorRate => format!("{:.2}%", value * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_carry_units() {
        assert_eq!(metric_value(MetricType::Tps, 2240.4), "2240 TPS");
        assert_eq!(metric_value(MetricType::Latency, 232.0), "232 ms");
        assert_eq!(metric_value(MetricType::Bandwidth, 99.6), "100 Mbps");
        assert_eq!(metric_value(MetricType::ErrorRate, 0.015), "1.50%");
        assert_eq!(metric_label(MetricType::ErrorRate), "Error Rate");
    }
}
