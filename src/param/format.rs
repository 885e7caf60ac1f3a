//! Display formatting for parameter values.

/// Decimal places a step carries, capped at six.
pub fn step_decimals(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 {
        return 0;
    }
    let text = format!("{step}");
    let decimals = match text.split_once('.') {
        Some((_, fraction)) => fraction.len(),
        None => 0,
    };
    decimals.min(6)
}

/// Format `value` at the precision of `step`, trimming trailing zeros.
pub fn format_value(value: f64, step: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let decimals = step_decimals(step);
    let mut text = format!("{value:.decimals$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}
