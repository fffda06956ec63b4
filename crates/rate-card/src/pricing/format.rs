/// Two-decimal dollar amount with thousands separators. Zero and non-finite
/// values render as `$0.00`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "$0.00".to_string();
    }

    let fixed = format!("{:.2}", round_half_up(value.abs(), 100.0));
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("${sign}{}.{fraction}", group_thousands(whole))
}

/// Fraction rendered as a percentage with one decimal place; NaN renders as `0%`.
pub fn format_percentage(value: f64) -> String {
    if value.is_nan() {
        return "0%".to_string();
    }
    format!("{:.1}%", round_half_up(value * 100.0, 10.0))
}

/// Whole-number percentage used when quoting a target margin.
pub fn format_whole_percentage(value: f64) -> String {
    if value.is_nan() {
        return "0%".to_string();
    }
    format!("{:.0}%", round_half_up(value * 100.0, 1.0))
}

/// Client rate for comparison tables, where an unoffered location reads `N/A`.
pub fn format_rate_or_na(rate: f64) -> String {
    if rate > 0.0 && rate.is_finite() {
        format_currency(rate)
    } else {
        "N/A".to_string()
    }
}

/// Round to `1 / scale` with ties away from zero, as spreadsheet and browser
/// number formatting do. `{:.N}` alone would round exact halves to even.
fn round_half_up(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale + 0.0
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
