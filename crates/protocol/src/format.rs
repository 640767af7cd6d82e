use serde::{Deserialize, Serialize};

/// How a numeric report cell is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueFormat {
    /// Call counts. Integral in single runs, fractional in aggregated runs.
    Count,
    /// Metric values, rounded to whole units.
    Number,
    /// A ratio rendered as a percentage with one decimal.
    Percent,
}

/// Placeholder for a ratio whose denominator is zero.
pub const NOT_APPLICABLE: &str = "N/A";

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Count => format_count(value),
            ValueFormat::Number => group_thousands(value, 0),
            ValueFormat::Percent => format_percent(Some(value)),
        }
    }

    /// Format an optional value; `None` is "not applicable".
    pub fn format_opt(self, value: Option<f64>) -> String {
        match value {
            Some(v) => self.format(v),
            None if self == ValueFormat::Percent => format!("{NOT_APPLICABLE}%"),
            None => NOT_APPLICABLE.to_string(),
        }
    }
}

/// `4000` → `4,000`, `4000.1212` → `4,000.121`, `4000.0001` → `4,000`.
pub fn format_count(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.round() == rounded {
        group_thousands(rounded, 0)
    } else {
        group_thousands(rounded, 3)
    }
}

pub fn format_percent(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.1}%", 100.0 * r),
        None => format!("{NOT_APPLICABLE}%"),
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    let is_zero = text.bytes().all(|b| b == b'0' || b == b'.');
    if value.is_sign_negative() && !is_zero {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
