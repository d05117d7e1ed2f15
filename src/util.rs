// Parsing and numeric helpers shared by the normalizer and the aggregators.
//
// Everything that has to cope with dirty CSV text or with float edge cases
// lives here so the aggregation code can work on plain `f64` values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Integer columns (year, month) sometimes arrive as `2023.0`.
pub fn parse_int_safe(s: Option<&str>) -> Option<i32> {
    let v = parse_f64_safe(s)?;
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i32)
    } else {
        None
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Round to `decimals` places, ties to even.
pub fn round_half_even(x: f64, decimals: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let scale = 10f64.powi(decimals as i32);
    let y = x * scale;
    let floor = y.floor();
    let diff = y - floor;
    let rounded = if (diff - 0.5).abs() < 1e-9 {
        if floor % 2.0 == 0.0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        y.round()
    };
    rounded / scale
}

/// Relative change from `prev` to `cur`, with IEEE semantics for a zero
/// baseline: +inf, -inf or NaN depending on the sign of `cur`.
pub fn pct_change(prev: f64, cur: f64) -> f64 {
    (cur - prev) / prev
}
