//! Human-readable byte sizes.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: f64 = 1024.0;

/// Format a byte count with base-1024 units and two decimals.
///
/// The unit is picked so the printed mantissa falls in `[1.00, 1024.00)`.
/// Zero has no logarithm and is rendered as the literal `"0 Bytes"`.
/// Counts past the largest unit stay in GB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }

    // 1023.996 KB would print as "1024.00 KB".
    if round2(value) >= STEP && unit < UNITS.len() - 1 {
        value /= STEP;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
