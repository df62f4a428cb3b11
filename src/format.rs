// Display formatting for raw counts.
// Compacts large numbers into K/M/B/T labels and maps counts to severity colors.

/// Format a count for inline display (e.g., 1500000 -> "1.5M").
///
/// Values under 1000 render as the bare integer. Larger values scale down
/// by thousands through K, M, B, and T with one decimal place. The scale
/// stops at T, so anything at or past 10^15 renders like "1000.0T".
pub fn human_readable_number(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    const UNITS: [&str; 4] = ["K", "M", "B", "T"];
    let mut value = n as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// CSS color for a download count's "hotness", empty above the last band.
pub fn hot_level_color(n: u64) -> &'static str {
    if n < 1000 {
        "green"
    } else if n < 10_000 {
        "orange"
    } else if n < 100_000 {
        "red"
    } else {
        ""
    }
}
