//! Compact human-readable durations for the upload transcript

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Format milliseconds as the two largest non-zero units, e.g. `1 minute 30 seconds`
pub fn format_duration_ms(total_ms: u64) -> String {
    let days = total_ms / MS_PER_DAY;
    let hours = (total_ms % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (total_ms % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (total_ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let ms = total_ms % MS_PER_SECOND;

    let parts: Vec<String> = [
        (days, "day"),
        (hours, "hour"),
        (minutes, "minute"),
        (seconds, "second"),
    ]
    .iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| pluralize(*value, unit))
    .chain((ms > 0).then(|| format!("{} ms", ms)))
    .take(2)
    .collect();

    if parts.is_empty() {
        return format!("{} ms", ms);
    }

    parts.join(" ")
}

fn pluralize(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
