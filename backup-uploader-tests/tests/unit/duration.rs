//! Unit tests for transcript duration formatting

use backup_uploader::utils::format_duration_ms;

#[test]
fn test_zero_duration() {
    assert_eq!(format_duration_ms(0), "0 ms");
}

#[test]
fn test_transcript_examples() {
    assert_eq!(format_duration_ms(1500), "1 second 500 ms");
    assert_eq!(format_duration_ms(90_000), "1 minute 30 seconds");
    assert_eq!(format_duration_ms(90_061_000), "1 day 1 hour");
}

#[test]
fn test_plural_units() {
    assert_eq!(format_duration_ms(2 * 60 * 60 * 1000), "2 hours");
    assert_eq!(format_duration_ms(3 * 24 * 60 * 60 * 1000 + 5 * 60 * 1000), "3 days 5 minutes");
}

#[test]
fn test_sub_second() {
    assert_eq!(format_duration_ms(1), "1 ms");
    assert_eq!(format_duration_ms(999), "999 ms");
}

#[test]
fn test_smaller_units_dropped() {
    // 1 hour 1 minute 1 second 1 ms
    assert_eq!(format_duration_ms(3_661_001), "1 hour 1 minute");
}
