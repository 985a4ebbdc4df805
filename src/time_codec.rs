//! Conversion between human finish times and whole seconds.
//!
//! Input accepts `SS`, `MM:SS` and `HH:MM:SS`; output is always `HH:MM:SS`
//! with an unbounded hour component (a 120-hour ultra renders as `120:00:00`).

/// Parse a colon-delimited time into seconds.
///
/// The number of components decides the interpretation: one part is seconds,
/// two parts are minutes:seconds, three parts are hours:minutes:seconds.
/// Empty or malformed input yields `0`; callers check the shape with
/// [`is_valid_time_input`] first.
pub fn parse_time(text: &str) -> u64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let mut parts = Vec::with_capacity(3);
    for part in text.split(':') {
        match part.trim().parse::<u64>() {
            Ok(v) => parts.push(v),
            Err(_) => return 0,
        }
    }

    match parts.as_slice() {
        [s] => *s,
        [m, s] => m.saturating_mul(60).saturating_add(*s),
        [h, m, s] => h
            .saturating_mul(3600)
            .saturating_add(m.saturating_mul(60))
            .saturating_add(*s),
        _ => 0,
    }
}

/// Format seconds as zero-padded `HH:MM:SS`, flooring fractional seconds.
/// Negative and NaN input render as `00:00:00`.
pub fn format_time(seconds: f64) -> String {
    if seconds.is_nan() || seconds < 0.0 {
        return "00:00:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Whether `text` has one of the accepted entry shapes: one to three
/// colon-separated components of one or two digits each.
pub fn is_valid_time_input(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let parts: Vec<&str> = text.split(':').collect();
    (1..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Canonicalise a user-entered time to `HH:MM:SS`, or `None` if the shape is
/// not accepted. Missing leading components are treated as zero.
pub fn normalize_time_input(text: &str) -> Option<String> {
    if !is_valid_time_input(text) {
        return None;
    }
    Some(format_time(parse_time(text) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_counts() {
        assert_eq!(parse_time("45"), 45);
        assert_eq!(parse_time("12:34"), 12 * 60 + 34);
        assert_eq!(parse_time("2:03:04"), 2 * 3600 + 3 * 60 + 4);
        assert_eq!(parse_time("02:00:00"), 7200);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert_eq!(parse_time(""), 0);
        assert_eq!(parse_time("   "), 0);
        assert_eq!(parse_time("abc"), 0);
        assert_eq!(parse_time("1:xx"), 0);
        assert_eq!(parse_time("1:2:3:4"), 0);
        assert_eq!(parse_time("-5"), 0);
    }

    #[test]
    fn test_format_basic() {
        assert_eq!(format_time(0.0), "00:00:00");
        assert_eq!(format_time(6545.45), "01:49:05");
        assert_eq!(format_time(59.999), "00:00:59");
        assert_eq!(format_time(3600.0), "01:00:00");
    }

    #[test]
    fn test_format_negative_and_nan() {
        assert_eq!(format_time(-1.0), "00:00:00");
        assert_eq!(format_time(f64::NAN), "00:00:00");
    }

    #[test]
    fn test_format_hours_do_not_wrap() {
        assert_eq!(format_time(100.0 * 3600.0 + 61.0), "100:01:01");
    }

    #[test]
    fn test_round_trip_is_stable() {
        for input in ["7", "59", "1:05", "12:34", "0:00:01", "9:59:59", "23:59:59", "99:00:00"] {
            let secs = parse_time(input);
            let canonical = format_time(secs as f64);
            assert_eq!(parse_time(&canonical), secs, "round trip of {}", input);
            assert_eq!(format_time(parse_time(&canonical) as f64), canonical);
        }
    }

    #[test]
    fn test_valid_input_shapes() {
        for ok in ["5", "05", "4:05", "12:34", "1:02:03", "10:00:00"] {
            assert!(is_valid_time_input(ok), "{} should be accepted", ok);
        }
        for bad in ["", ":", "123", "1:2:3:4", "1::2", "a:bc", "1:234", "1:00:"] {
            assert!(!is_valid_time_input(bad), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_normalize_pads_missing_components() {
        assert_eq!(normalize_time_input("7").as_deref(), Some("00:00:07"));
        assert_eq!(normalize_time_input("45:30").as_deref(), Some("00:45:30"));
        assert_eq!(normalize_time_input("2:00:00").as_deref(), Some("02:00:00"));
        assert_eq!(normalize_time_input("2h"), None);
    }
}
