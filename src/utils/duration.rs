//! Codec for the service's duration-string format.
//!
//! The services report elapsed times as Go-style duration strings
//! (`"1m12.5s"`, `"843.32ms"`); requests carry waits in the same format.
//! [`format_duration`] produces the canonical encoding for outgoing fields
//! and [`parse_duration`] turns metric strings back into [`Duration`]s.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+(?:\.\d+)?)(ns|us|µs|ms|s|m|h))+$").expect("static duration pattern")
});

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)(ns|us|µs|ms|s|m|h)").expect("static token pattern"));

/// Encodes a duration for a wire field.
///
/// Whole seconds encode as `"Ns"`, whole milliseconds as `"Nms"`, anything
/// finer as `"Nus"`. Zero encodes as `"0s"`.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }
    let nanos = duration.as_nanos();
    if nanos % 1_000_000_000 == 0 {
        format!("{}s", duration.as_secs())
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", duration.as_millis())
    } else if nanos % 1_000 == 0 {
        format!("{}us", duration.as_micros())
    } else {
        format!("{}ns", nanos)
    }
}

/// Parses a Go-style duration string. Returns `None` for anything that is
/// not a well-formed sequence of `<number><unit>` tokens.
pub fn parse_duration(text: &str) -> Option<Duration> {
    if !DURATION_RE.is_match(text) {
        return None;
    }

    let mut total_nanos: f64 = 0.0;
    for token in TOKEN_RE.captures_iter(text) {
        let value: f64 = token[1].parse().ok()?;
        let scale = match &token[2] {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3_600.0 * 1_000_000_000.0,
            _ => return None,
        };
        total_nanos += value * scale;
    }

    Some(Duration::from_nanos(total_nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("2m30s"), Some(Duration::from_secs(150)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("843ms"), Some(Duration::from_millis(843)));
        assert_eq!(
            parse_duration("1h2m3s"),
            Some(Duration::from_secs(3723))
        );
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("3s extra"), None);
    }

    #[test]
    fn formats_at_the_coarsest_exact_unit() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(75)), "75s");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2500ms");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1500us");
    }

    #[test]
    fn round_trips() {
        for d in [
            Duration::from_secs(1),
            Duration::from_millis(250),
            Duration::from_micros(99),
        ] {
            assert_eq!(parse_duration(&format_duration(d)), Some(d));
        }
    }
}
