//! Duration parsing utilities.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid duration '{input}': {reason}")]
pub struct DurationParseError {
    pub input: String,
    pub reason: String,
}

impl DurationParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse a duration string like "1500ms", "10s", "2m", "1h" or "3".
/// Supports:
/// - Plain numbers (interpreted as seconds, fractions allowed): "1.5"
/// - Milliseconds suffix: "1500ms"
/// - Seconds suffix: "10s"
/// - Minutes suffix: "2m"
/// - Hours suffix: "1h"
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::new(s, "empty duration string"));
    }

    // "ms" must be checked before the single-letter suffixes
    if let Some(num_str) = s.strip_suffix("ms") {
        let millis: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| DurationParseError::new(s, "invalid milliseconds value"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(num_str) = s.strip_suffix('h') {
        return parse_scaled(s, num_str, 3600.0);
    }
    if let Some(num_str) = s.strip_suffix('m') {
        return parse_scaled(s, num_str, 60.0);
    }
    if let Some(num_str) = s.strip_suffix('s') {
        return parse_seconds(s, num_str);
    }

    // No suffix - treat as seconds
    parse_seconds(s, s)
}

/// Decimal seconds with up to nine fractional digits are parsed exactly;
/// anything else goes through `f64`.
fn parse_seconds(input: &str, num_str: &str) -> Result<Duration, DurationParseError> {
    let num_str = num_str.trim();
    let (whole, frac) = num_str.split_once('.').unwrap_or((num_str, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || !digits(frac) || frac.len() > 9 {
        return parse_scaled(input, num_str, 1.0);
    }

    let secs: u64 = whole
        .parse()
        .map_err(|_| DurationParseError::new(input, "seconds value out of range"))?;
    let nanos = if frac.is_empty() {
        0
    } else {
        let scale = 10u32.pow(9 - frac.len() as u32);
        frac.parse::<u32>()
            .map_err(|_| DurationParseError::new(input, "invalid fractional seconds"))?
            * scale
    };
    Ok(Duration::new(secs, nanos))
}

fn parse_scaled(input: &str, num_str: &str, scale: f64) -> Result<Duration, DurationParseError> {
    let value: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| DurationParseError::new(input, "not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DurationParseError::new(input, "must be a non-negative number"));
    }
    Duration::try_from_secs_f64(value * scale)
        .map_err(|e| DurationParseError::new(input, e.to_string()))
}

/// Render a duration the way it is accepted by [`parse_duration`].
///
/// Whole milliseconds use the "s" or "ms" form. Anything finer is written as
/// exact fractional seconds, so parsing the result gives back the same value.
pub fn format_duration(duration: &Duration) -> String {
    let nanos = duration.subsec_nanos();
    if nanos % 1_000_000 != 0 {
        let fraction = format!("{nanos:09}");
        return format!("{}.{}s", duration.as_secs(), fraction.trim_end_matches('0'));
    }
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Fractional(f64),
    Text(String),
}

impl RawDuration {
    fn into_duration(self) -> Result<Duration, DurationParseError> {
        match self {
            RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
            RawDuration::Fractional(secs) => {
                let text = secs.to_string();
                parse_seconds(&text, &text)
            }
            RawDuration::Text(text) => parse_duration(&text),
        }
    }
}

/// Serde adapter for `Duration` fields written as "1500ms", "10s" or plain seconds.
pub mod serde_duration {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        RawDuration::deserialize(deserializer)?
            .into_duration()
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Duration>` fields.
pub mod serde_duration_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&format_duration(d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_duration("1500ms").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("1.5").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0.000000001s").unwrap(), Duration::from_nanos(1));
        assert_eq!(
            parse_duration("18446744073709551615").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1.5ms").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&Duration::from_secs(10)), "10s");
        assert_eq!(format_duration(&Duration::from_millis(300)), "300ms");
        assert_eq!(
            parse_duration(&format_duration(&Duration::from_millis(2250))).unwrap(),
            Duration::from_millis(2250)
        );
    }

    #[test]
    fn test_format_keeps_sub_millisecond_precision() {
        let cases = [
            (Duration::new(1, 500_000), "1.0005s"),
            (Duration::new(2, 1), "2.000000001s"),
            (Duration::from_micros(250), "0.00025s"),
        ];
        for (duration, text) in cases {
            assert_eq!(format_duration(&duration), text);
            assert_eq!(parse_duration(text).unwrap(), duration);
        }
    }

    #[test]
    fn test_serde_round_trip_is_lossless() {
        #[derive(serde::Serialize, Deserialize, PartialEq, Debug)]
        struct Holder {
            #[serde(with = "serde_duration")]
            delay: Duration,
        }

        let holder = Holder {
            delay: Duration::new(1, 500_000),
        };
        let yaml = serde_yaml::to_string(&holder).unwrap();
        assert_eq!(serde_yaml::from_str::<Holder>(&yaml).unwrap(), holder);

        let unquoted: Holder = serde_yaml::from_str("delay: 1.0005\n").unwrap();
        assert_eq!(unquoted, holder);
    }
}
