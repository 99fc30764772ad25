//! Derived mission metrics as rendered in the estimates table.
//!
//! | Cell      | Example                      | Parsed          |
//! |-----------|------------------------------|-----------------|
//! | time      | `3.5 min`, `2 hr`, `> 10 min`| minutes         |
//! | time      | `Too large`                  | `f64::INFINITY` |
//! | photos    | `1,204`, `-`                 | count / `∞`     |
//! | GSD       | `0.42 cm/px`                 | [`Gsd`]         |

use crate::result::{WaypointError, WaypointResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Estimate shown in the editor's estimates table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Flight time, minutes
    Time,
    /// Photo count
    Photos,
    /// Colour ground sample distance
    ColorGsd,
    /// Thermal ground sample distance
    ThermalGsd,
}

impl Metric {
    /// Column of the metric in the estimates row
    #[must_use]
    pub const fn column(self) -> i64 {
        match self {
            Self::Time => 0,
            Self::Photos => 1,
            Self::ColorGsd => 2,
            Self::ThermalGsd => 3,
        }
    }

    /// Parse the cell text for this metric
    ///
    /// # Errors
    ///
    /// [`WaypointError::MetricParse`] when the text does not match the metric's format
    pub fn parse(self, text: &str) -> WaypointResult<f64> {
        match self {
            Self::Time => parse_time(text),
            Self::Photos => parse_photos(text),
            Self::ColorGsd | Self::ThermalGsd => Ok(parse_gsd(text)?.value),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Time => "time",
            Self::Photos => "photos",
            Self::ColorGsd => "color gsd",
            Self::ThermalGsd => "thermal gsd",
        })
    }
}

/// Ground sample distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gsd {
    /// Numeric amount
    pub value: f64,
    /// Unit text, e.g. `cm/px`
    pub unit: String,
}

impl fmt::Display for Gsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

fn parse_error(text: &str, reason: impl Into<String>) -> WaypointError {
    WaypointError::MetricParse {
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn parse_number(text: &str, raw: &str) -> WaypointResult<f64> {
    raw.replace(',', "")
        .parse()
        .map_err(|_| parse_error(text, format!("`{raw}` is not a number")))
}

/// Flight time in minutes
///
/// # Errors
///
/// [`WaypointError::MetricParse`] for units other than `min` and `hr`
pub fn parse_time(text: &str) -> WaypointResult<f64> {
    if text.contains("Too large") {
        return Ok(f64::INFINITY);
    }
    let trimmed = text.trim().trim_start_matches(['>', ' ']);
    let (amount, unit) = trimmed
        .split_once(' ')
        .ok_or_else(|| parse_error(text, "expected `<amount> <unit>`"))?;
    let amount = parse_number(text, amount)?;
    match unit.trim() {
        "min" => Ok(amount),
        "hr" => Ok(amount * 60.0),
        other => Err(parse_error(text, format!("unknown time unit `{other}`"))),
    }
}

/// Photo count; `-` means unbounded
///
/// # Errors
///
/// [`WaypointError::MetricParse`] when the text is not a number
pub fn parse_photos(text: &str) -> WaypointResult<f64> {
    let trimmed = text.trim();
    if trimmed == "-" {
        return Ok(f64::INFINITY);
    }
    parse_number(text, trimmed)
}

/// Ground sample distance from `<amount> <unit>`
///
/// # Errors
///
/// [`WaypointError::MetricParse`] when either part is missing
pub fn parse_gsd(text: &str) -> WaypointResult<Gsd> {
    let (amount, unit) = text
        .trim()
        .split_once(' ')
        .ok_or_else(|| parse_error(text, "expected `<amount> <unit>`"))?;
    let unit = unit.trim();
    if unit.is_empty() {
        return Err(parse_error(text, "missing unit"));
    }
    Ok(Gsd {
        value: parse_number(text, amount)?,
        unit: unit.to_string(),
    })
}

fn rotation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"rotate\(([-\d.]+)deg\)").ok())
        .as_ref()
}

/// Degrees from a `rotate(<n>deg)` transform in an inline style
///
/// # Errors
///
/// [`WaypointError::MetricParse`] when the style has no rotation
pub fn parse_rotation(style: &str) -> WaypointResult<f64> {
    let captured = rotation_pattern()
        .and_then(|re| re.captures(style))
        .and_then(|c| c.get(1))
        .ok_or_else(|| parse_error(style, "no rotate(<deg>deg) transform"))?;
    parse_number(style, captured.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod time_tests {
        use super::*;

        #[test]
        fn test_minutes_and_hours() {
            assert_eq!(parse_time("3.5 min").unwrap(), 3.5);
            assert_eq!(parse_time("2 hr").unwrap(), 120.0);
        }

        #[test]
        fn test_lower_bound_prefix() {
            assert_eq!(parse_time("> 10 min").unwrap(), 10.0);
            assert_eq!(parse_time(">10 min").unwrap(), 10.0);
        }

        #[test]
        fn test_too_large_is_unbounded() {
            assert!(parse_time("Too large").unwrap().is_infinite());
            assert!(parse_time("Mission Too large to estimate").unwrap().is_infinite());
        }

        #[test]
        fn test_unknown_unit() {
            let err = parse_time("5 sec").unwrap_err();
            assert!(matches!(err, WaypointError::MetricParse { .. }));
            assert!(err.to_string().contains("sec"));
        }

        #[test]
        fn test_missing_unit() {
            assert!(parse_time("12").is_err());
        }
    }

    mod photos_tests {
        use super::*;

        #[test]
        fn test_count() {
            assert_eq!(parse_photos("412").unwrap(), 412.0);
            assert_eq!(parse_photos("1,204").unwrap(), 1204.0);
        }

        #[test]
        fn test_dash_is_unbounded() {
            assert!(parse_photos("-").unwrap().is_infinite());
        }

        #[test]
        fn test_garbage() {
            assert!(parse_photos("many").is_err());
        }
    }

    mod gsd_tests {
        use super::*;

        #[test]
        fn test_amount_and_unit() {
            let gsd = parse_gsd("0.42 cm/px").unwrap();
            assert_eq!(gsd.value, 0.42);
            assert_eq!(gsd.unit, "cm/px");
            assert_eq!(gsd.to_string(), "0.42 cm/px");
        }

        #[test]
        fn test_missing_unit() {
            assert!(parse_gsd("0.42").is_err());
        }
    }

    #[test]
    fn test_metric_dispatch() {
        assert_eq!(Metric::Time.parse("2 hr").unwrap(), 120.0);
        assert_eq!(Metric::ThermalGsd.parse("3.1 cm/px").unwrap(), 3.1);
        assert_eq!(Metric::Photos.column(), 1);
        assert_eq!(Metric::ColorGsd.to_string(), "color gsd");
    }

    mod rotation_tests {
        use super::*;

        #[test]
        fn test_extracts_degrees() {
            assert_eq!(
                parse_rotation("width: 24px; transform: rotate(-35deg);").unwrap(),
                -35.0
            );
            assert_eq!(parse_rotation("transform: rotate(12.5deg)").unwrap(), 12.5);
        }

        #[test]
        fn test_no_rotation() {
            assert!(parse_rotation("transform: scale(2)").is_err());
        }
    }
}
