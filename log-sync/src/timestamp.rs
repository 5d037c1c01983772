//! Reformats ISO-8601 timestamps into the sheet's display format.
//!
//! Parsing never fails the caller: anything that is not recognised is passed
//! through untouched as [`Timestamp::Raw`]. Inputs are rendered in their own
//! offset, no timezone conversion takes place.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

/// `DD/MM/YYYY HH:MM:SS`
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// The input parsed and was reformatted.
    Parsed(String),
    /// The input did not parse and is kept verbatim.
    Raw(String),
}

impl Timestamp {
    pub fn as_str(&self) -> &str {
        match self {
            Timestamp::Parsed(s) | Timestamp::Raw(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Timestamp::Parsed(s) | Timestamp::Raw(s) => s,
        }
    }
}

pub fn normalize(raw: &str) -> Timestamp {
    match parse(raw) {
        Some(datetime) => Timestamp::Parsed(datetime.format(DISPLAY_FORMAT).to_string()),
        None => Timestamp::Raw(raw.to_owned()),
    }
}

/// Parses into the wall-clock time of the input's own offset.
fn parse(raw: &str) -> Option<NaiveDateTime> {
    let mut input = match raw.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_owned(),
    };
    strip_offset_seconds(&mut input)?;
    expand_hour_only(&mut input);

    let datetime = parse_datetime(&input)?;
    // chrono encodes a leap second as nanoseconds past one billion.
    if datetime.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(datetime)
}

fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    for format in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(input, format) {
            return Some(datetime.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
            return Some(datetime);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Drops the seconds of a trailing `±HH:MM:SS` offset, which chrono does not
/// parse. The wall-clock time is kept, so they never affect the output.
/// Returns `None` when the seconds are out of range.
fn strip_offset_seconds(input: &mut String) -> Option<()> {
    let bytes = input.as_bytes();
    let Some(start) = bytes.len().checked_sub(9) else {
        return Some(());
    };
    let offset = &bytes[start..];
    let shaped = matches!(offset[0], b'+' | b'-')
        && offset[3] == b':'
        && offset[6] == b':'
        && [1, 2, 4, 5, 7, 8]
            .iter()
            .all(|&i| offset[i].is_ascii_digit());
    if !shaped {
        return Some(());
    }

    let seconds = (offset[7] - b'0') * 10 + (offset[8] - b'0');
    if seconds >= 60 {
        return None;
    }
    input.truncate(start + 6);
    Some(())
}

/// Completes an hour-only time (`2024-03-05T14`) with zero minutes.
fn expand_hour_only(input: &mut String) {
    let bytes = input.as_bytes();
    let hour_only = bytes.len() >= 13
        && matches!(bytes[10], b'T' | b' ')
        && bytes[11].is_ascii_digit()
        && bytes[12].is_ascii_digit()
        && bytes.get(13).is_none_or(|&b| matches!(b, b'+' | b'-'));
    if hour_only {
        input.insert_str(13, ":00");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_marker() {
        assert_eq!(
            normalize("2024-03-05T14:30:00Z"),
            Timestamp::Parsed("05/03/2024 14:30:00".into())
        );
    }

    #[test]
    fn test_keeps_input_offset() {
        // No conversion to UTC: the wall-clock time of the input is kept.
        assert_eq!(
            normalize("2024-03-05T14:30:00-03:00").as_str(),
            "05/03/2024 14:30:00"
        );
        assert_eq!(
            normalize("2024-12-31T23:59:59+0530").as_str(),
            "31/12/2024 23:59:59"
        );
    }

    #[test]
    fn test_accepted_shapes() {
        let cases = [
            ("2024-01-01T00:00:00.123Z", "01/01/2024 00:00:00"),
            ("2024-01-01T08:15:30.123456+01:00", "01/01/2024 08:15:30"),
            ("2024-01-01 08:15:30", "01/01/2024 08:15:30"),
            ("2024-01-01T08:15", "01/01/2024 08:15:00"),
            ("2024-01-01T08:15Z", "01/01/2024 08:15:00"),
            ("2024-02-29", "29/02/2024 00:00:00"),
            ("2024-03-05T14", "05/03/2024 14:00:00"),
            ("2024-03-05 14", "05/03/2024 14:00:00"),
            ("2024-03-05T14Z", "05/03/2024 14:00:00"),
            ("2024-03-05T14-03:00", "05/03/2024 14:00:00"),
            ("2024-03-05T14:30:00+05:30:15", "05/03/2024 14:30:00"),
            ("2024-03-05T14:30-05:30:00", "05/03/2024 14:30:00"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                normalize(input),
                Timestamp::Parsed(expected.to_owned()),
                "{input}"
            );
        }
    }

    #[test]
    fn test_raw_fallback() {
        for input in [
            "",
            "yesterday",
            "2024-13-01T00:00:00Z",
            "2023-02-29",
            "1709649000",
            "2024-03-05T14:30:00ZZ",
            "2024-03-05T23:59:60Z",
            "2024-03-05T23:59:60",
            "2024-03-05T14:30:00+05:30:60",
            "2024-03-05T1",
            "2024-03-05T24",
        ] {
            assert_eq!(normalize(input), Timestamp::Raw(input.to_owned()));
        }
    }

    #[test]
    fn test_normalized_output_is_stable() {
        // The display format is not ISO-8601, so a second pass keeps it verbatim.
        let once = normalize("2024-03-05T14:30:00Z").into_string();
        let twice = normalize(&once);
        assert_eq!(twice, Timestamp::Raw(once));
    }

    #[test]
    fn test_deterministic() {
        let input = "2025-09-02T14:45:58.462+02:00";
        assert_eq!(normalize(input), normalize(input));
    }
}
