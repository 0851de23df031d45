use crate::error::{malformed_registration, SyncResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

/// Date format of the confirmation text, e.g. `3/14/2024`
const DATE_FORMAT: &str = "%m/%d/%Y";
/// Time format of the confirmation text, e.g. `6:00am`
const TIME_FORMAT: &str = "%I:%M%p";

lazy_static! {
    static ref REGISTRATION_PATTERN: Regex =
        Regex::new(r"(.+?) on (\d+/\d+/\d+) at (\d+:\d+[ap]m)").unwrap();
    static ref LEAD_IN_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:registered|registration|signed up|booked)\s+for\s+").unwrap();
}

/// A class registration found in an email body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRegistration {
    pub class_name: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
}

impl ParsedRegistration {
    /// Start of the class as a naive local timestamp
    pub fn start(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }
}

/// Find a class registration in an email body.
///
/// Returns `Ok(None)` when the body does not describe a registration and
/// `Err(Error::MalformedRegistration)` when it does but the date or time is
/// not a real calendar value (e.g. `2/30/2024`).
pub fn extract(body: &str) -> SyncResult<Option<ParsedRegistration>> {
    // A match with a blank name ("  on 3/14/2024 ...") is not a registration,
    // keep looking further along
    for captures in REGISTRATION_PATTERN.captures_iter(body) {
        // Groups 1-3 are not optional, so they're present on every match
        let (Some(name), Some(date), Some(time)) =
            (captures.get(1), captures.get(2), captures.get(3))
        else {
            continue;
        };

        let class_name = class_name_from(name.as_str());
        if class_name.is_empty() {
            continue;
        }

        let matched = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
        let start_date =
            parse_date(date.as_str()).map_err(|reason| malformed_registration(matched, &reason))?;
        let start_time = NaiveTime::parse_from_str(time.as_str(), TIME_FORMAT).map_err(|e| {
            malformed_registration(matched, &format!("invalid time '{}': {}", time.as_str(), e))
        })?;

        return Ok(Some(ParsedRegistration {
            class_name,
            start_date,
            start_time,
        }));
    }

    Ok(None)
}

/// Trim the captured name and drop a confirmation lead-in such as "You registered for"
fn class_name_from(captured: &str) -> String {
    let trimmed = captured.trim();
    let stripped = LEAD_IN_PATTERN
        .find_iter(trimmed)
        .last()
        .map(|m| trimmed[m.end()..].trim())
        .unwrap_or(trimmed);

    if stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped.to_string()
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    // Only a four digit year is accepted
    let year_digits = date.rsplit('/').next().map(str::len).unwrap_or_default();
    if year_digits != 4 {
        return Err(format!("invalid date '{}': year must have four digits", date));
    }

    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {}", date, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_extracts_confirmation_sentence() {
        let body = "You registered for Power Yoga on 3/14/2024 at 6:00am. See you there!";
        let reg = extract(body).unwrap().unwrap();

        assert_eq!(reg.class_name, "Power Yoga");
        assert_eq!(reg.start(), at(2024, 3, 14, 6, 0));
    }

    #[test]
    fn test_no_pattern_is_not_an_error() {
        assert!(extract("Your spot is confirmed.").unwrap().is_none());
        assert!(extract("").unwrap().is_none());
        // No " on " anywhere
        assert!(extract("Spin 3/14/2024 at 6:00am").unwrap().is_none());
        // Uppercase meridiem doesn't match
        assert!(extract("Spin on 3/14/2024 at 6:00AM").unwrap().is_none());
    }

    #[test]
    fn test_invalid_calendar_values_are_malformed() {
        let result = extract("Spin on 2/30/2024 at 6:00am");
        assert!(matches!(result, Err(Error::MalformedRegistration { .. })));

        let result = extract("Spin on 13/1/2024 at 6:00am");
        assert!(matches!(result, Err(Error::MalformedRegistration { .. })));

        let result = extract("Spin on 3/14/2024 at 13:00pm");
        assert!(matches!(result, Err(Error::MalformedRegistration { .. })));

        let result = extract("Spin on 3/14/24 at 6:00am");
        assert!(matches!(result, Err(Error::MalformedRegistration { .. })));
    }

    #[test]
    fn test_name_containing_on() {
        let reg = extract("Dragon Boat Conditioning on 5/1/2024 at 6:00am")
            .unwrap()
            .unwrap();
        assert_eq!(reg.class_name, "Dragon Boat Conditioning");

        let reg = extract("Yoga on the Lawn on 5/1/2024 at 7:15pm").unwrap().unwrap();
        assert_eq!(reg.class_name, "Yoga on the Lawn");
        assert_eq!(reg.start(), at(2024, 5, 1, 19, 15));
    }

    #[test]
    fn test_rendered_names_round_trip() {
        let cases = [
            ("HIIT", "1/2/2025", "9:05am", at(2025, 1, 2, 9, 5)),
            ("  Barre Basics ", "12/31/2024", "12:00pm", at(2024, 12, 31, 12, 0)),
            ("Midnight Cycle", "7/4/2024", "12:30am", at(2024, 7, 4, 0, 30)),
            ("Pilates & Core", "02/09/2024", "11:59pm", at(2024, 2, 9, 23, 59)),
        ];

        for (name, date, time, expected) in cases {
            let body = format!("{} on {} at {}", name, date, time);
            let reg = extract(&body).unwrap().unwrap();
            assert_eq!(reg.class_name, name.trim());
            assert_eq!(reg.start(), expected);
        }
    }

    #[test]
    fn test_match_is_searched_per_line() {
        let body = "Hello Alex,\n\nYou have registered for Spin on 4/2/2024 at 5:30pm.\nThanks";
        let reg = extract(body).unwrap().unwrap();
        assert_eq!(reg.class_name, "Spin");
        assert_eq!(reg.start(), at(2024, 4, 2, 17, 30));

        let body = "Confirmation: Registration for Boxing on 4/2/2024 at 5:30pm";
        assert_eq!(extract(body).unwrap().unwrap().class_name, "Boxing");
    }

    #[test]
    fn test_blank_name_match_is_skipped() {
        let body = "  on 3/14/2024 at 6:00am\nYoga on 3/15/2024 at 7:00am";
        let reg = extract(body).unwrap().unwrap();
        assert_eq!(reg.class_name, "Yoga");
        assert_eq!(reg.start(), at(2024, 3, 15, 7, 0));

        assert!(extract("  on 3/14/2024 at 6:00am").unwrap().is_none());
    }

    #[test]
    fn test_lead_in_inside_class_name_is_stripped() {
        // Names that start with a lead-in phrase lose it
        let reg = extract("Booked for Life Bootcamp on 3/14/2024 at 6:00am")
            .unwrap()
            .unwrap();
        assert_eq!(reg.class_name, "Life Bootcamp");

        // Nothing follows the lead-in, so it stays part of the name
        let reg = extract("Registered for on 3/14/2024 at 6:00am").unwrap().unwrap();
        assert_eq!(reg.class_name, "Registered for");
    }

    #[test]
    fn test_extract_is_repeatable() {
        let body = "You registered for Power Yoga on 3/14/2024 at 6:00am.";
        assert_eq!(extract(body).unwrap(), extract(body).unwrap());
    }
}
