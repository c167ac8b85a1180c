//! Split date/time controls with a relative-label vocabulary.
//!
//! Dates accept `Today`/`Tomorrow`/`Yesterday`, weekday names (next
//! occurrence, today's weekday resolving a week ahead), `YYYY-MM-DD` and
//! `D/M[/YY[YY]]`. Times accept `H[:MM]`, the named slots and `now`.
//! Anything else is kept as a free-form keyword.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::registry::{DateTimeFieldConfig, DateTimeMode};
use crate::values::{FieldMap, FieldValue};

pub const DATE_LABELS: &[&str] = &[
    "Today",
    "Tomorrow",
    "Yesterday",
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Named time slots. The `Now` suggestion resolves against the base date; a
/// typed `now` uses the wall clock.
pub const TIME_SLOTS: &[(&str, Option<(u32, u32)>)] = &[
    ("Now", None),
    ("Morning", Some((9, 0))),
    ("Midday", Some((12, 0))),
    ("Afternoon", Some((15, 0))),
    ("Evening", Some((19, 0))),
    ("Night", Some((22, 0))),
];

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"));
static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/](\d{1,2})(?:[-/](\d{4}|\d{2}))?$").expect("valid regex")
});
static CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?$").expect("valid regex"));
static ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{1,2}-\d{1,2})[T ](\d{1,2}:\d{2})(?::\d{2}(?:\.\d+)?)?").expect("valid regex")
});
static WEATHER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhour\s+(\d{1,2})(?:\s+minute\s+(\d{1,2}))?").expect("valid regex")
});

/// Structured time emitted for weather-mode fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default)]
    pub raw: String,
}

impl WeatherTime {
    pub fn is_empty(&self) -> bool {
        self.day.is_none()
            && self.date.is_none()
            && self.hour.is_none()
            && self.minute.is_none()
            && self.raw.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: Option<NaiveDate>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTime {
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub keyword: Option<String>,
}

impl ParsedTime {
    pub fn clock(&self) -> Option<String> {
        self.hour
            .map(|hour| format!("{hour:02}:{:02}", self.minute.unwrap_or(0)))
    }
}

/// UI-side working copy for one date/time field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateTimeInputs {
    pub date_value: String,
    pub time_value: String,
    pub use_default_time: bool,
}

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("sunday", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
];

/// Resolves a relative date label against `base`.
pub fn resolve_date_label(label: &str, base: NaiveDate) -> Option<NaiveDate> {
    let label = label.trim().to_ascii_lowercase();
    let offset = match label.as_str() {
        "today" => 0,
        "tomorrow" => 1,
        "yesterday" => -1,
        other => {
            let (_, weekday) = WEEKDAYS.iter().find(|(name, _)| *name == other)?;
            let current = base.weekday().num_days_from_sunday() as i64;
            let target = weekday.num_days_from_sunday() as i64;
            let ahead = (target - current).rem_euclid(7);
            if ahead == 0 {
                7
            } else {
                ahead
            }
        }
    };
    base.checked_add_signed(Duration::days(offset))
}

/// Display casing of a vocabulary label, if `keyword` is one.
pub fn date_label_for(keyword: &str) -> Option<&'static str> {
    DATE_LABELS
        .iter()
        .copied()
        .find(|label| label.eq_ignore_ascii_case(keyword.trim()))
}

fn expand_two_digit_year(yy: i32, base_year: i32) -> i32 {
    let mut year = base_year - base_year.rem_euclid(100) + yy;
    if year - base_year > 50 {
        year -= 100;
    } else if base_year - year > 50 {
        year += 100;
    }
    year
}

pub fn parse_date_input(text: &str, base: NaiveDate) -> ParsedDate {
    let text = text.trim();
    if text.is_empty() {
        return ParsedDate::default();
    }
    if let Some(label) = date_label_for(text) {
        return ParsedDate {
            date: resolve_date_label(label, base),
            keyword: Some(label.to_ascii_lowercase()),
        };
    }

    let numeric = if let Some(caps) = ISO_DATE.captures(text) {
        let year = caps[1].parse().ok();
        let month = caps[2].parse().ok();
        let day = caps[3].parse().ok();
        year.zip(month)
            .zip(day)
            .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
    } else if let Some(caps) = DAY_MONTH.captures(text) {
        let day: Option<u32> = caps[1].parse().ok();
        let month: Option<u32> = caps[2].parse().ok();
        let year = match caps.get(3) {
            None => Some(base.year()),
            Some(m) if m.as_str().len() == 2 => m
                .as_str()
                .parse()
                .ok()
                .map(|yy| expand_two_digit_year(yy, base.year())),
            Some(m) => m.as_str().parse().ok(),
        };
        year.zip(month)
            .zip(day)
            .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
    } else {
        None
    };

    match numeric {
        Some(date) => ParsedDate {
            date: Some(date),
            keyword: None,
        },
        None => ParsedDate {
            date: None,
            keyword: Some(text.to_string()),
        },
    }
}

/// Suggestion labels paired with the clock value each one writes.
pub fn time_slot_values(base: NaiveTime) -> Vec<(&'static str, String)> {
    TIME_SLOTS
        .iter()
        .map(|(label, slot)| {
            let (hour, minute) = slot.unwrap_or((base.hour(), base.minute()));
            (*label, format!("{hour:02}:{minute:02}"))
        })
        .collect()
}

pub fn parse_time_input(text: &str, now: NaiveTime) -> ParsedTime {
    let text = text.trim();
    if text.is_empty() {
        return ParsedTime::default();
    }
    if let Some(caps) = CLOCK.captures(text) {
        let hour: Option<u32> = caps[1].parse().ok();
        let minute: Option<u32> = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok());
        if let (Some(hour), Some(minute)) = (hour, minute) {
            if hour < 24 && minute < 60 {
                return ParsedTime {
                    hour: Some(hour),
                    minute: Some(minute),
                    keyword: None,
                };
            }
        }
    }
    if let Some((label, slot)) = TIME_SLOTS
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(text))
    {
        let (hour, minute) = slot.unwrap_or((now.hour(), now.minute()));
        return ParsedTime {
            hour: Some(hour),
            minute: Some(minute),
            keyword: Some(label.to_ascii_lowercase()),
        };
    }
    ParsedTime {
        hour: None,
        minute: None,
        keyword: Some(text.to_string()),
    }
}

/// Anchor for relative labels: the record timestamp, else the current time.
pub fn base_date_for(timestamp: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = timestamp.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return now;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.naive_local();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .unwrap_or(now)
}

impl DateTimeInputs {
    /// Rebuilds the working copy from a stored field value.
    pub fn from_field_value(value: Option<&FieldValue>, config: &DateTimeFieldConfig) -> Self {
        let mut inputs = DateTimeInputs {
            use_default_time: config.default_time.is_some(),
            ..Default::default()
        };
        match value {
            None => {}
            Some(FieldValue::Weather(time)) => {
                inputs.date_value = match (&time.day, &time.date) {
                    (Some(day), _) => date_label_for(day)
                        .map(str::to_string)
                        .unwrap_or_else(|| day.clone()),
                    (None, Some(date)) => date.clone(),
                    (None, None) => String::new(),
                };
                if let Some(hour) = time.hour {
                    inputs.time_value = format!("{hour:02}:{:02}", time.minute.unwrap_or(0));
                }
            }
            Some(FieldValue::Text(text)) => {
                let text = text.trim();
                if let Some(caps) = ISO_DATETIME.captures(text) {
                    inputs.date_value = caps[1].to_string();
                    inputs.time_value = caps[2].to_string();
                } else if config.mode == DateTimeMode::Weather {
                    inputs.split_weather_text(text);
                } else {
                    inputs.date_value = text.to_string();
                }
            }
        }
        inputs
    }

    fn split_weather_text(&mut self, text: &str) {
        let Some(caps) = WEATHER_TEXT.captures(text) else {
            self.date_value = text.to_string();
            return;
        };
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        self.time_value = format!("{hour:02}:{minute:02}");

        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let rest = format!("{} {}", &text[..whole.start], &text[whole.end..]);
        let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        self.date_value = date_label_for(&rest).map(str::to_string).unwrap_or(rest);
    }
}

/// Writes `fields[field]` from the working copy. Returns whether the field
/// now holds a value; unresolvable input deletes it.
pub fn apply_date_time_field_value(
    fields: &mut FieldMap,
    field: &str,
    config: &DateTimeFieldConfig,
    inputs: &DateTimeInputs,
    required: bool,
    base: NaiveDateTime,
    clock: NaiveTime,
) -> bool {
    let date_text = inputs.date_value.trim();
    let time_text = inputs.time_value.trim();
    let date = parse_date_input(date_text, base.date());
    let time = parse_time_input(time_text, clock);

    let value = match config.mode {
        DateTimeMode::Weather => {
            if date_text.is_empty() && time_text.is_empty() {
                None
            } else {
                let raw = [date_text, time_text]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(FieldValue::Weather(WeatherTime {
                    day: date.keyword,
                    date: date.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    hour: time.hour,
                    minute: time.minute,
                    raw,
                }))
            }
        }
        DateTimeMode::Iso if config.include_time => date.date.and_then(|day| {
            let clock = match time.clock() {
                Some(clock) => Some(clock),
                None if time_text.is_empty() && (required || inputs.use_default_time) => {
                    config.default_time.map(str::to_string)
                }
                None => None,
            }?;
            Some(FieldValue::Text(format!("{}T{clock}", day.format("%Y-%m-%d"))))
        }),
        DateTimeMode::Iso | DateTimeMode::Date => date
            .date
            .map(|day| FieldValue::Text(day.format("%Y-%m-%d").to_string())),
    };

    match value {
        Some(value) => {
            fields.insert(field, value);
            true
        }
        None => {
            fields.remove(field);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::date_time_field_config;

    // Sunday
    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn relative_labels_resolve_against_base() {
        let day = base().date();
        assert_eq!(resolve_date_label("Today", day), Some(ymd(2025, 6, 1)));
        assert_eq!(resolve_date_label("tomorrow", day), Some(ymd(2025, 6, 2)));
        assert_eq!(resolve_date_label("Yesterday", day), Some(ymd(2025, 5, 31)));
        assert_eq!(resolve_date_label("Monday", day), Some(ymd(2025, 6, 2)));
        assert_eq!(resolve_date_label("Sunday", day), Some(ymd(2025, 6, 8)));
        assert_eq!(resolve_date_label("Someday", day), None);
    }

    #[test]
    fn numeric_dates_parse_with_century_window() {
        let day = base().date();
        assert_eq!(parse_date_input("2025-07-04", day).date, Some(ymd(2025, 7, 4)));
        assert_eq!(parse_date_input("4/7", day).date, Some(ymd(2025, 7, 4)));
        assert_eq!(parse_date_input("4-7-26", day).date, Some(ymd(2026, 7, 4)));
        assert_eq!(parse_date_input("4/7/80", day).date, Some(ymd(1980, 7, 4)));
        assert_eq!(parse_date_input("4/7/2030", day).date, Some(ymd(2030, 7, 4)));
    }

    #[test]
    fn unknown_date_text_is_kept_as_keyword() {
        let parsed = parse_date_input("next week", base().date());
        assert_eq!(parsed.date, None);
        assert_eq!(parsed.keyword.as_deref(), Some("next week"));

        let invalid = parse_date_input("31/2", base().date());
        assert_eq!(invalid.date, None);
        assert_eq!(invalid.keyword.as_deref(), Some("31/2"));
    }

    #[test]
    fn times_parse_clock_slots_and_now() {
        let now = base().time();
        assert_eq!(parse_time_input("7", now).clock().as_deref(), Some("07:00"));
        assert_eq!(parse_time_input("14:30", now).clock().as_deref(), Some("14:30"));
        assert_eq!(parse_time_input("evening", now).clock().as_deref(), Some("19:00"));
        assert_eq!(parse_time_input("Now", now).clock().as_deref(), Some("08:15"));
        let keyword = parse_time_input("after lunch", now);
        assert_eq!(keyword.hour, None);
        assert_eq!(keyword.keyword.as_deref(), Some("after lunch"));
        assert_eq!(parse_time_input("25:00", now).hour, None);
    }

    #[test]
    fn iso_mode_uses_default_time_when_required() {
        let config = date_time_field_config("start").unwrap();
        let mut fields = FieldMap::new();
        let inputs = DateTimeInputs {
            date_value: "Tomorrow".into(),
            time_value: String::new(),
            use_default_time: false,
        };

        assert!(apply_date_time_field_value(&mut fields, "start", &config, &inputs, true, base(), base().time()));
        assert_eq!(fields.text("start"), Some("2025-06-02T09:00"));

        assert!(!apply_date_time_field_value(&mut fields, "start", &config, &inputs, false, base(), base().time()));
        assert!(!fields.contains("start"));
    }

    #[test]
    fn unresolvable_iso_deletes_field() {
        let config = date_time_field_config("end").unwrap();
        let mut fields: FieldMap = [("end", "2025-06-01T10:00")].into_iter().collect();
        let inputs = DateTimeInputs {
            date_value: "whenever".into(),
            time_value: "10:00".into(),
            use_default_time: true,
        };
        assert!(!apply_date_time_field_value(&mut fields, "end", &config, &inputs, false, base(), base().time()));
        assert!(!fields.contains("end"));
    }

    #[test]
    fn date_mode_writes_bare_date() {
        let config = date_time_field_config("deadline").unwrap();
        let mut fields = FieldMap::new();
        let inputs = DateTimeInputs {
            date_value: "Friday".into(),
            ..Default::default()
        };
        apply_date_time_field_value(&mut fields, "deadline", &config, &inputs, false, base(), base().time());
        assert_eq!(fields.text("deadline"), Some("2025-06-06"));
    }

    #[test]
    fn weather_mode_writes_structured_time_and_round_trips() {
        let config = date_time_field_config("time").unwrap();
        let mut fields = FieldMap::new();
        let inputs = DateTimeInputs {
            date_value: "Tomorrow".into(),
            time_value: "14:30".into(),
            use_default_time: false,
        };
        apply_date_time_field_value(&mut fields, "time", &config, &inputs, false, base(), base().time());

        let Some(FieldValue::Weather(time)) = fields.get("time") else {
            panic!("expected structured weather time");
        };
        assert_eq!(time.day.as_deref(), Some("tomorrow"));
        assert_eq!(time.date.as_deref(), Some("2025-06-02"));
        assert_eq!((time.hour, time.minute), (Some(14), Some(30)));
        assert_eq!(time.raw, "Tomorrow 14:30");

        let again = DateTimeInputs::from_field_value(fields.get("time"), &config);
        assert_eq!(again.date_value, inputs.date_value);
        assert_eq!(again.time_value, inputs.time_value);
    }

    #[test]
    fn weather_mode_clears_when_inputs_empty() {
        let config = date_time_field_config("time").unwrap();
        let mut fields: FieldMap = [("time", "tomorrow")].into_iter().collect();
        apply_date_time_field_value(
            &mut fields,
            "time",
            &config,
            &DateTimeInputs::default(),
            false,
            base(),
            base().time(),
        );
        assert!(!fields.contains("time"));
    }

    #[test]
    fn typed_now_uses_wall_clock_not_base() {
        let config = date_time_field_config("start").unwrap();
        let mut fields = FieldMap::new();
        let inputs = DateTimeInputs {
            date_value: "Today".into(),
            time_value: "now".into(),
            use_default_time: false,
        };
        let wall = NaiveTime::from_hms_opt(17, 40, 0).unwrap();
        apply_date_time_field_value(&mut fields, "start", &config, &inputs, false, base(), wall);
        assert_eq!(fields.text("start"), Some("2025-06-01T17:40"));

        let slots = time_slot_values(base().time());
        assert_eq!(slots[0], ("Now", "08:15".to_string()));
        assert_eq!(slots[4], ("Evening", "19:00".to_string()));
    }

    #[test]
    fn split_controls_round_trip_iso_values() {
        let config = date_time_field_config("start").unwrap();
        let mut fields = FieldMap::new();
        let inputs = DateTimeInputs {
            date_value: "2025-06-03".into(),
            time_value: "10:45".into(),
            use_default_time: true,
        };
        apply_date_time_field_value(&mut fields, "start", &config, &inputs, false, base(), base().time());
        let again = DateTimeInputs::from_field_value(fields.get("start"), &config);
        assert_eq!(again, inputs);
    }

    #[test]
    fn canonical_weather_text_splits_into_inputs() {
        let config = date_time_field_config("time").unwrap();
        let value = FieldValue::text("tomorrow hour 14 minute 30");
        let inputs = DateTimeInputs::from_field_value(Some(&value), &config);
        assert_eq!(inputs.date_value, "Tomorrow");
        assert_eq!(inputs.time_value, "14:30");
    }

    #[test]
    fn base_date_prefers_record_timestamp() {
        let now = base();
        let parsed = base_date_for(Some("2024-12-24T18:00:00+01:00"), now);
        assert_eq!(parsed.date(), ymd(2024, 12, 24));
        assert_eq!(base_date_for(Some("garbage"), now), now);
        assert_eq!(base_date_for(None, now), now);
    }
}
