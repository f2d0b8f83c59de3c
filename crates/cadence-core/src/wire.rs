//! JSON wire form of recurrence patterns and RFC 5545 export.
//!
//! Day-keys travel as epoch milliseconds of local midnight, so converting in
//! either direction needs the [`LocalZone`] they were produced in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ScheduleError;
use crate::models::{EndCondition, Frequency, RecurrencePattern, WeekdaySet};
use crate::timezone::LocalZone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyLabel {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndConditionLabel {
    Never,
    Count,
    Date,
}

/// Serialized recurrence pattern.
///
/// Numbers are signed so malformed input reaches validation instead of
/// failing inside the deserializer.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    pub frequency: FrequencyLabel,
    pub interval: i64,
    pub days_of_week: Option<Vec<String>>,
    pub end_condition: EndConditionLabel,
    pub end_count: Option<i64>,
    pub end_date: Option<i64>,
    pub exclude_dates: Option<Vec<i64>>,
    pub completed_instances: Option<Vec<i64>>,
}

impl PatternRecord {
    pub fn from_pattern(pattern: &RecurrencePattern, zone: &LocalZone) -> Self {
        let (frequency, days_of_week) = match &pattern.frequency {
            Frequency::Daily => (FrequencyLabel::Daily, None),
            Frequency::Weekly { days } => (
                FrequencyLabel::Weekly,
                Some(days.iter().map(|day| weekday_label(day).to_string()).collect()),
            ),
            Frequency::Monthly => (FrequencyLabel::Monthly, None),
        };
        let (end_condition, end_count, end_date) = match pattern.end {
            EndCondition::Never => (EndConditionLabel::Never, None, None),
            EndCondition::AfterOccurrences(count) => {
                (EndConditionLabel::Count, Some(i64::from(count)), None)
            }
            EndCondition::Until(day) => (EndConditionLabel::Date, None, Some(zone.day_key_ms(day))),
        };
        let day_keys = |days: &BTreeSet<NaiveDate>| {
            if days.is_empty() {
                None
            } else {
                Some(days.iter().map(|day| zone.day_key_ms(*day)).collect())
            }
        };

        Self {
            frequency,
            interval: i64::from(pattern.interval),
            days_of_week,
            end_condition,
            end_count,
            end_date,
            exclude_dates: day_keys(&pattern.exclude_dates),
            completed_instances: day_keys(&pattern.completed_instances),
        }
    }

    /// Validates the record and builds the domain pattern.
    ///
    /// # Errors
    /// * `InvalidPattern` - non-positive interval or count, a missing count
    ///   or end date for the chosen end condition, a weekly rule without a
    ///   `daysOfWeek` array, or an unknown weekday label
    /// * `InvalidInput` - a timestamp outside the representable range
    pub fn into_pattern(self, zone: &LocalZone) -> Result<RecurrencePattern, ScheduleError> {
        let interval = u32::try_from(self.interval)
            .ok()
            .filter(|interval| *interval > 0)
            .ok_or_else(|| {
                ScheduleError::InvalidPattern(format!(
                    "interval must be a positive integer, got {}",
                    self.interval
                ))
            })?;

        let frequency = match self.frequency {
            FrequencyLabel::Daily => Frequency::Daily,
            FrequencyLabel::Monthly => Frequency::Monthly,
            FrequencyLabel::Weekly => {
                let labels = self.days_of_week.ok_or_else(|| {
                    ScheduleError::InvalidPattern("weekly rule needs daysOfWeek".to_string())
                })?;
                let days = labels
                    .iter()
                    .map(|label| {
                        Weekday::from_str(label).map_err(|_| {
                            ScheduleError::InvalidPattern(format!("unknown weekday: {}", label))
                        })
                    })
                    .collect::<Result<WeekdaySet, _>>()?;
                Frequency::Weekly { days }
            }
        };

        let end = match self.end_condition {
            EndConditionLabel::Never => EndCondition::Never,
            EndConditionLabel::Count => {
                let count = self.end_count.ok_or_else(|| {
                    ScheduleError::InvalidPattern("endCount is required for a count end".to_string())
                })?;
                let count = u32::try_from(count)
                    .ok()
                    .filter(|count| *count > 0)
                    .ok_or_else(|| {
                        ScheduleError::InvalidPattern(format!(
                            "endCount must be a positive integer, got {}",
                            count
                        ))
                    })?;
                EndCondition::AfterOccurrences(count)
            }
            EndConditionLabel::Date => {
                let end_date = self.end_date.ok_or_else(|| {
                    ScheduleError::InvalidPattern("endDate is required for a date end".to_string())
                })?;
                EndCondition::Until(zone.day_of(end_date)?)
            }
        };

        let days = |keys: Option<Vec<i64>>| -> Result<BTreeSet<NaiveDate>, ScheduleError> {
            keys.unwrap_or_default()
                .into_iter()
                .map(|key| zone.day_of(key))
                .collect()
        };

        let pattern = RecurrencePattern {
            frequency,
            interval,
            end,
            exclude_dates: days(self.exclude_dates)?,
            completed_instances: days(self.completed_instances)?,
        };
        pattern.validate()?;
        Ok(pattern)
    }
}

pub fn pattern_to_json(pattern: &RecurrencePattern, zone: &LocalZone) -> Result<String, ScheduleError> {
    Ok(serde_json::to_string(&PatternRecord::from_pattern(pattern, zone))?)
}

pub fn pattern_from_json(json: &str, zone: &LocalZone) -> Result<RecurrencePattern, ScheduleError> {
    let record: PatternRecord = serde_json::from_str(json)?;
    record.into_pattern(zone)
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "sun",
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
    }
}

fn rrule_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

// ============================================================================
// RFC 5545 Export
// ============================================================================

impl RecurrencePattern {
    /// Renders the series anchored at `anchor` as an iCalendar rule set:
    /// `DTSTART`, `RRULE` and, when days are excluded, `EXDATE`.
    ///
    /// Weeks start on Sunday (`WKST=SU`) to match how intervals are counted.
    ///
    /// # Errors
    /// * `InvalidPattern` - the pattern is malformed, or it is a weekly rule
    ///   without weekdays, which iCalendar cannot express
    pub fn to_rrule(&self, anchor: NaiveDateTime, zone: &LocalZone) -> Result<String, ScheduleError> {
        self.validate()?;

        let mut rule = vec![
            format!("FREQ={}", self.frequency.label().to_uppercase()),
            format!("INTERVAL={}", self.interval),
        ];
        if let Frequency::Weekly { days } = &self.frequency {
            if days.is_empty() {
                return Err(ScheduleError::InvalidPattern(
                    "a weekly rule without weekdays has no RRULE form".to_string(),
                ));
            }
            let byday: Vec<_> = days.iter().map(rrule_weekday).collect();
            rule.push(format!("BYDAY={}", byday.join(",")));
        }
        rule.push("WKST=SU".to_string());
        match self.end {
            EndCondition::Never => {}
            EndCondition::AfterOccurrences(count) => rule.push(format!("COUNT={}", count)),
            EndCondition::Until(day) => {
                let last_second = day.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
                let until = utc_instant(zone.to_epoch_ms(last_second))?;
                rule.push(format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
            }
        }

        let mut lines = vec![
            format!("DTSTART{}", ical_instant(anchor, zone)),
            format!("RRULE:{}", rule.join(";")),
        ];
        if !self.exclude_dates.is_empty() {
            let mut exdate = String::from("EXDATE");
            for (i, day) in self.exclude_dates.iter().enumerate() {
                let value = ical_instant(day.and_time(anchor.time()), zone);
                if i == 0 {
                    exdate.push_str(&value);
                } else {
                    // Parameters only precede the first value
                    let (_, bare) = value.split_once(':').unwrap_or(("", &value));
                    exdate.push(',');
                    exdate.push_str(bare);
                }
            }
            lines.push(exdate);
        }
        Ok(lines.join("\n"))
    }
}

/// Property parameters and value for an instant, e.g. `;TZID=Europe/Berlin:20240101T090000`.
fn ical_instant(local: NaiveDateTime, zone: &LocalZone) -> String {
    if zone.name() == "UTC" {
        format!(":{}", local.format("%Y%m%dT%H%M%SZ"))
    } else {
        format!(";TZID={}:{}", zone.name(), local.format("%Y%m%dT%H%M%S"))
    }
}

fn utc_instant(timestamp_ms: i64) -> Result<DateTime<Utc>, ScheduleError> {
    DateTime::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
        ScheduleError::InvalidInput(format!("Timestamp out of range: {}", timestamp_ms))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::RecurrenceEngine;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn berlin() -> LocalZone {
        LocalZone::parse("Europe/Berlin").unwrap()
    }

    #[test]
    fn test_json_round_trip_preserves_occurrences() {
        let zone = berlin();
        let mut pattern = RecurrencePattern::weekly(2, [Weekday::Tue, Weekday::Sat])
            .with_end(EndCondition::Until(date(2024, 12, 31)))
            .excluding([date(2024, 3, 30)]);
        pattern.mark_complete(date(2024, 1, 6));

        let json = pattern_to_json(&pattern, &zone).unwrap();
        let restored = pattern_from_json(&json, &zone).unwrap();
        assert_eq!(restored, pattern);

        let anchor = date(2024, 1, 2).and_hms_opt(19, 0, 0).unwrap();
        let before = RecurrenceEngine::new(&pattern, anchor).unwrap();
        let after = RecurrenceEngine::new(&restored, anchor).unwrap();
        for day in date(2024, 1, 1).iter_days().take(400) {
            assert_eq!(before.occurs_on(day), after.occurs_on(day), "{}", day);
        }
    }

    #[test]
    fn test_record_layout() {
        let zone = LocalZone::utc();
        let pattern = RecurrencePattern::daily(3).with_end(EndCondition::AfterOccurrences(10));
        let value: serde_json::Value =
            serde_json::from_str(&pattern_to_json(&pattern, &zone).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "frequency": "daily",
                "interval": 3,
                "endCondition": "count",
                "endCount": 10
            })
        );
    }

    #[test]
    fn test_day_keys_are_local_midnight() {
        let zone = berlin();
        let pattern = RecurrencePattern::daily(1).excluding([date(2024, 7, 1)]);
        let record = PatternRecord::from_pattern(&pattern, &zone);
        // Berlin is UTC+2 in July
        assert_eq!(record.exclude_dates, Some(vec![1_719_784_800_000]));
    }

    #[test]
    fn test_rejects_malformed_records() {
        let zone = LocalZone::utc();
        let cases = [
            r#"{"frequency":"daily","interval":0,"endCondition":"never"}"#,
            r#"{"frequency":"daily","interval":-2,"endCondition":"never"}"#,
            r#"{"frequency":"daily","interval":1,"endCondition":"count"}"#,
            r#"{"frequency":"daily","interval":1,"endCondition":"count","endCount":0}"#,
            r#"{"frequency":"daily","interval":1,"endCondition":"date"}"#,
            r#"{"frequency":"weekly","interval":1,"endCondition":"never"}"#,
            r#"{"frequency":"weekly","interval":1,"daysOfWeek":["mon","someday"],"endCondition":"never"}"#,
        ];
        for json in cases {
            assert!(
                matches!(pattern_from_json(json, &zone), Err(ScheduleError::InvalidPattern(_))),
                "{}",
                json
            );
        }
    }

    #[test]
    fn test_empty_weekday_array_is_accepted() {
        let pattern = pattern_from_json(
            r#"{"frequency":"weekly","interval":1,"daysOfWeek":[],"endCondition":"never"}"#,
            &LocalZone::utc(),
        )
        .unwrap();
        assert_eq!(
            pattern.frequency,
            Frequency::Weekly {
                days: WeekdaySet::empty()
            }
        );
    }

    #[test]
    fn test_weekday_labels_are_case_insensitive() {
        let pattern = pattern_from_json(
            r#"{"frequency":"weekly","interval":1,"daysOfWeek":["Monday","FRI"],"endCondition":"never"}"#,
            &LocalZone::utc(),
        )
        .unwrap();
        assert_eq!(pattern, RecurrencePattern::weekly(1, [Weekday::Mon, Weekday::Fri]));
    }

    #[test]
    fn test_to_rrule_rendering() {
        let anchor = date(2024, 1, 2).and_hms_opt(19, 0, 0).unwrap();
        let pattern = RecurrencePattern::weekly(2, [Weekday::Sat, Weekday::Tue])
            .with_end(EndCondition::AfterOccurrences(8))
            .excluding([date(2024, 1, 6), date(2024, 1, 16)]);
        assert_eq!(
            pattern.to_rrule(anchor, &berlin()).unwrap(),
            "DTSTART;TZID=Europe/Berlin:20240102T190000\n\
             RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,SA;WKST=SU;COUNT=8\n\
             EXDATE;TZID=Europe/Berlin:20240106T190000,20240116T190000"
        );

        let until = RecurrencePattern::monthly(1).with_end(EndCondition::Until(date(2024, 6, 30)));
        assert_eq!(
            until.to_rrule(anchor, &berlin()).unwrap(),
            "DTSTART;TZID=Europe/Berlin:20240102T190000\n\
             RRULE:FREQ=MONTHLY;INTERVAL=1;WKST=SU;UNTIL=20240630T215959Z"
        );
        assert!(RecurrencePattern::weekly(1, []).to_rrule(anchor, &berlin()).is_err());
    }
}
