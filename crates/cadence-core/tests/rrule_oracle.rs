//! Cross-checks the engine against the `rrule` crate through the RFC 5545
//! export. Patterns are anchored on a day the rule fires, since iCalendar
//! leaves unsynchronised DTSTART values undefined.

use cadence_core::models::{EndCondition, RecurrencePattern};
use cadence_core::recurrence::RecurrenceEngine;
use cadence_core::timezone::LocalZone;
use chrono::{Days, NaiveDate, Weekday};
use rrule::RRuleSet;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn oracle_days(pattern: &RecurrencePattern, anchor: NaiveDate, window_end: NaiveDate) -> Vec<NaiveDate> {
    let rule = pattern
        .to_rrule(anchor.and_hms_opt(9, 0, 0).unwrap(), &LocalZone::utc())
        .unwrap();
    let set: RRuleSet = rule.parse().unwrap();
    let (dates, _) = set.all(500);
    dates
        .into_iter()
        .map(|dt| dt.naive_utc().date())
        .filter(|day| *day <= window_end)
        .collect()
}

fn engine_days(pattern: &RecurrencePattern, anchor: NaiveDate, window_end: NaiveDate) -> Vec<NaiveDate> {
    let engine = RecurrenceEngine::new(pattern, anchor.and_hms_opt(9, 0, 0).unwrap()).unwrap();
    engine
        .occurrences_between(anchor, window_end)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[rstest]
#[case::daily(RecurrencePattern::daily(1), date(2024, 1, 1))]
#[case::every_third_day(RecurrencePattern::daily(3), date(2024, 2, 27))]
#[case::daily_count(
    RecurrencePattern::daily(2).with_end(EndCondition::AfterOccurrences(17)),
    date(2024, 1, 1)
)]
#[case::weekdays(
    RecurrencePattern::weekly(1, [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]),
    date(2024, 1, 3)
)]
#[case::fortnightly_sunday_and_saturday(
    RecurrencePattern::weekly(2, [Weekday::Sun, Weekday::Sat]),
    date(2024, 1, 6)
)]
#[case::every_third_week_counted(
    RecurrencePattern::weekly(3, [Weekday::Tue, Weekday::Thu])
        .with_end(EndCondition::AfterOccurrences(11)),
    date(2024, 3, 14)
)]
#[case::weekly_until(
    RecurrencePattern::weekly(1, [Weekday::Fri]).with_end(EndCondition::Until(date(2024, 6, 28))),
    date(2024, 1, 5)
)]
#[case::monthly(RecurrencePattern::monthly(1), date(2024, 1, 15))]
#[case::month_end(
    RecurrencePattern::monthly(1).with_end(EndCondition::AfterOccurrences(8)),
    date(2024, 1, 31)
)]
#[case::quarterly_on_the_30th(RecurrencePattern::monthly(3), date(2023, 11, 30))]
#[case::leap_day(RecurrencePattern::monthly(12), date(2024, 2, 29))]
fn engine_agrees_with_rrule(#[case] pattern: RecurrencePattern, #[case] anchor: NaiveDate) {
    let window_end = anchor + Days::new(366);
    assert_eq!(
        engine_days(&pattern, anchor, window_end),
        oracle_days(&pattern, anchor, window_end)
    );
}

#[test]
fn exclusions_match_exdate() {
    let anchor = date(2024, 1, 1);
    let pattern = RecurrencePattern::daily(1)
        .with_end(EndCondition::AfterOccurrences(10))
        .excluding([date(2024, 1, 3), date(2024, 1, 7)]);
    let window_end = date(2024, 12, 31);
    let days = engine_days(&pattern, anchor, window_end);
    assert_eq!(days.len(), 8);
    assert_eq!(days, oracle_days(&pattern, anchor, window_end));
}
