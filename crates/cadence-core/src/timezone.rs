use crate::error::ScheduleError;
use crate::models::all_day_anchor_time;
use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// The single local calendar the engine schedules against.
///
/// Entries carry wall-clock instants; this type is the only place where
/// they meet epoch-millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalZone {
    tz: Tz,
}

impl LocalZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Parse an IANA timezone name
    pub fn parse(name: &str) -> Result<Self, ScheduleError> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|_| ScheduleError::InvalidInput(format!("Invalid timezone: {}", name)))
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Wall-clock instant for an epoch-millisecond timestamp.
    pub fn to_local(&self, timestamp_ms: i64) -> Result<NaiveDateTime, ScheduleError> {
        Utc.timestamp_millis_opt(timestamp_ms)
            .single()
            .map(|dt| dt.with_timezone(&self.tz).naive_local())
            .ok_or_else(|| {
                ScheduleError::InvalidInput(format!("Timestamp out of range: {}", timestamp_ms))
            })
    }

    /// Epoch milliseconds for a wall-clock instant.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a spring-forward gap move one hour later.
    pub fn to_epoch_ms(&self, local: NaiveDateTime) -> i64 {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.timestamp_millis(),
            LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
            LocalResult::None => {
                let shifted = local + Duration::hours(1);
                match self.tz.from_local_datetime(&shifted).earliest() {
                    Some(dt) => dt.timestamp_millis(),
                    None => local.and_utc().timestamp_millis(),
                }
            }
        }
    }

    /// Day-key timestamp: local midnight of `day`.
    pub fn day_key_ms(&self, day: NaiveDate) -> i64 {
        self.to_epoch_ms(day.and_time(NaiveTime::MIN))
    }

    /// Timestamp all-day entries on `day` are stored at: local noon.
    pub fn all_day_anchor(&self, day: NaiveDate) -> i64 {
        self.to_epoch_ms(day.and_time(all_day_anchor_time()))
    }

    /// Local calendar day a timestamp falls on.
    pub fn day_of(&self, timestamp_ms: i64) -> Result<NaiveDate, ScheduleError> {
        Ok(self.to_local(timestamp_ms)?.date())
    }

    /// Truncate a timestamp to local midnight.
    pub fn day_start_ms(&self, timestamp_ms: i64) -> Result<i64, ScheduleError> {
        Ok(self.day_key_ms(self.day_of(timestamp_ms)?))
    }

    /// Current wall-clock time in this zone.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    /// Offset string for display (e.g. "-05:00")
    pub fn offset_at(&self, local: NaiveDateTime) -> String {
        match self.tz.from_local_datetime(&local).earliest() {
            Some(dt) => dt.format("%:z").to_string(),
            None => String::from("?"),
        }
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_zone() {
        assert!(LocalZone::parse("UTC").is_ok());
        assert!(LocalZone::parse("America/New_York").is_ok());
        assert!(matches!(
            LocalZone::parse("Invalid/Timezone"),
            Err(ScheduleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_day_start_truncates_to_local_midnight() {
        let zone = LocalZone::parse("Europe/Berlin").unwrap();
        let evening = zone.to_epoch_ms(at(2025, 1, 15, 23, 30));
        let midnight = zone.day_start_ms(evening).unwrap();
        assert_eq!(zone.to_local(midnight).unwrap(), at(2025, 1, 15, 0, 0));
        // 23:30 in Berlin is already the 15th's evening, 22:30 UTC
        assert_eq!(evening - midnight, (23 * 60 + 30) * 60_000);
    }

    #[test]
    fn test_round_trip_through_epoch() {
        let zone = LocalZone::parse("America/New_York").unwrap();
        let local = at(2025, 7, 4, 9, 15);
        assert_eq!(zone.to_local(zone.to_epoch_ms(local)).unwrap(), local);
    }

    #[test]
    fn test_spring_forward_gap_moves_later() {
        let zone = LocalZone::parse("America/New_York").unwrap();
        // 02:30 does not exist on 2025-03-09 in New York
        let ms = zone.to_epoch_ms(at(2025, 3, 9, 2, 30));
        assert_eq!(zone.to_local(ms).unwrap(), at(2025, 3, 9, 3, 30));
    }

    #[test]
    fn test_all_day_anchor_is_noon_even_on_transition_days() {
        let zone = LocalZone::parse("America/New_York").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let noon = zone.all_day_anchor(day);
        assert_eq!(zone.to_local(noon).unwrap(), at(2025, 3, 9, 12, 0));
        assert_eq!(zone.day_of(noon).unwrap(), day);
    }

    #[test]
    fn test_fall_back_resolves_to_earliest() {
        let zone = LocalZone::parse("America/New_York").unwrap();
        let ambiguous = zone.to_epoch_ms(at(2025, 11, 2, 1, 30));
        let after = zone.to_epoch_ms(at(2025, 11, 2, 3, 0));
        // 01:30 EDT -> 03:00 EST spans two and a half hours
        assert_eq!(after - ambiguous, 150 * 60_000);
    }
}
