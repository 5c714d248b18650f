//! IV History
//!
//! Day-scoped, bounded log of intraday summary IVs. The log for a symbol
//! lives under a key derived from (symbol, exchange-calendar day), so a new
//! day starts a new log without any explicit reset.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::profile::GexProfile;

/// Default number of records kept per (symbol, day)
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// Default store TTL for a day's log: two days
pub const DEFAULT_HISTORY_TTL_SECS: u64 = 172_800;

/// Key namespace for history logs in the key-value store
pub const HISTORY_KEY_PREFIX: &str = "gex:iv_history";

/// Derive the store key for a symbol's log on a given exchange day
pub fn history_key(symbol: &str, day: NaiveDate) -> String {
    format!(
        "{}:{}:{}",
        HISTORY_KEY_PREFIX,
        symbol.trim().to_uppercase(),
        day.format("%Y-%m-%d")
    )
}

/// Calendar day at the exchange for an instant
pub fn exchange_day(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// One timestamped summary sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvHistoryRecord {
    /// Wall-clock label in exchange time (HH:MM)
    pub time: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "atmIV")]
    pub atm_iv: Option<f64>,
    #[serde(rename = "callWallIV")]
    pub call_wall_iv: Option<f64>,
    #[serde(rename = "putWallIV")]
    pub put_wall_iv: Option<f64>,
}

impl IvHistoryRecord {
    /// Sample a profile's summary IVs at `now`
    pub fn from_profile(profile: &GexProfile, now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            time: now.with_timezone(&tz).format("%H:%M").to_string(),
            timestamp: now.timestamp_millis(),
            atm_iv: profile.atm_iv,
            call_wall_iv: profile.call_wall_iv,
            put_wall_iv: profile.put_wall_iv,
        }
    }
}

/// Bounded FIFO log, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct IvHistoryLog {
    records: Vec<IvHistoryRecord>,
    cap: usize,
}

impl IvHistoryLog {
    pub fn new(cap: usize) -> Self {
        Self {
            records: Vec::new(),
            cap: cap.max(1),
        }
    }

    /// Wrap previously stored records, trimming to the cap
    pub fn from_records(records: Vec<IvHistoryRecord>, cap: usize) -> Self {
        let mut log = Self { records, cap: cap.max(1) };
        log.trim();
        log
    }

    /// Append and discard the oldest entries beyond the cap
    pub fn push(&mut self, record: IvHistoryRecord) {
        self.records.push(record);
        self.trim();
    }

    fn trim(&mut self) {
        if self.records.len() > self.cap {
            let excess = self.records.len() - self.cap;
            self.records.drain(..excess);
        }
    }

    pub fn records(&self) -> &[IvHistoryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<IvHistoryRecord> {
        self.records
    }

    pub fn latest(&self) -> Option<&IvHistoryRecord> {
        self.records.last()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// History payload returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvHistory {
    pub symbol: String,
    pub records: Vec<IvHistoryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn sample(ts: i64) -> IvHistoryRecord {
        IvHistoryRecord {
            time: "09:30".to_string(),
            timestamp: ts,
            atm_iv: Some(15.0),
            call_wall_iv: None,
            put_wall_iv: Some(22.0),
        }
    }

    #[test]
    fn test_history_key_format() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        assert_eq!(history_key("spy", day), "gex:iv_history:SPY:2024-03-08");
        assert_eq!(history_key(" $SPX ", day), "gex:iv_history:$SPX:2024-03-08");
    }

    #[test]
    fn test_exchange_day_uses_exchange_timezone() {
        // 02:00 UTC on the 9th is still the 8th in New York
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 2, 0, 0).unwrap();
        assert_eq!(
            exchange_day(now, New_York),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_key_changes_across_days() {
        let late = Utc.with_ymd_and_hms(2024, 3, 8, 20, 59, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_ne!(
            history_key("SPY", exchange_day(late, New_York)),
            history_key("SPY", exchange_day(next, New_York))
        );
    }

    #[test]
    fn test_log_trims_oldest_first() {
        let mut log = IvHistoryLog::new(3);
        for ts in 0..5 {
            log.push(sample(ts));
            assert!(log.len() <= 3);
        }
        let stamps: Vec<i64> = log.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![2, 3, 4]);
        assert_eq!(log.latest().unwrap().timestamp, 4);
    }

    #[test]
    fn test_from_records_trims_oversized_input() {
        let records: Vec<_> = (0..10).map(sample).collect();
        let log = IvHistoryLog::from_records(records, 4);
        assert_eq!(log.len(), 4);
        assert_eq!(log.records()[0].timestamp, 6);
    }

    #[test]
    fn test_zero_cap_keeps_latest() {
        let mut log = IvHistoryLog::new(0);
        log.push(sample(1));
        log.push(sample(2));
        assert_eq!(log.cap(), 1);
        assert_eq!(log.into_records(), vec![sample(2)]);
    }

    #[test]
    fn test_record_serialization_keeps_nulls() {
        let json = serde_json::to_value(sample(7)).unwrap();
        assert_eq!(json["atmIV"], 15.0);
        assert!(json["callWallIV"].is_null());
        assert_eq!(json["timestamp"], 7);
    }
}
