//! Decides which periodic actions are due on a controller tick.
//!
//! Refresh and heartbeat run off monotonic accumulators fed by the elapsed
//! time between ticks, so irregular tick spacing cannot double-fire or skip
//! them. The telemetry record stays aligned to calendar minutes.

use chrono::{NaiveDateTime, Timelike};
use std::time::Duration;

/// Actions due on the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub refresh: bool,
    pub heartbeat: bool,
    pub log: bool,
}

#[derive(Debug, Clone)]
pub struct Cadence {
    refresh_interval: Duration,
    heartbeat_interval: Duration,
    log_increment_minutes: i64,
    since_refresh: Duration,
    since_heartbeat: Duration,
    /// Minutes since epoch of the last telemetry record.
    last_log_minute: Option<i64>,
    last_tick_minute: Option<i64>,
}

impl Cadence {
    pub fn new(
        refresh_interval: Duration,
        heartbeat_interval: Duration,
        log_increment_minutes: u32,
    ) -> Self {
        Self {
            refresh_interval,
            heartbeat_interval,
            log_increment_minutes: i64::from(log_increment_minutes.max(1)),
            since_refresh: Duration::ZERO,
            since_heartbeat: Duration::ZERO,
            last_log_minute: None,
            last_tick_minute: None,
        }
    }

    pub fn last_log_minute(&self) -> Option<i64> {
        self.last_log_minute
    }

    /// Account for `elapsed` and report what is due at wall-clock `now`.
    pub fn advance(&mut self, elapsed: Duration, now: NaiveDateTime) -> Due {
        let refresh = Self::accumulate(&mut self.since_refresh, elapsed, self.refresh_interval);
        let heartbeat =
            Self::accumulate(&mut self.since_heartbeat, elapsed, self.heartbeat_interval);

        let minute = now.and_utc().timestamp().div_euclid(60);
        // first tick of a new minute when second 0 itself was skipped
        let crossed = self.last_tick_minute.is_some_and(|prev| prev != minute);
        let at_boundary = now.second() == 0 || crossed;
        // a clock stepped backwards (DST fall-back, NTP) starts a new series
        let spaced = self.last_log_minute.map_or(true, |last| {
            minute < last || minute - last >= self.log_increment_minutes
        });
        let log = at_boundary && spaced;

        if log {
            self.last_log_minute = Some(minute);
        }
        self.last_tick_minute = Some(minute);

        Due {
            refresh,
            heartbeat,
            log,
        }
    }

    /// At most one firing per tick. The remainder carries over unless a
    /// stall left more than a whole interval, which is dropped.
    fn accumulate(acc: &mut Duration, elapsed: Duration, interval: Duration) -> bool {
        *acc += elapsed;
        if *acc < interval {
            return false;
        }
        *acc -= interval;
        if *acc >= interval {
            *acc = Duration::ZERO;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn cadence() -> Cadence {
        Cadence::new(Duration::from_millis(500), Duration::from_secs(300), 1)
    }

    #[test]
    fn one_record_when_second_zero_is_hit_twice() {
        let mut c = cadence();
        let second = Duration::from_secs(1);
        let logs: Vec<bool> = [at(12, 0, 58), at(12, 0, 59), at(12, 1, 0), at(12, 1, 0), at(12, 1, 1)]
            .into_iter()
            .map(|t| c.advance(second, t).log)
            .collect();
        assert_eq!(logs, vec![false, false, true, false, false]);
        assert_eq!(c.last_log_minute(), Some(at(12, 1, 0).and_utc().timestamp() / 60));
    }

    #[test]
    fn skipped_second_zero_still_logs_once() {
        let mut c = cadence();
        let step = Duration::from_millis(1500);
        assert!(!c.advance(step, at(12, 0, 59)).log);
        assert!(c.advance(step, at(12, 1, 1)).log);
        assert!(!c.advance(step, at(12, 1, 2)).log);
    }

    #[test]
    fn minute_of_hour_alias_does_not_suppress_log() {
        let mut c = cadence();
        assert!(c.advance(Duration::ZERO, at(12, 5, 0)).log);
        // same minute-of-hour one hour later
        assert!(c.advance(Duration::ZERO, at(13, 5, 0)).log);
    }

    #[test]
    fn log_increment_spaces_records() {
        let mut c = Cadence::new(Duration::from_millis(500), Duration::from_secs(300), 5);
        assert!(c.advance(Duration::ZERO, at(12, 0, 0)).log);
        assert!(!c.advance(Duration::ZERO, at(12, 1, 0)).log);
        assert!(!c.advance(Duration::ZERO, at(12, 4, 0)).log);
        assert!(c.advance(Duration::ZERO, at(12, 5, 0)).log);
    }

    #[test]
    fn refresh_fires_about_twice_per_second() {
        let mut c = cadence();
        let tick = Duration::from_millis(250);
        let fired = (0..8)
            .filter(|i| c.advance(tick, at(12, 0, 10 + i / 4)).refresh)
            .count();
        assert_eq!(fired, 4);
    }

    #[test]
    fn uneven_tick_keeps_refresh_rate() {
        let mut c = cadence();
        let tick = Duration::from_millis(400);
        let fired = (0..10)
            .filter(|_| c.advance(tick, at(12, 0, 10)).refresh)
            .count();
        // 4 s of ticks at a 500 ms interval
        assert_eq!(fired, 8);
    }

    #[test]
    fn clock_stepped_back_an_hour_keeps_logging() {
        let mut c = cadence();
        assert!(c.advance(Duration::ZERO, at(1, 59, 0)).log);

        let logged = (0..59)
            .filter(|m| c.advance(Duration::from_secs(60), at(1, *m, 0)).log)
            .count();
        assert_eq!(logged, 59);
    }

    #[test]
    fn clock_stepped_back_without_second_zero_still_logs() {
        let mut c = cadence();
        assert!(c.advance(Duration::ZERO, at(1, 59, 0)).log);
        assert!(c.advance(Duration::from_secs(1), at(1, 0, 7)).log);
        assert!(!c.advance(Duration::from_secs(1), at(1, 0, 8)).log);
    }

    #[test]
    fn long_stall_refreshes_once() {
        let mut c = cadence();
        assert!(c.advance(Duration::from_secs(10), at(12, 0, 30)).refresh);
        assert!(!c.advance(Duration::from_millis(100), at(12, 0, 30)).refresh);
    }

    #[test]
    fn heartbeat_follows_configured_minutes() {
        let mut c = cadence();
        let minute = Duration::from_secs(60);
        let beats: Vec<bool> = (0..10)
            .map(|m| c.advance(minute, at(12, m, 30)).heartbeat)
            .collect();
        assert_eq!(
            beats,
            vec![false, false, false, false, true, false, false, false, false, true]
        );
    }
}
