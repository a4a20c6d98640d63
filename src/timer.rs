//! Elapsed time, progress and zone for a fast.
//!
//! Everything here is a pure function of the fast record and an explicit
//! `now`. Callers sample the clock; nothing in this module does.

use crate::models::{Fast, FastSnapshot};
use chrono::{DateTime, Duration, Utc};

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Fasts older than this are considered abandoned.
pub const STALE_AFTER_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub name: &'static str,
    pub start_hour: f64,
    pub end_hour: f64,
}

pub const ZONES: [Zone; 6] = [
    Zone {
        name: "Fed State",
        start_hour: 0.0,
        end_hour: 4.0,
    },
    Zone {
        name: "Early Fasting",
        start_hour: 4.0,
        end_hour: 12.0,
    },
    Zone {
        name: "Fat Burning",
        start_hour: 12.0,
        end_hour: 18.0,
    },
    Zone {
        name: "Ketosis",
        start_hour: 18.0,
        end_hour: 24.0,
    },
    Zone {
        name: "Autophagy",
        start_hour: 24.0,
        end_hour: 48.0,
    },
    Zone {
        name: "Deep Autophagy",
        start_hour: 48.0,
        end_hour: f64::INFINITY,
    },
];

/// Running milliseconds: `(pausedAt or now) - start - pausedDuration`, floored at zero.
pub fn elapsed_ms(fast: Option<&Fast>, now: DateTime<Utc>) -> i64 {
    let Some(fast) = fast.filter(|fast| fast.is_running()) else {
        return 0;
    };
    let Some(start) = fast.start_time else {
        return 0;
    };

    let end = match fast.paused_at {
        Some(paused_at) if fast.is_paused() => paused_at,
        _ => now,
    };

    let elapsed = (end - start).num_milliseconds() - fast.paused_duration;
    elapsed.max(0)
}

/// Percent toward the target, in `[0, 100]`.
pub fn progress(elapsed_ms: i64, target_hours: f64) -> f64 {
    let target_ms = target_hours * MS_PER_HOUR;
    let pct = (elapsed_ms.max(0) as f64 / target_ms) * 100.0;
    pct.min(100.0)
}

/// Index into [`ZONES`]. A value on a boundary belongs to the later zone.
pub fn zone_index(elapsed_ms: i64) -> usize {
    let hours = elapsed_ms.max(0) as f64 / MS_PER_HOUR;
    ZONES
        .iter()
        .position(|zone| zone.start_hour <= hours && hours < zone.end_hour)
        .unwrap_or(ZONES.len() - 1)
}

pub fn zone_for(elapsed_ms: i64) -> &'static Zone {
    &ZONES[zone_index(elapsed_ms)]
}

pub fn remaining_ms(elapsed_ms: i64, target_hours: f64) -> i64 {
    let target_ms = (target_hours * MS_PER_HOUR) as i64;
    (target_ms - elapsed_ms).max(0)
}

pub fn is_stale(fast: &Fast, now: DateTime<Utc>) -> bool {
    match fast.start_time {
        Some(start) if fast.is_running() => now - start > Duration::days(STALE_AFTER_DAYS),
        _ => false,
    }
}

/// `"8h 05m"`
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let total_minutes = elapsed_ms.max(0) / 60_000;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

pub fn snapshot(fast: Option<&Fast>, now: DateTime<Utc>) -> FastSnapshot {
    let elapsed = elapsed_ms(fast, now);
    let running = fast.filter(|fast| fast.is_running());
    let target_hours = running.map(|fast| fast.target_hours).unwrap_or(0.0);
    let index = zone_index(elapsed);

    let (progress, remaining, title) = match running {
        Some(fast) if target_hours > 0.0 => {
            let suffix = if fast.is_paused() { " (paused)" } else { "" };
            (
                progress(elapsed, target_hours),
                remaining_ms(elapsed, target_hours),
                format!("{} · {}{}", format_elapsed(elapsed), ZONES[index].name, suffix),
            )
        }
        _ => (0.0, 0, "Not fasting".to_string()),
    };

    FastSnapshot {
        fast: fast.cloned(),
        elapsed_ms: elapsed,
        remaining_ms: remaining,
        progress,
        zone: ZONES[index].name,
        zone_index: index,
        title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FastStatus;
    use chrono::TimeZone;

    const HOUR_MS: i64 = 3_600_000;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn active(started_hours_ago: i64, target_hours: f64) -> Fast {
        Fast {
            id: Some("42".into()),
            start_time: Some(now() - Duration::hours(started_hours_ago)),
            target_hours,
            status: FastStatus::Active,
            ..Fast::default()
        }
    }

    #[test]
    fn no_fast_has_zero_elapsed() {
        assert_eq!(elapsed_ms(None, now()), 0);
        let ended = Fast {
            status: FastStatus::Ended,
            ..active(3, 16.0)
        };
        assert_eq!(elapsed_ms(Some(&ended), now()), 0);
    }

    #[test]
    fn elapsed_subtracts_paused_duration() {
        for paused in [0, 1, 59_999, HOUR_MS, 3 * HOUR_MS] {
            let fast = Fast {
                paused_duration: paused,
                ..active(5, 16.0)
            };
            assert_eq!(elapsed_ms(Some(&fast), now()), 5 * HOUR_MS - paused);
        }
    }

    #[test]
    fn elapsed_floors_at_zero_on_clock_skew() {
        let future = Fast {
            start_time: Some(now() + Duration::minutes(10)),
            ..active(0, 16.0)
        };
        assert_eq!(elapsed_ms(Some(&future), now()), 0);

        let over_paused = Fast {
            paused_duration: 10 * HOUR_MS,
            ..active(2, 16.0)
        };
        assert_eq!(elapsed_ms(Some(&over_paused), now()), 0);
    }

    #[test]
    fn eight_hours_into_sixteen() {
        let fast = active(8, 16.0);
        let snap = snapshot(Some(&fast), now());
        assert_eq!(snap.elapsed_ms, 8 * HOUR_MS);
        assert!((snap.progress - 50.0).abs() < 1e-9);
        assert_eq!(snap.zone, "Early Fasting");
        assert_eq!(snap.remaining_ms, 8 * HOUR_MS);
        assert_eq!(snap.title, "8h 00m · Early Fasting");
    }

    #[test]
    fn progress_caps_at_one_hundred() {
        let fast = active(20, 16.0);
        let snap = snapshot(Some(&fast), now());
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.remaining_ms, 0);
    }

    #[test]
    fn progress_stays_in_range() {
        for target in [0.5, 1.0, 12.0, 16.0, 36.0] {
            for hours in 0..80 {
                let elapsed = hours * HOUR_MS / 2;
                let pct = progress(elapsed, target);
                assert!((0.0..=100.0).contains(&pct));
                let reached = elapsed as f64 >= target * MS_PER_HOUR;
                assert_eq!(pct == 100.0, reached, "target {target} elapsed {elapsed}");
            }
        }
    }

    #[test]
    fn paused_fast_is_frozen_at_pause_time() {
        let fast = Fast {
            status: FastStatus::Paused,
            paused_at: Some(now() - Duration::hours(2)),
            paused_duration: 0,
            ..active(4, 16.0)
        };
        assert_eq!(elapsed_ms(Some(&fast), now()), 2 * HOUR_MS);
        let later = now() + Duration::hours(5);
        assert_eq!(elapsed_ms(Some(&fast), later), 2 * HOUR_MS);
        assert!(snapshot(Some(&fast), now()).title.ends_with("(paused)"));
    }

    #[test]
    fn zones_are_contiguous() {
        assert_eq!(ZONES[0].start_hour, 0.0);
        for pair in ZONES.windows(2) {
            assert_eq!(pair[0].end_hour, pair[1].start_hour);
            assert!(pair[0].start_hour < pair[0].end_hour);
        }
        assert!(ZONES[ZONES.len() - 1].end_hour.is_infinite());
    }

    #[test]
    fn zone_boundaries_belong_to_later_zone() {
        assert_eq!(zone_for(0).name, "Fed State");
        assert_eq!(zone_for(4 * HOUR_MS - 1).name, "Fed State");
        assert_eq!(zone_for(4 * HOUR_MS).name, "Early Fasting");
        assert_eq!(zone_for(18 * HOUR_MS).name, "Ketosis");
        assert_eq!(zone_for(48 * HOUR_MS).name, "Deep Autophagy");
        assert_eq!(zone_for(500 * HOUR_MS).name, "Deep Autophagy");
    }

    #[test]
    fn stale_after_seven_days() {
        assert!(!is_stale(&active(24 * 7, 16.0), now()));
        assert!(is_stale(&active(24 * 7 + 1, 16.0), now()));
        let ended = Fast {
            status: FastStatus::Ended,
            ..active(24 * 30, 16.0)
        };
        assert!(!is_stale(&ended, now()));
    }

    #[test]
    fn format_elapsed_pads_minutes() {
        assert_eq!(format_elapsed(0), "0h 00m");
        assert_eq!(format_elapsed(HOUR_MS + 5 * 60_000 + 59_000), "1h 05m");
        assert_eq!(format_elapsed(-5), "0h 00m");
    }

    #[test]
    fn idle_snapshot() {
        let snap = snapshot(None, now());
        assert_eq!(snap.title, "Not fasting");
        assert_eq!(snap.progress, 0.0);
        assert_eq!(snap.zone_index, 0);
    }
}
