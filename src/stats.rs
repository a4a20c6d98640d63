use crate::models::{CompletedFast, DailyPoint, StatsResponse, WeeklyAveragePoint, WeeklyPoint};
use crate::timer::MS_PER_HOUR;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default)]
struct DayTotals {
    hours: f64,
    completed: u32,
}

pub fn build_stats(fasts: &[CompletedFast]) -> StatsResponse {
    build_stats_at(Utc::now().date_naive(), fasts)
}

fn fasted_hours(fast: &CompletedFast) -> f64 {
    let ms = (fast.end_time - fast.start_time).num_milliseconds() - fast.paused_duration;
    ms.max(0) as f64 / MS_PER_HOUR
}

fn reached_target(fast: &CompletedFast) -> bool {
    fast.target_hours > 0.0 && fasted_hours(fast) >= fast.target_hours
}

/// Fasts are attributed to the UTC date they ended on.
pub fn build_stats_at(today: NaiveDate, fasts: &[CompletedFast]) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for fast in fasts {
        let entry = days.entry(fast.end_time.date_naive()).or_default();
        entry.hours += fasted_hours(fast);
        if reached_target(fast) {
            entry.completed += 1;
        }
    }
    let day = |date: NaiveDate| days.get(&date).copied().unwrap_or_default();

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let totals = day(date);
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            fasted_hours: round_tenth(totals.hours),
            fasts_completed: totals.completed,
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut hours = 0.0;
        let mut completed = 0u32;
        for day_offset in 0..7 {
            let totals = day(start + Duration::days(day_offset));
            hours += totals.hours;
            completed = completed.saturating_add(totals.completed);
        }

        let days_counted = if today < start {
            0
        } else if today > end {
            7
        } else {
            (today - start).num_days() as u8 + 1
        };

        let denom = if days_counted == 0 { 1.0 } else { f64::from(days_counted) };

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            fasted_hours: round_tenth(hours),
            fasts_completed: completed,
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            avg_hours: round_tenth(hours / denom),
        });
    }

    let completed = fasts.iter().filter(|fast| reached_target(fast)).count() as u32;
    let completion_rate = if fasts.is_empty() {
        0.0
    } else {
        round_tenth(f64::from(completed) / fasts.len() as f64 * 100.0)
    };

    let completed_days: BTreeSet<NaiveDate> = days
        .iter()
        .filter(|(_, totals)| totals.completed > 0)
        .map(|(date, _)| *date)
        .collect();

    StatsResponse {
        last_7_days,
        weekly_totals,
        weekly_averages,
        completed,
        completion_rate,
        current_streak_days: streak(today, &completed_days),
        last_fast_date: days.keys().next_back().copied(),
    }
}

/// Consecutive days with a completed fast, ending today or yesterday.
fn streak(today: NaiveDate, completed_days: &BTreeSet<NaiveDate>) -> u32 {
    let mut cursor = if completed_days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut count = 0;
    while completed_days.contains(&cursor) {
        count += 1;
        cursor = cursor - Duration::days(1);
    }
    count
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
