use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Length of the run of consecutive days ending `today` that are present in `days`.
///
/// The streak is the currently active one: if `today` is missing the result is 0,
/// no matter how long an earlier run was.
pub fn calculate_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    for (i, day) in days.iter().rev().enumerate() {
        let expected = today - Duration::days(i as i64);
        if *day != expected {
            break;
        }
        streak += 1;
    }
    streak
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_FORMAT).ok()
}
