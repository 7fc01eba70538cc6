use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::leveling;
use crate::engine::streak::{calculate_streak, parse_day_key};

pub const USER_STATS_KEY: &str = "userStats";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

/// Current version of the persisted achievements envelope. Version 0 is the
/// legacy bare-array layout.
pub const ACHIEVEMENTS_SCHEMA_VERSION: u32 = 1;

/// Durable progression snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub total_xp: u64,
    pub chore_streak: u32,
    pub learning_streak: u32,
    pub total_chores_completed: u32,
    pub total_lessons_completed: u32,
    pub total_money_earned: f64,
    pub last_active_date: Option<NaiveDate>,
    pub completed_chore_days: BTreeSet<NaiveDate>,
    pub completed_learning_days: BTreeSet<NaiveDate>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: leveling::xp_to_next(1),
            total_xp: 0,
            chore_streak: 0,
            learning_streak: 0,
            total_chores_completed: 0,
            total_lessons_completed: 0,
            total_money_earned: 0.0,
            last_active_date: None,
            completed_chore_days: BTreeSet::new(),
            completed_learning_days: BTreeSet::new(),
        }
    }
}

impl UserStats {
    /// Overlay a persisted payload onto the defaults, field by field.
    ///
    /// Never fails: unparseable input yields defaults, a bad field keeps its
    /// default, and malformed day entries are dropped. Derived fields are
    /// recomputed against `today` afterwards.
    pub fn hydrate(raw: &str, today: NaiveDate) -> Self {
        let mut stats = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => Self::from_object(&obj),
            Ok(_) => {
                warn!("userStats payload is not an object, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!("userStats payload failed to parse ({e}), using defaults");
                Self::default()
            }
        };
        stats.rederive(today);
        stats
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let d = Self::default();
        Self {
            level: count_field(obj, "level").unwrap_or(d.level),
            xp: count_field(obj, "xp").unwrap_or(d.xp),
            xp_to_next_level: count_field(obj, "xpToNextLevel").unwrap_or(d.xp_to_next_level),
            total_xp: count_field(obj, "totalXp").unwrap_or(d.total_xp),
            chore_streak: count_field(obj, "choreStreak").unwrap_or(d.chore_streak),
            learning_streak: count_field(obj, "learningStreak").unwrap_or(d.learning_streak),
            total_chores_completed: count_field(obj, "totalChoresCompleted")
                .unwrap_or(d.total_chores_completed),
            total_lessons_completed: count_field(obj, "totalLessonsCompleted")
                .unwrap_or(d.total_lessons_completed),
            total_money_earned: field::<f64>(obj, "totalMoneyEarned")
                .filter(|m| m.is_finite())
                .unwrap_or(d.total_money_earned),
            last_active_date: obj
                .get("lastActiveDate")
                .and_then(Value::as_str)
                .and_then(parse_day_key),
            completed_chore_days: day_set_field(obj, "completedChoreDays"),
            completed_learning_days: day_set_field(obj, "completedLearningDays"),
        }
    }

    /// Restore the derived fields: threshold from level, overflow carried into
    /// levels, streaks from the day-sets.
    pub fn rederive(&mut self, today: NaiveDate) {
        leveling::carry_levels(self);
        self.recompute_streaks(today);
    }

    pub fn recompute_streaks(&mut self, today: NaiveDate) {
        self.chore_streak = calculate_streak(&self.completed_chore_days, today);
        self.learning_streak = calculate_streak(&self.completed_learning_days, today);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    obj.get(key).and_then(|v| T::deserialize(v).ok())
}

/// Non-negative integer field. Accepts whole numbers stored as floats.
fn count_field<T: TryFrom<u64>>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    let value = obj.get(key)?;
    let n = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if !f.is_finite() || f < 0.0 {
                return None;
            }
            f.trunc() as u64
        }
    };
    T::try_from(n).ok()
}

fn day_set_field(obj: &Map<String, Value>, key: &str) -> BTreeSet<NaiveDate> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(parse_day_key)
            .collect(),
        _ => BTreeSet::new(),
    }
}

// --- Achievements ---

/// Per-user mutable state of one achievement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub id: String,
    #[serde(default)]
    pub current_progress: u32,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementProgress {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_str()?;
        if id.is_empty() {
            return None;
        }
        let unlocked = obj.get("unlocked").and_then(Value::as_bool).unwrap_or(false);
        Some(Self {
            id: id.to_string(),
            current_progress: count_field(obj, "currentProgress").unwrap_or(0),
            unlocked,
            unlocked_at: obj.get("unlockedAt").and_then(timestamp_value),
        })
    }
}

/// RFC 3339 strings, or epoch milliseconds as written by older clients.
fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementsData {
    pub schema_version: u32,
    pub achievements: Vec<AchievementProgress>,
}

impl AchievementsData {
    pub fn new(achievements: Vec<AchievementProgress>) -> Self {
        Self {
            schema_version: ACHIEVEMENTS_SCHEMA_VERSION,
            achievements,
        }
    }
}

/// Bring any persisted achievements payload up to the current layout.
///
/// Version 0 is a bare array; version 1 wraps it in an envelope. Entries
/// without an id are dropped. Unparseable payloads and versions newer than
/// this build yield an empty list, i.e. a fresh catalog.
pub fn migrate_achievements(raw: &str) -> Vec<AchievementProgress> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("achievements payload failed to parse ({e}), starting fresh");
            return Vec::new();
        }
    };

    let none: &[Value] = &[];
    let (version, entries) = match &value {
        Value::Array(items) => (0, items.as_slice()),
        Value::Object(obj) => {
            let version = count_field::<u32>(obj, "schemaVersion").unwrap_or(0);
            match obj.get("achievements") {
                Some(Value::Array(items)) => (version, items.as_slice()),
                _ => (version, none),
            }
        }
        _ => (0, none),
    };

    if version > ACHIEVEMENTS_SCHEMA_VERSION {
        warn!(
            version,
            supported = ACHIEVEMENTS_SCHEMA_VERSION,
            "achievements payload is from a newer schema, starting fresh"
        );
        return Vec::new();
    }

    entries
        .iter()
        .filter_map(AchievementProgress::from_value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        parse_day_key(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let stats = UserStats::default();
        assert_eq!(stats.level, 1);
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.xp_to_next_level, 100);
        assert!(stats.completed_chore_days.is_empty());
    }

    #[test]
    fn test_serialize_uses_camel_case_and_day_strings() {
        let mut stats = UserStats::default();
        stats.completed_chore_days.insert(today());
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"xpToNextLevel\":100"));
        assert!(json.contains("\"completedChoreDays\":[\"2026-10-18\"]"));
    }

    #[test]
    fn test_round_trip_with_day_sets() {
        let mut stats = UserStats::default();
        stats.total_money_earned = 12.5;
        stats.completed_chore_days =
            BTreeSet::from([today(), day("2026-10-17"), day("2026-10-16")]);
        stats.completed_learning_days = BTreeSet::from([day("2026-10-10")]);
        stats.recompute_streaks(today());

        let restored = UserStats::hydrate(&stats.to_json().unwrap(), today());
        assert_eq!(restored, stats);
        assert_eq!(restored.chore_streak, 3);
    }

    #[test]
    fn test_hydrate_garbage_falls_back_to_defaults() {
        assert_eq!(UserStats::hydrate("not json{", today()), UserStats::default());
        assert_eq!(UserStats::hydrate("[1,2,3]", today()), UserStats::default());
    }

    #[test]
    fn test_hydrate_defaults_bad_fields_independently() {
        let raw = r#"{
            "level": "three",
            "xp": 40,
            "totalChoresCompleted": 7,
            "totalMoneyEarned": "lots",
            "completedChoreDays": "2026-10-18",
            "completedLearningDays": ["2026-10-18", "garbage", 5]
        }"#;
        let stats = UserStats::hydrate(raw, today());
        assert_eq!(stats.level, 1);
        assert_eq!(stats.xp, 40);
        assert_eq!(stats.total_chores_completed, 7);
        assert_eq!(stats.total_money_earned, 0.0);
        assert!(stats.completed_chore_days.is_empty());
        assert_eq!(stats.completed_learning_days, BTreeSet::from([today()]));
        assert_eq!(stats.learning_streak, 1);
    }

    #[test]
    fn test_hydrate_ignores_unknown_fields_and_whole_floats() {
        let raw = r#"{"level": 2, "xp": 15.0, "favoriteColor": "green"}"#;
        let stats = UserStats::hydrate(raw, today());
        assert_eq!(stats.level, 2);
        assert_eq!(stats.xp, 15);
        assert_eq!(stats.xp_to_next_level, 200);
    }

    #[test]
    fn test_hydrate_rederives_stale_streaks_and_threshold() {
        let raw = r#"{
            "level": 3,
            "xpToNextLevel": 999,
            "choreStreak": 12,
            "completedChoreDays": ["2026-10-10", "2026-10-11"]
        }"#;
        let stats = UserStats::hydrate(raw, today());
        assert_eq!(stats.xp_to_next_level, 300);
        assert_eq!(stats.chore_streak, 0);
    }

    #[test]
    fn test_hydrate_carries_overflowing_xp() {
        let stats = UserStats::hydrate(r#"{"level": 1, "xp": 130}"#, today());
        assert_eq!(stats.level, 2);
        assert_eq!(stats.xp, 30);
    }

    #[test]
    fn test_hydrate_saturated_level_and_xp() {
        let raw = r#"{"level": 4294967295, "xp": 4294967295}"#;
        let stats = UserStats::hydrate(raw, today());
        assert_eq!(stats.level, u32::MAX);
        assert_eq!(stats.xp_to_next_level, u32::MAX);
        assert!(stats.xp < stats.xp_to_next_level);
    }

    #[test]
    fn test_migrate_legacy_bare_array() {
        let raw = r#"[
            {"id": "first_chore", "title": "First Chore", "currentProgress": 1,
             "unlocked": true, "unlockedAt": 1760000000000},
            {"title": "no id"},
            {"id": "chore_champion_10", "currentProgress": 4}
        ]"#;
        let entries = migrate_achievements(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "first_chore");
        assert!(entries[0].unlocked);
        assert!(entries[0].unlocked_at.is_some());
        assert_eq!(entries[1].current_progress, 4);
        assert!(!entries[1].unlocked);
    }

    #[test]
    fn test_migrate_current_envelope() {
        let data = AchievementsData::new(vec![AchievementProgress {
            id: "early_bird".to_string(),
            current_progress: 1,
            unlocked: true,
            unlocked_at: Some(Utc::now()),
        }]);
        let raw = serde_json::to_string(&data).unwrap();
        assert!(raw.contains("\"schemaVersion\":1"));
        assert_eq!(migrate_achievements(&raw), data.achievements);
    }

    #[test]
    fn test_migrate_future_version_starts_fresh() {
        let raw = r#"{"schemaVersion": 99, "achievements": [{"id": "first_chore"}]}"#;
        assert!(migrate_achievements(raw).is_empty());
    }

    #[test]
    fn test_migrate_garbage_starts_fresh() {
        assert!(migrate_achievements("{{{").is_empty());
        assert!(migrate_achievements("42").is_empty());
    }
}
