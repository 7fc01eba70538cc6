use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use piggybank::clock::{Clock, ManualClock};
use piggybank::engine::catalog::{
    CHORE_STREAK_3, FIRST_CHORE, LEVEL_5, PERFECT_DAY, SAVER_50,
};
use piggybank::engine::{EngineSettings, NotificationKind, ProgressEvent, ProgressionEngine};
use piggybank::feedback::{Cue, RecordingFeedback};
use piggybank::store::schema::{ACHIEVEMENTS_KEY, USER_STATS_KEY};
use piggybank::store::{JsonFileStore, KeyValueStore, MemoryStore, UserStats};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open(clock: &ManualClock, store: &MemoryStore, feedback: &RecordingFeedback) -> ProgressionEngine {
    ProgressionEngine::open(
        clock.clone(),
        store.clone(),
        feedback.clone(),
        EngineSettings::default(),
    )
}

#[test]
fn fresh_user_first_chore() {
    let clock = ManualClock::at(day(2026, 10, 18), 15);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();
    let mut engine = open(&clock, &store, &feedback);

    assert_eq!(engine.stats(), &UserStats::default());

    let report = engine.complete_chore(5.0);
    assert_eq!(report.stats.total_chores_completed, 1);
    assert_eq!(report.stats.chore_streak, 1);
    assert_eq!(report.stats.xp, 45);
    assert_eq!(report.stats.level, 1);
    assert_eq!(report.stats.xp_to_next_level, 100);

    let unlocked: Vec<&str> = engine.unlocked_achievements().iter().map(|a| a.id()).collect();
    assert_eq!(unlocked, vec![FIRST_CHORE]);

    assert!(matches!(
        report.events.as_slice(),
        [
            ProgressEvent::AchievementUnlocked { id: FIRST_CHORE, .. },
            ProgressEvent::RewardGranted { xp: 25, coins: 5, .. },
            ProgressEvent::XpGained { amount: 20, .. },
        ]
    ));

    let kinds: Vec<NotificationKind> = engine.notifications().iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Xp,
            NotificationKind::Xp,
            NotificationKind::Achievement
        ]
    );
    assert_eq!(feedback.played(), vec![Cue::Coin, Cue::Success, Cue::Achievement]);
}

#[test]
fn week_of_activity_builds_streaks_and_levels() {
    let clock = ManualClock::at(day(2026, 10, 12), 16);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();
    let mut engine = open(&clock, &store, &feedback);

    for _ in 0..7 {
        engine.complete_chore(2.0);
        engine.complete_lesson(1.0);
        engine.tick();
        clock.advance_days(1);
    }
    clock.advance_days(-1);

    let stats = engine.stats();
    assert_eq!(stats.chore_streak, 7);
    assert_eq!(stats.learning_streak, 7);
    assert_eq!(stats.completed_chore_days.len(), 7);
    assert!(stats.level >= 3);
    assert!(stats.xp < stats.xp_to_next_level);
    assert_eq!(stats.xp_to_next_level, stats.level * 100);
    assert!(engine.achievement(CHORE_STREAK_3).unwrap().unlocked);
    assert!(engine.achievement(PERFECT_DAY).unwrap().unlocked);
    assert!(feedback.played().contains(&Cue::LevelUp));
}

#[test]
fn missed_day_resets_streak_on_reopen() {
    let clock = ManualClock::at(day(2026, 10, 1), 10);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();

    let mut engine = open(&clock, &store, &feedback);
    engine.complete_chore(1.0);
    clock.advance_days(1);
    engine.complete_chore(1.0);
    assert_eq!(engine.stats().chore_streak, 2);
    engine.shutdown();

    clock.advance_days(2);
    let engine = open(&clock, &store, &feedback);
    assert_eq!(engine.stats().chore_streak, 0);
    assert_eq!(engine.stats().completed_chore_days.len(), 2);
}

#[test]
fn saving_milestone_reached_through_reward_coins() {
    let clock = ManualClock::at(day(2026, 10, 18), 12);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();
    let mut engine = open(&clock, &store, &feedback);

    // 46 earned + 5 first_chore coins crosses 50
    let report = engine.complete_chore(46.0);
    assert_eq!(report.stats.total_money_earned, 51.0);
    assert!(engine.achievement(SAVER_50).unwrap().unlocked);
}

#[test]
fn level_milestone_from_direct_xp_is_unrewarded() {
    let clock = ManualClock::at(day(2026, 10, 18), 12);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();
    let mut engine = open(&clock, &store, &feedback);

    let report = engine.add_xp(1050, "Birthday Bonus");
    assert_eq!(report.stats.level, 5);
    assert_eq!(report.stats.xp, 50);
    assert_eq!(report.stats.total_money_earned, 0.0);
    assert!(engine.achievement(LEVEL_5).unwrap().unlocked);
    assert_eq!(
        feedback.played(),
        vec![
            Cue::LevelUp,
            Cue::LevelUp,
            Cue::LevelUp,
            Cue::LevelUp,
            Cue::Achievement
        ]
    );
}

#[test]
fn hydrates_legacy_payloads() {
    let clock = ManualClock::at(day(2026, 10, 18), 12);
    let store = MemoryStore::new();
    store
        .set(
            USER_STATS_KEY,
            r#"{"level": 2, "xp": 30, "totalChoresCompleted": 4,
                "completedChoreDays": ["2026-10-17", "2026-10-18", "oops"],
                "completedLearningDays": null}"#,
        )
        .unwrap();
    store
        .set(
            ACHIEVEMENTS_KEY,
            r#"[{"id": "first_chore", "unlocked": true, "currentProgress": 1},
                {"id": "removed_long_ago", "unlocked": true}]"#,
        )
        .unwrap();

    let feedback = RecordingFeedback::new();
    let engine = open(&clock, &store, &feedback);
    let stats = engine.stats();
    assert_eq!(stats.level, 2);
    assert_eq!(stats.xp_to_next_level, 200);
    assert_eq!(stats.chore_streak, 2);
    assert_eq!(
        stats.completed_chore_days,
        BTreeSet::from([day(2026, 10, 17), day(2026, 10, 18)])
    );
    assert!(stats.completed_learning_days.is_empty());
    assert_eq!(engine.unlocked_achievements().len(), 1);
    assert!(engine.achievement("removed_long_ago").is_none());
}

#[test]
fn corrupt_store_falls_back_to_defaults() {
    let clock = ManualClock::at(day(2026, 10, 18), 12);
    let store = MemoryStore::new();
    store.set(USER_STATS_KEY, "{not json").unwrap();
    store.set(ACHIEVEMENTS_KEY, "\"nope\"").unwrap();

    let feedback = RecordingFeedback::new();
    let engine = open(&clock, &store, &feedback);
    assert_eq!(engine.stats(), &UserStats::default());
    assert!(engine.unlocked_achievements().is_empty());
}

#[test]
fn burst_of_actions_coalesces_into_one_write_per_record() {
    let clock = ManualClock::at(day(2026, 10, 18), 12);
    let store = MemoryStore::new();
    let feedback = RecordingFeedback::new();
    let mut engine = open(&clock, &store, &feedback);

    for _ in 0..10 {
        engine.correct_quiz_answer();
        clock.advance_ms(20);
        engine.tick();
    }
    assert_eq!(store.write_count(), 0);

    clock.advance(Duration::milliseconds(100));
    engine.tick();
    let mut log = store.write_log();
    log.sort();
    assert_eq!(log, vec![ACHIEVEMENTS_KEY.to_string(), USER_STATS_KEY.to_string()]);
}

#[test]
fn file_store_round_trip_through_engine() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::at(day(2026, 10, 18), 6);
    let feedback = RecordingFeedback::new();

    let store = JsonFileStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let mut engine = ProgressionEngine::open(
        clock.clone(),
        store,
        feedback.clone(),
        EngineSettings::default(),
    );
    engine.complete_lesson(3.0);
    engine.make_investment();
    engine.shutdown();

    assert!(dir.path().join("userStats.json").exists());
    assert!(dir.path().join("achievements.json").exists());

    let store = JsonFileStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let engine = ProgressionEngine::open(clock.clone(), store, feedback, EngineSettings::default());
    assert_eq!(engine.stats().total_lessons_completed, 1);
    assert_eq!(engine.stats().learning_streak, 1);
    assert_eq!(engine.stats().last_active_date, Some(clock.today()));
    // first_lesson, early_bird, first_investment
    assert_eq!(engine.unlocked_achievements().len(), 3);
}
