use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::engine::achievements::{Achievement, AchievementCatalog, Unlock, apply_rewards};
use crate::engine::catalog::{
    CHORE_COUNT_MILESTONES, CHORE_STREAK_MILESTONES, EARLY_BIRD, FIRST_INVESTMENT, INVESTOR_10,
    LEARNING_STREAK_MILESTONES, LESSON_COUNT_MILESTONES, LEVEL_MILESTONES, MARKET_MASTER,
    NIGHT_OWL, PERFECT_DAY, PROFITABLE_TRADE, QUIZ_CHAMPION, SATOSHI_SCHOLAR, SAVING_MILESTONES,
};
use crate::engine::leveling;
use crate::engine::notifications::{
    DEFAULT_CAPACITY, DEFAULT_TTL_MS, Notification, NotificationKind, NotificationQueue,
};
use crate::engine::streak::calculate_streak;
use crate::engine::{ProgressEvent, StreakKind};
use crate::feedback::{Cue, FeedbackNotifier};
use crate::store::kv::KeyValueStore;
use crate::store::schema::{
    ACHIEVEMENTS_KEY, AchievementsData, USER_STATS_KEY, UserStats, migrate_achievements,
};
use crate::store::write_coalescer::{Record, WriteCoalescer};

pub const EARLY_BIRD_BEFORE_HOUR: u32 = 8;
pub const NIGHT_OWL_FROM_HOUR: u32 = 20;
pub const DEFAULT_WRITE_DEBOUNCE_MS: i64 = 100;

// --- XP Table ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XpTable {
    #[serde(default = "default_chore_xp")]
    pub chore: u32,
    #[serde(default = "default_lesson_xp")]
    pub lesson: u32,
    #[serde(default = "default_investment_xp")]
    pub investment: u32,
    #[serde(default = "default_profitable_trade_xp")]
    pub profitable_trade: u32,
    #[serde(default = "default_quiz_answer_xp")]
    pub quiz_answer: u32,
}

fn default_chore_xp() -> u32 {
    20
}
fn default_lesson_xp() -> u32 {
    30
}
fn default_investment_xp() -> u32 {
    15
}
fn default_profitable_trade_xp() -> u32 {
    25
}
fn default_quiz_answer_xp() -> u32 {
    10
}

impl Default for XpTable {
    fn default() -> Self {
        Self {
            chore: default_chore_xp(),
            lesson: default_lesson_xp(),
            investment: default_investment_xp(),
            profitable_trade: default_profitable_trade_xp(),
            quiz_answer: default_quiz_answer_xp(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub write_debounce: Duration,
    pub notification_ttl: Duration,
    pub notification_capacity: usize,
    pub xp: XpTable,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            write_debounce: Duration::milliseconds(DEFAULT_WRITE_DEBOUNCE_MS),
            notification_ttl: Duration::milliseconds(DEFAULT_TTL_MS),
            notification_capacity: DEFAULT_CAPACITY,
            xp: XpTable::default(),
        }
    }
}

/// Snapshot handed back to the caller after every action.
#[derive(Clone, Debug, Serialize)]
pub struct ActionReport {
    pub stats: UserStats,
    pub events: Vec<ProgressEvent>,
}

// --- Engine ---

/// Owns one user's progression state and serializes every mutation through `&mut self`.
///
/// Writes are coalesced: actions only mark records dirty, `tick` persists the
/// ones whose debounce window has elapsed, and `flush`/`shutdown`/drop persist
/// whatever is still pending.
pub struct ProgressionEngine {
    clock: Box<dyn Clock>,
    store: Box<dyn KeyValueStore>,
    feedback: Box<dyn FeedbackNotifier>,
    settings: EngineSettings,
    stats: UserStats,
    achievements: AchievementCatalog,
    notifications: NotificationQueue,
    writer: WriteCoalescer,
}

impl ProgressionEngine {
    /// Build an engine and hydrate it from `store`. Never fails: unreadable or
    /// malformed records fall back to fresh state.
    pub fn open(
        clock: impl Clock + 'static,
        store: impl KeyValueStore + 'static,
        feedback: impl FeedbackNotifier + 'static,
        settings: EngineSettings,
    ) -> Self {
        let today = clock.today();

        let stats = match store.get(USER_STATS_KEY) {
            Ok(Some(raw)) => UserStats::hydrate(&raw, today),
            Ok(None) => UserStats::default(),
            Err(e) => {
                warn!("could not read {USER_STATS_KEY}: {e}");
                UserStats::default()
            }
        };
        let achievements = match store.get(ACHIEVEMENTS_KEY) {
            Ok(Some(raw)) => AchievementCatalog::from_persisted(migrate_achievements(&raw)),
            Ok(None) => AchievementCatalog::new(),
            Err(e) => {
                warn!("could not read {ACHIEVEMENTS_KEY}: {e}");
                AchievementCatalog::new()
            }
        };
        debug!(
            level = stats.level,
            unlocked = achievements.unlocked_count(),
            "progression state hydrated"
        );

        Self {
            notifications: NotificationQueue::new(
                settings.notification_capacity,
                settings.notification_ttl,
            ),
            writer: WriteCoalescer::new(settings.write_debounce),
            clock: Box::new(clock),
            store: Box::new(store),
            feedback: Box::new(feedback),
            settings,
            stats,
            achievements,
        }
    }

    // --- Queries ---

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        self.achievements.all()
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.get(id)
    }

    pub fn unlocked_achievements(&self) -> Vec<&Achievement> {
        self.achievements.unlocked()
    }

    pub fn locked_achievements(&self) -> Vec<&Achievement> {
        self.achievements.locked()
    }

    /// Notifications pushed less than the TTL ago, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.recent(self.clock.now())
    }

    // --- Actions ---

    pub fn complete_chore(&mut self, reward: f64) -> ActionReport {
        debug!(reward, "complete chore");
        self.feedback.play(Cue::Coin);
        self.feedback.play(Cue::Success);

        let today = self.clock.today();
        let now = self.now_utc();
        let mut stats = self.stats.clone();
        let mut events = Vec::new();

        let newly_marked = stats.completed_chore_days.insert(today);
        stats.recompute_streaks(today);
        stats.total_chores_completed = stats.total_chores_completed.saturating_add(1);
        stats.total_money_earned += coalesce_amount(reward);
        stats.last_active_date = Some(today);
        if newly_marked && stats.chore_streak >= 2 {
            events.push(ProgressEvent::StreakExtended {
                kind: StreakKind::Chore,
                days: stats.chore_streak,
            });
        }

        let mut unlocks = Vec::new();
        unlocks.extend(self.achievements.evaluate_all(
            CHORE_COUNT_MILESTONES,
            stats.total_chores_completed,
            now,
        ));
        unlocks.extend(
            self.achievements
                .evaluate_all(CHORE_STREAK_MILESTONES, stats.chore_streak, now),
        );
        unlocks.extend(self.time_of_day_unlocks(now));
        unlocks.extend(
            self.achievements
                .evaluate_all(SAVING_MILESTONES, money_progress(&stats), now),
        );

        let xp = self.settings.xp.chore;
        self.settle(stats, events, unlocks, Some(xp), "Chore Complete")
    }

    pub fn complete_lesson(&mut self, earnings: f64) -> ActionReport {
        debug!(earnings, "complete lesson");
        self.feedback.play(Cue::Success);

        let today = self.clock.today();
        let now = self.now_utc();
        let mut stats = self.stats.clone();
        let mut events = Vec::new();

        let newly_marked = stats.completed_learning_days.insert(today);
        stats.recompute_streaks(today);
        stats.total_lessons_completed = stats.total_lessons_completed.saturating_add(1);
        stats.total_money_earned += coalesce_amount(earnings);
        stats.last_active_date = Some(today);
        if newly_marked && stats.learning_streak >= 2 {
            events.push(ProgressEvent::StreakExtended {
                kind: StreakKind::Learning,
                days: stats.learning_streak,
            });
        }

        let mut unlocks = Vec::new();
        unlocks.extend(self.achievements.evaluate_all(
            LESSON_COUNT_MILESTONES,
            stats.total_lessons_completed,
            now,
        ));
        unlocks.extend(self.achievements.evaluate_all(
            LEARNING_STREAK_MILESTONES,
            stats.learning_streak,
            now,
        ));
        if stats.chore_streak > 0 && stats.learning_streak > 0 {
            unlocks.extend(self.achievements.evaluate(PERFECT_DAY, 1, now));
        }
        unlocks.extend(self.time_of_day_unlocks(now));
        unlocks.extend(
            self.achievements
                .evaluate_all(SAVING_MILESTONES, money_progress(&stats), now),
        );

        let xp = self.settings.xp.lesson;
        self.settle(stats, events, unlocks, Some(xp), "Lesson Complete")
    }

    /// Remove today from the chore days. Counters, money and XP already
    /// granted are left as they are.
    pub fn uncomplete_chore(&mut self) -> ActionReport {
        let today = self.clock.today();
        if self.stats.completed_chore_days.remove(&today) {
            self.stats.chore_streak = calculate_streak(&self.stats.completed_chore_days, today);
            self.mark_dirty(&[Record::UserStats]);
        }
        debug!(streak = self.stats.chore_streak, "uncomplete chore");
        self.report(Vec::new())
    }

    /// Remove today from the learning days. Counters, money and XP already
    /// granted are left as they are.
    pub fn uncomplete_lesson(&mut self) -> ActionReport {
        let today = self.clock.today();
        if self.stats.completed_learning_days.remove(&today) {
            self.stats.learning_streak =
                calculate_streak(&self.stats.completed_learning_days, today);
            self.mark_dirty(&[Record::UserStats]);
        }
        debug!(streak = self.stats.learning_streak, "uncomplete lesson");
        self.report(Vec::new())
    }

    pub fn make_investment(&mut self) -> ActionReport {
        let unlocks = self.count_event(&[FIRST_INVESTMENT, INVESTOR_10]);
        let xp = self.settings.xp.investment;
        self.settle(self.stats.clone(), Vec::new(), unlocks, Some(xp), "Investment Made")
    }

    pub fn profitable_trade(&mut self) -> ActionReport {
        let unlocks = self.count_event(&[PROFITABLE_TRADE, MARKET_MASTER]);
        let xp = self.settings.xp.profitable_trade;
        self.settle(self.stats.clone(), Vec::new(), unlocks, Some(xp), "Profitable Trade")
    }

    pub fn correct_quiz_answer(&mut self) -> ActionReport {
        let unlocks = self.count_event(&[SATOSHI_SCHOLAR, QUIZ_CHAMPION]);
        let xp = self.settings.xp.quiz_answer;
        self.settle(self.stats.clone(), Vec::new(), unlocks, Some(xp), "Correct Answer")
    }

    pub fn add_xp(&mut self, amount: u32, source: &str) -> ActionReport {
        self.settle(self.stats.clone(), Vec::new(), Vec::new(), Some(amount), source)
    }

    /// Record progress on `id` and, if that unlocks it, grant its reward.
    pub fn check_achievement(&mut self, id: &str, progress: u32) -> ActionReport {
        let now = self.now_utc();
        let unlocks: Vec<Unlock> = self.achievements.evaluate(id, progress, now).into_iter().collect();
        self.settle(self.stats.clone(), Vec::new(), unlocks, None, "")
    }

    /// Record progress on `id` without granting any reward, even on unlock.
    pub fn record_progress(&mut self, id: &str, progress: u32) -> ActionReport {
        let now = self.now_utc();
        let events: Vec<ProgressEvent> = self
            .achievements
            .evaluate(id, progress, now)
            .iter()
            .map(Unlock::event)
            .collect();
        self.publish(&events);
        if self.achievements.take_changed() {
            self.mark_dirty(&[Record::Achievements]);
        }
        self.report(events)
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    // --- Timers / teardown ---

    /// Expire notifications and persist records whose debounce window elapsed.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let expired = self.notifications.expire(now);
        if expired > 0 {
            debug!(expired, "notifications expired");
        }
        for record in self.writer.take_due(now) {
            self.write(record);
        }
    }

    /// Persist every pending record immediately.
    pub fn flush(&mut self) {
        for record in self.writer.take_all() {
            self.write(record);
        }
    }

    /// Flush pending writes and drop all notifications. Consumes the engine so
    /// nothing can be scheduled against torn-down state.
    pub fn shutdown(mut self) {
        self.flush();
        self.notifications.clear();
    }

    // --- Internals ---

    fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    fn time_of_day_unlocks(&mut self, now: DateTime<Utc>) -> Vec<Unlock> {
        let hour = self.clock.now().hour();
        let id = if hour < EARLY_BIRD_BEFORE_HOUR {
            EARLY_BIRD
        } else if hour >= NIGHT_OWL_FROM_HOUR {
            NIGHT_OWL
        } else {
            return Vec::new();
        };
        self.achievements.evaluate(id, 1, now).into_iter().collect()
    }

    /// Advance achievements that keep their own event counter.
    fn count_event(&mut self, ids: &[&str]) -> Vec<Unlock> {
        let now = self.now_utc();
        let mut unlocks = Vec::new();
        for id in ids {
            let progress = self.achievements.next_progress(id);
            unlocks.extend(self.achievements.evaluate(id, progress, now));
        }
        unlocks
    }

    /// Finish a transaction on `stats`: grant rewards for `unlocks` exactly
    /// once, add the base XP, then latch level milestones without rewarding
    /// them. Only records that actually changed are scheduled for a write.
    fn settle(
        &mut self,
        mut stats: UserStats,
        mut events: Vec<ProgressEvent>,
        mut unlocks: Vec<Unlock>,
        base_xp: Option<u32>,
        source: &str,
    ) -> ActionReport {
        let now = self.now_utc();

        // Reward coins can cross a saving milestone; the latch bounds this loop.
        while !unlocks.is_empty() {
            events.extend(unlocks.iter().map(Unlock::event));
            let (next, reward_events) = apply_rewards(&stats, &unlocks);
            stats = next;
            events.extend(reward_events);
            unlocks = self
                .achievements
                .evaluate_all(SAVING_MILESTONES, money_progress(&stats), now);
        }

        if let Some(amount) = base_xp {
            let (next, xp_events) = leveling::add_xp(&stats, amount, source);
            stats = next;
            events.extend(xp_events);
        }

        let level_unlocks = self
            .achievements
            .evaluate_all(LEVEL_MILESTONES, stats.level, now);
        events.extend(level_unlocks.iter().map(Unlock::event));

        if stats.level > self.stats.level {
            info!(from = self.stats.level, to = stats.level, "level up");
        }
        let stats_changed = stats != self.stats;
        self.stats = stats;
        self.publish(&events);
        if stats_changed {
            self.mark_dirty(&[Record::UserStats]);
        }
        if self.achievements.take_changed() {
            self.mark_dirty(&[Record::Achievements]);
        }
        self.report(events)
    }

    /// Turn events into notifications and feedback cues, in order.
    fn publish(&mut self, events: &[ProgressEvent]) {
        let now = self.clock.now();
        for event in events {
            let (message, kind) = match event {
                ProgressEvent::XpGained { amount, source } => {
                    (format!("+{amount} XP - {source}"), NotificationKind::Xp)
                }
                ProgressEvent::LevelUp { level } => {
                    self.feedback.play(Cue::LevelUp);
                    (
                        format!("Level Up! You reached level {level}!"),
                        NotificationKind::Level,
                    )
                }
                ProgressEvent::AchievementUnlocked { message, .. } => {
                    self.feedback.play(Cue::Achievement);
                    (message.clone(), NotificationKind::Achievement)
                }
                ProgressEvent::RewardGranted { xp, coins, .. } => {
                    (reward_message(*xp, *coins), NotificationKind::Xp)
                }
                ProgressEvent::StreakExtended { kind, days } => {
                    let what = match kind {
                        StreakKind::Chore => "chore",
                        StreakKind::Learning => "learning",
                    };
                    (
                        format!("{days}-day {what} streak! Keep it up!"),
                        NotificationKind::Streak,
                    )
                }
            };
            self.notifications.push(message, kind, now);
        }
    }

    fn mark_dirty(&mut self, records: &[Record]) {
        let now = self.clock.now();
        for &record in records {
            self.writer.mark_dirty(record, now);
        }
    }

    /// Persist one record. Failures are logged and dropped; there is no retry.
    fn write(&mut self, record: Record) {
        let payload = match record {
            Record::UserStats => self.stats.to_json(),
            Record::Achievements => {
                serde_json::to_string(&AchievementsData::new(self.achievements.to_persisted()))
            }
        };
        let result = match payload {
            Ok(json) => self.store.set(record.key(), &json).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => debug!(key = record.key(), "record persisted"),
            Err(e) => warn!(key = record.key(), "persisting record failed: {e}"),
        }
    }

    fn report(&self, events: Vec<ProgressEvent>) -> ActionReport {
        ActionReport {
            stats: self.stats.clone(),
            events,
        }
    }
}

impl Drop for ProgressionEngine {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Absent or non-finite amounts count as zero.
fn coalesce_amount(amount: f64) -> f64 {
    if amount.is_finite() { amount } else { 0.0 }
}

fn money_progress(stats: &UserStats) -> u32 {
    stats.total_money_earned.max(0.0).floor() as u32
}

fn reward_message(xp: u32, coins: u32) -> String {
    match (xp, coins) {
        (0, c) => format!("Reward: +{c} coins"),
        (x, 0) => format!("Reward: +{x} XP"),
        (x, c) => format!("Reward: +{x} XP, +{c} coins"),
    }
}
