pub mod achievements;
pub mod catalog;
pub mod leveling;
pub mod notifications;
pub mod progression;
pub mod streak;

use serde::Serialize;

pub use achievements::{Achievement, AchievementCatalog, Unlock};
pub use notifications::{Notification, NotificationKind, NotificationQueue};
pub use progression::{ActionReport, EngineSettings, ProgressionEngine, XpTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakKind {
    Chore,
    Learning,
}

/// What a state transition produced, in the order it happened.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProgressEvent {
    XpGained {
        amount: u32,
        source: String,
    },
    LevelUp {
        level: u32,
    },
    AchievementUnlocked {
        id: &'static str,
        title: &'static str,
        message: String,
    },
    RewardGranted {
        id: &'static str,
        xp: u32,
        coins: u32,
    },
    StreakExtended {
        kind: StreakKind,
        days: u32,
    },
}
