use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::ProgressEvent;
use crate::engine::catalog::{ACHIEVEMENTS, AchievementDefinition, Reward};
use crate::engine::leveling;
use crate::store::schema::{AchievementProgress, UserStats};

pub const FALLBACK_UNLOCK_MESSAGE: &str = "Achievement Unlocked";

/// A catalog entry merged with the user's progress on it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    #[serde(flatten)]
    pub definition: &'static AchievementDefinition,
    pub current_progress: u32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    fn fresh(definition: &'static AchievementDefinition) -> Self {
        Self {
            definition,
            current_progress: 0,
            unlocked: false,
            unlocked_at: None,
        }
    }

    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    pub fn requirement(&self) -> u32 {
        self.definition.requirement
    }

    pub fn to_progress(&self) -> AchievementProgress {
        AchievementProgress {
            id: self.id().to_string(),
            current_progress: self.current_progress,
            unlocked: self.unlocked,
            unlocked_at: self.unlocked_at,
        }
    }
}

/// An achievement that flipped to unlocked during an evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Unlock {
    pub id: &'static str,
    pub title: &'static str,
    pub message: String,
    pub reward: Reward,
    pub unlocked_at: DateTime<Utc>,
}

impl Unlock {
    pub fn event(&self) -> ProgressEvent {
        ProgressEvent::AchievementUnlocked {
            id: self.id,
            title: self.title,
            message: self.message.clone(),
        }
    }
}

/// The fixed catalog plus per-user unlock state, in catalog order.
#[derive(Clone, Debug)]
pub struct AchievementCatalog {
    entries: Vec<Achievement>,
    changed: bool,
}

impl AchievementCatalog {
    pub fn new() -> Self {
        Self {
            entries: ACHIEVEMENTS.iter().map(Achievement::fresh).collect(),
            changed: false,
        }
    }

    /// Merge persisted progress into the static catalog by id.
    ///
    /// Catalog ids with no stored entry start fresh; stored ids that are no
    /// longer in the catalog are dropped.
    pub fn from_persisted(progress: Vec<AchievementProgress>) -> Self {
        let mut stored: HashMap<String, AchievementProgress> =
            progress.into_iter().map(|p| (p.id.clone(), p)).collect();
        let entries = ACHIEVEMENTS
            .iter()
            .map(|def| match stored.remove(def.id) {
                Some(p) => Achievement {
                    definition: def,
                    current_progress: p.current_progress,
                    unlocked: p.unlocked,
                    unlocked_at: p.unlocked_at,
                },
                None => Achievement::fresh(def),
            })
            .collect();
        if !stored.is_empty() {
            debug!(dropped = stored.len(), "ignoring achievements no longer in the catalog");
        }
        Self {
            entries,
            changed: false,
        }
    }

    pub fn to_persisted(&self) -> Vec<AchievementProgress> {
        self.entries.iter().map(Achievement::to_progress).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.entries.iter().find(|a| a.id() == id)
    }

    pub fn all(&self) -> &[Achievement] {
        &self.entries
    }

    pub fn unlocked(&self) -> Vec<&Achievement> {
        self.entries.iter().filter(|a| a.unlocked).collect()
    }

    pub fn locked(&self) -> Vec<&Achievement> {
        self.entries.iter().filter(|a| !a.unlocked).collect()
    }

    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|a| a.unlocked).count()
    }

    /// Record `progress` for `id` and latch it unlocked once the requirement is met.
    ///
    /// No rewards are applied here. Returns the unlock when this call flipped
    /// the latch; already-unlocked and unknown ids are no-ops.
    pub fn evaluate(&mut self, id: &str, progress: u32, now: DateTime<Utc>) -> Option<Unlock> {
        let Some(entry) = self.entries.iter_mut().find(|a| a.id() == id) else {
            debug!(id, "evaluate: unknown achievement id");
            return None;
        };
        if entry.unlocked {
            return None;
        }

        if entry.current_progress != progress {
            entry.current_progress = progress;
            self.changed = true;
        }
        if progress < entry.requirement() {
            return None;
        }

        entry.unlocked = true;
        self.changed = true;
        entry.unlocked_at = Some(now);
        let def = entry.definition;
        let message = if def.celebration.message.is_empty() {
            format!("{FALLBACK_UNLOCK_MESSAGE}: {}", def.title)
        } else {
            def.celebration.message.to_string()
        };
        info!(id = def.id, title = def.title, "achievement unlocked");
        Some(Unlock {
            id: def.id,
            title: def.title,
            message,
            reward: def.reward,
            unlocked_at: now,
        })
    }

    /// Evaluate every id in `ids` against the same progress value.
    pub fn evaluate_all(&mut self, ids: &[&str], progress: u32, now: DateTime<Utc>) -> Vec<Unlock> {
        ids.iter()
            .filter_map(|id| self.evaluate(id, progress, now))
            .collect()
    }

    /// Whether any entry changed since the last call. Resets the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Progress one past the stored value, for achievements that count their own events.
    pub fn next_progress(&self, id: &str) -> u32 {
        self.get(id)
            .map(|a| a.current_progress.saturating_add(1))
            .unwrap_or(1)
    }
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the rewards of `unlocks` to `stats`.
///
/// Coins go to `total_money_earned`; XP is added to both `xp` and `total_xp`
/// and then carried into levels once. Rewards with neither XP nor coins are
/// skipped without an event.
pub fn apply_rewards(stats: &UserStats, unlocks: &[Unlock]) -> (UserStats, Vec<ProgressEvent>) {
    let mut next = stats.clone();
    let mut events = Vec::new();

    for unlock in unlocks {
        let Reward { xp, coins, .. } = unlock.reward;
        if xp == 0 && coins == 0 {
            continue;
        }
        next.xp = next.xp.saturating_add(xp);
        next.total_xp = next.total_xp.saturating_add(u64::from(xp));
        next.total_money_earned += f64::from(coins);
        events.push(ProgressEvent::RewardGranted {
            id: unlock.id,
            xp,
            coins,
        });
    }

    events.extend(
        leveling::carry_levels(&mut next)
            .into_iter()
            .map(|level| ProgressEvent::LevelUp { level }),
    );
    (next, events)
}
