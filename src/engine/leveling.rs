use crate::engine::ProgressEvent;
use crate::store::schema::UserStats;

/// XP needed to go from `level` to `level + 1`.
pub fn xp_to_next(level: u32) -> u32 {
    level.max(1).saturating_mul(100)
}

/// Add `amount` XP to `stats`, carrying overflow into as many levels as it covers.
///
/// Emits one `LevelUp` per level crossed, or a single `XpGained` when the level
/// is unchanged. `total_xp` always grows by exactly `amount`.
pub fn add_xp(stats: &UserStats, amount: u32, source: &str) -> (UserStats, Vec<ProgressEvent>) {
    let mut next = stats.clone();
    next.total_xp = next.total_xp.saturating_add(u64::from(amount));
    next.xp = next.xp.saturating_add(amount);

    let levels = carry_levels(&mut next);
    let events = if levels.is_empty() {
        vec![ProgressEvent::XpGained {
            amount,
            source: source.to_string(),
        }]
    } else {
        levels
            .into_iter()
            .map(|level| ProgressEvent::LevelUp { level })
            .collect()
    };
    (next, events)
}

/// Promote while `xp` covers the current threshold. Returns each level reached.
pub fn carry_levels(stats: &mut UserStats) -> Vec<u32> {
    stats.level = stats.level.max(1);
    stats.xp_to_next_level = xp_to_next(stats.level);

    let mut reached = Vec::new();
    while stats.level < u32::MAX && stats.xp >= stats.xp_to_next_level {
        stats.xp -= stats.xp_to_next_level;
        stats.level += 1;
        stats.xp_to_next_level = xp_to_next(stats.level);
        reached.push(stats.level);
    }
    // Top level: keep xp below the (saturated) threshold.
    if stats.xp >= stats.xp_to_next_level {
        stats.xp = stats.xp_to_next_level.saturating_sub(1);
    }
    reached
}

/// Fraction of the way to the next level (0.0 - 1.0).
pub fn progress_to_next(stats: &UserStats) -> f64 {
    if stats.xp_to_next_level == 0 {
        return 1.0;
    }
    (stats.xp as f64 / stats.xp_to_next_level as f64).clamp(0.0, 1.0)
}
