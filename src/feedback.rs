//! Sound / haptic cues fired by the engine.
//!
//! The engine only decides *which* cue plays and when; playback belongs to
//! whatever implements [`FeedbackNotifier`].

use std::sync::{Arc, Mutex};

use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Chore reward granted.
    Coin,
    /// Chore or lesson completed.
    Success,
    /// Level transition.
    LevelUp,
    /// Achievement unlocked.
    Achievement,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Coin => "playCoin",
            Cue::Success => "playSuccess",
            Cue::LevelUp => "playLevelUp",
            Cue::Achievement => "playAchievement",
        }
    }
}

pub trait FeedbackNotifier: Send {
    fn play(&self, cue: Cue);
}

/// Discards every cue.
pub struct SilentFeedback;

impl FeedbackNotifier for SilentFeedback {
    fn play(&self, _cue: Cue) {}
}

/// Logs cues instead of playing them; used by the CLI.
pub struct LogFeedback;

impl FeedbackNotifier for LogFeedback {
    fn play(&self, cue: Cue) {
        debug!(cue = cue.as_str(), "feedback");
    }
}

/// Records cues in order. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingFeedback {
    played: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut played) = self.played.lock() {
            played.clear();
        }
    }
}

impl FeedbackNotifier for RecordingFeedback {
    fn play(&self, cue: Cue) {
        if let Ok(mut played) = self.played.lock() {
            played.push(cue);
        }
    }
}
