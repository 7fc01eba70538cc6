//! Progression engine for a kids' financial-literacy app.
//!
//! Tracks XP and levels, chore / learning streaks and a fixed catalog of
//! achievements, and persists that state through a debounced key-value store.

pub mod clock;
pub mod config;
pub mod engine;
pub mod event;
pub mod feedback;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ActionReport, EngineSettings, ProgressEvent, ProgressionEngine};
pub use feedback::{Cue, FeedbackNotifier};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, UserStats};
