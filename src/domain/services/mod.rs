//! Domain services - Stateless rules shared by the application services

pub mod capture_system;
pub mod daily_streak;
mod leveling;

pub use capture_system::{CaptureChance, CapturePreview, PendingCapture};
pub use daily_streak::{DailyPayout, StreakDecision};
pub use leveling::{CurveProgression, LevelProgression};
