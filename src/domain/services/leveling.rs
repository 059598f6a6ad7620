//! Level progression
//!
//! Experience is spent level by level: reaching a threshold consumes it and
//! the remainder carries into the next level.

use crate::domain::entities::Player;

/// Decides level thresholds. Injected so content can tune the curve.
pub trait LevelProgression: Send + Sync {
    /// Experience needed to advance from `level` to `level + 1`
    fn xp_required(&self, level: u32) -> i64;

    /// Consume the player's experience into levels. Returns levels gained.
    fn apply(&self, player: &mut Player) -> u32 {
        let mut gained = 0;
        loop {
            let needed = self.xp_required(player.level);
            if needed <= 0 || player.experience < needed {
                break;
            }
            player.experience -= needed;
            player.level += 1;
            gained += 1;
        }
        gained
    }
}

/// `floor(base * level^exponent)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveProgression {
    pub base: f64,
    pub exponent: f64,
}

impl Default for CurveProgression {
    fn default() -> Self {
        Self {
            base: 100.0,
            exponent: 1.5,
        }
    }
}

impl LevelProgression for CurveProgression {
    fn xp_required(&self, level: u32) -> i64 {
        (self.base * f64::from(level).powf(self.exponent)).floor() as i64
    }
}
