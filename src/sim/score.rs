//! Score and kill-chain tracking read by the HUD

use serde::{Deserialize, Serialize};

/// Player score state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub points: u64,
    /// Kills since the player last took damage
    pub kill_chain: u32,
    pub best_chain: u32,
    pub kills: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a kill worth `value` points
    pub fn record_kill(&mut self, value: u64) {
        self.points += value;
        self.kills += 1;
        self.kill_chain += 1;
        self.best_chain = self.best_chain.max(self.kill_chain);
    }

    pub fn add_bonus(&mut self, points: u64) {
        self.points += points;
    }

    /// Player got hit: the chain is broken
    pub fn break_chain(&mut self) {
        if self.kill_chain > 0 {
            log::debug!("kill chain of {} broken", self.kill_chain);
        }
        self.kill_chain = 0;
    }
}
