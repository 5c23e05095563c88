//! Challenges, leaderboard and rewards. All content is static.

use crate::fallback;
use crate::models::{Challenge, LeaderboardEntry, Reward};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChallengesTab {
    #[default]
    Challenges,
    Leaderboard,
    Rewards,
}

impl ChallengesTab {
    pub const ALL: [Self; 3] = [Self::Challenges, Self::Leaderboard, Self::Rewards];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Challenges => "Challenges",
            Self::Leaderboard => "Leaderboard",
            Self::Rewards => "Rewards",
        }
    }
}

pub const LEADERBOARD_TITLE: &str = "This Week's Top Cleaners";
pub const LEADERBOARD_SUBTITLE: &str = "Resets every Sunday";
pub const REWARDS_TITLE: &str = "Your Badges & Achievements";

#[derive(Debug)]
pub struct ChallengesScreen {
    tab: ChallengesTab,
    challenges: Vec<Challenge>,
    leaderboard: Vec<LeaderboardEntry>,
    rewards: Vec<Reward>,
}

impl ChallengesScreen {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tab: ChallengesTab::Challenges,
            challenges: fallback::challenges(),
            leaderboard: fallback::leaderboard(),
            rewards: fallback::rewards(),
        }
    }

    #[must_use]
    pub fn tab(&self) -> ChallengesTab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: ChallengesTab) {
        self.tab = tab;
    }

    #[must_use]
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    #[must_use]
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    #[must_use]
    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Points from every unlocked reward.
    #[must_use]
    pub fn unlocked_points(&self) -> u32 {
        self.rewards
            .iter()
            .filter(|r| r.unlocked)
            .map(|r| r.points)
            .sum()
    }
}

impl Default for ChallengesScreen {
    fn default() -> Self {
        Self::new()
    }
}
