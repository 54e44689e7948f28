use serde::{Deserialize, Serialize};

use crate::data::quests::STARTER_QUESTS;
use crate::data::ranks::RankTable;
use crate::models::achievement::Achievement;
use crate::models::attributes::AttributeSet;

/// The achievement log keeps only the newest entries.
pub const MAX_RECENT_ACHIEVEMENTS: usize = 10;

/// The user's overall rank standing, derived from the weakest attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankStanding {
    pub title: String,
    pub color_tier: String,
    pub level: u32,
    pub progress: f64,
}

/// Monotonic lifetime counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    pub quests_completed: u64,
    pub hours_accumulated: f64,
    pub rank_advances: u64,
    pub level_ups: u64,
}

/// The root mutable aggregate. One per installation, owned by ProfileStore.
///
/// `milestones` and `recent_achievements` default when absent so profiles
/// persisted by older versions still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub current_rank: RankStanding,
    pub attributes: AttributeSet,
    /// Insertion order preserved for achievement history.
    pub completed_quests: Vec<String>,
    pub unlocked_quests: Vec<String>,
    #[serde(default)]
    pub milestones: Milestones,
    /// Newest first, at most MAX_RECENT_ACHIEVEMENTS entries.
    #[serde(default)]
    pub recent_achievements: Vec<Achievement>,
}

impl UserProfile {
    /// Fresh default profile: first rank, level 1, all attributes at zero
    /// hours, starter quests unlocked.
    pub fn seed(table: &RankTable) -> Self {
        let first = table.first();
        Self {
            current_rank: RankStanding {
                title: first.title.clone(),
                color_tier: first.color_tier.clone(),
                level: 1,
                progress: 0.0,
            },
            attributes: AttributeSet::new(first),
            completed_quests: Vec::new(),
            unlocked_quests: STARTER_QUESTS.iter().map(|s| s.to_string()).collect(),
            milestones: Milestones::default(),
            recent_achievements: Vec::new(),
        }
    }

    pub fn has_completed(&self, quest_id: &str) -> bool {
        self.completed_quests.iter().any(|q| q == quest_id)
    }

    pub fn has_unlocked(&self, quest_id: &str) -> bool {
        self.unlocked_quests.iter().any(|q| q == quest_id)
    }

    /// Add a quest id to the unlocked set. Returns false if already present.
    pub fn unlock(&mut self, quest_id: &str) -> bool {
        if self.has_unlocked(quest_id) {
            return false;
        }
        self.unlocked_quests.push(quest_id.to_string());
        true
    }

    /// Prepend an achievement and truncate the log to its bound.
    pub fn push_achievement(&mut self, achievement: Achievement) {
        self.recent_achievements.insert(0, achievement);
        self.recent_achievements.truncate(MAX_RECENT_ACHIEVEMENTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seeded() -> UserProfile {
        UserProfile::seed(&RankTable::bundled().unwrap())
    }

    #[test]
    fn test_seed_defaults() {
        let profile = seeded();
        assert_eq!(profile.current_rank.title, "Home Cook");
        assert_eq!(profile.current_rank.level, 1);
        assert_eq!(profile.current_rank.progress, 0.0);
        assert_eq!(profile.attributes.technique.total_hours, 0.0);
        assert!(profile.completed_quests.is_empty());
        assert_eq!(profile.unlocked_quests.len(), STARTER_QUESTS.len());
        assert_eq!(profile.milestones.quests_completed, 0);
    }

    #[test]
    fn test_unlock_dedupes() {
        let mut profile = seeded();
        assert!(profile.unlock("stockpot-rotation"));
        assert!(!profile.unlock("stockpot-rotation"));
        let count = profile
            .unlocked_quests
            .iter()
            .filter(|q| *q == "stockpot-rotation")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_achievement_log_bounded_newest_first() {
        let mut profile = seeded();
        for i in 0..15 {
            profile.push_achievement(Achievement::QuestComplete {
                quest_id: format!("q{}", i),
                title: format!("Quest {}", i),
                earned_at: Utc::now(),
            });
        }
        assert_eq!(profile.recent_achievements.len(), MAX_RECENT_ACHIEVEMENTS);
        match &profile.recent_achievements[0] {
            Achievement::QuestComplete { quest_id, .. } => assert_eq!(quest_id, "q14"),
            other => panic!("unexpected head: {:?}", other),
        }
    }

    #[test]
    fn test_legacy_shape_backfills() {
        // Older persisted profiles predate milestones and recent_achievements.
        let mut profile = seeded();
        profile.milestones.quests_completed = 7;
        let mut value = serde_json::to_value(&profile).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("milestones");
        obj.remove("recent_achievements");

        let back: UserProfile = serde_json::from_value(value).unwrap();
        assert_eq!(back.milestones, Milestones::default());
        assert!(back.recent_achievements.is_empty());
        assert_eq!(back.current_rank.title, "Home Cook");
    }
}
