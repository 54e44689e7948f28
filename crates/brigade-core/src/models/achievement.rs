use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry in the bounded achievement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Achievement {
    QuestComplete {
        quest_id: String,
        title: String,
        earned_at: DateTime<Utc>,
    },
    RankUp {
        rank: String,
        earned_at: DateTime<Utc>,
    },
    LevelUp {
        rank: String,
        level: u32,
        earned_at: DateTime<Utc>,
    },
}

impl Achievement {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Achievement::QuestComplete { .. } => "quest_complete",
            Achievement::RankUp { .. } => "rank_up",
            Achievement::LevelUp { .. } => "level_up",
        }
    }

    pub fn earned_at(&self) -> DateTime<Utc> {
        match self {
            Achievement::QuestComplete { earned_at, .. }
            | Achievement::RankUp { earned_at, .. }
            | Achievement::LevelUp { earned_at, .. } => *earned_at,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Achievement::QuestComplete { title, .. } => format!("Completed: {}", title),
            Achievement::RankUp { rank, .. } => format!("Advanced to {}", rank),
            Achievement::LevelUp { rank, level, .. } => {
                format!("Reached {} level {}", rank, level)
            }
        }
    }
}
