//! The quest-completion transaction: validate, credit rewards, mutate the
//! unlock and completion sets, record achievements, persist.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::data::quests::QuestCatalog;
use crate::error::Result;
use crate::models::achievement::Achievement;
use crate::models::attributes::Attribute;
use crate::storage::Storage;
use crate::store::ProfileStore;

/// The result contract handed back to front-ends.
///
/// Validation failures (unknown quest, already completed, not unlocked) come
/// back as `success: false` outcomes; only storage or rank-table faults are
/// `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub success: bool,
    pub message: String,
    /// Hours actually credited per rewarded attribute. Capped or
    /// waiting-rejected grants report the truncated (possibly zero) figure,
    /// matching the profile's field deltas.
    pub rewards: Option<BTreeMap<Attribute, f64>>,
    pub rank_up: bool,
    pub new_rank: Option<String>,
    pub level_up: bool,
    pub new_level: Option<u32>,
}

impl CompletionOutcome {
    fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            rewards: None,
            rank_up: false,
            new_rank: None,
            level_up: false,
            new_level: None,
        }
    }

    fn success(message: String, rewards: BTreeMap<Attribute, f64>) -> Self {
        Self {
            success: true,
            message,
            rewards: Some(rewards),
            rank_up: false,
            new_rank: None,
            level_up: false,
            new_level: None,
        }
    }
}

/// Complete one quest. Replaying the same quest id is harmless: the
/// already-completed check is the sole idempotency guard and no side effect
/// precedes it.
pub fn complete_quest<S: Storage>(
    store: &mut ProfileStore<S>,
    catalog: &QuestCatalog,
    quest_id: &str,
) -> Result<CompletionOutcome> {
    let Some(quest) = catalog.find_by_id(quest_id) else {
        return Ok(CompletionOutcome::failure("Quest not found"));
    };
    if store.profile()?.has_completed(quest_id) {
        return Ok(CompletionOutcome::failure("Quest already completed"));
    }
    if !store.profile()?.has_unlocked(quest_id) {
        return Ok(CompletionOutcome::failure("Quest not unlocked yet"));
    }

    let (previous_rank, previous_level) = {
        let profile = store.profile()?;
        (profile.current_rank.title.clone(), profile.current_rank.level)
    };

    let mut rewards = BTreeMap::new();
    let mut credited_total = 0.0;
    for attribute in Attribute::ALL {
        let Some(&hours) = quest.rewards.get(&attribute) else {
            continue;
        };
        if hours <= 0.0 {
            continue;
        }
        let outcome = store.update_attribute_hours(attribute, hours)?;
        let credited = outcome.credited_hours();
        rewards.insert(attribute, credited);
        credited_total += credited;
    }

    let now = Utc::now();
    {
        let profile = store.profile_mut()?;
        profile.completed_quests.push(quest.id.clone());
        profile.milestones.quests_completed += 1;
        profile.milestones.hours_accumulated += credited_total;
        for id in &quest.unlocks {
            profile.unlock(id);
        }
        profile.push_achievement(Achievement::QuestComplete {
            quest_id: quest.id.clone(),
            title: quest.title.clone(),
            earned_at: now,
        });
    }
    store.save()?;

    let (new_rank, new_level) = {
        let profile = store.profile()?;
        (profile.current_rank.title.clone(), profile.current_rank.level)
    };

    if new_rank != previous_rank {
        {
            let profile = store.profile_mut()?;
            profile.milestones.rank_advances += 1;
            profile.push_achievement(Achievement::RankUp {
                rank: new_rank.clone(),
                earned_at: now,
            });
        }
        store.save()?;
        let mut outcome = CompletionOutcome::success(
            format!("{} complete — you advanced to {}!", quest.title, new_rank),
            rewards,
        );
        outcome.rank_up = true;
        outcome.new_rank = Some(new_rank);
        return Ok(outcome);
    }

    if new_level != previous_level {
        {
            let profile = store.profile_mut()?;
            profile.milestones.level_ups += 1;
            profile.push_achievement(Achievement::LevelUp {
                rank: new_rank.clone(),
                level: new_level,
                earned_at: now,
            });
        }
        store.save()?;
        let mut outcome = CompletionOutcome::success(
            format!("{} complete — level {} reached!", quest.title, new_level),
            rewards,
        );
        outcome.level_up = true;
        outcome.new_level = Some(new_level);
        return Ok(outcome);
    }

    Ok(CompletionOutcome::success(
        format!("{} complete!", quest.title),
        rewards,
    ))
}
