//! The progression engine: pure functions mapping accumulated practice hours
//! to levels, ranks, and overall standing.

use serde::Serialize;

use crate::data::ranks::RankTable;
use crate::error::Result;
use crate::models::attributes::Attribute;
use crate::models::profile::UserProfile;

/// Computed level state for one attribute within one rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeLevelResult {
    pub level: u32,
    pub level_progress: f64,
    pub rank_progress: f64,
    /// Absolute hour threshold at which the next level triggers.
    pub hours_to_next_level: f64,
    pub is_maxed: bool,
    pub waiting_for_rank_up: bool,
}

/// Outcome of an hour grant. Callers must read field deltas off the profile;
/// the Display text is for humans only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HoursOutcome {
    /// The attribute is ranked ahead of the user and frozen; nothing was
    /// added. Hours earned while waiting are dropped, not banked.
    RejectedWaiting,
    /// Total hours were already at the user-rank ceiling; the attribute was
    /// relabeled to the next rank and is now waiting.
    Promoted { rank: String },
    /// Ceiling reached at the terminal rank; nothing to add.
    AtMaxRank,
    /// Hours were added, truncated to the remaining rank capacity.
    Credited { requested: f64, credited: f64 },
}

impl HoursOutcome {
    /// Hours actually applied to the attribute by this call.
    pub fn credited_hours(&self) -> f64 {
        match self {
            HoursOutcome::Credited { credited, .. } => *credited,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for HoursOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoursOutcome::RejectedWaiting => {
                write!(f, "No hours added: attribute is waiting for your rank to catch up")
            }
            HoursOutcome::Promoted { rank } => {
                write!(f, "Attribute promoted to {}; waiting for your rank to catch up", rank)
            }
            HoursOutcome::AtMaxRank => {
                write!(f, "Already at the top of the final rank; no hours added")
            }
            HoursOutcome::Credited { requested, credited } => {
                if credited < requested {
                    write!(f, "Added {:.1} hours (capped from {:.1})", credited, requested)
                } else {
                    write!(f, "Added {:.1} hours", credited)
                }
            }
        }
    }
}

fn clamp_pct(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Compute an attribute's level state from its accumulated hours and the
/// user's current rank. Pure; safe to call repeatedly.
///
/// When the attribute ranks ahead of the user it is frozen at level 1 / 0%
/// and `total_hours` is not consulted at all.
pub fn calculate_attribute_level(
    table: &RankTable,
    attribute_rank: &str,
    user_rank: &str,
    total_hours: f64,
) -> Result<AttributeLevelResult> {
    let rank = table.rank(attribute_rank)?;
    let previous = table.total_hours_before(attribute_rank)?;

    if table.is_higher(attribute_rank, user_rank)? {
        return Ok(AttributeLevelResult {
            level: 1,
            level_progress: 0.0,
            rank_progress: 0.0,
            hours_to_next_level: previous + rank.first_level_cost(),
            is_maxed: false,
            waiting_for_rank_up: true,
        });
    }

    let required = rank.hours_required();
    // Hours past the rank requirement stay in total_hours but never advance
    // this rank's display.
    let hours_in_rank = (total_hours - previous).clamp(0.0, required);

    if hours_in_rank >= required {
        if let Some(next) = table.next_rank(attribute_rank)? {
            // Rank cleared: the caller relabels current_rank to `next`.
            return Ok(AttributeLevelResult {
                level: 1,
                level_progress: 100.0,
                rank_progress: 100.0,
                hours_to_next_level: previous + required + next.first_level_cost(),
                is_maxed: true,
                waiting_for_rank_up: false,
            });
        }
        // Terminal rank fully cleared.
        return Ok(AttributeLevelResult {
            level: rank.level_count() as u32,
            level_progress: 100.0,
            rank_progress: 100.0,
            hours_to_next_level: previous + required,
            is_maxed: true,
            waiting_for_rank_up: false,
        });
    }

    let rank_progress = if required <= 0.0 {
        100.0
    } else {
        clamp_pct(hours_in_rank / required * 100.0)
    };

    let mut cumulative = 0.0;
    for (i, &cost) in rank.level_hours.iter().enumerate() {
        let level_start = cumulative;
        cumulative += cost;
        if hours_in_rank < cumulative {
            let level_progress = if cost <= 0.0 {
                100.0
            } else {
                clamp_pct((hours_in_rank - level_start) / cost * 100.0)
            };
            return Ok(AttributeLevelResult {
                level: (i + 1) as u32,
                level_progress,
                rank_progress,
                hours_to_next_level: previous + cumulative,
                is_maxed: false,
                waiting_for_rank_up: false,
            });
        }
    }

    // Only reachable with zero-cost levels at the tail of the rank.
    Ok(AttributeLevelResult {
        level: rank.level_count() as u32,
        level_progress: 100.0,
        rank_progress,
        hours_to_next_level: previous + required,
        is_maxed: hours_in_rank >= required,
        waiting_for_rank_up: false,
    })
}

/// Refresh every attribute against the profile's current rank, relabeling
/// maxed attributes upward until they freeze at user-rank + 1.
fn refresh_attributes(table: &RankTable, profile: &mut UserProfile) -> Result<()> {
    let user_rank = profile.current_rank.title.clone();
    for attribute in Attribute::ALL {
        let progress = profile.attributes.get_mut(attribute);
        loop {
            let result = calculate_attribute_level(
                table,
                &progress.current_rank,
                &user_rank,
                progress.total_hours,
            )?;
            progress.current_level = result.level;
            progress.level_progress = result.level_progress;
            progress.rank_progress = result.rank_progress;
            progress.hours_to_next_level = result.hours_to_next_level;
            progress.is_maxed = result.is_maxed;
            progress.waiting_for_rank_up = result.waiting_for_rank_up;

            if result.is_maxed {
                if let Some(next) = table.next_rank(&progress.current_rank)? {
                    progress.current_rank = next.title.clone();
                    continue;
                }
            }
            break;
        }
    }
    Ok(())
}

/// Recompute the profile's overall standing from its four attributes,
/// advancing the user's rank when every attribute has cleared it.
///
/// Idempotent: calling twice with no intervening hour changes leaves the
/// profile unchanged the second time. Profiles mutated only through
/// `update_attribute_hours` advance at most one rank here; profiles loaded
/// with hours far past their recorded rank keep advancing until the
/// attributes stop reading cleared, so normalization settles in one call.
pub fn calculate_user_rank(table: &RankTable, profile: &mut UserProfile) -> Result<()> {
    refresh_attributes(table, profile)?;

    loop {
        // Eligible when every attribute has cleared the current rank;
        // attributes already promoted ahead satisfy this automatically.
        let mut eligible = true;
        for attribute in Attribute::ALL {
            let progress = profile.attributes.get(attribute);
            let ahead = table.is_higher(&progress.current_rank, &profile.current_rank.title)?;
            if !ahead && progress.rank_progress < 100.0 {
                eligible = false;
                break;
            }
        }
        if !eligible {
            break;
        }
        let Some(next) = table.next_rank(&profile.current_rank.title)? else {
            break;
        };
        profile.current_rank.title = next.title.clone();
        profile.current_rank.color_tier = next.color_tier.clone();
        // Attributes that were waiting for this rank thaw here.
        refresh_attributes(table, profile)?;
    }

    // The weakest attribute gates the visible level.
    let mut min_level: Option<u32> = None;
    for attribute in Attribute::ALL {
        let progress = profile.attributes.get(attribute);
        if progress.current_rank == profile.current_rank.title && !progress.waiting_for_rank_up {
            min_level = Some(match min_level {
                Some(level) => level.min(progress.current_level),
                None => progress.current_level,
            });
        }
    }
    profile.current_rank.level = min_level.unwrap_or(1);

    // Each attribute is worth exactly one quarter of overall rank progress;
    // attributes promoted past the current rank contribute their full share.
    let mut overall = 0.0;
    for attribute in Attribute::ALL {
        let progress = profile.attributes.get(attribute);
        let share = if table.is_higher(&progress.current_rank, &profile.current_rank.title)? {
            100.0
        } else {
            progress.rank_progress
        };
        overall += share * 0.25;
    }
    profile.current_rank.progress = overall.min(100.0);

    Ok(())
}

/// Grant practice hours to one attribute, capped at the user-rank ceiling,
/// then recompute the profile's standing.
pub fn update_attribute_hours(
    table: &RankTable,
    profile: &mut UserProfile,
    attribute: Attribute,
    hours: f64,
) -> Result<HoursOutcome> {
    let user_rank = profile.current_rank.title.clone();

    if table.is_higher(&profile.attributes.get(attribute).current_rank, &user_rank)? {
        return Ok(HoursOutcome::RejectedWaiting);
    }

    let rank = table.rank(&user_rank)?;
    let ceiling = table.total_hours_before(&user_rank)? + rank.hours_required();
    let current = profile.attributes.get(attribute).total_hours;

    if current >= ceiling {
        return match table.next_rank(&user_rank)? {
            Some(next) => {
                let next_title = next.title.clone();
                let progress = profile.attributes.get_mut(attribute);
                if progress.current_rank == user_rank {
                    progress.current_rank = next_title.clone();
                    progress.waiting_for_rank_up = true;
                }
                calculate_user_rank(table, profile)?;
                Ok(HoursOutcome::Promoted { rank: next_title })
            }
            None => Ok(HoursOutcome::AtMaxRank),
        };
    }

    let credited = hours.max(0.0).min(ceiling - current);
    if credited > 0.0 {
        profile.attributes.get_mut(attribute).total_hours += credited;
    }
    calculate_user_rank(table, profile)?;
    Ok(HoursOutcome::Credited {
        requested: hours,
        credited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::UserProfile;

    fn table() -> RankTable {
        RankTable::bundled().unwrap()
    }

    /// Two tiny ranks for scenario tests: Novice [2,2] = 4, Apprentice [3,3] = 6.
    fn small_table() -> RankTable {
        let json = r#"[
            {"title": "Novice", "color_tier": "gray", "level_hours": [2, 2]},
            {"title": "Apprentice", "color_tier": "blue", "level_hours": [3, 3]}
        ]"#;
        RankTable::from_json_bytes(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_fresh_attribute_level_one() {
        let t = table();
        let r = calculate_attribute_level(&t, "Home Cook", "Home Cook", 0.0).unwrap();
        assert_eq!(r.level, 1);
        assert_eq!(r.level_progress, 0.0);
        assert_eq!(r.rank_progress, 0.0);
        assert_eq!(r.hours_to_next_level, 5.0);
        assert!(!r.is_maxed);
        assert!(!r.waiting_for_rank_up);
    }

    #[test]
    fn test_level_walk_thresholds() {
        let t = table();
        // Home Cook levels cost 5 each: 5 hours clears level 1 exactly
        let r = calculate_attribute_level(&t, "Home Cook", "Home Cook", 5.0).unwrap();
        assert_eq!(r.level, 2);
        assert_eq!(r.level_progress, 0.0);
        assert_eq!(r.hours_to_next_level, 10.0);

        // 7 hours: level 2 at 40% (2 of 5 into it)
        let r = calculate_attribute_level(&t, "Home Cook", "Home Cook", 7.0).unwrap();
        assert_eq!(r.level, 2);
        assert!((r.level_progress - 40.0).abs() < 1e-9);
        // 7 / 45 of the rank
        assert!((r.rank_progress - 7.0 / 45.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_maxed_at_exact_requirement() {
        let t = table();
        // Home Cook requires 45 hours total
        let r = calculate_attribute_level(&t, "Home Cook", "Home Cook", 45.0).unwrap();
        assert!(r.is_maxed);
        assert_eq!(r.rank_progress, 100.0);
        assert_eq!(r.level_progress, 100.0);
        assert!(!r.waiting_for_rank_up);
        // 0 + 45 + Prep Cook's first level cost (8)
        assert_eq!(r.hours_to_next_level, 53.0);
    }

    #[test]
    fn test_excess_hours_capped_idempotently() {
        let t = table();
        let a = calculate_attribute_level(&t, "Home Cook", "Home Cook", 45.0).unwrap();
        let b = calculate_attribute_level(&t, "Home Cook", "Home Cook", 1045.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frozen_branch_ignores_hours() {
        let t = table();
        // Attribute one rank ahead of the user: frozen regardless of hours
        let a = calculate_attribute_level(&t, "Prep Cook", "Home Cook", 0.0).unwrap();
        let b = calculate_attribute_level(&t, "Prep Cook", "Home Cook", 500.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.level, 1);
        assert_eq!(a.level_progress, 0.0);
        assert_eq!(a.rank_progress, 0.0);
        assert!(a.waiting_for_rank_up);
        assert!(!a.is_maxed);
        // 45 (Home Cook total) + 8 (Prep Cook first level)
        assert_eq!(a.hours_to_next_level, 53.0);
    }

    #[test]
    fn test_second_rank_hours_offset() {
        let t = table();
        // 45 previous + 8 = clears Prep Cook level 1 exactly
        let r = calculate_attribute_level(&t, "Prep Cook", "Prep Cook", 53.0).unwrap();
        assert_eq!(r.level, 2);
        assert_eq!(r.hours_to_next_level, 45.0 + 16.0);
    }

    #[test]
    fn test_terminal_rank_cleared() {
        let t = table();
        let previous = t.total_hours_before("Master Chef").unwrap();
        let required = t.rank("Master Chef").unwrap().hours_required();
        let r =
            calculate_attribute_level(&t, "Master Chef", "Master Chef", previous + required)
                .unwrap();
        assert!(r.is_maxed);
        assert_eq!(r.level, 9);
        assert_eq!(r.level_progress, 100.0);
        assert_eq!(r.rank_progress, 100.0);
        assert_eq!(r.hours_to_next_level, previous + required);
    }

    #[test]
    fn test_zero_level_cost_short_circuits() {
        let json = r#"[{"title": "Odd", "color_tier": "x", "level_hours": [0, 5]}]"#;
        let t = RankTable::from_json_bytes(json.as_bytes()).unwrap();
        let r = calculate_attribute_level(&t, "Odd", "Odd", 0.0).unwrap();
        // First level is free: already 100% into it, no division by zero
        assert_eq!(r.level, 1);
        assert_eq!(r.level_progress, 100.0);
    }

    #[test]
    fn test_update_five_hours_reaches_level_two() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Technique, 5.0).unwrap();
        assert_eq!(
            outcome,
            HoursOutcome::Credited { requested: 5.0, credited: 5.0 }
        );
        assert_eq!(profile.attributes.technique.total_hours, 5.0);
        assert_eq!(profile.attributes.technique.current_level, 2);
    }

    #[test]
    fn test_update_truncates_at_ceiling() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        // Home Cook ceiling is 45; requesting 50 credits only 45
        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Flavor, 50.0).unwrap();
        assert_eq!(
            outcome,
            HoursOutcome::Credited { requested: 50.0, credited: 45.0 }
        );
        assert_eq!(profile.attributes.flavor.total_hours, 45.0);
    }

    #[test]
    fn test_update_negative_hours_credit_nothing() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Technique, -3.0).unwrap();
        assert_eq!(
            outcome,
            HoursOutcome::Credited { requested: -3.0, credited: 0.0 }
        );
        assert_eq!(profile.attributes.technique.total_hours, 0.0);
    }

    #[test]
    fn test_exact_requirement_promotes_and_waits() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        update_attribute_hours(&t, &mut profile, Attribute::Technique, 45.0).unwrap();

        let technique = &profile.attributes.technique;
        assert_eq!(technique.current_rank, "Prep Cook");
        assert!(technique.waiting_for_rank_up);
        assert_eq!(technique.current_level, 1);
        assert_eq!(technique.level_progress, 0.0);
        // User rank unchanged until the other three clear
        assert_eq!(profile.current_rank.title, "Home Cook");
    }

    #[test]
    fn test_rejected_while_waiting_drops_hours() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        update_attribute_hours(&t, &mut profile, Attribute::Technique, 45.0).unwrap();
        assert!(profile.attributes.technique.waiting_for_rank_up);

        let before = profile.clone();
        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Technique, 10.0).unwrap();
        assert_eq!(outcome, HoursOutcome::RejectedWaiting);
        assert_eq!(outcome.credited_hours(), 0.0);
        assert_eq!(profile, before);
    }

    #[test]
    fn test_promoted_outcome_for_unlabeled_ceiling() {
        // Legacy shape: hours already at the ceiling but the label never
        // bumped. The next add relabels instead of crediting.
        let t = table();
        let mut profile = UserProfile::seed(&t);
        profile.attributes.ingredients.total_hours = 45.0;
        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Ingredients, 5.0).unwrap();
        assert_eq!(outcome, HoursOutcome::Promoted { rank: "Prep Cook".into() });
        assert_eq!(profile.attributes.ingredients.current_rank, "Prep Cook");
        assert!(profile.attributes.ingredients.waiting_for_rank_up);
        assert_eq!(profile.attributes.ingredients.total_hours, 45.0);
    }

    #[test]
    fn test_at_max_rank_outcome() {
        let t = small_table();
        let mut profile = UserProfile::seed(&t);
        profile.current_rank.title = "Apprentice".into();
        profile.current_rank.color_tier = "blue".into();
        for attribute in Attribute::ALL {
            let p = profile.attributes.get_mut(attribute);
            p.current_rank = "Apprentice".into();
            p.total_hours = 10.0; // 4 + 6, the full ladder
        }
        calculate_user_rank(&t, &mut profile).unwrap();

        let outcome =
            update_attribute_hours(&t, &mut profile, Attribute::Technique, 2.0).unwrap();
        assert_eq!(outcome, HoursOutcome::AtMaxRank);
        assert_eq!(profile.attributes.technique.total_hours, 10.0);
        assert_eq!(profile.attributes.technique.current_level, 2);
        assert_eq!(profile.attributes.technique.rank_progress, 100.0);
    }

    #[test]
    fn test_all_four_maxed_advances_user_in_same_call() {
        let t = small_table();
        let mut profile = UserProfile::seed(&t);
        for attribute in Attribute::ALL {
            // Novice requires 4 hours
            profile.attributes.get_mut(attribute).total_hours = 4.0;
        }
        calculate_user_rank(&t, &mut profile).unwrap();

        assert_eq!(profile.current_rank.title, "Apprentice");
        assert_eq!(profile.current_rank.color_tier, "blue");
        for attribute in Attribute::ALL {
            let p = profile.attributes.get(attribute);
            assert_eq!(p.current_rank, "Apprentice");
            assert!(!p.waiting_for_rank_up, "{} should have thawed", attribute);
            assert_eq!(p.current_level, 1);
            assert_eq!(p.rank_progress, 0.0);
        }
        assert_eq!(profile.current_rank.level, 1);
        assert_eq!(profile.current_rank.progress, 0.0);
    }

    #[test]
    fn test_calculate_user_rank_idempotent() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        update_attribute_hours(&t, &mut profile, Attribute::Technique, 45.0).unwrap();
        update_attribute_hours(&t, &mut profile, Attribute::Flavor, 12.0).unwrap();

        calculate_user_rank(&t, &mut profile).unwrap();
        let first = profile.clone();
        calculate_user_rank(&t, &mut profile).unwrap();
        assert_eq!(profile, first);
    }

    #[test]
    fn test_overall_progress_is_sum_of_quarters() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        update_attribute_hours(&t, &mut profile, Attribute::Technique, 45.0).unwrap(); // ahead: 25%
        update_attribute_hours(&t, &mut profile, Attribute::Ingredients, 9.0).unwrap(); // 20% of 45
        update_attribute_hours(&t, &mut profile, Attribute::Flavor, 22.5).unwrap(); // 50%

        let expected = 100.0 * 0.25
            + profile.attributes.ingredients.rank_progress * 0.25
            + profile.attributes.flavor.rank_progress * 0.25
            + profile.attributes.management.rank_progress * 0.25;
        assert!((profile.current_rank.progress - expected).abs() < 1e-9);
        // The waiting attribute contributes its full quarter despite 0% shown
        assert_eq!(profile.attributes.technique.rank_progress, 0.0);
        assert!(profile.current_rank.progress >= 25.0);
    }

    #[test]
    fn test_weakest_attribute_gates_level() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        update_attribute_hours(&t, &mut profile, Attribute::Technique, 20.0).unwrap(); // level 5
        update_attribute_hours(&t, &mut profile, Attribute::Ingredients, 10.0).unwrap(); // level 3
        assert_eq!(profile.attributes.technique.current_level, 5);
        assert_eq!(profile.attributes.ingredients.current_level, 3);
        // Flavor and management still level 1
        assert_eq!(profile.current_rank.level, 1);
    }

    #[test]
    fn test_lagging_legacy_profile_normalizes_in_one_call() {
        // A profile whose hours ran far past its recorded rank: one
        // calculate_user_rank call relabels up to user-rank + 1 and stops.
        let t = table();
        let mut profile = UserProfile::seed(&t);
        profile.current_rank.title = "Prep Cook".into();
        profile.current_rank.color_tier = "copper".into();
        for attribute in Attribute::ALL {
            let p = profile.attributes.get_mut(attribute);
            p.current_rank = "Home Cook".into();
            p.total_hours = 400.0; // past Home Cook (45) and Prep Cook (135)
        }
        calculate_user_rank(&t, &mut profile).unwrap();

        // 400 hours clears Home Cook (45), Prep Cook (90), and Line Cook
        // (180); the user catches up to Station Chef, where 400 - 315 = 85
        // hours land the attributes at level 4 (25 + 28 + 30 = 83 <= 85).
        assert_eq!(profile.current_rank.title, "Station Chef");
        for attribute in Attribute::ALL {
            let p = profile.attributes.get(attribute);
            assert_eq!(p.current_rank, "Station Chef");
            assert!(!p.waiting_for_rank_up);
            assert_eq!(p.current_level, 4);
        }
        assert_eq!(profile.current_rank.level, 4);

        let first = profile.clone();
        calculate_user_rank(&t, &mut profile).unwrap();
        assert_eq!(profile, first);
    }

    #[test]
    fn test_unknown_rank_aborts() {
        let t = table();
        let mut profile = UserProfile::seed(&t);
        profile.attributes.technique.current_rank = "Saucier".into();
        assert!(calculate_user_rank(&t, &mut profile).is_err());
        assert!(calculate_attribute_level(&t, "Saucier", "Home Cook", 0.0).is_err());
    }

    #[test]
    fn test_hours_outcome_display() {
        let capped = HoursOutcome::Credited { requested: 10.0, credited: 4.0 };
        assert_eq!(capped.to_string(), "Added 4.0 hours (capped from 10.0)");
        let plain = HoursOutcome::Credited { requested: 4.0, credited: 4.0 };
        assert_eq!(plain.to_string(), "Added 4.0 hours");
    }
}
