use serde::{Deserialize, Serialize};

use crate::data::ranks::RankDefinition;

/// The four skill dimensions every profile tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Technique,
    Ingredients,
    Flavor,
    Management,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Technique,
        Attribute::Ingredients,
        Attribute::Flavor,
        Attribute::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Technique => "technique",
            Attribute::Ingredients => "ingredients",
            Attribute::Flavor => "flavor",
            Attribute::Management => "management",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technique" => Some(Attribute::Technique),
            "ingredients" => Some(Attribute::Ingredients),
            "flavor" => Some(Attribute::Flavor),
            "management" => Some(Attribute::Management),
            _ => None,
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress of one attribute. `total_hours` is the source of truth and is
/// never capped; the derived fields are recomputed by the progression engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeProgress {
    pub total_hours: f64,
    /// Rank this attribute is progressing within. May lag or lead the user's
    /// overall rank by at most one.
    pub current_rank: String,
    pub current_level: u32,
    /// Absolute hour threshold (previous ranks + within-rank cumulative) at
    /// which the next level triggers.
    pub hours_to_next_level: f64,
    pub level_progress: f64,
    pub rank_progress: f64,
    pub is_maxed: bool,
    /// Maxed and provisionally promoted, frozen at level 1 / 0% until the
    /// user's overall rank catches up.
    pub waiting_for_rank_up: bool,
}

impl AttributeProgress {
    pub fn new(rank: &RankDefinition) -> Self {
        Self {
            total_hours: 0.0,
            current_rank: rank.title.clone(),
            current_level: 1,
            hours_to_next_level: rank.first_level_cost(),
            level_progress: 0.0,
            rank_progress: 0.0,
            is_maxed: false,
            waiting_for_rank_up: false,
        }
    }
}

/// The four attribute slots of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub technique: AttributeProgress,
    pub ingredients: AttributeProgress,
    pub flavor: AttributeProgress,
    pub management: AttributeProgress,
}

impl AttributeSet {
    pub fn new(first_rank: &RankDefinition) -> Self {
        Self {
            technique: AttributeProgress::new(first_rank),
            ingredients: AttributeProgress::new(first_rank),
            flavor: AttributeProgress::new(first_rank),
            management: AttributeProgress::new(first_rank),
        }
    }

    pub fn get(&self, attribute: Attribute) -> &AttributeProgress {
        match attribute {
            Attribute::Technique => &self.technique,
            Attribute::Ingredients => &self.ingredients,
            Attribute::Flavor => &self.flavor,
            Attribute::Management => &self.management,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut AttributeProgress {
        match attribute {
            Attribute::Technique => &mut self.technique,
            Attribute::Ingredients => &mut self.ingredients,
            Attribute::Flavor => &mut self.flavor,
            Attribute::Management => &mut self.management,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttributeProgress)> {
        Attribute::ALL.iter().map(move |&a| (a, self.get(a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_roundtrip() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::parse(attr.as_str()), Some(attr));
        }
        assert_eq!(Attribute::parse("plating"), None);
    }

    #[test]
    fn test_attribute_serde_lowercase() {
        let json = serde_json::to_string(&Attribute::Technique).unwrap();
        assert_eq!(json, "\"technique\"");
        let back: Attribute = serde_json::from_str("\"management\"").unwrap();
        assert_eq!(back, Attribute::Management);
    }

    #[test]
    fn test_set_get_mut() {
        let rank = RankDefinition {
            title: "Home Cook".into(),
            color_tier: "slate".into(),
            level_hours: vec![5.0; 9],
        };
        let mut set = AttributeSet::new(&rank);
        set.get_mut(Attribute::Flavor).total_hours = 12.0;
        assert_eq!(set.get(Attribute::Flavor).total_hours, 12.0);
        assert_eq!(set.get(Attribute::Technique).total_hours, 0.0);
    }

    #[test]
    fn test_iter_order() {
        let rank = RankDefinition {
            title: "Home Cook".into(),
            color_tier: "slate".into(),
            level_hours: vec![5.0],
        };
        let set = AttributeSet::new(&rank);
        let order: Vec<Attribute> = set.iter().map(|(a, _)| a).collect();
        assert_eq!(order, Attribute::ALL.to_vec());
    }

    #[test]
    fn test_new_progress_seed() {
        let rank = RankDefinition {
            title: "Home Cook".into(),
            color_tier: "slate".into(),
            level_hours: vec![5.0; 9],
        };
        let p = AttributeProgress::new(&rank);
        assert_eq!(p.current_level, 1);
        assert_eq!(p.hours_to_next_level, 5.0);
        assert!(!p.is_maxed);
        assert!(!p.waiting_for_rank_up);
    }
}
