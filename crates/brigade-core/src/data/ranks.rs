use serde::{Deserialize, Serialize};

use crate::error::{BrigadeError, Result};

/// One rank of the brigade hierarchy. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDefinition {
    /// Unique rank title, e.g. "Home Cook".
    pub title: String,
    /// Display-only tier color name.
    pub color_tier: String,
    /// Hours required to clear each successive level within this rank.
    pub level_hours: Vec<f64>,
}

impl RankDefinition {
    pub fn level_count(&self) -> usize {
        self.level_hours.len()
    }

    /// Total hours an attribute must accumulate within this rank to clear it.
    pub fn hours_required(&self) -> f64 {
        self.level_hours.iter().sum()
    }

    pub fn first_level_cost(&self) -> f64 {
        self.level_hours.first().copied().unwrap_or(0.0)
    }
}

/// The ordered rank list, loaded from ranks.json. Array index is rank index;
/// rank comparisons are by index.
#[derive(Debug, Clone)]
pub struct RankTable {
    ranks: Vec<RankDefinition>,
}

impl RankTable {
    /// Load and validate from JSON bytes.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let ranks: Vec<RankDefinition> = serde_json::from_slice(data)?;

        if ranks.is_empty() {
            return Err(BrigadeError::Data("Rank table has no ranks".into()));
        }
        for (i, rank) in ranks.iter().enumerate() {
            if rank.level_hours.is_empty() {
                return Err(BrigadeError::Data(format!(
                    "Rank '{}' has no level hours",
                    rank.title
                )));
            }
            if rank.level_hours.iter().any(|&h| h < 0.0) {
                return Err(BrigadeError::Data(format!(
                    "Rank '{}' has a negative level cost",
                    rank.title
                )));
            }
            if ranks[..i].iter().any(|r| r.title == rank.title) {
                return Err(BrigadeError::Data(format!(
                    "Duplicate rank title '{}'",
                    rank.title
                )));
            }
        }

        log::info!("Loaded rank table with {} ranks", ranks.len());
        Ok(Self { ranks })
    }

    /// Load from the bundled ranks.json (compiled into the binary).
    pub fn bundled() -> Result<Self> {
        Self::from_json_bytes(include_bytes!("../../data/ranks.json"))
    }

    /// Look up a rank by title. Unknown titles are fatal to the operation,
    /// never silently defaulted.
    pub fn rank(&self, title: &str) -> Result<&RankDefinition> {
        self.ranks
            .iter()
            .find(|r| r.title == title)
            .ok_or_else(|| BrigadeError::UnknownRank(title.to_string()))
    }

    pub fn rank_index(&self, title: &str) -> Result<usize> {
        self.ranks
            .iter()
            .position(|r| r.title == title)
            .ok_or_else(|| BrigadeError::UnknownRank(title.to_string()))
    }

    /// True if rank `a` is strictly higher than rank `b`.
    pub fn is_higher(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.rank_index(a)? > self.rank_index(b)?)
    }

    /// The rank following the given one, or None for the terminal rank.
    pub fn next_rank(&self, title: &str) -> Result<Option<&RankDefinition>> {
        let index = self.rank_index(title)?;
        Ok(self.ranks.get(index + 1))
    }

    /// Sum of `hours_required` for every rank strictly before the given one.
    pub fn total_hours_before(&self, title: &str) -> Result<f64> {
        let index = self.rank_index(title)?;
        Ok(self.ranks[..index].iter().map(|r| r.hours_required()).sum())
    }

    pub fn first(&self) -> &RankDefinition {
        // Validated non-empty in from_json_bytes
        &self.ranks[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankDefinition> {
        self.ranks.iter()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
