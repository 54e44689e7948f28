use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BrigadeError, Result};
use crate::models::attributes::Attribute;
use crate::storage::Storage;

/// Storage key for the cached quest catalog envelope.
pub const CATALOG_CACHE_KEY: &str = "quest_catalog_cache";

/// Cached catalogs older than this are reported as stale.
pub const CACHE_TTL_HOURS: i64 = 24;

/// Quest ids unlocked for a brand-new profile: the bundled catalog's
/// prerequisite-free quests.
pub const STARTER_QUESTS: &[&str] = &[
    "knife-drills-1",
    "market-run-1",
    "seasoning-lab-1",
    "mise-en-place-1",
    "family-dinner",
    "farmers-market",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestKind {
    Training,
    Side,
    Main,
    Explore,
    Challenge,
}

impl QuestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestKind::Training => "training",
            QuestKind::Side => "side",
            QuestKind::Main => "main",
            QuestKind::Explore => "explore",
            QuestKind::Challenge => "challenge",
        }
    }
}

impl std::fmt::Display for QuestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The quest's intended placement in the rank ladder. Display/data only;
/// completion does not gate on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRank {
    pub title: String,
    pub level: u32,
}

/// One quest record from the catalog. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub id: String,
    pub title: String,
    pub kind: QuestKind,
    pub rank: QuestRank,
    /// Attribute-hour rewards; absent attributes reward nothing.
    #[serde(default)]
    pub rewards: BTreeMap<Attribute, f64>,
    /// Data only; unlock state is driven by `unlocks` edges.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Quest ids granted to the profile on completion.
    #[serde(default)]
    pub unlocks: Vec<String>,
}

/// Ordered, read-only quest collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCatalog {
    quests: Vec<QuestRecord>,
}

impl QuestCatalog {
    /// Load and validate from JSON bytes (a JSON array of quest records).
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let quests: Vec<QuestRecord> = serde_json::from_slice(data)?;

        for (i, quest) in quests.iter().enumerate() {
            if quest.id.is_empty() {
                return Err(BrigadeError::Data(format!(
                    "Quest at position {} has an empty id",
                    i
                )));
            }
            if quests[..i].iter().any(|q| q.id == quest.id) {
                return Err(BrigadeError::Data(format!(
                    "Duplicate quest id '{}'",
                    quest.id
                )));
            }
            if quest.rewards.values().any(|&h| h < 0.0) {
                return Err(BrigadeError::Data(format!(
                    "Quest '{}' has a negative reward",
                    quest.id
                )));
            }
        }

        log::info!("Loaded quest catalog with {} quests", quests.len());
        Ok(Self { quests })
    }

    /// Load from the bundled quests.json (compiled into the binary).
    pub fn bundled() -> Result<Self> {
        Self::from_json_bytes(include_bytes!("../../data/quests.json"))
    }

    pub fn empty() -> Self {
        Self { quests: Vec::new() }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&QuestRecord> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestRecord> {
        self.quests.iter()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

/// The persisted cache envelope for a synced catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogCacheEnvelope {
    fetched_at: DateTime<Utc>,
    quests: Vec<QuestRecord>,
}

/// Result of consulting the catalog cache.
#[derive(Debug, Clone)]
pub enum CachedCatalog {
    /// Cached within the TTL.
    Fresh(QuestCatalog),
    /// Cached but older than the TTL; still usable as a fallback.
    Stale(QuestCatalog),
    Missing,
}

/// Read the cached catalog, classifying it by age against `now`.
pub fn load_cached<S: Storage>(storage: &S, now: DateTime<Utc>) -> Result<CachedCatalog> {
    let Some(json) = storage.get(CATALOG_CACHE_KEY)? else {
        return Ok(CachedCatalog::Missing);
    };
    let envelope: CatalogCacheEnvelope = match serde_json::from_str(&json) {
        Ok(envelope) => envelope,
        Err(e) => {
            log::warn!("Discarding malformed catalog cache: {}", e);
            return Ok(CachedCatalog::Missing);
        }
    };
    let catalog = QuestCatalog {
        quests: envelope.quests,
    };
    let age = now.signed_duration_since(envelope.fetched_at);
    if age <= Duration::hours(CACHE_TTL_HOURS) {
        Ok(CachedCatalog::Fresh(catalog))
    } else {
        Ok(CachedCatalog::Stale(catalog))
    }
}

/// Write the cache envelope, stamping it with `now`.
pub fn store_cache<S: Storage>(
    storage: &mut S,
    catalog: &QuestCatalog,
    now: DateTime<Utc>,
) -> Result<()> {
    let envelope = CatalogCacheEnvelope {
        fetched_at: now,
        quests: catalog.quests.clone(),
    };
    let json = serde_json::to_string(&envelope)?;
    storage.set(CATALOG_CACHE_KEY, &json)
}

/// Best available catalog: fresh cache, else stale cache, else bundled.
pub fn resolve_catalog<S: Storage>(storage: &S) -> Result<QuestCatalog> {
    match load_cached(storage, Utc::now())? {
        CachedCatalog::Fresh(catalog) => Ok(catalog),
        CachedCatalog::Stale(catalog) => {
            log::info!("Quest catalog cache is stale; using it as fallback");
            Ok(catalog)
        }
        CachedCatalog::Missing => QuestCatalog::bundled(),
    }
}

/// Import a catalog JSON file into the cache. Validates before writing and
/// returns the imported catalog for summary display.
pub fn sync_catalog<S: Storage>(storage: &mut S, json: &[u8]) -> Result<QuestCatalog> {
    let catalog = QuestCatalog::from_json_bytes(json)?;
    store_cache(storage, &catalog, Utc::now())?;
    log::info!("Synced quest catalog ({} quests) into cache", catalog.len());
    Ok(catalog)
}
