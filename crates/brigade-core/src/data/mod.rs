pub mod quests;
pub mod ranks;

pub use quests::{
    load_cached, resolve_catalog, store_cache, sync_catalog, CachedCatalog, QuestCatalog,
    QuestKind, QuestRank, QuestRecord, CATALOG_CACHE_KEY, STARTER_QUESTS,
};
pub use ranks::{RankDefinition, RankTable};
