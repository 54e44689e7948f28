pub mod completion;
pub mod data;
pub mod error;
pub mod models;
pub mod progression;
pub mod storage;
pub mod store;

pub use completion::{complete_quest, CompletionOutcome};
pub use data::{
    resolve_catalog, sync_catalog, CachedCatalog, QuestCatalog, QuestKind, QuestRecord,
    RankDefinition, RankTable,
};
pub use error::{BrigadeError, Result};
pub use models::{Achievement, Attribute, AttributeProgress, Milestones, RankStanding, UserProfile};
pub use progression::{
    calculate_attribute_level, calculate_user_rank, update_attribute_hours, AttributeLevelResult,
    HoursOutcome,
};
pub use storage::{MemoryStorage, SqliteStorage, Storage, PROFILE_KEY};
pub use store::ProfileStore;
