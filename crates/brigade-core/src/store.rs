use crate::data::quests::{QuestCatalog, QuestRecord};
use crate::data::ranks::RankTable;
use crate::error::Result;
use crate::models::attributes::Attribute;
use crate::models::profile::UserProfile;
use crate::progression::{self, HoursOutcome};
use crate::storage::{Storage, PROFILE_KEY};

/// Owns the one UserProfile per installation and its persistence lifecycle.
/// The only mutator of profile state; the progression engine stays pure.
pub struct ProfileStore<S: Storage> {
    storage: S,
    table: RankTable,
    profile: Option<UserProfile>,
}

impl<S: Storage> ProfileStore<S> {
    pub fn new(storage: S, table: RankTable) -> Self {
        Self {
            storage,
            table,
            profile: None,
        }
    }

    /// Construct with the bundled rank table.
    pub fn open(storage: S) -> Result<Self> {
        Ok(Self::new(storage, RankTable::bundled()?))
    }

    /// Load the profile: the in-memory copy if present, else the persisted
    /// copy (normalized once through the engine), else a fresh default that
    /// is persisted immediately.
    ///
    /// A malformed persisted profile or one recording an unknown rank is
    /// recoverable: it is logged and replaced with a fresh default rather
    /// than aborting the session.
    pub fn load(&mut self) -> Result<&UserProfile> {
        self.ensure_loaded()?;
        Ok(self.profile.as_ref().expect("profile loaded above"))
    }

    pub fn profile(&mut self) -> Result<&UserProfile> {
        self.load()
    }

    pub fn profile_mut(&mut self) -> Result<&mut UserProfile> {
        self.ensure_loaded()?;
        Ok(self.profile.as_mut().expect("profile loaded above"))
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.profile.is_some() {
            return Ok(());
        }
        if let Some(json) = self.storage.get(PROFILE_KEY)? {
            match self.revive(&json) {
                Ok(profile) => {
                    self.profile = Some(profile);
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Stored profile unusable ({}); starting fresh", e);
                }
            }
        }
        self.profile = Some(UserProfile::seed(&self.table));
        self.save()
    }

    /// Deserialize (serde defaults backfill fields older profiles lack) and
    /// normalize through the engine.
    fn revive(&self, json: &str) -> Result<UserProfile> {
        let mut profile: UserProfile = serde_json::from_str(json)?;
        progression::calculate_user_rank(&self.table, &mut profile)?;
        Ok(profile)
    }

    /// Serialize the full in-memory profile unconditionally. Storage errors
    /// propagate: silently losing the only state copy is a correctness bug.
    pub fn save(&mut self) -> Result<()> {
        let Some(ref profile) = self.profile else {
            return Ok(());
        };
        let json = serde_json::to_string(profile)?;
        self.storage.set(PROFILE_KEY, &json)
    }

    /// Discard all progress and persist a fresh default profile.
    pub fn reset(&mut self) -> Result<&UserProfile> {
        self.profile = Some(UserProfile::seed(&self.table));
        self.save()?;
        Ok(self.profile.as_ref().expect("profile seeded above"))
    }

    /// Grant hours to one attribute through the engine. Does not persist;
    /// callers decide when to save.
    pub fn update_attribute_hours(
        &mut self,
        attribute: Attribute,
        hours: f64,
    ) -> Result<HoursOutcome> {
        self.ensure_loaded()?;
        let Self {
            ref table,
            ref mut profile,
            ..
        } = *self;
        let profile = profile.as_mut().expect("profile loaded above");
        progression::update_attribute_hours(table, profile, attribute, hours)
    }

    /// Quests currently completable: unlocked and not yet completed, in
    /// catalog order.
    pub fn available_quests<'a>(
        &mut self,
        catalog: &'a QuestCatalog,
    ) -> Result<Vec<&'a QuestRecord>> {
        let profile = self.load()?;
        Ok(catalog
            .iter()
            .filter(|q| profile.has_unlocked(&q.id) && !profile.has_completed(&q.id))
            .collect())
    }

    pub fn table(&self) -> &RankTable {
        &self.table
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
