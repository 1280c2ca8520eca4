use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::attributes::age_on;
use crate::models::{pair_key, CandidateFilter, Pairing, PairingStatus, Profile, ProfileCounter};
use crate::services::store::{PairingPage, PairingStore, ProfileDirectory, StoreError};

#[derive(Default)]
struct PairingTable {
    by_id: HashMap<Uuid, Pairing>,
    /// pair key -> pairing id
    by_pair: HashMap<String, Uuid>,
}

/// In-process pairing store
///
/// One lock guards both the rows and the pair-key index, so the
/// uniqueness check and the insert are a single step.
#[derive(Default)]
pub struct MemoryPairingStore {
    table: RwLock<PairingTable>,
}

impl MemoryPairingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PairingStore for MemoryPairingStore {
    async fn find_pairing(&self, user_a: &str, user_b: &str) -> Result<Option<Pairing>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_pair
            .get(&pair_key(user_a, user_b))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError> {
        Ok(self.table.read().await.by_id.get(&id).cloned())
    }

    async fn create_pairing(&self, pairing: &Pairing) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        if table.by_pair.contains_key(&pairing.pair_key) {
            return Err(StoreError::DuplicatePair(pairing.pair_key.clone()));
        }

        let mut stored = pairing.clone();
        stored.version = 1;
        table.by_pair.insert(stored.pair_key.clone(), stored.id);
        table.by_id.insert(stored.id, stored);
        Ok(())
    }

    async fn save_pairing(&self, pairing: &Pairing) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let current = table
            .by_id
            .get_mut(&pairing.id)
            .ok_or(StoreError::StaleWrite(pairing.id))?;

        if current.version != pairing.version {
            return Err(StoreError::StaleWrite(pairing.id));
        }

        let version = current.version + 1;
        *current = pairing.clone();
        current.version = version;
        Ok(())
    }

    async fn delete_pairing(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut table = self.table.write().await;
        match table.by_id.remove(&id) {
            Some(removed) => {
                table.by_pair.remove(&removed.pair_key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_pairings_for_user(&self, user_id: &str) -> Result<Vec<Pairing>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_id
            .values()
            .filter(|p| p.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn page_pairings_for_user(
        &self,
        user_id: &str,
        status: Option<PairingStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<PairingPage, StoreError> {
        let mut pairings: Vec<Pairing> = self
            .list_pairings_for_user(user_id)
            .await?
            .into_iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .collect();
        pairings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = pairings.len() as u64;
        let pairings = pairings
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(PairingPage { pairings, total })
    }

    async fn expire_pending(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let mut expired = 0;
        for pairing in table.by_id.values_mut() {
            if pairing.expire_if_stale(now) {
                pairing.version += 1;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

/// In-process profile directory, used for local runs and tests
#[derive(Default)]
pub struct MemoryProfileDirectory {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfileDirectory {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn list_candidate_profiles(&self, filter: &CandidateFilter) -> Result<Vec<Profile>, StoreError> {
        let now = Utc::now();
        let profiles = self.profiles.read().await;

        let mut candidates: Vec<Profile> = profiles
            .values()
            .filter(|p| p.id != filter.requester_id && !p.is_blocked)
            .filter(|p| !filter.exclude_ids.contains(&p.id))
            .filter(|p| {
                filter
                    .exclude_blockers_of
                    .as_ref()
                    .map_or(true, |id| !p.blocked_users.contains(id))
            })
            .filter(|p| filter.genders.is_empty() || filter.genders.contains(&p.gender))
            .filter(|p| match (p.date_of_birth, filter.min_age, filter.max_age) {
                (Some(birth), min, max) => {
                    let age = age_on(birth, now);
                    min.map_or(true, |m| age >= m) && max.map_or(true, |m| age <= m)
                }
                (None, None, None) => true,
                (None, _, _) => false,
            })
            .cloned()
            .collect();

        // HashMap order is arbitrary; keep pool order deterministic
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        candidates.truncate(filter.limit);
        Ok(candidates)
    }

    async fn increment_profile_counter(
        &self,
        id: &str,
        counter: ProfileCounter,
        by: i64,
    ) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        if let Some(profile) = profiles.get_mut(id) {
            let stat = match counter {
                ProfileCounter::Likes => &mut profile.stats.likes,
                ProfileCounter::Matches => &mut profile.stats.matches,
                ProfileCounter::Conversations => &mut profile.stats.conversations,
            };
            *stat += by;
        }
        Ok(())
    }
}
