use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CandidateFilter, Pairing, PairingStatus, Profile, ProfileCounter};
use crate::services::postgres::PostgresError;
use crate::services::profiles::ProfileServiceError;

/// Errors raised by the persistence collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A pairing already exists for {0}")]
    DuplicatePair(String),

    #[error("Pairing {0} was modified concurrently")]
    StaleWrite(Uuid),

    #[error("Postgres error: {0}")]
    Postgres(#[from] PostgresError),

    #[error("Profile service error: {0}")]
    ProfileService(#[from] ProfileServiceError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Lost a race with a concurrent writer; the operation can be retried
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::DuplicatePair(_) | StoreError::StaleWrite(_))
    }
}

/// A page of pairings plus the total matching the query
#[derive(Debug, Clone)]
pub struct PairingPage {
    pub pairings: Vec<Pairing>,
    pub total: u64,
}

/// Persistence for pairings.
///
/// Implementations guarantee at most one pairing per `pair_key` and treat
/// `Pairing::version` as a compare-and-swap token on save.
#[async_trait]
pub trait PairingStore: Send + Sync {
    async fn find_pairing(&self, user_a: &str, user_b: &str) -> Result<Option<Pairing>, StoreError>;

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError>;

    /// Insert a new pairing. Fails with `DuplicatePair` if its pair key is taken.
    async fn create_pairing(&self, pairing: &Pairing) -> Result<(), StoreError>;

    /// Persist `pairing` if the stored version still equals `pairing.version`.
    /// Fails with `StaleWrite` otherwise.
    async fn save_pairing(&self, pairing: &Pairing) -> Result<(), StoreError>;

    async fn delete_pairing(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Every pairing the user is a member of, any status
    async fn list_pairings_for_user(&self, user_id: &str) -> Result<Vec<Pairing>, StoreError>;

    /// Newest first
    async fn page_pairings_for_user(
        &self,
        user_id: &str,
        status: Option<PairingStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<PairingPage, StoreError>;

    /// Mark every pending pairing past its expiry as expired
    async fn expire_pending(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Read access to profiles owned by the profile subsystem
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError>;

    async fn list_candidate_profiles(&self, filter: &CandidateFilter) -> Result<Vec<Profile>, StoreError>;

    async fn increment_profile_counter(
        &self,
        id: &str,
        counter: ProfileCounter,
        by: i64,
    ) -> Result<(), StoreError>;
}
