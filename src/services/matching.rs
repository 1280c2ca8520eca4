//! Match orchestration.
//!
//! `MatchService` binds the pure engine in `core` to the pairing store and
//! the profile directory. Every pairing mutation follows the same shape:
//! load, apply to a private copy, persist with a version check, and retry
//! from a fresh load if another writer got there first.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::filters::{candidate_filter, Exclusions};
use crate::core::ledger::{record_interaction, PairProfiles};
use crate::core::recommender::Recommender;
use crate::error::{MatchError, MatchResult};
use crate::models::{
    InteractionAction, MatchSource, MatchStats, MatchView, MatchesResponse, Pagination, Pairing,
    PairingStatus, ProfileCounter, RecommendationsResponse, SwipeResponse, VirtualDateStatus,
};
use crate::services::store::{PairingStore, ProfileDirectory};

/// Times a short recommendation pool is refetched at double size
const MAX_POOL_WIDENINGS: u32 = 3;

/// Tunables for the match service
#[derive(Debug, Clone)]
pub struct MatchingOptions {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Candidates fetched per requested recommendation, before filtering
    pub candidate_pool_multiplier: usize,
    pub pairing_ttl: Duration,
    pub max_write_retries: u32,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 50,
            candidate_pool_multiplier: 5,
            pairing_ttl: Duration::days(7),
            max_write_retries: 5,
        }
    }
}

pub struct MatchService {
    pairings: Arc<dyn PairingStore>,
    profiles: Arc<dyn ProfileDirectory>,
    recommender: Recommender,
    options: MatchingOptions,
}

impl MatchService {
    pub fn new(
        pairings: Arc<dyn PairingStore>,
        profiles: Arc<dyn ProfileDirectory>,
        recommender: Recommender,
        options: MatchingOptions,
    ) -> Self {
        Self {
            pairings,
            profiles,
            recommender,
            options,
        }
    }

    pub fn options(&self) -> &MatchingOptions {
        &self.options
    }

    pub async fn health_check(&self) -> MatchResult<bool> {
        Ok(self.pairings.health_check().await?)
    }

    /// Record a swipe by `actor` on `target`
    ///
    /// Creates the pairing on the first swipe between the two users. The
    /// ledger update, status change and match side effects are persisted
    /// in a single write.
    pub async fn swipe(&self, actor: &str, target: &str, action: &str) -> MatchResult<SwipeResponse> {
        let action = parse_swipe_action(action)?;

        if target.trim().is_empty() {
            return Err(MatchError::Validation("Target user id is required".to_string()));
        }
        if actor == target {
            return Err(MatchError::InvalidAction("You cannot swipe on yourself".to_string()));
        }

        let actor_profile = self
            .profiles
            .get_profile(actor)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Profile {} not found", actor)))?;
        let target_profile = self
            .profiles
            .get_profile(target)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Profile {} not found", target)))?;
        let profiles = PairProfiles {
            first: &actor_profile,
            second: &target_profile,
        };

        for attempt in 0..=self.options.max_write_retries {
            let now = Utc::now();

            let (mut pairing, is_new) = match self.pairings.find_pairing(actor, target).await? {
                Some(mut existing) => {
                    existing.expire_if_stale(now);
                    if existing.status == PairingStatus::Expired {
                        debug!("Discarding expired pairing {} for {}", existing.id, existing.pair_key);
                        self.pairings.delete_pairing(existing.id).await?;
                        (self.fresh_pairing(actor, target, now), true)
                    } else {
                        (existing, false)
                    }
                }
                None => (self.fresh_pairing(actor, target, now), true),
            };

            if pairing.interaction_by(actor).is_some() {
                return Err(MatchError::Conflict(
                    "You have already swiped on this user".to_string(),
                ));
            }

            let outcome = record_interaction(
                &mut pairing,
                actor,
                action,
                profiles,
                self.recommender.scorer(),
                now,
            )?;

            let persisted = if is_new {
                self.pairings.create_pairing(&pairing).await
            } else {
                self.pairings.save_pairing(&pairing).await
            };

            match persisted {
                Ok(()) => {}
                Err(e) if e.is_contention() => {
                    debug!("Swipe {} -> {} lost a write race (attempt {}): {}", actor, target, attempt + 1, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if action.is_positive() {
                self.bump_counter(target, ProfileCounter::Likes, 1).await;
            }
            if outcome.became_matched {
                info!(
                    "New match {} between {} and {} (score {:?})",
                    pairing.id, pairing.users[0], pairing.users[1], pairing.compatibility_score
                );
                self.bump_counter(actor, ProfileCounter::Matches, 1).await;
                self.bump_counter(target, ProfileCounter::Matches, 1).await;
            }

            return Ok(SwipeResponse {
                pairing_id: pairing.id,
                status: pairing.status,
                compatibility_score: pairing.compatibility_score,
                is_new_match: outcome.became_matched,
                matched_at: pairing.matched_at,
            });
        }

        Err(self.contention_exhausted(&format!("swipe {} -> {}", actor, target)))
    }

    /// Page through a user's pairings, newest first
    pub async fn list_matches(
        &self,
        user_id: &str,
        status: Option<PairingStatus>,
        page: u32,
        limit: u32,
    ) -> MatchResult<MatchesResponse> {
        if page == 0 || limit == 0 {
            return Err(MatchError::Validation("page and limit must be positive".to_string()));
        }

        let offset = (page as u64 - 1) * limit as u64;
        let result = self
            .pairings
            .page_pairings_for_user(user_id, status, offset, limit as u64)
            .await?;

        let now = Utc::now();
        let mut matches = Vec::with_capacity(result.pairings.len());
        for mut pairing in result.pairings {
            self.expire_lazily(&mut pairing, now).await;
            matches.push(self.view(&pairing, user_id, false, now).await?);
        }

        Ok(MatchesResponse {
            matches,
            pagination: Pagination::new(page, limit, result.total),
        })
    }

    /// Full view of one pairing, interactions included
    pub async fn get_pairing_detail(&self, pairing_id: Uuid, requester: &str) -> MatchResult<MatchView> {
        let mut pairing = self.load_for_member(pairing_id, requester).await?;
        let now = Utc::now();
        self.expire_lazily(&mut pairing, now).await;
        self.view(&pairing, requester, true, now).await
    }

    /// Destroy a pairing at the request of one of its members
    pub async fn unmatch(&self, pairing_id: Uuid, requester: &str) -> MatchResult<()> {
        let pairing = self.load_for_member(pairing_id, requester).await?;
        self.destroy(&pairing).await?;
        info!("User {} unmatched pairing {}", requester, pairing.id);
        Ok(())
    }

    pub async fn schedule_virtual_date(
        &self,
        pairing_id: Uuid,
        requester: &str,
        scheduled_at: DateTime<Utc>,
        activity: &str,
    ) -> MatchResult<MatchView> {
        let activity = activity.trim();
        if activity.is_empty() {
            return Err(MatchError::Validation("Activity is required".to_string()));
        }

        let (pairing, ()) = self
            .update_pairing(pairing_id, requester, |pairing, now| {
                pairing.schedule_virtual_date(scheduled_at, activity, now)
            })
            .await?;

        self.view(&pairing, requester, false, Utc::now()).await
    }

    pub async fn update_virtual_date_status(
        &self,
        pairing_id: Uuid,
        requester: &str,
        status: VirtualDateStatus,
    ) -> MatchResult<MatchView> {
        let (pairing, ()) = self
            .update_pairing(pairing_id, requester, |pairing, now| {
                pairing.set_virtual_date_status(status, now)
            })
            .await?;

        self.view(&pairing, requester, false, Utc::now()).await
    }

    /// Register a chat message sent on a matched pairing
    pub async fn record_message(&self, pairing_id: Uuid, sender: &str) -> MatchResult<MatchView> {
        let (pairing, started) = self
            .update_pairing(pairing_id, sender, |pairing, now| pairing.record_message(sender, now))
            .await?;

        if started {
            for member in &pairing.users {
                self.bump_counter(member, ProfileCounter::Conversations, 1).await;
            }
        }

        self.view(&pairing, sender, false, Utc::now()).await
    }

    /// Destroy any pairing between `requester` and `target`. Returns true
    /// if one existed.
    pub async fn block_user(&self, requester: &str, target: &str) -> MatchResult<bool> {
        if target.trim().is_empty() {
            return Err(MatchError::Validation("Target user id is required".to_string()));
        }
        if requester == target {
            return Err(MatchError::InvalidAction("You cannot block yourself".to_string()));
        }
        if self.profiles.get_profile(target).await?.is_none() {
            return Err(MatchError::NotFound(format!("Profile {} not found", target)));
        }

        match self.pairings.find_pairing(requester, target).await? {
            Some(pairing) => {
                self.destroy(&pairing).await?;
                info!("User {} blocked {}, pairing {} removed", requester, target, pairing.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Ranked discovery candidates for `user_id`
    pub async fn recommend(
        &self,
        user_id: &str,
        exclude_ids: Vec<String>,
        limit: Option<usize>,
    ) -> MatchResult<RecommendationsResponse> {
        let requester = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("Profile {} not found", user_id)))?;

        let limit = limit
            .unwrap_or(self.options.default_limit)
            .clamp(1, self.options.max_limit.max(1));

        let paired: HashSet<String> = self
            .pairings
            .list_pairings_for_user(user_id)
            .await?
            .iter()
            .filter_map(|p| p.other_member(user_id).map(str::to_string))
            .collect();
        let exclusions = Exclusions {
            paired,
            requested: exclude_ids.into_iter().collect(),
        };

        let mut pool_size = limit.saturating_mul(self.options.candidate_pool_multiplier.max(1));
        let mut widenings = 0;
        let result = loop {
            let filter = candidate_filter(&requester, &exclusions, pool_size);
            let pool = self.profiles.list_candidate_profiles(&filter).await?;
            let exhausted = pool.len() < pool_size;

            let result = self.recommender.recommend(&requester, pool, &exclusions, limit, Utc::now());
            if result.candidates.len() >= limit || exhausted || widenings >= MAX_POOL_WIDENINGS {
                break result;
            }

            // The directory may not honour every pushed-down rule; fetch a wider pool
            widenings += 1;
            pool_size = pool_size.saturating_mul(2);
            debug!("Widening candidate pool for {} to {}", user_id, pool_size);
        };
        debug!(
            "Recommended {} of {} candidates to {}",
            result.candidates.len(),
            result.total_candidates,
            user_id
        );

        Ok(RecommendationsResponse {
            recommendations: result.candidates,
            total_candidates: result.total_candidates,
        })
    }

    pub async fn match_stats(&self, user_id: &str) -> MatchResult<MatchStats> {
        let now = Utc::now();
        let pairings = self.pairings.list_pairings_for_user(user_id).await?;

        Ok(pairings.iter().fold(MatchStats::default(), |mut stats, p| {
            match p.status {
                PairingStatus::Matched => {
                    stats.matches += 1;
                    if p.conversation.is_started {
                        stats.conversations += 1;
                    }
                }
                PairingStatus::Pending if now < p.expires_at => stats.pending += 1,
                _ => {}
            }
            stats
        }))
    }

    /// Expire every pending pairing past its window
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> MatchResult<u64> {
        Ok(self.pairings.expire_pending(now).await?)
    }

    fn fresh_pairing(&self, actor: &str, target: &str, now: DateTime<Utc>) -> Pairing {
        Pairing::new(actor, target, MatchSource::Swipe, self.options.pairing_ttl, now)
    }

    async fn load_for_member(&self, pairing_id: Uuid, requester: &str) -> MatchResult<Pairing> {
        let pairing = self
            .pairings
            .get_pairing(pairing_id)
            .await?
            .ok_or_else(|| MatchError::NotFound("Match not found".to_string()))?;

        if !pairing.is_member(requester) {
            return Err(MatchError::Authorization(
                "You are not part of this match".to_string(),
            ));
        }
        Ok(pairing)
    }

    /// Load, mutate with `apply`, and save under the version check
    async fn update_pairing<T, F>(&self, pairing_id: Uuid, requester: &str, mut apply: F) -> MatchResult<(Pairing, T)>
    where
        F: FnMut(&mut Pairing, DateTime<Utc>) -> MatchResult<T>,
    {
        for attempt in 0..=self.options.max_write_retries {
            let mut pairing = self.load_for_member(pairing_id, requester).await?;
            let now = Utc::now();
            pairing.expire_if_stale(now);

            let output = apply(&mut pairing, now)?;

            match self.pairings.save_pairing(&pairing).await {
                Ok(()) => return Ok((pairing, output)),
                Err(e) if e.is_contention() => {
                    debug!("Update of pairing {} lost a write race (attempt {})", pairing_id, attempt + 1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(self.contention_exhausted(&format!("update pairing {}", pairing_id)))
    }

    async fn destroy(&self, pairing: &Pairing) -> MatchResult<()> {
        let removed = self.pairings.delete_pairing(pairing.id).await?;
        if removed && pairing.status == PairingStatus::Matched {
            for member in &pairing.users {
                self.bump_counter(member, ProfileCounter::Matches, -1).await;
            }
        }
        Ok(())
    }

    /// Persist a lazily detected expiry; losing the race is harmless
    async fn expire_lazily(&self, pairing: &mut Pairing, now: DateTime<Utc>) {
        if !pairing.expire_if_stale(now) {
            return;
        }
        match self.pairings.save_pairing(pairing).await {
            Ok(()) => pairing.version += 1,
            Err(e) => debug!("Lazy expiry of pairing {} not persisted: {}", pairing.id, e),
        }
    }

    async fn view(
        &self,
        pairing: &Pairing,
        viewer: &str,
        detail: bool,
        now: DateTime<Utc>,
    ) -> MatchResult<MatchView> {
        let other_user = match pairing.other_member(viewer) {
            Some(other) => self.profiles.get_profile(other).await?.map(|p| p.card(now)),
            None => None,
        };

        Ok(MatchView {
            id: pairing.id,
            status: pairing.status,
            compatibility_score: pairing.compatibility_score,
            matched_at: pairing.matched_at,
            created_at: pairing.created_at,
            matched_via: pairing.matched_via,
            conversation: pairing.conversation.clone(),
            virtual_date: pairing.virtual_date.clone(),
            metadata: pairing.metadata.clone(),
            expires_at: pairing.expires_at,
            interactions: detail.then(|| pairing.interactions.clone()),
            other_user,
        })
    }

    /// Counters are advisory; a failed update never fails the operation
    async fn bump_counter(&self, user_id: &str, counter: ProfileCounter, by: i64) {
        if let Err(e) = self.profiles.increment_profile_counter(user_id, counter, by).await {
            warn!("Failed to update {} counter for {}: {}", counter.as_str(), user_id, e);
        }
    }

    fn contention_exhausted(&self, what: &str) -> MatchError {
        warn!(
            "Giving up on {} after {} write conflicts",
            what,
            self.options.max_write_retries + 1
        );
        MatchError::Conflict("The match was updated concurrently, please retry".to_string())
    }
}

/// Swipes accept like, super-like and pass only
fn parse_swipe_action(action: &str) -> MatchResult<InteractionAction> {
    match action.parse::<InteractionAction>() {
        Ok(a @ (InteractionAction::Like | InteractionAction::SuperLike | InteractionAction::Pass)) => Ok(a),
        _ => Err(MatchError::Validation(format!(
            "Invalid action '{}', expected like, super-like or pass",
            action
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_action_parsing() {
        assert_eq!(parse_swipe_action("like").unwrap(), InteractionAction::Like);
        assert_eq!(parse_swipe_action("super-like").unwrap(), InteractionAction::SuperLike);
        assert_eq!(parse_swipe_action("pass").unwrap(), InteractionAction::Pass);
        assert!(matches!(parse_swipe_action("block"), Err(MatchError::Validation(_))));
        assert!(matches!(parse_swipe_action(""), Err(MatchError::Validation(_))));
    }

    #[test]
    fn test_default_options() {
        let options = MatchingOptions::default();
        assert_eq!(options.pairing_ttl, Duration::days(7));
        assert!(options.max_limit >= options.default_limit);
    }
}
