// Integration tests for the match service on the in-memory stores

use std::sync::Arc;

use chrono::{Duration, Utc};
use heartconnect_match::core::Recommender;
use async_trait::async_trait;
use heartconnect_match::models::{
    CandidateFilter, Exercise, Gender, Interest, MatchSource, Pairing, PairingStatus, Profile,
    ProfileCounter, VirtualDateStatus,
};
use heartconnect_match::services::{
    MatchService, MatchingOptions, MemoryPairingStore, MemoryProfileDirectory, PairingStore,
    ProfileDirectory, StoreError,
};
use heartconnect_match::MatchError;

struct Harness {
    service: Arc<MatchService>,
    pairings: Arc<MemoryPairingStore>,
    profiles: Arc<MemoryProfileDirectory>,
}

fn create_test_profile(id: &str, age: i64, gender: Gender, interested_in: Gender) -> Profile {
    let now = Utc::now();
    Profile {
        id: id.to_string(),
        first_name: format!("User {}", id),
        last_name: String::new(),
        date_of_birth: Some(now - Duration::days((age as f64 * 365.25) as i64 + 10)),
        gender,
        interested_in: vec![interested_in],
        bio: None,
        photos: vec![],
        interests: vec![],
        lifestyle: Default::default(),
        location: Default::default(),
        preferences: Default::default(),
        is_online: false,
        last_active: now,
        is_verified: false,
        is_premium: false,
        is_blocked: false,
        blocked_users: vec![],
        stats: Default::default(),
    }
}

fn harness(profiles: Vec<Profile>) -> Harness {
    let pairings = Arc::new(MemoryPairingStore::new());
    let directory = Arc::new(MemoryProfileDirectory::with_profiles(profiles));
    let service = Arc::new(MatchService::new(
        pairings.clone(),
        directory.clone(),
        Recommender::default(),
        MatchingOptions::default(),
    ));

    Harness {
        service,
        pairings,
        profiles: directory,
    }
}

fn couple() -> Harness {
    let mut alice = create_test_profile("alice", 30, Gender::Female, Gender::Male);
    alice.interests = vec![
        Interest { category: "travel".into(), name: "Travel".into(), level: 4 },
        Interest { category: "outdoors".into(), name: "Hiking".into(), level: 3 },
    ];
    alice.lifestyle.exercise = Some(Exercise::Daily);

    let mut bob = create_test_profile("bob", 32, Gender::Male, Gender::Female);
    bob.interests = vec![
        Interest { category: "travel".into(), name: "Travel".into(), level: 5 },
        Interest { category: "music".into(), name: "Music".into(), level: 2 },
    ];
    bob.lifestyle.exercise = Some(Exercise::Daily);

    harness(vec![alice, bob])
}

async fn matched_couple() -> (Harness, uuid::Uuid) {
    let h = couple();
    h.service.swipe("alice", "bob", "like").await.unwrap();
    let result = h.service.swipe("bob", "alice", "like").await.unwrap();
    (h, result.pairing_id)
}

#[tokio::test]
async fn test_like_then_like_forms_match() {
    let h = couple();

    let first = h.service.swipe("alice", "bob", "like").await.unwrap();
    assert_eq!(first.status, PairingStatus::Pending);
    assert!(!first.is_new_match);
    assert_eq!(first.compatibility_score, None);

    let second = h.service.swipe("bob", "alice", "super-like").await.unwrap();
    assert_eq!(second.status, PairingStatus::Matched);
    assert!(second.is_new_match);
    assert_eq!(second.compatibility_score, Some(23));
    assert_eq!(second.pairing_id, first.pairing_id);

    let stored = h.pairings.get_pairing(first.pairing_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PairingStatus::Matched);
    assert_eq!(stored.compatibility_score, Some(23));
    assert_eq!(stored.metadata.common_interests, vec!["Travel".to_string()]);

    let alice = h.profiles.get_profile("alice").await.unwrap().unwrap();
    let bob = h.profiles.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(alice.stats.matches, 1);
    assert_eq!(bob.stats.matches, 1);
    assert_eq!(alice.stats.likes, 1);
    assert_eq!(bob.stats.likes, 1);
}

#[tokio::test]
async fn test_pass_rejects() {
    let h = couple();
    h.service.swipe("alice", "bob", "like").await.unwrap();
    let result = h.service.swipe("bob", "alice", "pass").await.unwrap();

    assert_eq!(result.status, PairingStatus::Rejected);
    assert!(!result.is_new_match);
    assert_eq!(result.compatibility_score, None);
}

#[tokio::test]
async fn test_swipe_validation() {
    let h = couple();

    assert!(matches!(h.service.swipe("alice", "bob", "block").await, Err(MatchError::Validation(_))));
    assert!(matches!(h.service.swipe("alice", "", "like").await, Err(MatchError::Validation(_))));
    assert!(matches!(h.service.swipe("alice", "alice", "like").await, Err(MatchError::InvalidAction(_))));
    assert!(matches!(h.service.swipe("alice", "ghost", "like").await, Err(MatchError::NotFound(_))));
}

#[tokio::test]
async fn test_second_swipe_by_same_user_conflicts() {
    let h = couple();
    h.service.swipe("alice", "bob", "like").await.unwrap();

    let again = h.service.swipe("alice", "bob", "pass").await;
    assert!(matches!(again, Err(MatchError::Conflict(_))));
}

#[tokio::test]
async fn test_concurrent_swipes_create_one_pairing() {
    let h = couple();

    let a = {
        let service = h.service.clone();
        tokio::spawn(async move { service.swipe("alice", "bob", "like").await })
    };
    let b = {
        let service = h.service.clone();
        tokio::spawn(async move { service.swipe("bob", "alice", "like").await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert_eq!(a.pairing_id, b.pairing_id);
    assert_eq!(h.pairings.len().await, 1);

    let stored = h.pairings.find_pairing("alice", "bob").await.unwrap().unwrap();
    assert_eq!(stored.status, PairingStatus::Matched);
    assert_eq!(stored.interactions.len(), 2);
    assert!(stored.compatibility_score.is_some());
    assert!(a.is_new_match ^ b.is_new_match);
}

#[tokio::test]
async fn test_expired_pairing_is_replaced_on_swipe() {
    let h = couple();
    let stale = Pairing::new("alice", "bob", MatchSource::Swipe, Duration::days(7), Utc::now() - Duration::days(10));
    h.pairings.create_pairing(&stale).await.unwrap();

    let result = h.service.swipe("alice", "bob", "like").await.unwrap();
    assert_ne!(result.pairing_id, stale.id);
    assert_eq!(result.status, PairingStatus::Pending);
    assert!(h.pairings.get_pairing(stale.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expiry_sweep() {
    let h = couple();
    let stale = Pairing::new("alice", "bob", MatchSource::Swipe, Duration::days(7), Utc::now() - Duration::days(10));
    h.pairings.create_pairing(&stale).await.unwrap();

    assert_eq!(h.service.expire_stale(Utc::now()).await.unwrap(), 1);
    let stored = h.pairings.get_pairing(stale.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PairingStatus::Expired);
}

#[tokio::test]
async fn test_list_matches_and_detail() {
    let (h, id) = matched_couple().await;

    let page = h.service.list_matches("alice", Some(PairingStatus::Matched), 1, 20).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.matches[0].id, id);
    assert_eq!(page.matches[0].other_user.as_ref().unwrap().id, "bob");
    assert!(page.matches[0].interactions.is_none());

    let pending = h.service.list_matches("alice", Some(PairingStatus::Pending), 1, 20).await.unwrap();
    assert!(pending.matches.is_empty());

    let detail = h.service.get_pairing_detail(id, "bob").await.unwrap();
    assert_eq!(detail.other_user.unwrap().id, "alice");
    assert_eq!(detail.interactions.unwrap().len(), 2);
}

#[tokio::test]
async fn test_outsider_cannot_touch_pairing() {
    let (h, id) = matched_couple().await;
    h.profiles.insert(create_test_profile("mallory", 29, Gender::Female, Gender::Male)).await;

    assert!(matches!(h.service.get_pairing_detail(id, "mallory").await, Err(MatchError::Authorization(_))));
    assert!(matches!(h.service.unmatch(id, "mallory").await, Err(MatchError::Authorization(_))));
    assert!(matches!(
        h.service.unmatch(uuid::Uuid::new_v4(), "alice").await,
        Err(MatchError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_unmatch_removes_pairing_and_counters() {
    let (h, id) = matched_couple().await;

    h.service.unmatch(id, "alice").await.unwrap();

    assert!(h.pairings.get_pairing(id).await.unwrap().is_none());
    let bob = h.profiles.get_profile("bob").await.unwrap().unwrap();
    assert_eq!(bob.stats.matches, 0);
}

#[tokio::test]
async fn test_virtual_date_requires_match() {
    let h = couple();
    let pending = h.service.swipe("alice", "bob", "like").await.unwrap();

    let result = h
        .service
        .schedule_virtual_date(pending.pairing_id, "alice", Utc::now() + Duration::days(2), "Coffee")
        .await;
    assert!(matches!(result, Err(MatchError::InvalidState(_))));
}

#[tokio::test]
async fn test_virtual_date_lifecycle() {
    let (h, id) = matched_couple().await;
    let when = Utc::now() + Duration::days(2);

    let view = h.service.schedule_virtual_date(id, "alice", when, "Museum tour").await.unwrap();
    assert!(view.virtual_date.is_scheduled);
    assert_eq!(view.virtual_date.activity.as_deref(), Some("Museum tour"));

    h.service.update_virtual_date_status(id, "bob", VirtualDateStatus::Active).await.unwrap();
    let done = h.service.update_virtual_date_status(id, "bob", VirtualDateStatus::Completed).await.unwrap();
    assert_eq!(done.virtual_date.status, VirtualDateStatus::Completed);

    let back = h.service.update_virtual_date_status(id, "alice", VirtualDateStatus::Active).await;
    assert!(matches!(back, Err(MatchError::InvalidState(_))));
}

#[tokio::test]
async fn test_messages_start_conversation_once() {
    let (h, id) = matched_couple().await;

    let first = h.service.record_message(id, "alice").await.unwrap();
    assert!(first.conversation.is_started);
    assert_eq!(first.conversation.started_by.as_deref(), Some("alice"));

    let second = h.service.record_message(id, "bob").await.unwrap();
    assert_eq!(second.conversation.message_count, 2);
    assert_eq!(second.conversation.started_by.as_deref(), Some("alice"));

    let alice = h.profiles.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(alice.stats.conversations, 1);

    let stats = h.service.match_stats("bob").await.unwrap();
    assert_eq!((stats.matches, stats.pending, stats.conversations), (1, 0, 1));
}

#[tokio::test]
async fn test_block_removes_pairing() {
    let (h, id) = matched_couple().await;

    assert!(h.service.block_user("bob", "alice").await.unwrap());
    assert!(h.pairings.get_pairing(id).await.unwrap().is_none());
    assert!(!h.service.block_user("bob", "alice").await.unwrap());
}

#[tokio::test]
async fn test_block_unknown_user_is_not_found() {
    let h = couple();
    assert!(matches!(h.service.block_user("alice", "ghost").await, Err(MatchError::NotFound(_))));
}

#[tokio::test]
async fn test_recommendations_exclude_paired_and_requested() {
    let h = harness(vec![
        create_test_profile("me", 28, Gender::Male, Gender::Female),
        create_test_profile("liked", 27, Gender::Female, Gender::Male),
        create_test_profile("hidden", 26, Gender::Female, Gender::Male),
        create_test_profile("fresh", 29, Gender::Female, Gender::Male),
        create_test_profile("other-man", 29, Gender::Male, Gender::Female),
    ]);

    h.service.swipe("me", "liked", "like").await.unwrap();

    let response = h
        .service
        .recommend("me", vec!["hidden".to_string()], Some(10))
        .await
        .unwrap();

    let ids: Vec<&str> = response.recommendations.iter().map(|c| c.profile.id.as_str()).collect();
    assert_eq!(ids, vec!["fresh"]);
    assert!(response.recommendations[0].final_score >= response.recommendations[0].compatibility_score);
}

fn blocked_me_pool() -> Vec<Profile> {
    let mut profiles = vec![create_test_profile("me", 28, Gender::Male, Gender::Female)];
    for i in 0..5 {
        let mut blocker = create_test_profile(&format!("a{}", i), 27, Gender::Female, Gender::Male);
        blocker.blocked_users.push("me".to_string());
        profiles.push(blocker);
    }
    profiles.push(create_test_profile("z", 27, Gender::Female, Gender::Male));
    profiles
}

#[tokio::test]
async fn test_recommendations_skip_profiles_that_blocked_requester() {
    let h = harness(blocked_me_pool());

    let response = h.service.recommend("me", vec![], Some(1)).await.unwrap();

    let ids: Vec<&str> = response.recommendations.iter().map(|c| c.profile.id.as_str()).collect();
    assert_eq!(ids, vec!["z"]);
    assert_eq!(response.total_candidates, 1);
}

/// Directory that ignores the blocker exclusion, like a profile service
/// without support for it
struct LooseDirectory(MemoryProfileDirectory);

#[async_trait]
impl ProfileDirectory for LooseDirectory {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        self.0.get_profile(id).await
    }

    async fn list_candidate_profiles(&self, filter: &CandidateFilter) -> Result<Vec<Profile>, StoreError> {
        let filter = CandidateFilter {
            exclude_blockers_of: None,
            ..filter.clone()
        };
        self.0.list_candidate_profiles(&filter).await
    }

    async fn increment_profile_counter(
        &self,
        id: &str,
        counter: ProfileCounter,
        by: i64,
    ) -> Result<(), StoreError> {
        self.0.increment_profile_counter(id, counter, by).await
    }
}

#[tokio::test]
async fn test_recommendations_widen_pool_until_filled() {
    let service = MatchService::new(
        Arc::new(MemoryPairingStore::new()),
        Arc::new(LooseDirectory(MemoryProfileDirectory::with_profiles(blocked_me_pool()))),
        Recommender::default(),
        MatchingOptions::default(),
    );

    let response = service.recommend("me", vec![], Some(1)).await.unwrap();

    let ids: Vec<&str> = response.recommendations.iter().map(|c| c.profile.id.as_str()).collect();
    assert_eq!(ids, vec!["z"]);
}

#[tokio::test]
async fn test_recommendations_for_unknown_user() {
    let h = couple();
    assert!(matches!(h.service.recommend("ghost", vec![], None).await, Err(MatchError::NotFound(_))));
}
