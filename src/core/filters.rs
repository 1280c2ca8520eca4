use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{CandidateFilter, Profile};

/// Ids a requester must never be shown again
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Anyone with a pairing of any status with the requester
    pub paired: HashSet<String>,
    /// Caller-supplied ids
    pub requested: HashSet<String>,
}

impl Exclusions {
    pub fn contains(&self, user_id: &str) -> bool {
        self.paired.contains(user_id) || self.requested.contains(user_id)
    }
}

/// Check if a candidate may be recommended to the requester
///
/// Rejects self, suspended accounts, blocks in either direction,
/// excluded and already-paired ids, then demographic mismatches.
#[inline]
pub fn is_eligible(
    requester: &Profile,
    candidate: &Profile,
    exclusions: &Exclusions,
    now: DateTime<Utc>,
) -> bool {
    if candidate.id == requester.id || candidate.is_blocked {
        return false;
    }

    if requester.blocks_either_way(candidate) {
        return false;
    }

    if exclusions.contains(&candidate.id) {
        return false;
    }

    matches_demographics(requester, candidate, now)
}

/// Check if a candidate fits the requester's gender and age preferences
///
/// An empty interested-in set means no gender preference. A candidate
/// whose age is unknown cannot satisfy an age range.
#[inline]
pub fn matches_demographics(requester: &Profile, candidate: &Profile, now: DateTime<Utc>) -> bool {
    if !requester.interested_in.is_empty() && !requester.interested_in.contains(&candidate.gender) {
        return false;
    }

    match candidate.age(now) {
        Some(age) => requester.preferences.age_range.contains(age),
        None => false,
    }
}

/// Filter pushed to the profile service to narrow the pool
pub fn candidate_filter(requester: &Profile, exclusions: &Exclusions, limit: usize) -> CandidateFilter {
    let mut exclude_ids: Vec<String> = exclusions
        .paired
        .iter()
        .chain(exclusions.requested.iter())
        .chain(requester.blocked_users.iter())
        .cloned()
        .collect();
    exclude_ids.sort();
    exclude_ids.dedup();

    CandidateFilter {
        requester_id: requester.id.clone(),
        genders: requester.interested_in.clone(),
        min_age: Some(requester.preferences.age_range.min),
        max_age: Some(requester.preferences.age_range.max),
        exclude_ids,
        exclude_blockers_of: Some(requester.id.clone()),
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeRange, Gender};
    use chrono::Duration;

    fn create_test_profile(id: &str, age: i64, gender: Gender) -> Profile {
        let now = Utc::now();
        Profile {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: Some(now - Duration::days((age as f64 * 365.25) as i64 + 10)),
            gender,
            interested_in: vec![Gender::Female],
            bio: None,
            photos: vec![],
            interests: vec![],
            lifestyle: Default::default(),
            location: Default::default(),
            preferences: Default::default(),
            is_online: false,
            last_active: now,
            is_verified: true,
            is_premium: false,
            is_blocked: false,
            blocked_users: vec![],
            stats: Default::default(),
        }
    }

    fn requester() -> Profile {
        let mut p = create_test_profile("me", 28, Gender::Male);
        p.preferences.age_range = AgeRange { min: 21, max: 35 };
        p
    }

    #[test]
    fn test_demographics_match() {
        let candidate = create_test_profile("c", 25, Gender::Female);
        assert!(matches_demographics(&requester(), &candidate, Utc::now()));
    }

    #[test]
    fn test_demographics_fail_age() {
        let candidate = create_test_profile("c", 40, Gender::Female);
        assert!(!matches_demographics(&requester(), &candidate, Utc::now()));
    }

    #[test]
    fn test_age_bounds_inclusive() {
        let now = Utc::now();
        assert!(matches_demographics(&requester(), &create_test_profile("c", 21, Gender::Female), now));
        assert!(matches_demographics(&requester(), &create_test_profile("c", 35, Gender::Female), now));
        assert!(!matches_demographics(&requester(), &create_test_profile("c", 36, Gender::Female), now));
    }

    #[test]
    fn test_demographics_fail_gender() {
        let candidate = create_test_profile("c", 25, Gender::Male);
        assert!(!matches_demographics(&requester(), &candidate, Utc::now()));
    }

    #[test]
    fn test_empty_interest_set_accepts_any_gender() {
        let mut me = requester();
        me.interested_in.clear();
        let candidate = create_test_profile("c", 25, Gender::NonBinary);
        assert!(matches_demographics(&me, &candidate, Utc::now()));
    }

    #[test]
    fn test_suspended_user_filtered() {
        let mut candidate = create_test_profile("c", 25, Gender::Female);
        candidate.is_blocked = true;
        assert!(!is_eligible(&requester(), &candidate, &Exclusions::default(), Utc::now()));
    }

    #[test]
    fn test_blocked_by_candidate_filtered() {
        let mut candidate = create_test_profile("c", 25, Gender::Female);
        candidate.blocked_users.push("me".to_string());
        assert!(!is_eligible(&requester(), &candidate, &Exclusions::default(), Utc::now()));
    }

    #[test]
    fn test_paired_filtered() {
        let candidate = create_test_profile("c", 25, Gender::Female);
        let mut exclusions = Exclusions::default();
        exclusions.paired.insert("c".to_string());
        assert!(!is_eligible(&requester(), &candidate, &exclusions, Utc::now()));
    }

    #[test]
    fn test_candidate_filter_dedups_exclusions() {
        let mut me = requester();
        me.blocked_users.push("x".to_string());
        let mut exclusions = Exclusions::default();
        exclusions.paired.insert("x".to_string());
        exclusions.requested.insert("y".to_string());

        let filter = candidate_filter(&me, &exclusions, 40);
        assert_eq!(filter.exclude_ids, vec!["x", "y"]);
        assert_eq!(filter.min_age, Some(21));
        assert_eq!(filter.limit, 40);
        assert_eq!(filter.exclude_blockers_of.as_deref(), Some("me"));
    }
}
