use chrono::{DateTime, Utc};

use crate::core::attributes::{days_since, shared_interest_name_count};
use crate::core::filters::{is_eligible, Exclusions};
use crate::core::scoring::CompatibilityScorer;
use crate::models::{Candidate, Profile};

/// Most reasons attached to a single candidate
pub const MAX_REASONS: usize = 3;

/// Result of a ranking pass
#[derive(Debug)]
pub struct RecommendationResult {
    pub candidates: Vec<Candidate>,
    /// Eligible candidates before truncation
    pub total_candidates: usize,
}

/// Discovery ranker
///
/// # Pipeline Stages
/// 1. Eligibility filtering (self, blocks, existing pairings, demographics)
/// 2. Compatibility scoring
/// 3. Activity and profile-completeness bonuses
/// 4. Reasons, stable sort by final score, truncation
#[derive(Debug, Clone)]
pub struct Recommender {
    scorer: CompatibilityScorer,
}

impl Recommender {
    pub fn new(scorer: CompatibilityScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// Rank `pool` for `requester`. Pure over its inputs.
    pub fn recommend(
        &self,
        requester: &Profile,
        pool: Vec<Profile>,
        exclusions: &Exclusions,
        limit: usize,
        now: DateTime<Utc>,
    ) -> RecommendationResult {
        let mut candidates: Vec<Candidate> = pool
            .into_iter()
            .filter(|candidate| is_eligible(requester, candidate, exclusions, now))
            .map(|candidate| {
                let compatibility = self.scorer.score(requester, &candidate, now);
                let bonus = bonus_points(&candidate, now);
                let final_score = (compatibility as u32 + bonus).min(100) as u8;

                Candidate {
                    recommendation_reasons: recommendation_reasons(requester, &candidate, now),
                    profile: candidate.card(now),
                    compatibility_score: compatibility,
                    final_score,
                }
            })
            .collect();

        let total_candidates = candidates.len();

        // sort_by is stable, ties keep pool order
        candidates.sort_by(|a, b| b.final_score.cmp(&a.final_score));
        candidates.truncate(limit);

        RecommendationResult {
            candidates,
            total_candidates,
        }
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(CompatibilityScorer::default())
    }
}

/// Activity, verification and completeness bonus for a candidate
pub fn bonus_points(candidate: &Profile, now: DateTime<Utc>) -> u32 {
    let mut bonus = 0;

    if candidate.is_online {
        bonus += 5;
    }
    if candidate.is_verified {
        bonus += 3;
    }

    let idle_days = days_since(candidate.last_active, now);
    if idle_days < 1 {
        bonus += 5;
    } else if idle_days < 7 {
        bonus += 2;
    }

    let has_photo = candidate.has_photo();
    let has_bio = candidate.bio_len() > 50;
    let has_interests = candidate.interests.len() > 3;

    if has_photo && has_bio && has_interests {
        bonus += 10;
    } else if has_photo && has_bio {
        bonus += 5;
    } else if has_photo {
        bonus += 2;
    }

    bonus
}

type ReasonRule = fn(&Profile, &Profile, DateTime<Utc>) -> Option<String>;

/// Evaluated in order; the first `MAX_REASONS` hits are kept
const REASON_RULES: [ReasonRule; 6] = [
    similar_age,
    shared_interests,
    same_place,
    same_education,
    same_exercise,
    recently_active,
];

/// Human-readable reasons for recommending `candidate` to `requester`
pub fn recommendation_reasons(requester: &Profile, candidate: &Profile, now: DateTime<Utc>) -> Vec<String> {
    REASON_RULES
        .iter()
        .filter_map(|rule| rule(requester, candidate, now))
        .chain(verified(candidate))
        .take(MAX_REASONS)
        .collect()
}

fn similar_age(requester: &Profile, candidate: &Profile, now: DateTime<Utc>) -> Option<String> {
    let diff = requester.age(now)?.abs_diff(candidate.age(now)?);
    (diff <= 3).then(|| "Similar age".to_string())
}

fn shared_interests(requester: &Profile, candidate: &Profile, _now: DateTime<Utc>) -> Option<String> {
    match shared_interest_name_count(requester, candidate) {
        0 => None,
        1 => Some("1 shared interest".to_string()),
        n => Some(format!("{} shared interests", n)),
    }
}

fn same_place(requester: &Profile, candidate: &Profile, _now: DateTime<Utc>) -> Option<String> {
    let (mine, theirs) = (&requester.location, &candidate.location);
    let (my_city, their_city) = (mine.city.as_deref()?, theirs.city.as_deref()?);

    if my_city == their_city {
        return Some("Same city".to_string());
    }
    match (mine.state.as_deref(), theirs.state.as_deref()) {
        (Some(a), Some(b)) if a == b => Some("Same state".to_string()),
        _ => None,
    }
}

fn same_education(requester: &Profile, candidate: &Profile, _now: DateTime<Utc>) -> Option<String> {
    (requester.education_level()? == candidate.education_level()?)
        .then(|| "Similar education".to_string())
}

fn same_exercise(requester: &Profile, candidate: &Profile, _now: DateTime<Utc>) -> Option<String> {
    (requester.lifestyle.exercise? == candidate.lifestyle.exercise?)
        .then(|| "Similar fitness habits".to_string())
}

fn recently_active(_requester: &Profile, candidate: &Profile, now: DateTime<Utc>) -> Option<String> {
    (days_since(candidate.last_active, now) < 1).then(|| "Recently active".to_string())
}

fn verified(candidate: &Profile) -> Option<String> {
    candidate.is_verified.then(|| "Verified profile".to_string())
}
