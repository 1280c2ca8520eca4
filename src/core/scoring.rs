use chrono::{DateTime, Utc};

use crate::core::attributes::{common_interests, lifestyle_comparisons};
use crate::models::{Profile, ScoringWeights};

/// Score returned when no factor can be compared
pub const NEUTRAL_SCORE: u8 = 50;

/// Calculate a compatibility score (0-100) between two profiles
///
/// Scoring formula, counting only the factors that can be compared:
/// score = (
///     age_score * 0.20 +           # whenever both ages are known
///     interest_score * 0.40 +      # both list at least one interest
///     lifestyle_score * 0.30 +     # a lifestyle attribute set on both sides
///     education_score * 0.10       # both have an education level
/// ) / counted_factors
///
/// Weights of skipped factors are dropped, not redistributed, so the
/// result is the weighted sum averaged over the applicable factors.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
}

impl CompatibilityScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, a: &Profile, b: &Profile, now: DateTime<Utc>) -> u8 {
        let mut score = 0.0;
        let mut factors = 0u32;

        if let (Some(age_a), Some(age_b)) = (a.age(now), b.age(now)) {
            score += age_score(age_a, age_b) * self.weights.age;
            factors += 1;
        }

        if let Some(interests) = interest_score(a, b) {
            score += interests * self.weights.interests;
            factors += 1;
        }

        if let Some(lifestyle) = lifestyle_score(a, b) {
            score += lifestyle * self.weights.lifestyle;
            factors += 1;
        }

        if let Some(education) = education_score(a, b) {
            score += education * self.weights.education;
            factors += 1;
        }

        if factors == 0 {
            return NEUTRAL_SCORE;
        }

        (score / factors as f64).round().clamp(0.0, 100.0) as u8
    }
}

impl Default for CompatibilityScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

/// 100 minus 5 points per year of difference, floored at 0
#[inline]
pub fn age_score(age_a: u32, age_b: u32) -> f64 {
    let diff = age_a.abs_diff(age_b) as f64;
    (100.0 - diff * 5.0).max(0.0)
}

/// Share of interests in common, relative to the longer list.
/// `None` when either side lists no interests.
#[inline]
pub fn interest_score(a: &Profile, b: &Profile) -> Option<f64> {
    if a.interests.is_empty() || b.interests.is_empty() {
        return None;
    }

    let common = common_interests(a, b).len() as f64;
    let larger = a.interests.len().max(b.interests.len()) as f64;

    Some(common / larger * 100.0)
}

/// 100 per matching attribute, 50 per mismatch, averaged.
/// `None` when no attribute is set on both sides.
#[inline]
pub fn lifestyle_score(a: &Profile, b: &Profile) -> Option<f64> {
    let compared = lifestyle_comparisons(a, b);
    if compared.is_empty() {
        return None;
    }

    let total: f64 = compared
        .iter()
        .map(|same| if *same { 100.0 } else { 50.0 })
        .sum();

    Some(total / compared.len() as f64)
}

/// 100 for the same education level, 70 otherwise
#[inline]
pub fn education_score(a: &Profile, b: &Profile) -> Option<f64> {
    let level_a = a.education_level()?;
    let level_b = b.education_level()?;

    Some(if level_a == level_b { 100.0 } else { 70.0 })
}
