use chrono::{DateTime, Utc};

use crate::models::{Interest, Profile, ProfileCard};

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Age in whole years: `floor((now - birth) / 365.25 days)`.
///
/// Every age comparison in the crate goes through this function so that
/// scoring and age-range filtering never disagree.
pub fn age_on(birth_date: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed_ms = (now - birth_date).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms as f64 / (DAYS_PER_YEAR * MILLIS_PER_DAY)).floor() as u32
}

/// Whole days elapsed since `then`
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - then).num_milliseconds() as f64 / MILLIS_PER_DAY).floor() as i64
}

impl Profile {
    /// `None` when the profile service did not share a birth date
    pub fn age(&self, now: DateTime<Utc>) -> Option<u32> {
        self.date_of_birth.map(|birth| age_on(birth, now))
    }

    pub fn has_photo(&self) -> bool {
        !self.photos.is_empty()
    }

    pub fn bio_len(&self) -> usize {
        self.bio.as_deref().map(|b| b.chars().count()).unwrap_or(0)
    }

    pub fn education_level(&self) -> Option<&str> {
        self.lifestyle
            .education
            .as_ref()
            .and_then(|e| e.level.as_deref())
            .filter(|l| !l.is_empty())
    }

    /// True if either side has the other on their block list
    pub fn blocks_either_way(&self, other: &Profile) -> bool {
        self.blocked_users.iter().any(|id| *id == other.id)
            || other.blocked_users.iter().any(|id| *id == self.id)
    }

    pub fn card(&self, now: DateTime<Utc>) -> ProfileCard {
        ProfileCard {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            age: self.age(now),
            gender: self.gender,
            bio: self.bio.clone(),
            photos: self.photos.clone(),
            interests: self.interests.clone(),
            location: self.location.clone(),
            last_active: self.last_active,
            is_online: self.is_online,
            is_verified: self.is_verified,
        }
    }
}

fn same_interest(a: &Interest, b: &Interest) -> bool {
    a.category == b.category && a.name == b.name
}

/// Interests of `a` that `b` also lists under the same category.
///
/// Counted from `a`'s side, so duplicates in `a` count twice.
pub fn common_interests<'a>(a: &'a Profile, b: &Profile) -> Vec<&'a Interest> {
    a.interests
        .iter()
        .filter(|ia| b.interests.iter().any(|ib| same_interest(ia, ib)))
        .collect()
}

/// Names of the interests both profiles list under the same category
pub fn common_interest_names(a: &Profile, b: &Profile) -> Vec<String> {
    common_interests(a, b)
        .into_iter()
        .map(|i| i.name.clone())
        .collect()
}

/// Interests of `a` whose name appears anywhere in `b`, ignoring category
pub fn shared_interest_name_count(a: &Profile, b: &Profile) -> usize {
    a.interests
        .iter()
        .filter(|ia| b.interests.iter().any(|ib| ia.name == ib.name))
        .count()
}

/// One entry per lifestyle attribute set on both sides, true when equal.
/// Only smoking, drinking, exercise and diet take part.
pub fn lifestyle_comparisons(a: &Profile, b: &Profile) -> Vec<bool> {
    let la = &a.lifestyle;
    let lb = &b.lifestyle;
    let mut compared = Vec::with_capacity(4);

    if let (Some(x), Some(y)) = (la.smoking, lb.smoking) {
        compared.push(x == y);
    }
    if let (Some(x), Some(y)) = (la.drinking, lb.drinking) {
        compared.push(x == y);
    }
    if let (Some(x), Some(y)) = (la.exercise, lb.exercise) {
        compared.push(x == y);
    }
    if let (Some(x), Some(y)) = (la.diet, lb.diet) {
        compared.push(x == y);
    }

    compared
}
