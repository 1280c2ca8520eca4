use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gender as stored on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer-not-to-say",
        }
    }
}

/// User profile as supplied by the profile service.
///
/// The matching core only reads profiles. The one exception is the
/// aggregate counters in [`ProfileStats`], which are bumped through
/// the profile service rather than written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Gender,
    #[serde(default)]
    pub interested_in: Vec<Gender>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub lifestyle: Lifestyle,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub preferences: MatchPreferences,
    #[serde(default)]
    pub is_online: bool,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_premium: bool,
    /// Account suspended by moderation
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub blocked_users: Vec<String>,
    #[serde(default)]
    pub stats: ProfileStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub category: String,
    pub name: String,
    /// 1-5
    #[serde(default = "default_interest_level")]
    pub level: u8,
}

fn default_interest_level() -> u8 { 3 }

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lifestyle {
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub education: Option<Education>,
    #[serde(default)]
    pub smoking: Option<Smoking>,
    #[serde(default)]
    pub drinking: Option<Drinking>,
    #[serde(default)]
    pub exercise: Option<Exercise>,
    #[serde(default)]
    pub diet: Option<Diet>,
    #[serde(default)]
    pub pets: Option<Pets>,
    #[serde(default)]
    pub children: Option<Children>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Smoking {
    Never,
    Socially,
    Regularly,
    TryingToQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Drinking {
    Never,
    Socially,
    Regularly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    Never,
    Sometimes,
    Regularly,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diet {
    Omnivore,
    Vegetarian,
    Vegan,
    Pescatarian,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pets {
    Love,
    Like,
    Allergic,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Children {
    Have,
    Want,
    DontWant,
    Maybe,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Discovery preferences declared by the profile owner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPreferences {
    #[serde(default)]
    pub age_range: AgeRange,
    #[serde(default = "default_max_distance")]
    pub max_distance: u16,
}

impl Default for MatchPreferences {
    fn default() -> Self {
        Self {
            age_range: AgeRange::default(),
            max_distance: default_max_distance(),
        }
    }
}

fn default_max_distance() -> u16 { 50 }

/// Inclusive age bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 22, max: 35 }
    }
}

impl AgeRange {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && age <= self.max
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    #[serde(default)]
    pub profile_views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub matches: i64,
    #[serde(default)]
    pub conversations: i64,
}

/// Aggregate counters the core is allowed to adjust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileCounter {
    Likes,
    Matches,
    Conversations,
}

impl ProfileCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileCounter::Likes => "likes",
            ProfileCounter::Matches => "matches",
            ProfileCounter::Conversations => "conversations",
        }
    }
}

/// One-sided swipe action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionAction {
    Like,
    SuperLike,
    Pass,
    Block,
    Report,
}

impl InteractionAction {
    pub fn is_positive(&self) -> bool {
        matches!(self, InteractionAction::Like | InteractionAction::SuperLike)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::Like => "like",
            InteractionAction::SuperLike => "super-like",
            InteractionAction::Pass => "pass",
            InteractionAction::Block => "block",
            InteractionAction::Report => "report",
        }
    }
}

impl std::str::FromStr for InteractionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionAction::Like),
            "super-like" => Ok(InteractionAction::SuperLike),
            "pass" => Ok(InteractionAction::Pass),
            "block" => Ok(InteractionAction::Block),
            "report" => Ok(InteractionAction::Report),
            other => Err(format!("unrecognized action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub user: String,
    pub action: InteractionAction,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    Pending,
    Matched,
    Rejected,
    Expired,
}

impl PairingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStatus::Pending => "pending",
            PairingStatus::Matched => "matched",
            PairingStatus::Rejected => "rejected",
            PairingStatus::Expired => "expired",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, PairingStatus::Rejected | PairingStatus::Expired)
    }
}

impl std::str::FromStr for PairingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PairingStatus::Pending),
            "matched" => Ok(PairingStatus::Matched),
            "rejected" => Ok(PairingStatus::Rejected),
            "expired" => Ok(PairingStatus::Expired),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    Swipe,
    Search,
    Recommendation,
    InterestBased,
    LocationBased,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub is_started: bool,
    pub started_by: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub message_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VirtualDateStatus {
    #[default]
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDate {
    pub is_scheduled: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub activity: Option<String>,
    pub status: VirtualDateStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingMetadata {
    pub common_interests: Vec<String>,
    /// Miles between the two members when both shared coordinates
    pub location_distance: Option<f64>,
}

/// Persistent record of the relationship between two users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub id: Uuid,
    /// Sorted member ids
    pub users: [String; 2],
    pub pair_key: String,
    pub status: PairingStatus,
    pub initiator: String,
    pub compatibility_score: Option<u8>,
    pub matched_via: MatchSource,
    pub interactions: Vec<Interaction>,
    pub conversation: Conversation,
    pub virtual_date: VirtualDate,
    pub expires_at: DateTime<Utc>,
    pub metadata: PairingMetadata,
    pub matched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, owned by the store
    #[serde(skip)]
    pub version: i64,
}

/// Canonical key for an unordered pair of user ids
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}:{}", a, b)
    } else {
        format!("{}:{}", b, a)
    }
}

impl Pairing {
    pub fn new(
        initiator: &str,
        target: &str,
        matched_via: MatchSource,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let users = if initiator <= target {
            [initiator.to_string(), target.to_string()]
        } else {
            [target.to_string(), initiator.to_string()]
        };

        Self {
            id: Uuid::new_v4(),
            pair_key: pair_key(initiator, target),
            users,
            status: PairingStatus::Pending,
            initiator: initiator.to_string(),
            compatibility_score: None,
            matched_via,
            interactions: Vec::new(),
            conversation: Conversation::default(),
            virtual_date: VirtualDate::default(),
            expires_at: now + ttl,
            metadata: PairingMetadata::default(),
            matched_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }

    /// The member that is not `user_id`
    pub fn other_member(&self, user_id: &str) -> Option<&str> {
        if !self.is_member(user_id) {
            return None;
        }
        self.users
            .iter()
            .find(|u| u.as_str() != user_id)
            .map(String::as_str)
    }

    pub fn interaction_by(&self, user_id: &str) -> Option<&Interaction> {
        self.interactions.iter().find(|i| i.user == user_id)
    }
}

/// Ranked discovery result; built on demand and never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub profile: ProfileCard,
    pub compatibility_score: u8,
    pub final_score: u8,
    pub recommendation_reasons: Vec<String>,
}

/// Public view of another member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCard {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub gender: Gender,
    pub bio: Option<String>,
    pub photos: Vec<Photo>,
    pub interests: Vec<Interest>,
    pub location: Location,
    pub last_active: DateTime<Utc>,
    pub is_online: bool,
    pub is_verified: bool,
}

/// Filter pushed down to the profile service when listing candidates.
///
/// Only narrows the pool; eligibility is re-checked in-process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    pub requester_id: String,
    pub genders: Vec<Gender>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub exclude_ids: Vec<String>,
    /// Drop candidates whose block list contains this id
    pub exclude_blockers_of: Option<String>,
    pub limit: usize,
}

/// Scoring weights for the compatibility factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub age: f64,
    pub interests: f64,
    pub lifestyle: f64,
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            age: 0.20,
            interests: 0.40,
            lifestyle: 0.30,
            education: 0.10,
        }
    }
}
