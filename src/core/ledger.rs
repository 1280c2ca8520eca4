//! Interaction ledger.
//!
//! Records one swipe per member on a pairing and recomputes the pairing
//! status. The match side effects (score, common interests, distance) are
//! applied to the same `Pairing` value before it is handed back, so a
//! persisted `matched` pairing always carries its score.

use chrono::{DateTime, Utc};

use crate::core::attributes::common_interest_names;
use crate::core::distance::profile_distance_miles;
use crate::core::scoring::CompatibilityScorer;
use crate::error::{MatchError, MatchResult};
use crate::models::{Interaction, InteractionAction, Pairing, PairingStatus, Profile};

/// What a recorded interaction did to the pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub previous_status: PairingStatus,
    pub status: PairingStatus,
    /// True only on the call that moved the pairing into `matched`
    pub became_matched: bool,
}

/// Both members' profiles, in any order
#[derive(Debug, Clone, Copy)]
pub struct PairProfiles<'a> {
    pub first: &'a Profile,
    pub second: &'a Profile,
}

/// Record `action` by `acting_user` on `pairing`.
///
/// A prior interaction by the same user is replaced, never duplicated.
/// Terminal pairings still accept the call but do not change status.
pub fn record_interaction(
    pairing: &mut Pairing,
    acting_user: &str,
    action: InteractionAction,
    profiles: PairProfiles<'_>,
    scorer: &CompatibilityScorer,
    now: DateTime<Utc>,
) -> MatchResult<InteractionOutcome> {
    if pairing.users[0] == pairing.users[1] {
        return Err(MatchError::InvalidAction(
            "You cannot swipe on yourself".to_string(),
        ));
    }
    if !pairing.is_member(acting_user) {
        return Err(MatchError::InvalidAction(format!(
            "User {} is not part of pairing {}",
            acting_user, pairing.id
        )));
    }

    pairing.interactions.retain(|i| i.user != acting_user);
    pairing.interactions.push(Interaction {
        user: acting_user.to_string(),
        action,
        timestamp: now,
    });
    pairing.updated_at = now;

    let previous_status = pairing.status;
    let status = next_status(pairing, action);
    pairing.status = status;

    let became_matched =
        previous_status != PairingStatus::Matched && status == PairingStatus::Matched;

    if became_matched {
        pairing.matched_at = Some(now);
        apply_match_side_effects(pairing, profiles, scorer, now);
    }

    Ok(InteractionOutcome {
        previous_status,
        status,
        became_matched,
    })
}

/// Status after the latest interaction has been appended
fn next_status(pairing: &Pairing, action: InteractionAction) -> PairingStatus {
    let current = pairing.status;
    if current.is_terminal() {
        return current;
    }

    let both_liked = pairing.users.iter().all(|user| {
        pairing
            .interaction_by(user)
            .map(|i| i.action.is_positive())
            .unwrap_or(false)
    });

    if both_liked && current == PairingStatus::Pending {
        PairingStatus::Matched
    } else if matches!(action, InteractionAction::Pass | InteractionAction::Block) {
        PairingStatus::Rejected
    } else {
        current
    }
}

fn apply_match_side_effects(
    pairing: &mut Pairing,
    profiles: PairProfiles<'_>,
    scorer: &CompatibilityScorer,
    now: DateTime<Utc>,
) {
    if pairing.compatibility_score.is_none() {
        pairing.compatibility_score = Some(scorer.score(profiles.first, profiles.second, now));
    }
    pairing.metadata.common_interests = common_interest_names(profiles.first, profiles.second);
    pairing.metadata.location_distance = profile_distance_miles(profiles.first, profiles.second);

    tracing::debug!(
        "Pairing {} matched with score {:?}",
        pairing.id,
        pairing.compatibility_score
    );
}
