use chrono::{DateTime, Utc};

use crate::error::{MatchError, MatchResult};
use crate::models::{Pairing, PairingStatus, VirtualDate, VirtualDateStatus};

/// Match state machine.
///
/// pending -> matched | rejected | expired, matched -> rejected.
/// Conversation and virtual date records require a matched pairing.
impl Pairing {
    /// Expire a pending pairing whose window has passed. Returns true if
    /// the status changed.
    pub fn expire_if_stale(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == PairingStatus::Pending && now >= self.expires_at {
            self.status = PairingStatus::Expired;
            self.updated_at = now;
            return true;
        }
        false
    }

    fn require_matched(&self, what: &str) -> MatchResult<()> {
        if self.status != PairingStatus::Matched {
            return Err(MatchError::InvalidState(format!(
                "Can only {} with matched users (pairing is {})",
                what,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    pub fn start_conversation(&mut self, user_id: &str, now: DateTime<Utc>) -> MatchResult<()> {
        self.require_matched("start a conversation")?;

        self.conversation.is_started = true;
        self.conversation.started_by = Some(user_id.to_string());
        self.conversation.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Register one chat message. Returns true if it started the
    /// conversation.
    pub fn record_message(&mut self, sender: &str, now: DateTime<Utc>) -> MatchResult<bool> {
        self.require_matched("send messages")?;

        let started = !self.conversation.is_started;
        if started {
            self.start_conversation(sender, now)?;
        }
        self.conversation.last_message_at = Some(now);
        self.conversation.message_count += 1;
        self.updated_at = now;
        Ok(started)
    }

    pub fn schedule_virtual_date(
        &mut self,
        scheduled_at: DateTime<Utc>,
        activity: &str,
        now: DateTime<Utc>,
    ) -> MatchResult<()> {
        self.require_matched("schedule dates")?;

        self.virtual_date = VirtualDate {
            is_scheduled: true,
            scheduled_at: Some(scheduled_at),
            activity: Some(activity.to_string()),
            status: VirtualDateStatus::Scheduled,
        };
        self.updated_at = now;
        Ok(())
    }

    /// scheduled -> active -> completed, scheduled | active -> cancelled
    pub fn set_virtual_date_status(
        &mut self,
        status: VirtualDateStatus,
        now: DateTime<Utc>,
    ) -> MatchResult<()> {
        self.require_matched("update dates")?;
        if !self.virtual_date.is_scheduled {
            return Err(MatchError::InvalidState(
                "No virtual date has been scheduled".to_string(),
            ));
        }

        use VirtualDateStatus::*;
        let allowed = matches!(
            (self.virtual_date.status, status),
            (Scheduled, Active) | (Active, Completed) | (Scheduled, Cancelled) | (Active, Cancelled)
        );
        if !allowed {
            return Err(MatchError::InvalidState(format!(
                "Cannot move virtual date from {:?} to {:?}",
                self.virtual_date.status, status
            )));
        }

        self.virtual_date.status = status;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchSource;
    use chrono::Duration;

    fn matched() -> Pairing {
        let mut p = Pairing::new("a", "b", MatchSource::Swipe, Duration::days(7), Utc::now());
        p.status = PairingStatus::Matched;
        p
    }

    #[test]
    fn test_pending_expires_after_window() {
        let now = Utc::now();
        let mut p = Pairing::new("a", "b", MatchSource::Swipe, Duration::days(7), now);

        assert!(!p.expire_if_stale(now + Duration::days(6)));
        assert!(p.expire_if_stale(now + Duration::days(8)));
        assert_eq!(p.status, PairingStatus::Expired);
    }

    #[test]
    fn test_matched_never_expires() {
        let mut p = matched();
        assert!(!p.expire_if_stale(Utc::now() + Duration::days(30)));
        assert_eq!(p.status, PairingStatus::Matched);
    }

    #[test]
    fn test_conversation_requires_match() {
        let mut p = Pairing::new("a", "b", MatchSource::Swipe, Duration::days(7), Utc::now());
        let result = p.start_conversation("a", Utc::now());
        assert!(matches!(result, Err(MatchError::InvalidState(_))));
        assert!(!p.conversation.is_started);
    }

    #[test]
    fn test_first_message_starts_conversation() {
        let mut p = matched();
        assert!(p.record_message("b", Utc::now()).unwrap());
        assert!(!p.record_message("a", Utc::now()).unwrap());

        assert_eq!(p.conversation.started_by.as_deref(), Some("b"));
        assert_eq!(p.conversation.message_count, 2);
        assert!(p.conversation.last_message_at.is_some());
    }

    #[test]
    fn test_schedule_date_requires_match() {
        let mut p = Pairing::new("a", "b", MatchSource::Swipe, Duration::days(7), Utc::now());
        let when = Utc::now() + Duration::days(2);
        assert!(p.schedule_virtual_date(when, "museum tour", Utc::now()).is_err());

        let mut p = matched();
        p.schedule_virtual_date(when, "museum tour", Utc::now()).unwrap();
        assert!(p.virtual_date.is_scheduled);
        assert_eq!(p.virtual_date.status, VirtualDateStatus::Scheduled);
    }

    #[test]
    fn test_virtual_date_transitions() {
        let mut p = matched();
        let now = Utc::now();
        p.schedule_virtual_date(now + Duration::hours(3), "cooking class", now).unwrap();

        assert!(p.set_virtual_date_status(VirtualDateStatus::Completed, now).is_err());
        p.set_virtual_date_status(VirtualDateStatus::Active, now).unwrap();
        p.set_virtual_date_status(VirtualDateStatus::Completed, now).unwrap();
        assert!(p.set_virtual_date_status(VirtualDateStatus::Cancelled, now).is_err());
    }

    #[test]
    fn test_unscheduled_date_cannot_change() {
        let mut p = matched();
        let result = p.set_virtual_date_status(VirtualDateStatus::Active, Utc::now());
        assert!(matches!(result, Err(MatchError::InvalidState(_))));
    }
}
