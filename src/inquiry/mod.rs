//! Inquiry status state machine.
//!
//! ```text
//! active --seller|admin--> completed
//! active --seller|admin--> cancelled
//! active --any party-----> reported
//! ```
//!
//! The three non-active states are terminal. Persisting a transition is the
//! caller's job; the action layer writes it with a version precondition so two
//! racing transitions cannot both land.

use crate::models::{Caller, Inquiry, InquiryStatus, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Who is acting on an inquiry, relative to that inquiry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Buyer,
    Seller,
    Admin,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorRole::Buyer => "buyer",
            ActorRole::Seller => "seller",
            ActorRole::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::Active => "active",
            InquiryStatus::Completed => "completed",
            InquiryStatus::Cancelled => "cancelled",
            InquiryStatus::Reported => "reported",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, InquiryStatus::Active)
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("inquiry is already {0}")]
    AlreadyInState(InquiryStatus),

    #[error("inquiry is {0} and can no longer change")]
    Terminal(InquiryStatus),

    #[error("{role} may not move an inquiry from {from} to {to}")]
    NotAllowed {
        from: InquiryStatus,
        to: InquiryStatus,
        role: ActorRole,
    },
}

use InquiryStatus::{Active, Cancelled, Completed, Reported};

/// (current state, actor) -> states the actor may move the inquiry to
const TRANSITIONS: &[(InquiryStatus, ActorRole, &[InquiryStatus])] = &[
    (Active, ActorRole::Seller, &[Completed, Cancelled, Reported]),
    (Active, ActorRole::Admin, &[Completed, Cancelled, Reported]),
    (Active, ActorRole::Buyer, &[Reported]),
];

pub fn allowed_transitions(from: InquiryStatus, role: ActorRole) -> &'static [InquiryStatus] {
    TRANSITIONS
        .iter()
        .find(|(state, actor, _)| *state == from && *actor == role)
        .map(|(_, _, next)| *next)
        .unwrap_or(&[])
}

/// Validate a single step of the state machine and return the new state
pub fn transition(
    from: InquiryStatus,
    to: InquiryStatus,
    role: ActorRole,
) -> Result<InquiryStatus, TransitionError> {
    if from == to {
        return Err(TransitionError::AlreadyInState(from));
    }
    if from.is_terminal() {
        return Err(TransitionError::Terminal(from));
    }
    if !allowed_transitions(from, role).contains(&to) {
        return Err(TransitionError::NotAllowed { from, to, role });
    }
    Ok(to)
}

/// Role of `caller` on `inquiry`, `None` for people outside the conversation
pub fn role_of(caller: &Caller, inquiry: &Inquiry) -> Option<ActorRole> {
    if caller.role == Role::Admin {
        Some(ActorRole::Admin)
    } else if caller.uid == inquiry.seller_id {
        Some(ActorRole::Seller)
    } else if caller.uid == inquiry.buyer_id {
        Some(ActorRole::Buyer)
    } else {
        None
    }
}

/// Move `inquiry` to `to` in place
pub fn apply_transition(
    inquiry: &mut Inquiry,
    to: InquiryStatus,
    role: ActorRole,
    at: DateTime<Utc>,
) -> Result<(), TransitionError> {
    inquiry.status = transition(inquiry.status, to, role)?;
    inquiry.last_activity_at = at;
    Ok(())
}

/// Count a new message on an open inquiry
pub fn record_message(inquiry: &mut Inquiry, at: DateTime<Utc>) -> Result<(), TransitionError> {
    if inquiry.status.is_terminal() {
        return Err(TransitionError::Terminal(inquiry.status));
    }
    inquiry.message_count += 1;
    inquiry.last_activity_at = at;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inquiry() -> Inquiry {
        let now = Utc::now();
        Inquiry {
            id: "inq-1".to_string(),
            item_id: "item-1".to_string(),
            buyer_id: "buyer".to_string(),
            seller_id: "seller".to_string(),
            status: Active,
            message_count: 0,
            last_activity_at: now,
            created_at: now,
        }
    }

    #[test]
    fn seller_can_complete_buyer_cannot() {
        assert_eq!(transition(Active, Completed, ActorRole::Seller), Ok(Completed));
        assert_eq!(
            transition(Active, Completed, ActorRole::Buyer),
            Err(TransitionError::NotAllowed {
                from: Active,
                to: Completed,
                role: ActorRole::Buyer
            })
        );
        assert!(transition(Active, Cancelled, ActorRole::Buyer).is_err());
    }

    #[test]
    fn either_party_can_report() {
        for role in [ActorRole::Buyer, ActorRole::Seller, ActorRole::Admin] {
            assert_eq!(transition(Active, Reported, role), Ok(Reported));
        }
    }

    #[test]
    fn terminal_states_stay_put() {
        for from in [Completed, Cancelled, Reported] {
            for to in [Active, Completed, Cancelled, Reported] {
                if from == to {
                    continue;
                }
                assert_eq!(
                    transition(from, to, ActorRole::Admin),
                    Err(TransitionError::Terminal(from))
                );
            }
            for role in [ActorRole::Buyer, ActorRole::Seller, ActorRole::Admin] {
                assert!(allowed_transitions(from, role).is_empty());
            }
        }
    }

    #[test]
    fn same_state_is_rejected() {
        assert_eq!(
            transition(Active, Active, ActorRole::Seller),
            Err(TransitionError::AlreadyInState(Active))
        );
    }

    #[test]
    fn roles_are_relative_to_the_inquiry() {
        let inquiry = inquiry();
        assert_eq!(role_of(&Caller::user("seller"), &inquiry), Some(ActorRole::Seller));
        assert_eq!(role_of(&Caller::user("buyer"), &inquiry), Some(ActorRole::Buyer));
        assert_eq!(role_of(&Caller::admin("ops"), &inquiry), Some(ActorRole::Admin));
        assert_eq!(role_of(&Caller::user("stranger"), &inquiry), None);
    }

    #[test]
    fn messages_only_on_open_inquiries() {
        let mut inquiry = inquiry();
        let later = inquiry.created_at + chrono::Duration::minutes(5);
        record_message(&mut inquiry, later).unwrap();
        assert_eq!(inquiry.message_count, 1);
        assert_eq!(inquiry.last_activity_at, later);

        apply_transition(&mut inquiry, Completed, ActorRole::Seller, later).unwrap();
        assert_eq!(
            record_message(&mut inquiry, later),
            Err(TransitionError::Terminal(Completed))
        );
        assert_eq!(inquiry.message_count, 1);
    }
}
