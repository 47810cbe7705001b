//! Two-sided negotiation state for a vendor request.
//!
//! Each request carries one [`NegotiationState`] per party. The pair is a
//! [`StatusPair`]; a request is *booked* when both sides have accepted.
//! The transition functions here decide what an action does to a pair;
//! persisting the result and cleaning up siblings is the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status id type matching SMALLINT in the database.
pub type StatusId = i16;

/// One party's position on a request. Discriminants are the stored ids.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NegotiationState {
    #[default]
    Pending = 1,
    Accepted = 2,
    Rejected = 3,
}

impl NegotiationState {
    /// Return the database status id.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Accepted),
            3 => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl TryFrom<StatusId> for NegotiationState {
    type Error = CoreError;

    fn try_from(value: StatusId) -> Result<Self, Self::Error> {
        Self::from_id(value)
            .ok_or_else(|| CoreError::Internal(format!("Unknown negotiation status id {value}")))
    }
}

impl std::fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The combined state of a request: vendor side and user side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusPair {
    pub vendor: NegotiationState,
    pub user: NegotiationState,
}

impl StatusPair {
    pub fn new(vendor: NegotiationState, user: NegotiationState) -> Self {
        Self { vendor, user }
    }

    /// Both parties have accepted.
    pub fn is_doubly_accepted(&self) -> bool {
        self.vendor == NegotiationState::Accepted && self.user == NegotiationState::Accepted
    }

    /// Still under negotiation (anything short of doubly accepted).
    pub fn is_open(&self) -> bool {
        !self.is_doubly_accepted()
    }
}

/// What a vendor can do with a request addressed to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorAction {
    Accept,
    Reject,
}

impl VendorAction {
    pub fn parse(action: &str) -> Result<Self, CoreError> {
        match action.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(CoreError::Validation(format!(
                "Invalid action '{other}'. Must be one of: accept, reject"
            ))),
        }
    }
}

/// The effect a transition has on the ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Persist the new pair. `books` is true when the pair is doubly
    /// accepted afterwards, which triggers progress seeding and sibling
    /// retraction.
    Update { pair: StatusPair, books: bool },
    /// Delete the ledger entry and its mirrors.
    Remove,
}

impl Effect {
    fn update(pair: StatusPair) -> Self {
        Self::Update {
            pair,
            books: pair.is_doubly_accepted(),
        }
    }
}

fn booked_conflict() -> CoreError {
    CoreError::Conflict("Request is already booked by both parties".to_string())
}

/// Decide the effect of a vendor's response.
///
/// Rejecting removes the request outright. Accepting a booked request
/// again is a no-op update; rejecting one is refused.
pub fn vendor_transition(current: StatusPair, action: VendorAction) -> Result<Effect, CoreError> {
    match action {
        VendorAction::Accept => Ok(Effect::update(StatusPair {
            vendor: NegotiationState::Accepted,
            ..current
        })),
        VendorAction::Reject if current.is_doubly_accepted() => Err(booked_conflict()),
        VendorAction::Reject => Ok(Effect::Remove),
    }
}

/// Decide the effect of the requesting user's answer to an offer.
pub fn user_transition(current: StatusPair, accept: bool) -> Result<Effect, CoreError> {
    if accept {
        Ok(Effect::update(StatusPair {
            user: NegotiationState::Accepted,
            ..current
        }))
    } else if current.is_doubly_accepted() {
        Err(booked_conflict())
    } else {
        Ok(Effect::Remove)
    }
}

/// Listing filter over the negotiation state of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceFilter {
    #[default]
    Any,
    /// Not yet doubly accepted.
    Open,
    /// Doubly accepted only.
    Booked,
}

impl AcceptanceFilter {
    pub fn matches(self, pair: StatusPair) -> bool {
        match self {
            Self::Any => true,
            Self::Open => pair.is_open(),
            Self::Booked => pair.is_doubly_accepted(),
        }
    }
}
