//! Tournament, TournamentPhase, and the engine-wide error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
///
/// The engine never swallows these; callers receive them as raised.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    /// A pairing strategy or ranking criterion key that is not registered.
    #[error("Unknown pairing strategy or ranking criterion: {0}")]
    UnknownStrategy(String),
    /// Round creation or stage advancement requested while its precondition is false.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    /// A reported result is not acceptable for the match or its stage.
    #[error("Invalid result: {0}")]
    InvalidResult(String),
    /// A uniqueness invariant would be broken (stage order, round order, seed, ...).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    /// No record with this id exists in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
}

impl TournamentError {
    pub(crate) fn invalid_transition(msg: impl Into<String>) -> Self {
        TournamentError::InvalidTransition(msg.into())
    }

    pub(crate) fn invalid_result(msg: impl Into<String>) -> Self {
        TournamentError::InvalidResult(msg.into())
    }

    pub(crate) fn constraint(msg: impl Into<String>) -> Self {
        TournamentError::ConstraintViolation(msg.into())
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Where a tournament is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TournamentPhase {
    /// No stage has a round yet.
    Registering,
    /// The stage with this order is being played.
    StageActive { order: u32 },
    /// The last stage is complete.
    Complete,
}

/// A tournament: owns its stages and players (through the store).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    /// Free-form owner reference (user name or id in the surrounding app).
    pub owner: Option<String>,
    pub is_accepting_registrations: bool,
    pub created_on: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament that accepts registrations.
    pub fn new(name: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            owner,
            is_accepting_registrations: true,
            created_on: Utc::now(),
        }
    }
}
