//! Player and StagePlayer data structures.

use crate::models::stage::StageId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament player.
pub type PlayerId = Uuid;

/// Unique identifier for a player's participation in one stage.
pub type StagePlayerId = Uuid;

/// Whether the player is still playing.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Active,
    Dropped,
}

/// A player registered in a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub status: PlayerStatus,
    pub created_on: DateTime<Utc>,
}

impl Player {
    /// Create a new active player with the given name.
    pub fn new(tournament_id: TournamentId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            status: PlayerStatus::Active,
            created_on: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }
}

/// A player's participation record in one stage.
///
/// `seed` is 1 for the best player. `rank` is written when the stage's
/// standings are frozen for advancement.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StagePlayer {
    pub id: StagePlayerId,
    pub player_id: PlayerId,
    pub stage_id: StageId,
    pub seed: u32,
    pub rank: Option<u32>,
    pub group: Option<String>,
}

impl StagePlayer {
    pub fn new(player_id: PlayerId, stage_id: StageId, seed: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            stage_id,
            seed,
            rank: None,
            group: None,
        }
    }
}
