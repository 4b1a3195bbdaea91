//! Match (game), its result, and the round that holds them.

use crate::models::player::StagePlayerId;
use crate::models::stage::StageId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a round.
pub type RoundId = Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One cycle of matches within a stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub stage_id: StageId,
    pub order: u32,
    pub created_on: DateTime<Utc>,
    /// Copied from the stage when the round is created.
    pub round_length_in_minutes: Option<u32>,
}

impl Round {
    pub fn new(stage_id: StageId, order: u32, round_length_in_minutes: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_id,
            order,
            created_on: Utc::now(),
            round_length_in_minutes,
        }
    }

    /// When the round's clock runs out, if the round is timed.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.round_length_in_minutes
            .map(|minutes| self.created_on + Duration::minutes(i64::from(minutes)))
    }
}

/// A single match. `player_two == None` is a bye.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub round_id: RoundId,
    pub player_one: StagePlayerId,
    pub player_two: Option<StagePlayerId>,
    pub created_on: DateTime<Utc>,
}

impl GameMatch {
    pub fn new(round_id: RoundId, player_one: StagePlayerId, player_two: Option<StagePlayerId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            round_id,
            player_one,
            player_two,
            created_on: Utc::now(),
        }
    }

    pub fn bye(round_id: RoundId, player: StagePlayerId) -> Self {
        Self::new(round_id, player, None)
    }

    pub fn is_bye(&self) -> bool {
        self.player_two.is_none()
    }

    pub fn involves(&self, player: StagePlayerId) -> bool {
        self.player_one == player || self.player_two == Some(player)
    }

    /// The other participant, or `None` for a bye or a non-participant.
    pub fn opponent_of(&self, player: StagePlayerId) -> Option<StagePlayerId> {
        if self.player_one == player {
            self.player_two
        } else if self.player_two == Some(player) {
            Some(self.player_one)
        } else {
            None
        }
    }
}

/// The outcome of a match. `winner == None` is a tie.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub winner: Option<StagePlayerId>,
    pub player_one_score: Option<u32>,
    pub player_two_score: Option<u32>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl MatchResult {
    pub fn new(match_id: MatchId, winner: Option<StagePlayerId>) -> Self {
        let now = Utc::now();
        Self {
            match_id,
            winner,
            player_one_score: None,
            player_two_score: None,
            created_on: now,
            updated_on: now,
        }
    }

    pub fn with_scores(mut self, player_one_score: Option<u32>, player_two_score: Option<u32>) -> Self {
        self.player_one_score = player_one_score;
        self.player_two_score = player_two_score;
        self
    }

    pub fn is_tie(&self) -> bool {
        self.winner.is_none()
    }
}
