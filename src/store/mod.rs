//! Persistence seam: the engine reads and writes entities only through these traits.
//!
//! [`MatchHistory`] is the narrow read side used by the standings calculator and the
//! pairing strategies. [`TournamentStore`] adds the writes and enforces the
//! uniqueness invariants of the data model.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    GameMatch, MatchId, MatchResult, Player, PlayerId, Round, RoundId, Stage, StageId,
    StagePlayer, StagePlayerId, Tournament, TournamentError, TournamentId,
};

/// A match of a stage together with its (optional) result.
#[derive(Clone, Debug)]
pub struct MatchRecord {
    pub game: GameMatch,
    pub result: Option<MatchResult>,
}

impl MatchRecord {
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }
}

/// Read-only view of a stage's players, rounds, matches and results.
pub trait MatchHistory {
    fn get_stage(&self, id: StageId) -> Result<Stage, TournamentError>;
    fn get_player(&self, id: PlayerId) -> Result<Player, TournamentError>;
    fn get_stage_player(&self, id: StagePlayerId) -> Result<StagePlayer, TournamentError>;
    fn get_round(&self, id: RoundId) -> Result<Round, TournamentError>;
    fn get_match(&self, id: MatchId) -> Result<GameMatch, TournamentError>;

    /// Stage players ordered by seed.
    fn stage_players(&self, stage_id: StageId) -> Vec<StagePlayer>;
    /// Rounds ordered by `order`.
    fn stage_rounds(&self, stage_id: StageId) -> Vec<Round>;
    /// Matches in creation order.
    fn round_matches(&self, round_id: RoundId) -> Vec<GameMatch>;
    fn match_result(&self, match_id: MatchId) -> Option<MatchResult>;

    /// Stage players whose tournament player is still active, in seed order.
    fn active_stage_players(&self, stage_id: StageId) -> Result<Vec<StagePlayer>, TournamentError> {
        let mut active = Vec::new();
        for sp in self.stage_players(stage_id) {
            if self.get_player(sp.player_id)?.is_active() {
                active.push(sp);
            }
        }
        Ok(active)
    }

    /// The highest-order round of the stage.
    fn current_round(&self, stage_id: StageId) -> Option<Round> {
        self.stage_rounds(stage_id).pop()
    }

    fn is_round_complete(&self, round_id: RoundId) -> bool {
        self.round_matches(round_id)
            .iter()
            .all(|m| self.match_result(m.id).is_some())
    }

    /// A stage is complete when it has rounds and every one of them is complete.
    fn is_stage_complete(&self, stage_id: StageId) -> bool {
        let rounds = self.stage_rounds(stage_id);
        !rounds.is_empty() && rounds.iter().all(|r| self.is_round_complete(r.id))
    }

    /// Every match of the stage, by round order then creation order.
    fn stage_match_records(&self, stage_id: StageId) -> Vec<MatchRecord> {
        self.stage_rounds(stage_id)
            .into_iter()
            .flat_map(|round| self.round_matches(round.id))
            .map(|game| MatchRecord {
                result: self.match_result(game.id),
                game,
            })
            .collect()
    }
}

/// Create/query/update access to all engine entities.
///
/// Implementations must reject duplicates with [`TournamentError::ConstraintViolation`]:
/// `(tournament, stage order)`, `(stage, round order)`, `(player, stage)` and
/// `(stage, seed)`. `save_result` replaces an existing result for the same match.
pub trait TournamentStore: MatchHistory {
    fn insert_tournament(&mut self, tournament: Tournament) -> Result<(), TournamentError>;
    fn get_tournament(&self, id: TournamentId) -> Result<Tournament, TournamentError>;
    fn update_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError>;

    fn insert_player(&mut self, player: Player) -> Result<(), TournamentError>;
    fn update_player(&mut self, player: &Player) -> Result<(), TournamentError>;
    /// Players in registration order.
    fn tournament_players(&self, tournament_id: TournamentId) -> Vec<Player>;

    fn insert_stage(&mut self, stage: Stage) -> Result<(), TournamentError>;
    fn update_stage(&mut self, stage: &Stage) -> Result<(), TournamentError>;
    /// Stages ordered by `order`.
    fn tournament_stages(&self, tournament_id: TournamentId) -> Vec<Stage>;

    fn insert_stage_player(&mut self, stage_player: StagePlayer) -> Result<(), TournamentError>;
    fn update_stage_player(&mut self, stage_player: &StagePlayer) -> Result<(), TournamentError>;
    fn delete_stage_player(&mut self, id: StagePlayerId) -> Result<(), TournamentError>;
    /// Every stage entry of a tournament player.
    fn player_stage_entries(&self, player_id: PlayerId) -> Vec<StagePlayer>;

    fn insert_round(&mut self, round: Round) -> Result<(), TournamentError>;
    fn insert_match(&mut self, game: GameMatch) -> Result<(), TournamentError>;
    /// Insert or overwrite the single result of a match; returns the stored row.
    fn save_result(&mut self, result: MatchResult) -> Result<MatchResult, TournamentError>;
}
