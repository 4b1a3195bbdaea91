//! In-memory store. Rows live in insertion-ordered vectors so iteration is deterministic.

use crate::models::{
    GameMatch, MatchId, MatchResult, Player, PlayerId, Round, RoundId, Stage, StageId,
    StagePlayer, StagePlayerId, Tournament, TournamentError, TournamentId,
};
use crate::store::{MatchHistory, TournamentStore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    tournaments: Vec<Tournament>,
    players: Vec<Player>,
    stages: Vec<Stage>,
    stage_players: Vec<StagePlayer>,
    rounds: Vec<Round>,
    matches: Vec<GameMatch>,
    results: Vec<MatchResult>,
}

fn not_found(entity: &'static str, id: uuid::Uuid) -> TournamentError {
    TournamentError::NotFound { entity, id }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_seed_free(&self, stage_player: &StagePlayer) -> Result<(), TournamentError> {
        let taken = self.stage_players.iter().any(|sp| {
            sp.id != stage_player.id
                && sp.stage_id == stage_player.stage_id
                && sp.seed == stage_player.seed
        });
        if taken {
            return Err(TournamentError::constraint(format!(
                "seed {} already used in stage",
                stage_player.seed
            )));
        }
        Ok(())
    }
}

impl MatchHistory for MemoryStore {
    fn get_stage(&self, id: StageId) -> Result<Stage, TournamentError> {
        self.stages
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(not_found("stage", id))
    }

    fn get_player(&self, id: PlayerId) -> Result<Player, TournamentError> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(not_found("player", id))
    }

    fn get_stage_player(&self, id: StagePlayerId) -> Result<StagePlayer, TournamentError> {
        self.stage_players
            .iter()
            .find(|sp| sp.id == id)
            .cloned()
            .ok_or(not_found("stage player", id))
    }

    fn get_round(&self, id: RoundId) -> Result<Round, TournamentError> {
        self.rounds
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(not_found("round", id))
    }

    fn get_match(&self, id: MatchId) -> Result<GameMatch, TournamentError> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(not_found("match", id))
    }

    fn stage_players(&self, stage_id: StageId) -> Vec<StagePlayer> {
        let mut players: Vec<_> = self
            .stage_players
            .iter()
            .filter(|sp| sp.stage_id == stage_id)
            .cloned()
            .collect();
        players.sort_by_key(|sp| sp.seed);
        players
    }

    fn stage_rounds(&self, stage_id: StageId) -> Vec<Round> {
        let mut rounds: Vec<_> = self
            .rounds
            .iter()
            .filter(|r| r.stage_id == stage_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| r.order);
        rounds
    }

    fn round_matches(&self, round_id: RoundId) -> Vec<GameMatch> {
        self.matches
            .iter()
            .filter(|m| m.round_id == round_id)
            .cloned()
            .collect()
    }

    fn match_result(&self, match_id: MatchId) -> Option<MatchResult> {
        self.results.iter().find(|r| r.match_id == match_id).cloned()
    }
}

impl TournamentStore for MemoryStore {
    fn insert_tournament(&mut self, tournament: Tournament) -> Result<(), TournamentError> {
        if self.tournaments.iter().any(|t| t.id == tournament.id) {
            return Err(TournamentError::constraint("tournament already exists"));
        }
        self.tournaments.push(tournament);
        Ok(())
    }

    fn get_tournament(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.tournaments
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(not_found("tournament", id))
    }

    fn update_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError> {
        let row = self
            .tournaments
            .iter_mut()
            .find(|t| t.id == tournament.id)
            .ok_or(not_found("tournament", tournament.id))?;
        *row = tournament.clone();
        Ok(())
    }

    fn insert_player(&mut self, player: Player) -> Result<(), TournamentError> {
        self.get_tournament(player.tournament_id)?;
        let duplicate = self.players.iter().any(|p| {
            p.id == player.id
                || (p.tournament_id == player.tournament_id && p.name.eq_ignore_ascii_case(&player.name))
        });
        if duplicate {
            return Err(TournamentError::constraint(format!(
                "player {} already registered",
                player.name
            )));
        }
        self.players.push(player);
        Ok(())
    }

    fn update_player(&mut self, player: &Player) -> Result<(), TournamentError> {
        let row = self
            .players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or(not_found("player", player.id))?;
        *row = player.clone();
        Ok(())
    }

    fn tournament_players(&self, tournament_id: TournamentId) -> Vec<Player> {
        self.players
            .iter()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect()
    }

    fn insert_stage(&mut self, stage: Stage) -> Result<(), TournamentError> {
        self.get_tournament(stage.tournament_id)?;
        let duplicate = self
            .stages
            .iter()
            .any(|s| s.tournament_id == stage.tournament_id && s.order == stage.order);
        if duplicate {
            return Err(TournamentError::constraint(format!(
                "stage order {} already exists",
                stage.order
            )));
        }
        self.stages.push(stage);
        Ok(())
    }

    fn update_stage(&mut self, stage: &Stage) -> Result<(), TournamentError> {
        let clash = self.stages.iter().any(|s| {
            s.id != stage.id && s.tournament_id == stage.tournament_id && s.order == stage.order
        });
        if clash {
            return Err(TournamentError::constraint(format!(
                "stage order {} already exists",
                stage.order
            )));
        }
        let row = self
            .stages
            .iter_mut()
            .find(|s| s.id == stage.id)
            .ok_or(not_found("stage", stage.id))?;
        *row = stage.clone();
        Ok(())
    }

    fn tournament_stages(&self, tournament_id: TournamentId) -> Vec<Stage> {
        let mut stages: Vec<_> = self
            .stages
            .iter()
            .filter(|s| s.tournament_id == tournament_id)
            .cloned()
            .collect();
        stages.sort_by_key(|s| s.order);
        stages
    }

    fn insert_stage_player(&mut self, stage_player: StagePlayer) -> Result<(), TournamentError> {
        self.get_stage(stage_player.stage_id)?;
        self.get_player(stage_player.player_id)?;
        let duplicate = self.stage_players.iter().any(|sp| {
            sp.stage_id == stage_player.stage_id && sp.player_id == stage_player.player_id
        });
        if duplicate {
            return Err(TournamentError::constraint("player already in stage"));
        }
        self.check_seed_free(&stage_player)?;
        self.stage_players.push(stage_player);
        Ok(())
    }

    fn update_stage_player(&mut self, stage_player: &StagePlayer) -> Result<(), TournamentError> {
        self.check_seed_free(stage_player)?;
        let row = self
            .stage_players
            .iter_mut()
            .find(|sp| sp.id == stage_player.id)
            .ok_or(not_found("stage player", stage_player.id))?;
        *row = stage_player.clone();
        Ok(())
    }

    fn delete_stage_player(&mut self, id: StagePlayerId) -> Result<(), TournamentError> {
        let in_match = self
            .matches
            .iter()
            .any(|m| m.player_one == id || m.player_two == Some(id));
        if in_match {
            return Err(TournamentError::constraint("stage player has matches"));
        }
        let before = self.stage_players.len();
        self.stage_players.retain(|sp| sp.id != id);
        if self.stage_players.len() == before {
            return Err(not_found("stage player", id));
        }
        Ok(())
    }

    fn player_stage_entries(&self, player_id: PlayerId) -> Vec<StagePlayer> {
        self.stage_players
            .iter()
            .filter(|sp| sp.player_id == player_id)
            .cloned()
            .collect()
    }

    fn insert_round(&mut self, round: Round) -> Result<(), TournamentError> {
        self.get_stage(round.stage_id)?;
        let duplicate = self
            .rounds
            .iter()
            .any(|r| r.stage_id == round.stage_id && r.order == round.order);
        if duplicate {
            return Err(TournamentError::constraint(format!(
                "round {} already exists in stage",
                round.order
            )));
        }
        self.rounds.push(round);
        Ok(())
    }

    fn insert_match(&mut self, game: GameMatch) -> Result<(), TournamentError> {
        let round = self.get_round(game.round_id)?;
        for sp in std::iter::once(game.player_one).chain(game.player_two) {
            if self.get_stage_player(sp)?.stage_id != round.stage_id {
                return Err(TournamentError::constraint("match player is not in the round's stage"));
            }
        }
        if game.player_two == Some(game.player_one) {
            return Err(TournamentError::constraint("a player cannot play themselves"));
        }
        self.matches.push(game);
        Ok(())
    }

    fn save_result(&mut self, result: MatchResult) -> Result<MatchResult, TournamentError> {
        self.get_match(result.match_id)?;
        match self.results.iter_mut().find(|r| r.match_id == result.match_id) {
            Some(existing) => {
                existing.winner = result.winner;
                existing.player_one_score = result.player_one_score;
                existing.player_two_score = result.player_two_score;
                existing.updated_on = result.updated_on;
                Ok(existing.clone())
            }
            None => {
                self.results.push(result.clone());
                Ok(result)
            }
        }
    }
}
