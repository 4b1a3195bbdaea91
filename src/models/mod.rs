//! Data structures for the tournament engine: tournaments, stages, rounds, matches, players.

mod game;
mod player;
mod stage;
mod tournament;

pub use game::{GameMatch, MatchId, MatchResult, Round, RoundId};
pub use player::{Player, PlayerId, PlayerStatus, StagePlayer, StagePlayerId};
pub use stage::{ScoreReporting, Stage, StageConfig, StageId};
pub use tournament::{Tournament, TournamentError, TournamentId, TournamentPhase};
