//! Trading-card-game tournament engine: stages, pairings, results and standings.

pub mod config;
pub mod export;
pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    add_match, add_stage, advance_to_next_stage, available_ranking_criteria, available_strategies,
    can_create_round_in_current_stage, can_modify_seeding, can_start_next_stage, close_registration,
    create_initial_stage, create_playoff_stage, create_round, create_tournament, current_stage,
    drop_player, get_pairing_strategy, get_ranking_criterion, get_stage_standings,
    get_stage_standings_with_rng, get_tournament_standings, next_stage, prepare_next_stage_seeding, randomize_seeding,
    register_player, report_result, report_self_scheduled_result, start_tournament,
    tournament_phase, undrop_player, update_seeding_order, PairingStrategy, RankingCriterion,
    Scores, StandingRecord, TournamentStanding,
};
pub use models::{
    GameMatch, MatchId, MatchResult, Player, PlayerId, PlayerStatus, Round, RoundId,
    ScoreReporting, Stage, StageConfig, StageId, StagePlayer, StagePlayerId, Tournament,
    TournamentError, TournamentId, TournamentPhase,
};
pub use store::{MatchHistory, MemoryStore, TournamentStore};
