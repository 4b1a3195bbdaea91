//! Tournament engine: pairing strategies, standings, and the stage lifecycle.

pub mod criteria;
pub mod lifecycle;
pub mod pairing;
pub mod registration;
pub mod results;
pub mod seeding;
pub mod standings;

pub use criteria::{available_ranking_criteria, get_ranking_criterion, RankingCriterion};
pub use lifecycle::{
    add_stage, advance_to_next_stage, can_create_round_in_current_stage, can_start_next_stage,
    create_initial_stage, create_playoff_stage, create_round, create_tournament, current_stage,
    next_stage, start_tournament, tournament_phase,
};
pub use pairing::{available_strategies, get_pairing_strategy, PairingStrategy};
pub use registration::{close_registration, drop_player, register_player, undrop_player};
pub use results::{add_match, report_result, report_self_scheduled_result, Scores};
pub use seeding::{
    can_modify_seeding, prepare_next_stage_seeding, randomize_seeding, update_seeding_order,
};
pub use standings::{
    get_stage_standings, get_stage_standings_with_rng, get_tournament_standings, StandingRecord,
    TournamentStanding,
};
