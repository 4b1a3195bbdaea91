//! Result reporting and manually created matches.

use crate::logic::lifecycle::current_stage;
use crate::models::{
    GameMatch, MatchId, MatchResult, RoundId, ScoreReporting, Stage, StageId, StagePlayerId,
    TournamentError,
};
use crate::store::TournamentStore;

/// Reported game scores, `(player_one, player_two)` in the match's orientation.
pub type Scores = (u32, u32);

/// Record (or overwrite) the result of a match. `winner == None` is a tie.
pub fn report_result<S>(
    store: &mut S,
    match_id: MatchId,
    winner: Option<StagePlayerId>,
    scores: Option<Scores>,
) -> Result<MatchResult, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let game = store.get_match(match_id)?;
    let round = store.get_round(game.round_id)?;
    let stage = store.get_stage(round.stage_id)?;
    if game.is_bye() {
        return Err(TournamentError::invalid_result("bye matches are resolved automatically"));
    }
    let result = build_result(&stage, &game, winner, scores)?;

    let replaced = store.match_result(match_id).is_some();
    let saved = store.save_result(result)?;
    log::info!(
        "{} result for match {} in round {} of {}",
        if replaced { "Updated" } else { "Reported" },
        match_id,
        round.order,
        stage.name
    );
    Ok(saved)
}

/// Validate winner and scores against the stage's rules and build the result row.
fn build_result(
    stage: &Stage,
    game: &GameMatch,
    winner: Option<StagePlayerId>,
    scores: Option<Scores>,
) -> Result<MatchResult, TournamentError> {
    match winner {
        Some(w) if !game.involves(w) => {
            return Err(TournamentError::invalid_result("winner did not play in this match"));
        }
        None if !stage.are_ties_allowed => {
            return Err(TournamentError::invalid_result(format!(
                "ties are not allowed in {}",
                stage.name
            )));
        }
        _ => {}
    }
    let scores = match stage.score_reporting {
        ScoreReporting::Disabled => None,
        ScoreReporting::Optional => scores,
        ScoreReporting::Required => Some(scores.ok_or_else(|| {
            TournamentError::invalid_result(format!("scores are required in {}", stage.name))
        })?),
    };
    Ok(MatchResult::new(game.id, winner).with_scores(scores.map(|s| s.0), scores.map(|s| s.1)))
}

/// Create a match in `round_id` by hand. Both players must be active members of the round's
/// stage and not yet matched in that round.
pub fn add_match<S>(
    store: &mut S,
    round_id: RoundId,
    player_one: StagePlayerId,
    player_two: StagePlayerId,
) -> Result<GameMatch, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let round = store.get_round(round_id)?;
    if player_one == player_two {
        return Err(TournamentError::constraint("a player cannot play themselves"));
    }
    for id in [player_one, player_two] {
        check_active_member(&*store, round.stage_id, id)?;
    }
    let busy = store
        .round_matches(round_id)
        .iter()
        .any(|m| m.involves(player_one) || m.involves(player_two));
    if busy {
        return Err(TournamentError::constraint(format!(
            "a player already has a match in round {}",
            round.order
        )));
    }

    let game = GameMatch::new(round_id, player_one, Some(player_two));
    store.insert_match(game.clone())?;
    log::info!("Added match {} to round {}", game.id, round.order);
    Ok(game)
}

/// A player of a self-scheduled stage reports a game they played: the match is created in
/// the stage's current round with `reporter` as player one, together with its result.
pub fn report_self_scheduled_result<S>(
    store: &mut S,
    stage_id: StageId,
    reporter: StagePlayerId,
    opponent: StagePlayerId,
    winner: Option<StagePlayerId>,
    scores: Option<Scores>,
) -> Result<MatchResult, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let stage = store.get_stage(stage_id)?;
    if !stage.pairing_strategy.is_self_scheduled() {
        return Err(TournamentError::invalid_transition(format!(
            "players do not schedule their own matches in {}",
            stage.name
        )));
    }
    let is_current = current_stage(&*store, stage.tournament_id)?.map_or(false, |s| s.id == stage.id);
    let Some(round) = store.current_round(stage_id).filter(|_| is_current) else {
        return Err(TournamentError::invalid_transition(format!(
            "{} is not open for play",
            stage.name
        )));
    };
    if reporter == opponent {
        return Err(TournamentError::constraint("a player cannot play themselves"));
    }
    for id in [reporter, opponent] {
        check_active_member(&*store, stage_id, id)?;
    }
    let rematch = store
        .round_matches(round.id)
        .iter()
        .any(|m| m.involves(reporter) && m.involves(opponent));
    if rematch {
        return Err(TournamentError::constraint("these players already have a match in this round"));
    }

    let game = GameMatch::new(round.id, reporter, Some(opponent));
    let result = build_result(&stage, &game, winner, scores)?;
    store.insert_match(game)?;
    let saved = store.save_result(result)?;
    log::info!("Self-scheduled result reported in round {} of {}", round.order, stage.name);
    Ok(saved)
}

fn check_active_member<S>(store: &S, stage_id: StageId, id: StagePlayerId) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let entry = store.get_stage_player(id)?;
    if entry.stage_id != stage_id {
        return Err(TournamentError::constraint("player is not in this stage"));
    }
    let player = store.get_player(entry.player_id)?;
    if !player.is_active() {
        return Err(TournamentError::invalid_transition(format!("{} has dropped", player.name)));
    }
    Ok(())
}
