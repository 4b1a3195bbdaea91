//! Player registration, dropping and re-joining.

use crate::logic::lifecycle::current_stage;
use crate::models::{
    MatchResult, Player, PlayerId, PlayerStatus, StagePlayer, TournamentError, TournamentId,
};
use crate::store::TournamentStore;

/// Register a player. If the tournament already has a stage, the player also joins the
/// current stage with the next free seed.
pub fn register_player<S>(
    store: &mut S,
    tournament_id: TournamentId,
    name: &str,
) -> Result<Player, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let tournament = store.get_tournament(tournament_id)?;
    if !tournament.is_accepting_registrations {
        return Err(TournamentError::invalid_transition(format!(
            "{} is not accepting registrations",
            tournament.name
        )));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::constraint("player name must not be empty"));
    }

    let player = Player::new(tournament_id, name);
    store.insert_player(player.clone())?;
    if let Some(stage) = current_stage(&*store, tournament_id)? {
        let seed = store.stage_players(stage.id).iter().map(|sp| sp.seed).max().unwrap_or(0) + 1;
        store.insert_stage_player(StagePlayer::new(player.id, stage.id, seed))?;
    }
    log::info!("Registered player {} in tournament {}", player.name, tournament_id);
    Ok(player)
}

/// Drop a player. Their unresolved matches in the current round are awarded to the opponent.
pub fn drop_player<S>(store: &mut S, player_id: PlayerId) -> Result<Player, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut player = store.get_player(player_id)?;
    if !player.is_active() {
        return Err(TournamentError::invalid_transition(format!(
            "{} is already dropped",
            player.name
        )));
    }
    player.status = PlayerStatus::Dropped;
    store.update_player(&player)?;

    let mut awarded = 0;
    if let Some(stage) = current_stage(&*store, player.tournament_id)? {
        let entry = store.stage_players(stage.id).into_iter().find(|sp| sp.player_id == player.id);
        if let (Some(entry), Some(round)) = (entry, store.current_round(stage.id)) {
            for game in store.round_matches(round.id) {
                if store.match_result(game.id).is_some() {
                    continue;
                }
                if let Some(opponent) = game.opponent_of(entry.id) {
                    store.save_result(MatchResult::new(game.id, Some(opponent)))?;
                    awarded += 1;
                }
            }
        }
    }
    log::info!(
        "Dropped player {}; {} open match(es) awarded to opponents",
        player.name,
        awarded
    );
    Ok(player)
}

/// Reactivate a dropped player. Matches awarded while they were dropped stay as they are.
pub fn undrop_player<S>(store: &mut S, player_id: PlayerId) -> Result<Player, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut player = store.get_player(player_id)?;
    if player.is_active() {
        return Err(TournamentError::invalid_transition(format!(
            "{} is already active",
            player.name
        )));
    }
    player.status = PlayerStatus::Active;
    store.update_player(&player)?;
    log::info!("Undropped player {}", player.name);
    Ok(player)
}

pub fn close_registration<S>(store: &mut S, tournament_id: TournamentId) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut tournament = store.get_tournament(tournament_id)?;
    tournament.is_accepting_registrations = false;
    store.update_tournament(&tournament)?;
    log::info!("Closed registration for tournament {}", tournament.name);
    Ok(())
}
