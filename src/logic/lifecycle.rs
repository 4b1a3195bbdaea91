//! Tournament and stage lifecycle: which stage is current, creating rounds,
//! starting the tournament and advancing from one stage to the next.

use crate::logic::standings::get_stage_standings;
use crate::models::{
    Player, Round, Stage, StageConfig, StageId, StagePlayer, Tournament, TournamentError,
    TournamentId, TournamentPhase,
};
use crate::store::TournamentStore;
use rand::RngCore;

/// Player cap for a playoff stage created without an explicit one.
pub const DEFAULT_PLAYOFF_PLAYERS: u32 = 8;

/// The highest-order stage that has a round, or the first stage if none has started.
pub fn current_stage<S>(store: &S, tournament_id: TournamentId) -> Result<Option<Stage>, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    store.get_tournament(tournament_id)?;
    let stages = store.tournament_stages(tournament_id);
    let started = stages
        .iter()
        .rev()
        .find(|s| !store.stage_rounds(s.id).is_empty())
        .cloned();
    Ok(started.or_else(|| stages.into_iter().next()))
}

/// The stage following the current one, if any.
pub fn next_stage<S>(store: &S, tournament_id: TournamentId) -> Result<Option<Stage>, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(current) = current_stage(store, tournament_id)? else {
        return Ok(None);
    };
    Ok(store
        .tournament_stages(tournament_id)
        .into_iter()
        .find(|s| s.order > current.order))
}

pub fn create_tournament<S>(
    store: &mut S,
    name: &str,
    owner: Option<String>,
) -> Result<Tournament, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(TournamentError::constraint("tournament name must not be empty"));
    }
    let tournament = Tournament::new(name, owner);
    store.insert_tournament(tournament.clone())?;
    log::info!("Created tournament {} ({})", tournament.name, tournament.id);
    Ok(tournament)
}

/// Add a stage built from `config`. The stage's tie-break seed is drawn from `rng`.
pub fn add_stage<S>(
    store: &mut S,
    tournament_id: TournamentId,
    config: StageConfig,
    rng: &mut dyn RngCore,
) -> Result<Stage, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    store.get_tournament(tournament_id)?;
    let stage = config.build(tournament_id, rng.next_u64())?;
    store.insert_stage(stage.clone())?;
    log::info!(
        "Added stage {} (order {}, {}) to tournament {}",
        stage.name,
        stage.order,
        stage.pairing_strategy.key(),
        tournament_id
    );
    Ok(stage)
}

/// Create the order-1 stage and seed every active player in registration order.
pub fn create_initial_stage<S>(
    store: &mut S,
    tournament_id: TournamentId,
    pairing_strategy: &str,
    rng: &mut dyn RngCore,
) -> Result<Stage, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let stage = add_stage(
        store,
        tournament_id,
        StageConfig::new("Main Stage", 1, pairing_strategy),
        rng,
    )?;
    seed_active_players(store, &stage)?;
    Ok(stage)
}

/// Create the order-2 single elimination stage. Ties are never allowed in playoffs.
pub fn create_playoff_stage<S>(
    store: &mut S,
    tournament_id: TournamentId,
    max_players: Option<u32>,
    rng: &mut dyn RngCore,
) -> Result<Stage, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let config = StageConfig::new("Playoffs", 2, "single_elimination")
        .max_players(max_players.unwrap_or(DEFAULT_PLAYOFF_PLAYERS))
        .ties_allowed(false);
    add_stage(store, tournament_id, config, rng)
}

/// Add every active tournament player not yet in `stage`, continuing after the highest seed.
pub(crate) fn seed_active_players<S>(store: &mut S, stage: &Stage) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let existing = store.stage_players(stage.id);
    let mut next_seed = existing.iter().map(|sp| sp.seed).max().unwrap_or(0) + 1;
    let players: Vec<Player> = store
        .tournament_players(stage.tournament_id)
        .into_iter()
        .filter(|p| p.is_active() && !existing.iter().any(|sp| sp.player_id == p.id))
        .collect();
    for player in players {
        store.insert_stage_player(StagePlayer::new(player.id, stage.id, next_seed))?;
        next_seed += 1;
    }
    Ok(())
}

/// Create the next round of `stage` and pair it.
///
/// Fails with [`TournamentError::InvalidTransition`] when the stage's strategy does not
/// allow another round yet.
pub fn create_round<S>(store: &mut S, stage_id: StageId, rng: &mut dyn RngCore) -> Result<Round, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let stage = store.get_stage(stage_id)?;
    if !stage.pairing_strategy.can_create_new_round(&*store, stage_id)? {
        return Err(TournamentError::invalid_transition(format!(
            "cannot create a new round in stage {}",
            stage.name
        )));
    }
    let order = store.current_round(stage_id).map_or(1, |r| r.order + 1);
    open_round(store, &stage, order, rng)
}

/// Insert round `order` and let the strategy pair it. The store rejects a duplicate order.
fn open_round<S>(store: &mut S, stage: &Stage, order: u32, rng: &mut dyn RngCore) -> Result<Round, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let round = Round::new(stage.id, order, stage.round_length_in_minutes);
    store.insert_round(round.clone())?;
    stage.pairing_strategy.make_pairings_for_round(store, &round, rng)?;
    log::info!(
        "Created round {} of stage {} with {} matches",
        round.order,
        stage.name,
        store.round_matches(round.id).len()
    );
    Ok(round)
}

/// Whether the tournament's current stage accepts another round right now.
pub fn can_create_round_in_current_stage<S>(store: &S, tournament_id: TournamentId) -> Result<bool, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    match current_stage(store, tournament_id)? {
        Some(stage) => stage.pairing_strategy.can_create_new_round(store, stage.id),
        None => Ok(false),
    }
}

/// Create round 1 of the first stage and close registration if its strategy says so.
pub fn start_tournament<S>(
    store: &mut S,
    tournament_id: TournamentId,
    rng: &mut dyn RngCore,
) -> Result<Round, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(stage) = current_stage(&*store, tournament_id)? else {
        return Err(TournamentError::invalid_transition("tournament has no stages"));
    };
    if !store.stage_rounds(stage.id).is_empty() {
        return Err(TournamentError::invalid_transition("tournament has already started"));
    }
    if store.stage_players(stage.id).is_empty() {
        seed_active_players(store, &stage)?;
    }
    if store.active_stage_players(stage.id)?.is_empty() {
        return Err(TournamentError::invalid_transition("no active players to start with"));
    }

    let round = open_round(store, &stage, 1, rng)?;
    if stage.pairing_strategy.closes_registration_on_start() {
        let mut tournament = store.get_tournament(tournament_id)?;
        tournament.is_accepting_registrations = false;
        store.update_tournament(&tournament)?;
    }
    log::info!("Started tournament {} with stage {}", tournament_id, stage.name);
    Ok(round)
}

/// The current stage is complete and the next one exists without rounds.
pub fn can_start_next_stage<S>(store: &S, tournament_id: TournamentId) -> Result<bool, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(current) = current_stage(store, tournament_id)? else {
        return Ok(false);
    };
    if !store.is_stage_complete(current.id) {
        return Ok(false);
    }
    Ok(next_stage(store, tournament_id)?
        .map_or(false, |next| store.stage_rounds(next.id).is_empty()))
}

/// Seed the next stage from the current stage's standings and create its round 1.
///
/// Preliminary seeding written by [`prepare_next_stage_seeding`] is used when present;
/// either way only the best `max_players` active players (by seed) enter.
///
/// [`prepare_next_stage_seeding`]: crate::logic::seeding::prepare_next_stage_seeding
pub fn advance_to_next_stage<S>(
    store: &mut S,
    tournament_id: TournamentId,
    rng: &mut dyn RngCore,
) -> Result<Stage, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    if !can_start_next_stage(&*store, tournament_id)? {
        return Err(TournamentError::invalid_transition(
            "current stage is not complete or there is no next stage to start",
        ));
    }
    let (Some(current), Some(next)) = (
        current_stage(&*store, tournament_id)?,
        next_stage(&*store, tournament_id)?,
    ) else {
        return Err(TournamentError::invalid_transition("no next stage"));
    };

    if store.stage_players(next.id).is_empty() {
        seed_from_standings(store, &current, &next)?;
    }
    let cap = next.max_players.map_or(usize::MAX, |m| m as usize);
    let mut kept = 0;
    for entry in store.stage_players(next.id) {
        if kept < cap && store.get_player(entry.player_id)?.is_active() {
            kept += 1;
        } else {
            store.delete_stage_player(entry.id)?;
        }
    }

    open_round(store, &next, 1, rng)?;
    log::info!(
        "Advanced tournament {} from stage {} to stage {} with {} players",
        tournament_id,
        current.order,
        next.order,
        store.stage_players(next.id).len()
    );
    Ok(next)
}

/// Write final ranks on `current` and create `next`'s entries for active players, seed = rank order.
pub(crate) fn seed_from_standings<S>(store: &mut S, current: &Stage, next: &Stage) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let standings = get_stage_standings(&*store, current.id)?;
    let mut seed = 1;
    for record in standings {
        let mut ranked = record.stage_player.clone();
        ranked.rank = Some(record.rank);
        store.update_stage_player(&ranked)?;

        if store.get_player(ranked.player_id)?.is_active() {
            store.insert_stage_player(StagePlayer::new(ranked.player_id, next.id, seed))?;
            seed += 1;
        }
    }
    Ok(())
}

/// Where the tournament is in its lifecycle.
pub fn tournament_phase<S>(store: &S, tournament_id: TournamentId) -> Result<TournamentPhase, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let Some(current) = current_stage(store, tournament_id)? else {
        return Ok(TournamentPhase::Registering);
    };
    if store.stage_rounds(current.id).is_empty() {
        return Ok(TournamentPhase::Registering);
    }
    if store.is_stage_complete(current.id) && next_stage(store, tournament_id)?.is_none() {
        return Ok(TournamentPhase::Complete);
    }
    Ok(TournamentPhase::StageActive { order: current.order })
}
