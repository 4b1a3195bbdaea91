//! Seeding of a stage before it starts.

use crate::logic::lifecycle::{can_start_next_stage, current_stage, next_stage, seed_from_standings};
use crate::models::{StageId, StagePlayer, StagePlayerId, TournamentError, TournamentId};
use crate::store::TournamentStore;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

/// Freeze the current stage's ranks and enter every active player into the next stage,
/// seeded by rank. Replaces any earlier preliminary seeding. Returns the new entries.
pub fn prepare_next_stage_seeding<S>(
    store: &mut S,
    tournament_id: TournamentId,
) -> Result<Vec<StagePlayer>, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    if !can_start_next_stage(&*store, tournament_id)? {
        return Err(TournamentError::invalid_transition(
            "current stage is not complete or there is no next stage to seed",
        ));
    }
    let (Some(current), Some(next)) = (
        current_stage(&*store, tournament_id)?,
        next_stage(&*store, tournament_id)?,
    ) else {
        return Err(TournamentError::invalid_transition("no next stage"));
    };

    for entry in store.stage_players(next.id) {
        store.delete_stage_player(entry.id)?;
    }
    seed_from_standings(store, &current, &next)?;
    let entries = store.stage_players(next.id);
    log::info!("Prepared seeding of {} players for {}", entries.len(), next.name);
    Ok(entries)
}

/// Seeding can change until the stage has a round.
pub fn can_modify_seeding<S>(store: &S, stage_id: StageId) -> Result<bool, TournamentError>
where
    S: TournamentStore + ?Sized,
{
    store.get_stage(stage_id)?;
    Ok(store.stage_rounds(stage_id).is_empty())
}

/// Renumber the stage's seeds 1..N in the order of `ordered`, which must list every
/// stage player exactly once.
pub fn update_seeding_order<S>(
    store: &mut S,
    stage_id: StageId,
    ordered: &[StagePlayerId],
) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    if !can_modify_seeding(&*store, stage_id)? {
        return Err(TournamentError::invalid_transition("stage has already started"));
    }
    let entries = store.stage_players(stage_id);
    let expected: HashSet<StagePlayerId> = entries.iter().map(|sp| sp.id).collect();
    let given: HashSet<StagePlayerId> = ordered.iter().copied().collect();
    if given.len() != ordered.len() || given != expected {
        return Err(TournamentError::constraint(
            "seeding order must list every stage player exactly once",
        ));
    }

    // Two passes so no intermediate state repeats a seed.
    let offset = entries.iter().map(|sp| sp.seed).max().unwrap_or(0);
    for (i, id) in ordered.iter().enumerate() {
        let mut entry = store.get_stage_player(*id)?;
        entry.seed = offset + i as u32 + 1;
        store.update_stage_player(&entry)?;
    }
    for (i, id) in ordered.iter().enumerate() {
        let mut entry = store.get_stage_player(*id)?;
        entry.seed = i as u32 + 1;
        store.update_stage_player(&entry)?;
    }
    log::info!("Updated seeding of {} players", ordered.len());
    Ok(())
}

/// Shuffle the stage's seeds.
pub fn randomize_seeding<S>(store: &mut S, stage_id: StageId, rng: &mut dyn RngCore) -> Result<(), TournamentError>
where
    S: TournamentStore + ?Sized,
{
    let mut order: Vec<StagePlayerId> = store.stage_players(stage_id).iter().map(|sp| sp.id).collect();
    order.shuffle(rng);
    update_seeding_order(store, stage_id, &order)
}
