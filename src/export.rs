//! CSV export of stage standings.

use crate::logic::standings::StandingRecord;
use crate::models::{Player, PlayerId};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Serialize)]
struct StandingRow<'a> {
    rank: u32,
    player: &'a str,
    seed: u32,
    wins: u32,
    losses: u32,
    ties: u32,
    byes: u32,
    points: u32,
    strength_of_schedule: String,
    player_score: u64,
    opponent_score: u64,
}

/// Write one CSV row per standing, with a header. Player names come from `players`;
/// a record whose player is missing gets an empty name.
pub fn write_standings_csv<W: Write>(
    records: &[StandingRecord],
    players: &[Player],
    writer: W,
) -> Result<(), csv::Error> {
    let names: HashMap<PlayerId, &str> = players.iter().map(|p| (p.id, p.name.as_str())).collect();
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(StandingRow {
            rank: record.rank,
            player: names.get(&record.stage_player.player_id).copied().unwrap_or(""),
            seed: record.seed,
            wins: record.wins,
            losses: record.losses,
            ties: record.ties,
            byes: record.byes,
            points: record.points,
            strength_of_schedule: format!("{:.2}", record.strength_of_schedule),
            player_score: record.player_score,
            opponent_score: record.opponent_score,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
