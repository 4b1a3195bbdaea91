//! Single binary web server: JSON API over the tournament engine.
//! Run with: cargo run --bin web
//! Env: HOST, PORT, INACTIVITY_TIMEOUT_HOURS, RNG_SEED (see `ServerConfig`).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::time::{Duration, Instant};
use tcg_tourney::config::ServerConfig;
use tcg_tourney::export::write_standings_csv;
use tcg_tourney::{
    add_match, add_stage, advance_to_next_stage, available_ranking_criteria, available_strategies,
    close_registration, create_round, create_tournament, drop_player, get_stage_standings,
    get_tournament_standings, prepare_next_stage_seeding, register_player, report_result,
    report_self_scheduled_result, start_tournament, tournament_phase, undrop_player,
    update_seeding_order, GameMatch, MatchHistory, MatchId, MatchResult, MemoryStore, Player,
    PlayerId, Round, RoundId, Stage, StageConfig, StageId, StagePlayer, StagePlayerId, Tournament,
    TournamentError, TournamentId, TournamentPhase, TournamentStore,
};

/// One tournament's engine state: its own store and random source, plus last activity time.
struct TournamentEntry {
    id: TournamentId,
    store: MemoryStore,
    rng: StdRng,
    last_activity: Instant,
}

/// Tournaments by id. Each sits behind its own mutex so operations on one tournament are
/// serialized without blocking the others.
type Registry = RwLock<HashMap<TournamentId, Arc<Mutex<TournamentEntry>>>>;
type AppState = Data<Registry>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: &TournamentError) -> HttpResponse {
    let body = ErrorBody {
        error: err.to_string(),
    };
    match err {
        TournamentError::NotFound { .. } => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn tournament_not_found(id: TournamentId) -> HttpResponse {
    error_response(&TournamentError::NotFound {
        entity: "tournament",
        id,
    })
}

fn lookup(state: &AppState, id: TournamentId) -> Option<Arc<Mutex<TournamentEntry>>> {
    state.read().ok().and_then(|g| g.get(&id).cloned())
}

/// Run `f` on the tournament under its lock and answer with its JSON result or error.
fn with_entry<T, F>(state: &AppState, id: TournamentId, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&mut TournamentEntry) -> Result<T, TournamentError>,
{
    let Some(entry) = lookup(state, id) else {
        return tournament_not_found(id);
    };
    let mut guard = match entry.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    guard.last_activity = Instant::now();
    match f(&mut guard) {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => {
            log::warn!("Tournament {}: {}", id, err);
            error_response(&err)
        }
    }
}

/// Whether the cleanup sweep keeps `entry`. A tournament busy with a request is kept
/// without waiting for its lock; a poisoned one is removed.
fn keep_entry(entry: &Mutex<TournamentEntry>, timeout: Duration) -> bool {
    match entry.try_lock() {
        Ok(e) => e.last_activity.elapsed() < timeout,
        Err(TryLockError::WouldBlock) => true,
        Err(TryLockError::Poisoned(_)) => false,
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Deserialize)]
struct PlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct ReportResultBody {
    /// Absent or null for a tie.
    #[serde(default)]
    winner: Option<StagePlayerId>,
    #[serde(default)]
    player_one_score: Option<u32>,
    #[serde(default)]
    player_two_score: Option<u32>,
}

impl ReportResultBody {
    fn scores(&self) -> Option<(u32, u32)> {
        self.player_one_score.zip(self.player_two_score)
    }
}

#[derive(Deserialize)]
struct AddMatchBody {
    player_one: StagePlayerId,
    player_two: StagePlayerId,
}

#[derive(Deserialize)]
struct SelfReportBody {
    reporter: StagePlayerId,
    opponent: StagePlayerId,
    #[serde(default)]
    winner: Option<StagePlayerId>,
    #[serde(default)]
    reporter_score: Option<u32>,
    #[serde(default)]
    opponent_score: Option<u32>,
}

#[derive(Deserialize)]
struct SeedingBody {
    order: Vec<StagePlayerId>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct StagePath {
    id: TournamentId,
    stage_id: StageId,
}

#[derive(Deserialize)]
struct PlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    round_id: RoundId,
}

#[derive(Serialize)]
struct TournamentView {
    tournament: Tournament,
    phase: TournamentPhase,
    stages: Vec<Stage>,
    players: Vec<Player>,
}

#[derive(Serialize)]
struct MatchView {
    #[serde(rename = "match")]
    game: GameMatch,
    result: Option<MatchResult>,
}

#[derive(Serialize)]
struct RoundView {
    round: Round,
    end_time: Option<DateTime<Utc>>,
    matches: Vec<MatchView>,
}

#[derive(Serialize)]
struct StageView {
    stage: Stage,
    players: Vec<StagePlayer>,
    rounds: Vec<RoundView>,
}

#[derive(Serialize)]
struct OptionView {
    key: &'static str,
    name: &'static str,
    description: &'static str,
}

fn tournament_view(entry: &TournamentEntry) -> Result<TournamentView, TournamentError> {
    Ok(TournamentView {
        tournament: entry.store.get_tournament(entry.id)?,
        phase: tournament_phase(&entry.store, entry.id)?,
        stages: entry.store.tournament_stages(entry.id),
        players: entry.store.tournament_players(entry.id),
    })
}

fn stage_view(store: &MemoryStore, stage_id: StageId) -> Result<StageView, TournamentError> {
    let rounds = store
        .stage_rounds(stage_id)
        .into_iter()
        .map(|round| RoundView {
            end_time: round.end_time(),
            matches: store
                .round_matches(round.id)
                .into_iter()
                .map(|game| MatchView {
                    result: store.match_result(game.id),
                    game,
                })
                .collect(),
            round,
        })
        .collect();
    Ok(StageView {
        stage: store.get_stage(stage_id)?,
        players: store.stage_players(stage_id),
        rounds,
    })
}

/// The stage must belong to the tournament at the path.
fn check_stage(entry: &TournamentEntry, stage_id: StageId) -> Result<(), TournamentError> {
    let stage = entry.store.get_stage(stage_id)?;
    if stage.tournament_id != entry.id {
        return Err(TournamentError::NotFound {
            entity: "stage",
            id: stage_id,
        });
    }
    Ok(())
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tcg-tourney",
    })
}

#[get("/api/strategies")]
async fn api_strategies() -> HttpResponse {
    let options: Vec<OptionView> = available_strategies()
        .into_iter()
        .map(|s| OptionView {
            key: s.key(),
            name: s.display_name(),
            description: s.description(),
        })
        .collect();
    HttpResponse::Ok().json(options)
}

#[get("/api/ranking-criteria")]
async fn api_ranking_criteria() -> HttpResponse {
    let options: Vec<OptionView> = available_ranking_criteria()
        .iter()
        .map(|c| OptionView {
            key: c.key(),
            name: c.name(),
            description: c.description(),
        })
        .collect();
    HttpResponse::Ok().json(options)
}

#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    config: Data<ServerConfig>,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let mut store = MemoryStore::new();
    let tournament = match create_tournament(&mut store, &body.name, body.owner.clone()) {
        Ok(t) => t,
        Err(err) => return error_response(&err),
    };
    let entry = TournamentEntry {
        id: tournament.id,
        store,
        rng: make_rng(config.rng_seed),
        last_activity: Instant::now(),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(tournament.id, Arc::new(Mutex::new(entry)));
    HttpResponse::Ok().json(tournament)
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| tournament_view(entry))
}

#[post("/api/tournaments/{id}/stages")]
async fn api_add_stage(state: AppState, path: Path<TournamentPath>, body: Json<StageConfig>) -> HttpResponse {
    let config = body.into_inner();
    with_entry(&state, path.id, |entry| {
        add_stage(&mut entry.store, entry.id, config, &mut entry.rng)
    })
}

#[get("/api/tournaments/{id}/stages/{stage_id}")]
async fn api_get_stage(state: AppState, path: Path<StagePath>) -> HttpResponse {
    let stage_id = path.stage_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, stage_id)?;
        stage_view(&entry.store, stage_id)
    })
}

#[post("/api/tournaments/{id}/players")]
async fn api_register_player(state: AppState, path: Path<TournamentPath>, body: Json<PlayerBody>) -> HttpResponse {
    with_entry(&state, path.id, |entry| {
        register_player(&mut entry.store, entry.id, &body.name)
    })
}

#[post("/api/tournaments/{id}/players/{player_id}/drop")]
async fn api_drop_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    let player_id = path.player_id;
    with_entry(&state, path.id, |entry| drop_player(&mut entry.store, player_id))
}

#[post("/api/tournaments/{id}/players/{player_id}/undrop")]
async fn api_undrop_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    let player_id = path.player_id;
    with_entry(&state, path.id, |entry| undrop_player(&mut entry.store, player_id))
}

#[post("/api/tournaments/{id}/close-registration")]
async fn api_close_registration(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| {
        close_registration(&mut entry.store, entry.id)?;
        tournament_view(entry)
    })
}

#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| {
        start_tournament(&mut entry.store, entry.id, &mut entry.rng)
    })
}

#[post("/api/tournaments/{id}/stages/{stage_id}/rounds")]
async fn api_create_round(state: AppState, path: Path<StagePath>) -> HttpResponse {
    let stage_id = path.stage_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, stage_id)?;
        create_round(&mut entry.store, stage_id, &mut entry.rng)
    })
}

#[post("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_report_result(state: AppState, path: Path<MatchPath>, body: Json<ReportResultBody>) -> HttpResponse {
    let match_id = path.match_id;
    with_entry(&state, path.id, |entry| {
        let round = entry.store.get_round(entry.store.get_match(match_id)?.round_id)?;
        check_stage(entry, round.stage_id)?;
        report_result(&mut entry.store, match_id, body.winner, body.scores())
    })
}

#[post("/api/tournaments/{id}/rounds/{round_id}/matches")]
async fn api_add_match(state: AppState, path: Path<RoundPath>, body: Json<AddMatchBody>) -> HttpResponse {
    let round_id = path.round_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, entry.store.get_round(round_id)?.stage_id)?;
        add_match(&mut entry.store, round_id, body.player_one, body.player_two)
    })
}

#[post("/api/tournaments/{id}/stages/{stage_id}/self-reported")]
async fn api_self_report(state: AppState, path: Path<StagePath>, body: Json<SelfReportBody>) -> HttpResponse {
    let stage_id = path.stage_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, stage_id)?;
        let scores = body.reporter_score.zip(body.opponent_score);
        report_self_scheduled_result(
            &mut entry.store,
            stage_id,
            body.reporter,
            body.opponent,
            body.winner,
            scores,
        )
    })
}

#[get("/api/tournaments/{id}/stages/{stage_id}/standings")]
async fn api_stage_standings(state: AppState, path: Path<StagePath>) -> HttpResponse {
    let stage_id = path.stage_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, stage_id)?;
        get_stage_standings(&entry.store, stage_id)
    })
}

#[get("/api/tournaments/{id}/stages/{stage_id}/standings.csv")]
async fn api_stage_standings_csv(state: AppState, path: Path<StagePath>) -> HttpResponse {
    let Some(entry) = lookup(&state, path.id) else {
        return tournament_not_found(path.id);
    };
    let mut entry = match entry.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    entry.last_activity = Instant::now();
    let standings = match check_stage(&entry, path.stage_id)
        .and_then(|_| get_stage_standings(&entry.store, path.stage_id))
    {
        Ok(standings) => standings,
        Err(err) => return error_response(&err),
    };
    let players = entry.store.tournament_players(entry.id);
    let mut buf = Vec::new();
    if let Err(err) = write_standings_csv(&standings, &players, &mut buf) {
        log::error!("CSV export failed: {}", err);
        return HttpResponse::InternalServerError().body("csv error");
    }
    HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(buf)
}

#[get("/api/tournaments/{id}/standings")]
async fn api_tournament_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| get_tournament_standings(&entry.store, entry.id))
}

#[post("/api/tournaments/{id}/seeding/prepare")]
async fn api_prepare_seeding(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| {
        prepare_next_stage_seeding(&mut entry.store, entry.id)
    })
}

#[put("/api/tournaments/{id}/stages/{stage_id}/seeding")]
async fn api_update_seeding(state: AppState, path: Path<StagePath>, body: Json<SeedingBody>) -> HttpResponse {
    let stage_id = path.stage_id;
    with_entry(&state, path.id, |entry| {
        check_stage(entry, stage_id)?;
        update_seeding_order(&mut entry.store, stage_id, &body.order)?;
        Ok(entry.store.stage_players(stage_id))
    })
}

#[post("/api/tournaments/{id}/advance")]
async fn api_advance(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_entry(&state, path.id, |entry| {
        advance_to_next_stage(&mut entry.store, entry.id, &mut entry.rng)
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state: AppState = Data::new(RwLock::new(HashMap::new()));

    // Background task: every 30 minutes, remove tournaments nobody has touched recently
    let state_cleanup = state.clone();
    let timeout = config.inactivity_timeout;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| keep_entry(entry, timeout));
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s)", removed);
            }
        }
    });

    let config = Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(favicon)
            .service(api_strategies)
            .service(api_ranking_criteria)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_stage)
            .service(api_get_stage)
            .service(api_register_player)
            .service(api_drop_player)
            .service(api_undrop_player)
            .service(api_close_registration)
            .service(api_start_tournament)
            .service(api_create_round)
            .service(api_report_result)
            .service(api_add_match)
            .service(api_self_report)
            .service(api_stage_standings_csv)
            .service(api_stage_standings)
            .service(api_tournament_standings)
            .service(api_prepare_seeding)
            .service(api_update_seeding)
            .service(api_advance)
    })
    .bind(bind)?
    .run()
    .await
}
