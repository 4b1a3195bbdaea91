//! Stage: an ordered phase of a tournament with its own pairing strategy and ranking chain.

use crate::logic::criteria::{self, RankingCriterion};
use crate::logic::pairing::{self, PairingStrategy};
use crate::models::tournament::{TournamentError, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a stage.
pub type StageId = Uuid;

/// Whether game scores are collected alongside the winner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReporting {
    #[default]
    Disabled,
    Optional,
    Required,
}

/// A phase of the tournament (1 = main stage, 2 = playoffs, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub order: u32,
    pub pairing_strategy: PairingStrategy,
    /// Cap applied when players advance into this stage.
    pub max_players: Option<u32>,
    pub are_ties_allowed: bool,
    pub score_reporting: ScoreReporting,
    pub round_length_in_minutes: Option<u32>,
    /// Enabled criteria in ranking order. Empty means "use the default chain".
    pub ranking_criteria: Vec<RankingCriterion>,
    /// Seeds the Random criterion so repeated standings queries agree.
    pub tiebreak_seed: u64,
    pub created_on: DateTime<Utc>,
}

impl Stage {
    /// The criteria the standings are sorted by, falling back to the default chain for this order.
    pub fn effective_ranking_criteria(&self) -> Vec<RankingCriterion> {
        if self.ranking_criteria.is_empty() {
            criteria::default_chain_for_stage_order(self.order)
        } else {
            self.ranking_criteria.clone()
        }
    }

    /// Replace the ranking chain. Keys must be known and unique; order is preserved.
    pub fn set_ranking_criteria<K: AsRef<str>>(&mut self, keys: &[K]) -> Result<(), TournamentError> {
        self.ranking_criteria = parse_ranking_chain(keys)?;
        Ok(())
    }
}

/// Everything needed to create a stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub order: u32,
    pub pairing_strategy: String,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub are_ties_allowed: bool,
    #[serde(default)]
    pub score_reporting: ScoreReporting,
    #[serde(default)]
    pub round_length_in_minutes: Option<u32>,
    #[serde(default)]
    pub ranking_criteria: Vec<String>,
}

impl StageConfig {
    pub fn new(name: impl Into<String>, order: u32, pairing_strategy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            pairing_strategy: pairing_strategy.into(),
            max_players: None,
            are_ties_allowed: false,
            score_reporting: ScoreReporting::Disabled,
            round_length_in_minutes: None,
            ranking_criteria: Vec::new(),
        }
    }

    pub fn max_players(mut self, max_players: u32) -> Self {
        self.max_players = Some(max_players);
        self
    }

    pub fn ties_allowed(mut self, allowed: bool) -> Self {
        self.are_ties_allowed = allowed;
        self
    }

    pub fn score_reporting(mut self, mode: ScoreReporting) -> Self {
        self.score_reporting = mode;
        self
    }

    pub fn round_length(mut self, minutes: u32) -> Self {
        self.round_length_in_minutes = Some(minutes);
        self
    }

    pub fn ranking_criteria<K: Into<String>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.ranking_criteria = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Validate keys and build the stage record.
    pub fn build(self, tournament_id: TournamentId, tiebreak_seed: u64) -> Result<Stage, TournamentError> {
        if self.order == 0 {
            return Err(TournamentError::constraint("stage order starts at 1"));
        }
        let pairing_strategy = pairing::get_pairing_strategy(&self.pairing_strategy)?;
        let ranking_criteria = parse_ranking_chain(&self.ranking_criteria)?;
        Ok(Stage {
            id: Uuid::new_v4(),
            tournament_id,
            name: self.name,
            order: self.order,
            pairing_strategy,
            max_players: self.max_players,
            are_ties_allowed: self.are_ties_allowed,
            score_reporting: self.score_reporting,
            round_length_in_minutes: self.round_length_in_minutes,
            ranking_criteria,
            tiebreak_seed,
            created_on: Utc::now(),
        })
    }
}

fn parse_ranking_chain<K: AsRef<str>>(keys: &[K]) -> Result<Vec<RankingCriterion>, TournamentError> {
    let mut seen = HashSet::new();
    let mut chain = Vec::with_capacity(keys.len());
    for key in keys {
        let criterion = criteria::get_ranking_criterion(key.as_ref())?;
        if !seen.insert(criterion) {
            return Err(TournamentError::constraint(format!(
                "ranking criterion {} listed twice",
                criterion.key()
            )));
        }
        chain.push(criterion);
    }
    Ok(chain)
}
