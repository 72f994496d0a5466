use std::fmt;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::trace;

use crate::allocator::{Allocator, SeatingError};
use crate::model::condition::{Score, PERFECT_PLAN_RATING};
use crate::model::entity::{Guest, Index, Round};
use crate::model::group::{Seating, Table};
use crate::usher::Usher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Score,
    Diversity,
    FollowUps,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Score => write!(f, "Score"),
            Parameter::Diversity => write!(f, "Diversity"),
            Parameter::FollowUps => write!(f, "FollowUps"),
        }
    }
}

/// Summary of one per-guest value over all guests of a plan.
///
/// `med` is the value in the middle position of the guest order, the values
/// are not sorted first.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStats {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub med: f64,
}

impl ParameterStats {
    pub fn calculate(parameter: Parameter, values: &[f64]) -> ParameterStats {
        if values.is_empty() {
            return ParameterStats { parameter, min: 0.0, max: 0.0, avg: 0.0, med: 0.0 };
        }
        ParameterStats {
            parameter,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg: values.iter().sum::<f64>() / values.len() as f64,
            med: values[values.len() / 2],
        }
    }
}

impl fmt::Display for ParameterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: min = {:.2}, max = {:.2}, avg = {:.2}, med = {:.2}",
            self.parameter, self.min, self.max, self.avg, self.med
        )
    }
}

/// The four factors of a plan rating. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub follow_ups: Score,
    pub diversity: Score,
    pub guest_score: Score,
    pub table_balance: Score,
}

impl Rating {
    pub fn value(&self) -> Score {
        self.follow_ups * self.diversity * self.guest_score * self.table_balance
    }

    pub fn is_perfect(&self) -> bool {
        self.value() == PERFECT_PLAN_RATING
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} ({:.2} * {:.2} * {:.2} * {:.2})",
            self.value(),
            self.follow_ups,
            self.diversity,
            self.guest_score,
            self.table_balance
        )
    }
}

/// A fully seated plan together with its statistics and rating.
#[derive(Debug, Clone)]
pub struct Plan {
    seating: Seating,
    sessions: Round,
    usher: Usher,
    scores: ParameterStats,
    diversities: ParameterStats,
    follow_ups: ParameterStats,
    rating: Rating,
}

impl Plan {
    /// Seats all sessions, then rates the result.
    pub fn simulate(mut seating: Seating, sessions: Round, rng: SmallRng) -> Result<Plan, SeatingError> {
        let allocator = Allocator::for_plan(seating.guests().len(), seating.tables().len(), sessions);
        trace!(?allocator, "seating plan");
        let mut usher = Usher::new(sessions, allocator, rng);
        usher.seat_all(&mut seating)?;

        let guests = seating.guests();
        let scores = ParameterStats::calculate(
            Parameter::Score,
            &guests.iter().map(Guest::score).collect::<Vec<_>>(),
        );
        let diversities = ParameterStats::calculate(
            Parameter::Diversity,
            &guests.iter().map(|g| g.diversity() as f64).collect::<Vec<_>>(),
        );
        let follow_ups = ParameterStats::calculate(
            Parameter::FollowUps,
            &guests.iter().map(|g| g.follow_ups() as f64).collect::<Vec<_>>(),
        );
        let rating = Rating {
            follow_ups: (follow_ups.max + (follow_ups.med - follow_ups.avg).abs()).max(1.0),
            diversity: 1.0 + (diversities.max - diversities.min),
            guest_score: scores.avg,
            table_balance: table_score(&seating, sessions),
        };

        Ok(Plan { seating, sessions, usher, scores, diversities, follow_ups, rating })
    }

    pub fn guests(&self) -> &[Guest] {
        self.seating.guests()
    }

    pub fn tables(&self) -> &[Table] {
        self.seating.tables()
    }

    pub fn sessions(&self) -> Round {
        self.sessions
    }

    pub fn usher(&self) -> &Usher {
        &self.usher
    }

    pub fn score_stats(&self) -> &ParameterStats {
        &self.scores
    }

    pub fn diversity_stats(&self) -> &ParameterStats {
        &self.diversities
    }

    pub fn follow_up_stats(&self) -> &ParameterStats {
        &self.follow_ups
    }

    pub fn rating(&self) -> &Rating {
        &self.rating
    }

    /// `(table, guests)` for every table in `round`, by identifier.
    pub fn seating_in_round(&self, round: Round) -> Vec<(&str, Vec<&str>)> {
        self.tables().iter()
            .map(|table| {
                let guests = table.roster(round).iter().map(|&g| self.guests()[g].id.as_str()).collect();
                (table.id.as_str(), guests)
            })
            .collect()
    }

    /// Identifiers of the tables `guest` sat at, one per round.
    pub fn table_history(&self, guest: Index) -> Vec<&str> {
        self.guests()[guest].tables().iter()
            .map(|&t| self.tables()[t].id.as_str())
            .collect()
    }

    /// Partners of `guest` by identifier, with the rounds they met in.
    pub fn meeting_summary(&self, guest: Index) -> Vec<(&str, &[Round])> {
        self.guests()[guest].meetings()
            .map(|(other, rounds)| (self.guests()[other].id.as_str(), rounds))
            .collect()
    }
}

/// 1.0 when every table hosts exactly its share of guests on average.
fn table_score(seating: &Seating, sessions: Round) -> Score {
    let share = seating.guests().len() as f64 / seating.tables().len() as f64;
    1.0 + seating.tables().iter()
        .map(|table| (table.total_guests() as f64 / sessions as f64 - share).abs())
        .sum::<f64>()
}

/// Builds a fresh, independent seating for every simulation attempt.
#[derive(Debug, Clone)]
pub struct PlanFactory {
    sessions: Round,
    table_names: Vec<String>,
    guest_names: Vec<String>,
    seed: Option<u64>,
}

impl PlanFactory {
    pub fn new(sessions: Round, table_names: Vec<String>, guest_names: Vec<String>) -> PlanFactory {
        PlanFactory { sessions, table_names, guest_names, seed: None }
    }

    /// Makes every unit reproducible: unit `n` draws from `seed + n`.
    pub fn with_seed(mut self, seed: Option<u64>) -> PlanFactory {
        self.seed = seed;
        self
    }

    pub fn sessions(&self) -> Round {
        self.sessions
    }

    pub fn tables(&self) -> usize {
        self.table_names.len()
    }

    pub fn guests(&self) -> usize {
        self.guest_names.len()
    }

    pub fn new_seating(&self) -> Seating {
        Seating::new(self.guest_names.iter().cloned(), self.table_names.iter().cloned())
    }

    pub fn rng_for(&self, unit: u64) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(unit)),
            None => SmallRng::from_entropy(),
        }
    }

    pub fn simulate(&self, unit: u64) -> Result<Plan, SeatingError> {
        Plan::simulate(self.new_seating(), self.sessions, self.rng_for(unit))
    }
}
