use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::model::condition::{meeting_penalty, Score};
use crate::model::entity::{Guest, Index, Round};
use crate::model::group::Table;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeatingError {
    #[error("no eligible table left for guest {guest} in round {round}")]
    NoEligibleTable { guest: String, round: Round },
    #[error("the first round has already been seated")]
    AlreadyStarted,
    #[error("all {0} sessions have already been seated")]
    SessionsExhausted(Round),
}

/// Policy picking the next table for a guest. A guest is never sent back to a
/// table they already sat at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocator {
    /// Fewest repeated meetings with the guests already at the table; random among ties.
    LookAhead,
    Random,
    /// Fewest guests seated this round; first table wins ties.
    LeastGuests,
    /// Fewest guests seated this round; random among ties.
    LeastGuestsRandom,
}

impl Allocator {
    /// Look-ahead while there is room to avoid every repeat, otherwise keep tables balanced.
    pub fn for_plan(guests: usize, tables: usize, sessions: Round) -> Allocator {
        if guests <= tables * (sessions as usize).saturating_sub(1) {
            Allocator::LookAhead
        } else {
            Allocator::LeastGuestsRandom
        }
    }

    pub fn choose_table<R: Rng + ?Sized>(
        &self,
        guest: &Guest,
        tables: &[Table],
        round: Round,
        rng: &mut R,
    ) -> Result<Index, SeatingError> {
        let eligible = (0..tables.len()).filter(|&t| !guest.has_visited(t));
        let chosen = match self {
            Allocator::LookAhead => eligible
                .map(|t| (t, look_ahead_score(guest, &tables[t], round)))
                .min_set_by(|a, b| a.1.total_cmp(&b.1))
                .choose(rng)
                .map(|(t, _)| *t),
            Allocator::Random => eligible.collect_vec().choose(rng).copied(),
            Allocator::LeastGuests => eligible.min_by_key(|&t| tables[t].occupancy(round)),
            Allocator::LeastGuestsRandom => eligible
                .min_set_by_key(|&t| tables[t].occupancy(round))
                .choose(rng)
                .copied(),
        };
        chosen.ok_or_else(|| SeatingError::NoEligibleTable { guest: guest.id.clone(), round })
    }
}

/// Penalty the guest would pay towards everyone already seated at `table` in `round`.
fn look_ahead_score(guest: &Guest, table: &Table, round: Round) -> Score {
    table.roster(round).iter()
        .map(|&other| meeting_penalty(guest.meetings_with(other)))
        .sum()
}
