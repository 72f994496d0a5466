use rand::rngs::SmallRng;

use crate::allocator::{Allocator, SeatingError};
use crate::model::entity::Round;
use crate::model::group::Seating;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    Round(Round),
}

/// Walks every guest to a table, one round at a time, until all sessions are seated.
#[derive(Debug, Clone)]
pub struct Usher {
    sessions: Round,
    allocator: Allocator,
    rng: SmallRng,
    stage: Stage,
}

impl Usher {
    pub fn new(sessions: Round, allocator: Allocator, rng: SmallRng) -> Usher {
        Usher { sessions, allocator, rng, stage: Stage::NotStarted }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn allocator(&self) -> Allocator {
        self.allocator
    }

    /// Last round seated, 0 before the first one.
    pub fn round(&self) -> Round {
        match self.stage {
            Stage::NotStarted => 0,
            Stage::Round(round) => round,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.round() >= self.sessions
    }

    /// Round-robin: guest `i` goes to table `i mod tables`.
    pub fn first_round(&mut self, seating: &mut Seating) -> Result<Round, SeatingError> {
        if self.stage != Stage::NotStarted {
            return Err(SeatingError::AlreadyStarted);
        }
        let round = 1;
        self.stage = Stage::Round(round);
        let tables = seating.tables().len();
        for guest in 0..seating.guests().len() {
            seating.seat_guest(guest % tables, guest, round);
        }
        Ok(round)
    }

    /// Seats every guest, in input order, at a table they have not visited yet.
    pub fn next_round(&mut self, seating: &mut Seating) -> Result<Round, SeatingError> {
        if self.stage == Stage::NotStarted {
            return self.first_round(seating);
        }
        if self.is_complete() {
            return Err(SeatingError::SessionsExhausted(self.sessions));
        }
        let round = self.round() + 1;
        self.stage = Stage::Round(round);
        for guest in 0..seating.guests().len() {
            let table = self.allocator.choose_table(
                &seating.guests()[guest],
                seating.tables(),
                round,
                &mut self.rng,
            )?;
            seating.seat_guest(table, guest, round);
        }
        Ok(round)
    }

    pub fn seat_all(&mut self, seating: &mut Seating) -> Result<(), SeatingError> {
        while !self.is_complete() {
            self.next_round(seating)?;
        }
        Ok(())
    }
}
