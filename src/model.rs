pub mod condition {
    pub type Score = f64;

    /// Base of the penalty paid for every meeting with the same partner.
    pub const SAME_PERSON_PENALTY: Score = 2.0;

    /// Rating of a plan where nobody meets twice and all tables are evenly used.
    pub const PERFECT_PLAN_RATING: Score = SAME_PERSON_PENALTY;

    pub fn meeting_penalty(meetings: usize) -> Score {
        SAME_PERSON_PENALTY.powi(meetings as i32)
    }
}


pub mod entity {
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::fmt;

    use itertools::Itertools;

    use super::condition::{meeting_penalty, Score};

    pub type Index = usize;
    pub type Round = u32;

    /// A person being seated, with everyone they met and every table they sat at.
    #[derive(Debug, Clone)]
    pub struct Guest {
        pub id: String,
        meetings: BTreeMap<Index, Vec<Round>>,
        tables: Vec<Index>,
        score: Cell<Option<Score>>,
    }

    impl Guest {
        pub fn new(id: impl Into<String>) -> Guest {
            Guest {
                id: id.into(),
                meetings: BTreeMap::new(),
                tables: Vec::new(),
                score: Cell::new(None),
            }
        }

        /// One side of a meeting. `Seating` always records both sides.
        pub(crate) fn greet(&mut self, other: Index, round: Round) {
            self.score.set(None);
            self.meetings.entry(other).or_default().push(round);
        }

        pub(crate) fn seat_at(&mut self, table: Index) {
            self.tables.push(table);
        }

        pub fn has_visited(&self, table: Index) -> bool {
            self.tables.contains(&table)
        }

        /// Tables visited so far; position `i` is round `i + 1`.
        pub fn tables(&self) -> &[Index] {
            &self.tables
        }

        pub fn meetings_with(&self, other: Index) -> usize {
            self.meeting_rounds(other).len()
        }

        pub fn meeting_rounds(&self, other: Index) -> &[Round] {
            self.meetings.get(&other).map_or(&[], Vec::as_slice)
        }

        pub fn meetings(&self) -> impl Iterator<Item = (Index, &[Round])> + '_ {
            self.meetings.iter().map(|(other, rounds)| (*other, rounds.as_slice()))
        }

        /// Sum of `penalty ^ meetings` over every partner met.
        pub fn score(&self) -> Score {
            if let Some(score) = self.score.get() {
                return score;
            }
            let score = self.meetings.values()
                .map(|rounds| meeting_penalty(rounds.len()))
                .sum();
            self.score.set(Some(score));
            score
        }

        pub fn diversity(&self) -> usize {
            self.meetings.len()
        }

        /// Number of times the same partner was met in two consecutive rounds.
        pub fn follow_ups(&self) -> usize {
            self.meetings.values()
                .filter(|rounds| rounds.len() > 1)
                .map(|rounds| {
                    rounds.iter().tuple_windows().filter(|(a, b)| **a + 1 == **b).count()
                })
                .sum()
        }
    }

    impl fmt::Display for Guest {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{:>2} (followUps={}, diversity={}, score={:.2})",
                self.id,
                self.follow_ups(),
                self.diversity(),
                self.score()
            )
        }
    }
}


pub mod group {
    use std::collections::BTreeMap;

    use super::entity::{Guest, Index, Round};

    #[derive(Debug, Clone)]
    pub struct Table {
        pub id: String,
        rosters: BTreeMap<Round, Vec<Index>>,
    }

    impl Table {
        pub fn new(id: impl Into<String>) -> Table {
            Table { id: id.into(), rosters: BTreeMap::new() }
        }

        /// Guests seated here in `round`, in seating order.
        pub fn roster(&self, round: Round) -> &[Index] {
            self.rosters.get(&round).map_or(&[], Vec::as_slice)
        }

        pub fn occupancy(&self, round: Round) -> usize {
            self.roster(round).len()
        }

        pub fn total_guests(&self) -> usize {
            self.rosters.values().map(Vec::len).sum()
        }

        pub fn rounds(&self) -> impl Iterator<Item = (Round, &[Index])> + '_ {
            self.rosters.iter().map(|(round, guests)| (*round, guests.as_slice()))
        }
    }

    /// The guests and tables of one plan, addressed by position.
    #[derive(Debug, Clone)]
    pub struct Seating {
        guests: Vec<Guest>,
        tables: Vec<Table>,
    }

    impl Seating {
        pub fn new<G, T>(guest_ids: G, table_ids: T) -> Seating
        where
            G: IntoIterator,
            G::Item: Into<String>,
            T: IntoIterator,
            T::Item: Into<String>,
        {
            Seating {
                guests: guest_ids.into_iter().map(Guest::new).collect(),
                tables: table_ids.into_iter().map(Table::new).collect(),
            }
        }

        pub fn guests(&self) -> &[Guest] {
            &self.guests
        }

        pub fn tables(&self) -> &[Table] {
            &self.tables
        }

        pub fn record_meeting(&mut self, a: Index, b: Index, round: Round) {
            meet(&mut self.guests, a, b, round);
        }

        /// Seats `guest` at `table`; they meet everyone already seated there this round.
        pub fn seat_guest(&mut self, table: Index, guest: Index, round: Round) {
            let Seating { guests, tables } = self;
            let roster = tables[table].rosters.entry(round).or_default();
            for &seated in roster.iter() {
                meet(guests, seated, guest, round);
            }
            roster.push(guest);
            guests[guest].seat_at(table);
        }
    }

    fn meet(guests: &mut [Guest], a: Index, b: Index, round: Round) {
        guests[a].greet(b, round);
        guests[b].greet(a, round);
    }
}


#[cfg(test)]
mod tests {
    use super::condition::{meeting_penalty, SAME_PERSON_PENALTY};
    use super::group::Seating;

    fn seating(guests: usize, tables: usize) -> Seating {
        Seating::new(
            (1..=guests).map(|i| format!("g{i}")),
            (1..=tables).map(|i| format!("t{i}")),
        )
    }

    #[test]
    fn test_meetings_are_symmetric() {
        let mut s = seating(4, 2);
        s.seat_guest(0, 0, 1);
        s.seat_guest(0, 1, 1);
        s.seat_guest(0, 2, 1);
        s.seat_guest(1, 3, 1);
        s.seat_guest(1, 0, 2);
        s.seat_guest(1, 1, 2);

        for a in 0..4 {
            for b in 0..4 {
                assert_eq!(
                    s.guests()[a].meetings_with(b),
                    s.guests()[b].meetings_with(a),
                    "guests {a} and {b}"
                );
            }
        }
        assert_eq!(s.guests()[0].meeting_rounds(1), &[1, 2]);
        assert_eq!(s.guests()[0].meetings_with(3), 0);
    }

    #[test]
    fn test_score_is_cached_until_next_meeting() {
        let mut s = seating(3, 1);
        s.record_meeting(0, 1, 1);

        let first = s.guests()[0].score();
        assert_eq!(first, SAME_PERSON_PENALTY);
        assert_eq!(s.guests()[0].score(), first);

        s.record_meeting(0, 1, 2);
        assert_eq!(s.guests()[0].score(), meeting_penalty(2));

        s.record_meeting(1, 2, 3);
        assert_eq!(s.guests()[0].score(), meeting_penalty(2));
        assert_eq!(s.guests()[1].score(), meeting_penalty(2) + meeting_penalty(1));
    }

    #[test]
    fn test_follow_ups_count_only_consecutive_rounds() {
        let mut s = seating(3, 1);
        for round in [2, 3, 5] {
            s.record_meeting(0, 1, round);
        }
        assert_eq!(s.guests()[0].follow_ups(), 1);
        assert_eq!(s.guests()[1].follow_ups(), 1);

        s.record_meeting(0, 2, 1);
        s.record_meeting(0, 2, 4);
        assert_eq!(s.guests()[0].follow_ups(), 1);
        assert_eq!(s.guests()[0].diversity(), 2);
    }

    #[test]
    fn test_table_tracks_rosters_per_round() {
        let mut s = seating(3, 2);
        s.seat_guest(1, 2, 1);
        s.seat_guest(1, 0, 1);
        s.seat_guest(1, 1, 2);

        let table = &s.tables()[1];
        assert_eq!(table.roster(1), &[2, 0]);
        assert_eq!(table.occupancy(2), 1);
        assert_eq!(table.occupancy(3), 0);
        assert_eq!(table.total_guests(), 3);
        assert_eq!(s.tables()[0].total_guests(), 0);
        assert_eq!(s.guests()[0].tables(), &[1]);
        assert!(s.guests()[2].has_visited(1));
        assert!(!s.guests()[2].has_visited(0));
    }

    #[test]
    fn test_guest_display() {
        let mut s = seating(2, 1);
        s.record_meeting(0, 1, 1);
        assert_eq!(s.guests()[0].to_string(), "g1 (followUps=0, diversity=1, score=2.00)");
    }
}
