use std::sync::{Arc, Mutex};

use table_planner::config::names_from_lines;
use table_planner::search::Candidate;
use table_planner::{
    Acceptance, ConfigError, Planner, PlannerConfig, PlannerError, Search, SearchError, SeatingError, Verdict,
};

fn config(tables: usize, sessions: u32, guests: usize) -> PlannerConfig {
    PlannerConfig { tables, sessions, guests, iterations: 100, threads: 4, seed: Some(2024), names: None }
}

#[test]
fn test_sixteen_guests_four_tables_four_sessions() {
    let outcome = Planner::new(&config(4, 4, 16)).unwrap().run().unwrap();
    let plan = &outcome.plan;

    assert_ne!(outcome.verdict, Verdict::Perfect);
    assert_eq!(outcome.processed, 100);
    assert_eq!(plan.sessions(), 4);

    for round in 1..=4 {
        let seated: usize = plan.seating_in_round(round).iter().map(|(_, guests)| guests.len()).sum();
        assert_eq!(seated, 16);
    }
    for (index, guest) in plan.guests().iter().enumerate() {
        let mut history = plan.table_history(index);
        assert_eq!(history.len(), 4);
        history.sort_unstable();
        history.dedup();
        assert_eq!(history.len(), 4, "guest {} sat at a table twice", guest.id);

        for other in 0..plan.guests().len() {
            assert_eq!(guest.meetings_with(other), plan.guests()[other].meetings_with(index));
        }
    }
}

#[test]
fn test_winner_is_best_of_its_bucket() {
    let planner = Planner::new(&config(4, 4, 16)).unwrap();
    let acceptance = planner.acceptance();
    let factory = Arc::new(planner.factory().clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let record = Arc::clone(&seen);
    let outcome = Search::new(100, 4, acceptance)
        .run(move |unit| {
            let plan = factory.simulate(unit)?;
            record.lock().unwrap().push((Candidate::rating(&plan), acceptance.accepts(&plan)));
            Ok(plan)
        })
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 100);
    let any_accepted = seen.iter().any(|(_, accepted)| *accepted);
    let bucket_best = seen.iter()
        .filter(|(_, accepted)| *accepted || !any_accepted)
        .map(|(rating, _)| *rating)
        .fold(f64::INFINITY, f64::min);

    let expected = if any_accepted { Verdict::Accepted } else { Verdict::Fallback };
    assert_eq!(outcome.verdict, expected);
    assert_eq!(Candidate::rating(&outcome.plan), bucket_best);
}

#[test]
fn test_thresholds_follow_counts() {
    let planner = Planner::new(&config(4, 4, 16)).unwrap();
    assert_eq!(planner.acceptance(), Acceptance { max_follow_ups: 2, ignore_table_balance: false });

    let planner = Planner::new(&config(5, 3, 30)).unwrap();
    assert_eq!(planner.acceptance(), Acceptance { max_follow_ups: 3, ignore_table_balance: true });
}

#[test]
fn test_named_guests() {
    let text = "Host A\nHost B\nHost C\n\nAda\nGrace\nLinus\nKen\nBarbara\nDennis\nMargaret\n";
    let config = config(3, 3, 0).with_names(names_from_lines(text));
    let outcome = Planner::new(&config).unwrap().run().unwrap();

    let plan = &outcome.plan;
    assert_eq!(plan.guests().len(), 7);
    assert_eq!(plan.tables()[2].id, "Host C");
    assert_eq!(plan.guests()[0].id, "Ada");
    assert_eq!(plan.table_history(0)[0], "Host A");
    assert_eq!(plan.table_history(4)[0], "Host B");
}

#[test]
fn test_invalid_configuration_is_rejected_up_front() {
    let err = Planner::new(&config(4, 4, 51)).unwrap_err();
    assert!(matches!(err, ConfigError::GuestCount { count: 51, .. }));

    let err = Planner::new(&PlannerConfig { iterations: 10, ..config(4, 4, 16) }).unwrap_err();
    assert!(matches!(err, ConfigError::Iterations(10)));
}

#[test]
fn test_more_sessions_than_tables_aborts_search() {
    let err = Planner::new(&config(3, 5, 9)).unwrap().run().unwrap_err();
    assert!(matches!(
        err,
        PlannerError::Search(SearchError::Seating(SeatingError::NoEligibleTable { round: 4, .. }))
    ));
}
