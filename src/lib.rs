//! Randomized search for multi-round table plans.
//!
//! Guests are seated at tables over several sessions so that they meet as
//! many different people as possible, rarely meet anyone twice and tables
//! stay evenly used. Each attempt seats everyone round by round with a
//! table allocation heuristic, rates the result, and the best of many
//! attempts (run in parallel) wins.
//!
//! ```no_run
//! use table_planner::{Planner, PlannerConfig};
//!
//! let config = PlannerConfig { iterations: 1_000, ..PlannerConfig::default() };
//! let outcome = Planner::new(&config)?.run()?;
//! println!("{}", outcome.plan.rating());
//! for round in 1..=outcome.plan.sessions() {
//!     for (table, guests) in outcome.plan.seating_in_round(round) {
//!         println!("{round} {table}: {}", guests.join(", "));
//!     }
//! }
//! # Ok::<(), table_planner::PlannerError>(())
//! ```

pub mod allocator;
pub mod config;
pub mod model;
pub mod plan;
pub mod search;
pub mod usher;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use allocator::{Allocator, SeatingError};
pub use config::{ConfigError, PlannerConfig, Venue};
pub use plan::{Plan, PlanFactory, ParameterStats, Rating};
pub use search::{Acceptance, Search, SearchError, SearchOutcome, Verdict};

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
}

/// A validated configuration, ready to search.
#[derive(Debug, Clone)]
pub struct Planner {
    factory: Arc<PlanFactory>,
    search: Search,
}

impl Planner {
    pub fn new(config: &PlannerConfig) -> Result<Planner, ConfigError> {
        let factory = config.factory()?;
        let acceptance = Acceptance::new(factory.guests(), factory.tables(), factory.sessions());
        let search = Search::new(config.iterations, config.threads, acceptance);
        Ok(Planner { factory: Arc::new(factory), search })
    }

    pub fn factory(&self) -> &PlanFactory {
        &self.factory
    }

    pub fn acceptance(&self) -> Acceptance {
        self.search.acceptance()
    }

    pub fn run(&self) -> Result<SearchOutcome<Plan>, PlannerError> {
        let acceptance = self.acceptance();
        info!(
            guests = self.factory.guests(),
            tables = self.factory.tables(),
            sessions = self.factory.sessions(),
            iterations = self.search.iterations(),
            threads = self.search.threads(),
            max_follow_ups = acceptance.max_follow_ups,
            ignore_table_balance = acceptance.ignore_table_balance,
            "starting table plan search"
        );

        let factory = Arc::clone(&self.factory);
        let outcome = self.search.run(move |unit| factory.simulate(unit))?;

        info!(
            processed = outcome.processed,
            verdict = ?outcome.verdict,
            rating = %outcome.plan.rating(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "table plan search finished"
        );
        info!("{}", outcome.plan.score_stats());
        info!("{}", outcome.plan.diversity_stats());
        info!("{}", outcome.plan.follow_up_stats());
        Ok(outcome)
    }
}
