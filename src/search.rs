use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::allocator::SeatingError;
use crate::model::condition::{Score, PERFECT_PLAN_RATING};
use crate::model::entity::Round;
use crate::plan::Plan;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("plan could not be seated: {0}")]
    Seating(#[from] SeatingError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to start plan scheduler: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("no plan was generated")]
    NoResults,
}

/// What the search needs to know about a finished plan.
pub trait Candidate {
    fn rating(&self) -> Score;
    fn max_follow_ups(&self) -> Score;
    fn table_score(&self) -> Score;
}

impl Candidate for Plan {
    fn rating(&self) -> Score {
        Plan::rating(self).value()
    }

    fn max_follow_ups(&self) -> Score {
        self.follow_up_stats().max
    }

    fn table_score(&self) -> Score {
        Plan::rating(self).table_balance
    }
}

/// Thresholds a plan must meet to be preferred over the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    pub max_follow_ups: usize,
    pub ignore_table_balance: bool,
}

impl Acceptance {
    pub fn new(guests: usize, tables: usize, sessions: Round) -> Acceptance {
        Acceptance {
            max_follow_ups: max_follow_ups(guests, tables),
            ignore_table_balance: tables as i64 - sessions as i64 >= 1,
        }
    }

    pub fn accepts<C: Candidate>(&self, plan: &C) -> bool {
        plan.max_follow_ups() <= self.max_follow_ups as Score
            && (self.ignore_table_balance || plan.table_score() == 1.0)
    }
}

/// `ceil(log(guests) / log(tables))`, the smallest `k` with `tables^k >= guests`.
fn max_follow_ups(guests: usize, tables: usize) -> usize {
    if tables < 2 {
        return guests;
    }
    let mut k = 0;
    let mut reach = 1usize;
    while reach < guests {
        reach = reach.saturating_mul(tables);
        k += 1;
    }
    k
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A plan hit the perfect rating and ended the search early.
    Perfect,
    /// Best plan among those meeting the acceptance thresholds.
    Accepted,
    /// Nothing met the thresholds; best plan overall.
    Fallback,
}

#[derive(Debug)]
pub struct SearchOutcome<C> {
    pub plan: C,
    pub processed: usize,
    pub verdict: Verdict,
    pub elapsed: Duration,
}

type Published<C> = Result<C, SeatingError>;

/// Runs independent plan simulations on a worker pool and keeps the best one.
#[derive(Debug, Clone)]
pub struct Search {
    iterations: usize,
    threads: usize,
    acceptance: Acceptance,
    perfect_rating: Score,
}

impl Search {
    pub fn new(iterations: usize, threads: usize, acceptance: Acceptance) -> Search {
        Search { iterations, threads: threads.max(1), acceptance, perfect_rating: PERFECT_PLAN_RATING }
    }

    pub fn with_perfect_rating(mut self, rating: Score) -> Search {
        self.perfect_rating = rating;
        self
    }

    pub fn acceptance(&self) -> Acceptance {
        self.acceptance
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Simulates up to `iterations` units, `unit(n)` producing the `n`th plan.
    ///
    /// Returns on the first perfect plan or once every unit has reported. A
    /// seating failure in any unit aborts the whole search. Units still running
    /// when this returns are abandoned.
    pub fn run<C, F>(&self, unit: F) -> Result<SearchOutcome<C>, SearchError>
    where
        C: Candidate + Send + 'static,
        F: Fn(u64) -> Result<C, SeatingError> + Send + Sync + 'static,
    {
        let started = Instant::now();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("plan-worker-{i}"))
            .build()?;
        let cancelled = Arc::new(AtomicBool::new(false));
        let (result_tx, result_rx) = channel::unbounded();

        let scheduler = Scheduler {
            pool,
            slots: self.threads,
            iterations: self.iterations,
            cancelled: Arc::clone(&cancelled),
            unit: Arc::new(unit),
        };
        thread::Builder::new()
            .name("plan-scheduler".into())
            .spawn(move || scheduler.run(result_tx))?;

        let consumed = self.consume(&result_rx, &cancelled);
        cancelled.store(true, Ordering::Relaxed);
        let (plan, processed, verdict) = consumed?;

        Ok(SearchOutcome { plan, processed, verdict, elapsed: started.elapsed() })
    }

    fn consume<C: Candidate>(
        &self,
        results: &Receiver<Published<C>>,
        cancelled: &AtomicBool,
    ) -> Result<(C, usize, Verdict), SearchError> {
        let mut processed = 0;
        let mut best_accepted: Option<C> = None;
        let mut best_rejected: Option<C> = None;

        while processed < self.iterations {
            let Ok(result) = results.recv() else {
                break;
            };
            processed += 1;
            let plan = result?;
            if plan.rating() == self.perfect_rating {
                cancelled.store(true, Ordering::Relaxed);
                debug!(processed, "perfect plan found, no further plans scheduled");
                return Ok((plan, processed, Verdict::Perfect));
            }
            if self.acceptance.accepts(&plan) {
                keep_better(&mut best_accepted, plan);
            } else {
                keep_better(&mut best_rejected, plan);
            }
        }

        match (best_accepted, best_rejected) {
            (Some(plan), _) => Ok((plan, processed, Verdict::Accepted)),
            (None, Some(plan)) => {
                warn!(processed, "no plan met the acceptance thresholds, using the best rated one");
                Ok((plan, processed, Verdict::Fallback))
            }
            (None, None) => Err(SearchError::NoResults),
        }
    }
}

fn keep_better<C: Candidate>(best: &mut Option<C>, plan: C) {
    if best.as_ref().map_or(true, |b| plan.rating() < b.rating()) {
        *best = Some(plan);
    }
}

/// Feeds units to the pool, holding at most `slots` in flight.
struct Scheduler<F> {
    pool: ThreadPool,
    slots: usize,
    iterations: usize,
    cancelled: Arc<AtomicBool>,
    unit: Arc<F>,
}

impl<F> Scheduler<F> {
    fn run<C>(self, results: Sender<Published<C>>)
    where
        C: Send + 'static,
        F: Fn(u64) -> Published<C> + Send + Sync + 'static,
    {
        let (slot_tx, slot_rx) = channel::bounded(self.slots);
        for _ in 0..self.slots {
            if slot_tx.send(()).is_err() {
                return;
            }
        }

        for n in 0..self.iterations as u64 {
            if slot_rx.recv().is_err() || self.cancelled.load(Ordering::Relaxed) {
                debug!(scheduled = n, "plan scheduling stopped");
                return;
            }
            let unit = Arc::clone(&self.unit);
            let results = results.clone();
            let slot = slot_tx.clone();
            self.pool.spawn(move || {
                // the consumer may already be gone
                let _ = results.send(unit(n));
                let _ = slot.send(());
            });
        }
    }
}
