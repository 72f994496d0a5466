//! Planner configuration and input validation.
//!
//! Every bound is checked before any simulation starts:
//!
//! ```
//! use table_planner::config::{ConfigError, PlannerConfig};
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     tables = 5
//!     sessions = 3
//!     guests = 24
//!     iterations = 500
//! "#).unwrap();
//! let venue = config.validate().unwrap();
//! assert_eq!(venue.tables, ["1", "2", "3", "4", "5"]);
//! assert_eq!(venue.guests.len(), 24);
//!
//! let config = PlannerConfig { threads: 1, ..PlannerConfig::default() };
//! assert!(matches!(config.validate(), Err(ConfigError::Threads(1))));
//! ```

use std::ops::RangeInclusive;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::entity::Round;
use crate::plan::PlanFactory;

pub const TABLES: RangeInclusive<usize> = 3..=5;
pub const SESSIONS: RangeInclusive<Round> = 2..=5;
pub const MAX_PEOPLE: usize = 50;
pub const ITERATIONS: RangeInclusive<usize> = 100..=1_000_000;
pub const THREADS: RangeInclusive<usize> = 2..=16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("between 3 and 5 tables are supported, got {0}")]
    TableCount(usize),

    #[error("between 2 and 5 sessions are supported, got {0}")]
    SessionCount(Round),

    #[error("between {min} and {max} guests are supported, got {count}")]
    GuestCount { count: usize, min: usize, max: usize },

    #[error("names for at least 1 host and 1 guest for each table and no more than {max} names are required, got {count} (minimum {min})")]
    NameCount { count: usize, min: usize, max: usize },

    #[error("between 100 and 1,000,000 iterations are expected, got {0}")]
    Iterations(usize),

    #[error("between 2 and 16 threads are supported, got {0}")]
    Threads(usize),

    #[error("name {0} is blank")]
    BlankName(usize),

    #[error("name {0:?} is used more than once")]
    DuplicateName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlannerConfig {
    pub tables: usize,
    pub sessions: Round,
    /// Ignored when `names` is given.
    pub guests: usize,
    /// Hosts first, one per table, then the guests.
    pub names: Option<Vec<String>>,
    pub iterations: usize,
    pub threads: usize,
    /// Makes every simulation reproducible.
    pub seed: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            tables: 4,
            sessions: 4,
            guests: 16,
            names: None,
            iterations: 10_000,
            threads: 8,
            seed: None,
        }
    }
}

/// Validated table and guest identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub tables: Vec<String>,
    pub guests: Vec<String>,
}

impl PlannerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn validate(&self) -> Result<Venue, ConfigError> {
        if !TABLES.contains(&self.tables) {
            return Err(ConfigError::TableCount(self.tables));
        }
        if !SESSIONS.contains(&self.sessions) {
            return Err(ConfigError::SessionCount(self.sessions));
        }
        if !ITERATIONS.contains(&self.iterations) {
            return Err(ConfigError::Iterations(self.iterations));
        }
        if !THREADS.contains(&self.threads) {
            return Err(ConfigError::Threads(self.threads));
        }

        let people = self.tables * 2..=MAX_PEOPLE;
        let venue = match &self.names {
            Some(names) => {
                if !people.contains(&names.len()) {
                    return Err(ConfigError::NameCount {
                        count: names.len(),
                        min: *people.start(),
                        max: MAX_PEOPLE,
                    });
                }
                if let Some(blank) = names.iter().position(|n| n.trim().is_empty()) {
                    return Err(ConfigError::BlankName(blank + 1));
                }
                let (tables, guests) = names.split_at(self.tables);
                Venue { tables: tables.to_vec(), guests: guests.to_vec() }
            }
            None => {
                if !people.contains(&self.guests) {
                    return Err(ConfigError::GuestCount {
                        count: self.guests,
                        min: *people.start(),
                        max: MAX_PEOPLE,
                    });
                }
                Venue { tables: numbered(self.tables), guests: numbered(self.guests) }
            }
        };

        for ids in [&venue.tables, &venue.guests] {
            if let Some(duplicate) = ids.iter().duplicates().next() {
                return Err(ConfigError::DuplicateName(duplicate.clone()));
            }
        }
        Ok(venue)
    }

    pub fn factory(&self) -> Result<PlanFactory, ConfigError> {
        let venue = self.validate()?;
        Ok(PlanFactory::new(self.sessions, venue.tables, venue.guests).with_seed(self.seed))
    }
}

fn numbered(count: usize) -> Vec<String> {
    (1..=count).map(|i| i.to_string()).collect()
}

/// One name per line, trimmed, blank lines skipped.
pub fn names_from_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
