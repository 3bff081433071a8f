use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Level, NodeId, Result};

/// Upper bound on the number of generals in one simulation.
pub const MAX_GENERALS: usize = 16;

/// The fixed parameters of one simulation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    loyalty: Vec<bool>,
    reporter: NodeId,
    #[serde(default)]
    watchdog: Option<Duration>,
}

impl Config {
    /// `loyalty[i]` is false when general `i` is a traitor.
    pub fn new(loyalty: Vec<bool>, reporter: NodeId) -> Result<Self> {
        let config = Self {
            loyalty,
            reporter,
            watchdog: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Bounds every blocking wait by `timeout` instead of waiting forever.
    #[must_use]
    pub fn with_watchdog(mut self, timeout: Duration) -> Self {
        self.watchdog = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.n();
        if n > MAX_GENERALS {
            return Err(Error::TooManyGenerals {
                n,
                max: MAX_GENERALS,
            });
        }
        let traitors = self.traitors();
        if n <= 3 * traitors {
            return Err(Error::TooManyTraitors { n, traitors });
        }
        self.check_general(self.reporter)
    }

    pub fn n(&self) -> usize {
        self.loyalty.len()
    }

    /// The number of traitors, which is also the top recursion level `m`.
    pub fn traitors(&self) -> usize {
        self.loyalty.iter().filter(|loyal| !**loyal).count()
    }

    pub fn top_level(&self) -> Level {
        self.traitors()
    }

    pub fn is_loyal(&self, id: NodeId) -> bool {
        self.loyalty.get(id).copied().unwrap_or(false)
    }

    pub fn reporter(&self) -> NodeId {
        self.reporter
    }

    pub fn watchdog(&self) -> Option<Duration> {
        self.watchdog
    }

    pub fn generals(&self) -> impl Iterator<Item = NodeId> {
        0..self.n()
    }

    pub fn check_general(&self, id: NodeId) -> Result<()> {
        if id < self.n() {
            Ok(())
        } else {
            Err(Error::UnknownGeneral { id, n: self.n() })
        }
    }

    /// Number of messages one lieutenant receives at `level`.
    ///
    /// A message at `level` carries the commander plus `m - level` distinct
    /// relays, none of them the receiver, so the count is the number of
    /// ordered picks of `m - level` relays out of the other `n - 2` generals.
    pub fn mailbox_capacity(&self, level: Level) -> usize {
        let depth = self.top_level().saturating_sub(level);
        let others = self.n().saturating_sub(2);
        (0..depth)
            .map(|k| others.saturating_sub(k))
            .product::<usize>()
            .max(1)
    }
}
