use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, NodeId, Order, Result};

/// An order annotated with every general that has relayed it.
///
/// `path[0]` is the most recent relay and the last entry is the commander,
/// so the text form reads `"3:0:1:A"` for "3 heard from 0 who heard from
/// commander 1 that the order is Attack".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathMessage {
    path: Vec<NodeId>,
    order: Order,
}

impl PathMessage {
    /// The message a commander sends to its lieutenants.
    pub fn from_commander(commander: NodeId, order: Order) -> Self {
        Self {
            path: vec![commander],
            order,
        }
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn commander(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    pub fn hops(&self) -> usize {
        self.path.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.path.contains(&id)
    }

    /// Builds the message `relayer` forwards after receiving `self`.
    ///
    /// A loyal relayer keeps the order, a traitor replaces it with its
    /// parity value regardless of what it received.
    pub fn relay(&self, relayer: NodeId, loyal: bool) -> Result<Self> {
        if self.contains(relayer) {
            return Err(Error::CycleInPath {
                id: relayer,
                path: self.path.clone(),
            });
        }
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(relayer);
        path.extend_from_slice(&self.path);

        let order = if loyal {
            self.order
        } else {
            Order::for_parity(relayer)
        };
        Ok(Self { path, order })
    }

    /// Checks a message that arrived from another general.
    pub fn validate(&self, max_hops: usize) -> Result<()> {
        if self.path.is_empty() || self.path.len() > max_hops {
            return Err(Error::PathTooLong {
                len: self.path.len(),
                max: max_hops,
            });
        }
        for (i, id) in self.path.iter().enumerate() {
            if self.path[i + 1..].contains(id) {
                return Err(Error::CycleInPath {
                    id: *id,
                    path: self.path.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Display for PathMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.path.iter() {
            write!(f, "{}:", id)?;
        }
        write!(f, "{}", self.order)
    }
}

impl FromStr for PathMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts: Vec<&str> = s.trim().split(':').collect();
        let invalid = || Error::InvalidPath(s.to_string());

        let order = match parts.pop().map(|p| p.chars().collect::<Vec<_>>()) {
            Some(symbol) if symbol.len() == 1 => Order::from_symbol(symbol[0])?,
            _ => return Err(invalid()),
        };
        if parts.is_empty() {
            return Err(invalid());
        }
        let path = parts
            .into_iter()
            .map(|p| p.parse::<NodeId>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { path, order })
    }
}
