use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{Error, NodeId, Result};

/// The value a commander orders and lieutenants relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Order {
    Attack,
    Retreat,
}

impl Order {
    pub fn symbol(self) -> char {
        match self {
            Order::Attack => 'A',
            Order::Retreat => 'R',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            'A' => Ok(Order::Attack),
            'R' => Ok(Order::Retreat),
            other => Err(Error::InvalidOrder(other)),
        }
    }

    /// The value a traitor sends, decided only by the parity of `id`.
    ///
    /// A traitor commander applies this to each recipient, a traitor
    /// lieutenant applies it to itself and lies the same way to everyone.
    pub fn for_parity(id: NodeId) -> Self {
        if id % 2 == 0 {
            Order::Retreat
        } else {
            Order::Attack
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<char> for Order {
    type Error = Error;

    fn try_from(symbol: char) -> Result<Self> {
        Order::from_symbol(symbol)
    }
}
