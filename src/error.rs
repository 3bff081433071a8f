use thiserror::Error;

use crate::{Level, NodeId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("OM(m) requires n > 3m, got n = {n} with {traitors} traitors")]
    TooManyTraitors { n: usize, traitors: usize },
    #[error("The simulation supports at most {max} generals, got {n}")]
    TooManyGenerals { n: usize, max: usize },
    #[error("General {id} does not exist (n = {n})")]
    UnknownGeneral { id: NodeId, n: usize },
    #[error("Mailbox of general {general} at level {level} is full (capacity {capacity})")]
    MailboxOverflow {
        level: Level,
        general: NodeId,
        capacity: usize,
    },
    #[error("Mailbox of general {general} at level {level} was closed")]
    MailboxClosed { level: Level, general: NodeId },
    #[error("General {0} is already running in this session")]
    InboxTaken(NodeId),
    #[error("General {id} already appears in path {path:?}")]
    CycleInPath { id: NodeId, path: Vec<NodeId> },
    #[error("Path of {len} hops exceeds the bound of {max}")]
    PathTooLong { len: usize, max: usize },
    #[error("Invalid order symbol {0:?}")]
    InvalidOrder(char),
    #[error("Invalid path message {0:?}")]
    InvalidPath(String),
    #[error("Failed to encode with bincode")]
    Encoding(#[from] bincode::Error),
    #[error("General {general} timed out waiting at level {level}")]
    Watchdog { general: NodeId, level: Level },
    #[error("Broadcast timed out with {finished} of {expected} generals finished")]
    BroadcastTimedOut { finished: usize, expected: usize },
    #[error("{0} generals failed during the round")]
    GeneralsFailed(usize),
    #[error("The session has been cleaned up")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
