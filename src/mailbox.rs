use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use log::trace;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{Config, Error, Level, NodeId, PathMessage, Result};

// Sending half of one (level, general) mailbox.
struct Outbox {
    capacity: usize,
    tx: mpsc::Sender<Vec<u8>>,
}

/// The receiving halves of every mailbox addressed to one general.
///
/// Only the general itself reads from these, so it owns the inbox for as
/// long as it runs.
#[derive(Debug)]
pub(crate) struct Inbox {
    id: NodeId,
    max_hops: usize,
    watchdog: Option<Duration>,
    levels: Vec<mpsc::Receiver<Vec<u8>>>,
}

impl Inbox {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Waits for the next message at `level`, in arrival order.
    pub async fn recv(&mut self, level: Level) -> Result<PathMessage> {
        let general = self.id;
        let rx = self
            .levels
            .get_mut(level)
            .ok_or(Error::MailboxClosed { level, general })?;

        let received = match self.watchdog {
            Some(timeout) => tokio::time::timeout(timeout, rx.recv())
                .await
                .map_err(|_| Error::Watchdog { general, level })?,
            None => rx.recv().await,
        };
        let bytes = received.ok_or(Error::MailboxClosed { level, general })?;

        let msg: PathMessage = bincode::deserialize(&bytes)?;
        msg.validate(self.max_hops)?;
        trace!("[GEN-{}] L{} received {}", general, level, msg);
        Ok(msg)
    }
}

/// Every mailbox of a session, keyed by (level, general).
///
/// Each mailbox is bounded by the exact fan-in at its level, so a send that
/// finds it full is a protocol bug and is reported rather than retried.
pub(crate) struct Mailboxes {
    closed: AtomicBool,
    outboxes: RwLock<BTreeMap<(Level, NodeId), Outbox>>,
    inboxes: Mutex<BTreeMap<NodeId, Inbox>>,
}

impl Mailboxes {
    pub fn new(config: &Config) -> Self {
        let mut outboxes = BTreeMap::new();
        let mut inboxes = BTreeMap::new();

        for id in config.generals() {
            let mut levels = Vec::with_capacity(config.top_level() + 1);
            for level in 0..=config.top_level() {
                let capacity = config.mailbox_capacity(level);
                let (tx, rx) = mpsc::channel(capacity);
                outboxes.insert((level, id), Outbox { capacity, tx });
                levels.push(rx);
            }
            inboxes.insert(
                id,
                Inbox {
                    id,
                    max_hops: config.n(),
                    watchdog: config.watchdog(),
                    levels,
                },
            );
        }

        Self {
            closed: AtomicBool::new(false),
            outboxes: RwLock::new(outboxes),
            inboxes: Mutex::new(inboxes),
        }
    }

    /// Non-blocking send of `msg` into the mailbox of `general` at `level`.
    pub fn post(&self, level: Level, general: NodeId, msg: &PathMessage) -> Result<()> {
        let outboxes = self.outboxes.read().map_err(|_| Error::SessionClosed)?;
        let outbox = outboxes
            .get(&(level, general))
            .ok_or(Error::MailboxClosed { level, general })?;

        let bytes = bincode::serialize(msg)?;
        outbox.tx.try_send(bytes).map_err(|err| match err {
            TrySendError::Full(_) => Error::MailboxOverflow {
                level,
                general,
                capacity: outbox.capacity,
            },
            TrySendError::Closed(_) => Error::MailboxClosed { level, general },
        })?;
        Ok(())
    }

    pub fn take_inbox(&self, id: NodeId) -> Result<Inbox> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let mut inboxes = self.inboxes.lock().map_err(|_| Error::SessionClosed)?;
        inboxes.remove(&id).ok_or(Error::InboxTaken(id))
    }

    pub fn return_inbox(&self, inbox: Inbox) {
        if self.is_closed() {
            return;
        }
        if let Ok(mut inboxes) = self.inboxes.lock() {
            inboxes.insert(inbox.id(), inbox);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drops every mailbox. Generals blocked on a receive wake up with
    /// `MailboxClosed`. Calling this again is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut outboxes) = self.outboxes.write() {
            outboxes.clear();
        }
        if let Ok(mut inboxes) = self.inboxes.lock() {
            inboxes.clear();
        }
    }
}
