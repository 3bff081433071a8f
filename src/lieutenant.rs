use futures::future::{BoxFuture, FutureExt};
use log::{debug, info, trace};

use crate::mailbox::{Inbox, Mailboxes};
use crate::report::ReportSink;
use crate::{Config, Level, NodeId, PathMessage, Result};

/// One lieutenant running OM(m) to completion.
///
/// Recursive calls within a lieutenant run one after the other; lieutenants
/// run concurrently with each other and only meet through the mailboxes.
pub(crate) struct Lieutenant<'a> {
    id: NodeId,
    config: &'a Config,
    mailboxes: &'a Mailboxes,
    sink: &'a dyn ReportSink,
    inbox: Inbox,
    relayed: usize,
    received: usize,
}

impl<'a> Lieutenant<'a> {
    pub fn new(
        config: &'a Config,
        mailboxes: &'a Mailboxes,
        sink: &'a dyn ReportSink,
        inbox: Inbox,
    ) -> Self {
        Self {
            id: inbox.id(),
            config,
            mailboxes,
            sink,
            inbox,
            relayed: 0,
            received: 0,
        }
    }

    /// Waits for the commander's order, then runs OM from the top level.
    pub async fn run(&mut self) -> Result<()> {
        let top = self.config.top_level();
        let order = self.inbox.recv(top).await?;
        debug!("[GEN-{}] commander says {}", self.id, order);

        self.om(top, order).await?;
        info!(
            "[GEN-{}] done: relayed {} messages, received {}",
            self.id, self.relayed, self.received
        );
        Ok(())
    }

    pub fn into_inbox(self) -> Inbox {
        self.inbox
    }

    fn om(&mut self, level: Level, msg: PathMessage) -> BoxFuture<'_, Result<()>> {
        async move {
            if level == 0 {
                self.report(&msg);
                return Ok(());
            }

            // every general we relayed to relays back to us exactly once
            let sent = self.fan_out(level - 1, &msg)?;
            for _ in 0..sent {
                let next = self.inbox.recv(level - 1).await?;
                self.received += 1;
                self.om(level - 1, next).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn fan_out(&mut self, level: Level, msg: &PathMessage) -> Result<usize> {
        let loyal = self.config.is_loyal(self.id);
        let relay = msg.relay(self.id, loyal)?;
        if relay.order() != msg.order() {
            debug!("[GEN-{}] traitor turns {} into {}", self.id, msg, relay);
        }

        let mut sent = 0;
        for to in self.config.generals().filter(|to| !relay.contains(*to)) {
            self.mailboxes.post(level, to, &relay)?;
            sent += 1;
        }
        trace!("[GEN-{}] L{} relayed {} to {} generals", self.id, level, relay, sent);
        self.relayed += sent;
        Ok(sent)
    }

    fn report(&self, msg: &PathMessage) {
        let reporter = self.config.reporter();
        if self.id == reporter && !msg.contains(reporter) {
            self.sink.emit(msg);
        }
    }
}
