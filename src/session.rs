use std::sync::Arc;

use log::{debug, info, warn};

use crate::completion::Completion;
use crate::lieutenant::Lieutenant;
use crate::mailbox::Mailboxes;
use crate::report::ReportSink;
use crate::{Config, Error, NodeId, Order, PathMessage, Result};

/// Everything one simulation needs: the configuration, one mailbox per
/// (level, general), the completion signal and the report sink.
///
/// The caller spawns one task per lieutenant running [`Session::general`]
/// and calls [`Session::broadcast`] for the commander. Share the session
/// with an `Arc`; every entry point takes `&self`.
pub struct Session {
    config: Config,
    mailboxes: Mailboxes,
    completion: Completion,
    sink: Arc<dyn ReportSink>,
}

impl Session {
    /// Allocates the resources for `config`. Nothing is allocated when the
    /// configuration is rejected.
    pub fn setup(config: Config, sink: Arc<dyn ReportSink>) -> Result<Self> {
        config.validate()?;
        info!(
            "setting up {} generals with {} traitors, reporter {}",
            config.n(),
            config.traitors(),
            config.reporter()
        );

        Ok(Self {
            mailboxes: Mailboxes::new(&config),
            completion: Completion::new(),
            config,
            sink,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends `order` from `commander` to every other general and waits until
    /// all of them have finished OM.
    pub async fn broadcast(&self, order: Order, commander: NodeId) -> Result<()> {
        if self.mailboxes.is_closed() {
            return Err(Error::SessionClosed);
        }
        self.config.check_general(commander)?;

        let top = self.config.top_level();
        let loyal = self.config.is_loyal(commander);
        info!("[GEN-{}] commands {} (loyal: {})", commander, order, loyal);

        for to in self.config.generals().filter(|to| *to != commander) {
            let sent = if loyal { order } else { Order::for_parity(to) };
            let msg = PathMessage::from_commander(commander, sent);
            debug!("[GEN-{}] sends {} to {}", commander, msg, to);
            self.mailboxes.post(top, to, &msg)?;
        }

        let expected = self.config.n() - 1;
        let failed = self
            .completion
            .wait_for(expected, self.config.watchdog())
            .await?;
        self.sink.end_round();

        if failed > 0 {
            warn!("[GEN-{}] {} generals failed this round", commander, failed);
            return Err(Error::GeneralsFailed(failed));
        }
        Ok(())
    }

    /// Runs general `id` as a lieutenant for one round.
    ///
    /// Completion is signalled whether or not OM succeeded, so the commander
    /// never waits on a general that already gave up.
    pub async fn general(&self, id: NodeId) -> Result<()> {
        self.config.check_general(id)?;
        let inbox = self.mailboxes.take_inbox(id)?;

        let mut lieutenant = Lieutenant::new(&self.config, &self.mailboxes, &*self.sink, inbox);
        let res = lieutenant.run().await;
        if let Err(err) = &res {
            warn!("[GEN-{}] failed: {}", id, err);
        }

        self.mailboxes.return_inbox(lieutenant.into_inbox());
        self.completion.signal(res.is_ok());
        res
    }

    /// Releases every mailbox and the completion signal. Safe to call more
    /// than once; later calls do nothing.
    pub fn cleanup(&self) {
        if self.mailboxes.is_closed() {
            return;
        }
        info!("cleaning up {} generals", self.config.n());
        self.mailboxes.close();
        self.completion.close();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cleanup();
    }
}
