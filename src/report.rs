use std::sync::Mutex;

use crate::PathMessage;

/// Where the reporter's level 0 messages end up.
///
/// The sink only records what it is given; deciding on an order from the
/// reported paths is up to whoever reads them.
pub trait ReportSink: Send + Sync {
    fn emit(&self, msg: &PathMessage);

    /// Marks the end of one broadcast round.
    fn end_round(&self);
}

/// Prints each message as `" {path} "` and a newline per round.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn emit(&self, msg: &PathMessage) {
        print!(" {} ", msg);
    }

    fn end_round(&self) {
        println!();
    }
}

/// Keeps every reported message in memory, grouped by round.
#[derive(Debug, Default)]
pub struct Transcript {
    rounds: Mutex<Vec<Vec<PathMessage>>>,
    current: Mutex<Vec<PathMessage>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed rounds, oldest first.
    pub fn rounds(&self) -> Vec<Vec<PathMessage>> {
        self.rounds
            .lock()
            .map(|rounds| rounds.clone())
            .unwrap_or_default()
    }

    pub fn last_round(&self) -> Option<Vec<PathMessage>> {
        self.rounds().pop()
    }

    /// Same text `StdoutSink` would have printed for the completed rounds.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for round in self.rounds() {
            for msg in round {
                text.push_str(&format!(" {} ", msg));
            }
            text.push('\n');
        }
        text
    }
}

impl ReportSink for Transcript {
    fn emit(&self, msg: &PathMessage) {
        if let Ok(mut current) = self.current.lock() {
            current.push(msg.clone());
        }
    }

    fn end_round(&self) {
        let round = match self.current.lock() {
            Ok(mut current) => std::mem::take(&mut *current),
            Err(_) => return,
        };
        if let Ok(mut rounds) = self.rounds.lock() {
            rounds.push(round);
        }
    }
}
