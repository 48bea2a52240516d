use std::time::{Duration, Instant};

use dagpool::exec::{CompletionMessage, CompletionSink};
use parking_lot::{Condvar, Mutex};

/// A completion sink that:
/// - records every delivered batch, in delivery order
/// - lets tests block until a given number of completions has arrived.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<CompletionMessage>>>,
    delivered: Condvar,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<CompletionMessage>> {
        self.batches.lock().clone()
    }

    /// All messages, flattened in delivery order.
    pub fn messages(&self) -> Vec<CompletionMessage> {
        self.batches.lock().iter().flatten().copied().collect()
    }

    /// Wait until at least `count` messages have been delivered.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut batches = self.batches.lock();
        loop {
            let seen: usize = batches.iter().map(Vec::len).sum();
            if seen >= count {
                return true;
            }
            if self.delivered.wait_until(&mut batches, deadline).timed_out() {
                return batches.iter().map(Vec::len).sum::<usize>() >= count;
            }
        }
    }
}

impl CompletionSink for RecordingSink {
    fn deliver_completions(&self, batch: Vec<CompletionMessage>) {
        let mut batches = self.batches.lock();
        batches.push(batch);
        self.delivered.notify_all();
    }
}
