//! Background snapshot writer.
//!
//! Mutations send a dirty signal over a channel. The worker drains every
//! signal already queued before writing, so a burst of mutations costs one
//! snapshot. Write failures are logged and dropped.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::{CACHE_TARGET, CacheError};

#[derive(Debug)]
pub(super) struct Persister {
    sender: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Persister {
    pub(super) fn spawn<F>(mut persist: F) -> io::Result<Self>
    where
        F: FnMut() -> Result<(), CacheError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name("hangar-snapshot".to_owned())
            .spawn(move || {
                while receiver.recv().is_ok() {
                    let mut coalesced = 0_usize;
                    while receiver.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    match persist() {
                        Ok(()) => debug!(target: CACHE_TARGET, coalesced, "cache snapshot written"),
                        Err(error) => warn!(
                            target: CACHE_TARGET,
                            error = %error,
                            "cache snapshot failed"
                        ),
                    }
                }
            })?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub(super) fn mark_dirty(&self) {
        let delivered = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(()).is_ok());
        if !delivered {
            warn!(target: CACHE_TARGET, "snapshot worker is gone; mutation not persisted");
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued signals and exit.
        drop(self.sender.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!(target: CACHE_TARGET, "snapshot worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use rstest::{fixture, rstest};

    use super::*;

    /// Start times of every persist call.
    type WriteLog = Arc<Mutex<Vec<Instant>>>;

    #[fixture]
    fn writes() -> WriteLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn slow_persister(writes: &WriteLog, delay: Duration) -> Persister {
        let log = Arc::clone(writes);
        Persister::spawn(move || {
            log.lock().expect("write log mutex").push(Instant::now());
            thread::sleep(delay);
            Ok(())
        })
        .expect("spawn snapshot worker")
    }

    #[rstest]
    fn bursts_of_dirty_signals_coalesce(writes: WriteLog) {
        let persister = slow_persister(&writes, Duration::from_millis(50));

        for _ in 0..99 {
            persister.mark_dirty();
        }
        let last_signal = Instant::now();
        persister.mark_dirty();
        drop(persister);

        let log = writes.lock().expect("write log mutex");
        assert!(!log.is_empty(), "at least one snapshot is written");
        assert!(log.len() < 10, "100 signals produced {} writes", log.len());
        let last_write = log.last().copied().expect("a write was recorded");
        assert!(last_write >= last_signal, "a write must start after the final signal");
    }

    #[rstest]
    fn drop_flushes_signals_queued_behind_a_running_write(writes: WriteLog) {
        let persister = slow_persister(&writes, Duration::from_millis(100));

        persister.mark_dirty();
        thread::sleep(Duration::from_millis(20));
        let queued_at = Instant::now();
        persister.mark_dirty();
        drop(persister);

        let log = writes.lock().expect("write log mutex");
        assert_eq!(log.len(), 2);
        assert!(log[1] >= queued_at);
    }

    #[rstest]
    fn failed_writes_do_not_stop_the_worker() {
        let attempts = Arc::new(Mutex::new(0_usize));
        let counter = Arc::clone(&attempts);
        let persister = Persister::spawn(move || {
            *counter.lock().expect("attempt mutex") += 1;
            Err(CacheError::Poisoned)
        })
        .expect("spawn snapshot worker");

        persister.mark_dirty();
        thread::sleep(Duration::from_millis(50));
        persister.mark_dirty();
        drop(persister);

        assert_eq!(*attempts.lock().expect("attempt mutex"), 2);
    }

    #[rstest]
    fn idle_worker_writes_nothing(writes: WriteLog) {
        drop(slow_persister(&writes, Duration::ZERO));

        assert!(writes.lock().expect("write log mutex").is_empty());
    }
}
