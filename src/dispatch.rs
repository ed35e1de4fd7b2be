//! Marshaling observer work onto the consumer's thread.
//!
//! Observers run on a bridge's listener thread.  Anything that touches
//! consumer state (a UI, the status snapshot) must instead be posted as a
//! task to the thread that owns that state.  [`MainQueue`] is that thread's
//! task queue; [`QueueDispatcher`] is the sending half handed to observers.
//!
//! Tasks receive `&mut S`, the state owned by the thread that drains the
//! queue.  The state itself never crosses threads and need not be `Send`.
//!
//! ```ignore
//! let (mut queue, dispatcher) = MainQueue::<Status>::new();
//! bridge.register_observer(marshal(&dispatcher, |status: &mut Status, record| {
//!     // runs on the thread that drives `queue`
//! }));
//! loop {
//!     queue.run_for(&mut status, Duration::from_secs(1))?;
//! }
//! ```

use crate::bridge::Observer;
use crate::types::EventRecord;
use log::debug;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// A unit of work posted to the consumer's thread.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Something that can run a [`Task`] on another thread.
pub trait Dispatcher<S>: Send + Sync {
    /// Queue `task` and return immediately.
    fn post(&self, task: Task<S>);
}

/// Sending half of a [`MainQueue`].
pub struct QueueDispatcher<S> {
    tx: mpsc::Sender<Task<S>>,
}

impl<S> Clone for QueueDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> Dispatcher<S> for QueueDispatcher<S> {
    fn post(&self, task: Task<S>) {
        if self.tx.send(task).is_err() {
            debug!("main queue closed, dropping task");
        }
    }
}

/// Every [`QueueDispatcher`] has been dropped; no more tasks can arrive.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("all dispatchers disconnected")]
pub struct Disconnected;

/// Task queue owned by the consumer's thread.
pub struct MainQueue<S> {
    rx: mpsc::Receiver<Task<S>>,
}

impl<S> MainQueue<S> {
    /// Create a queue and its first dispatcher.
    pub fn new() -> (Self, QueueDispatcher<S>) {
        let (tx, rx) = mpsc::channel();
        (Self { rx }, QueueDispatcher { tx })
    }

    /// Run every task that is already queued.  Returns how many ran.
    pub fn run_pending(&mut self, state: &mut S) -> Result<usize, Disconnected> {
        let mut ran = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    task(state);
                    ran += 1;
                }
                Err(mpsc::TryRecvError::Empty) => return Ok(ran),
                Err(mpsc::TryRecvError::Disconnected) if ran > 0 => return Ok(ran),
                Err(mpsc::TryRecvError::Disconnected) => return Err(Disconnected),
            }
        }
    }

    /// Wait up to `timeout` for a task, then drain the queue.
    ///
    /// Returns `Ok(0)` when the timeout elapsed with nothing to do, which
    /// is the consumer's cue to run its periodic polling.
    pub fn run_for(&mut self, state: &mut S, timeout: Duration) -> Result<usize, Disconnected> {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task(state);
                match self.run_pending(state) {
                    Ok(n) => Ok(n + 1),
                    Err(Disconnected) => Ok(1),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(0),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Disconnected),
        }
    }
}

/// Wrap `f` in an observer that posts it to `dispatcher` instead of running
/// it on the listener thread.
///
/// The record is cloned into the task; the listener returns as soon as the
/// task is queued.
pub fn marshal<S, D, F>(dispatcher: &D, f: F) -> Observer
where
    S: 'static,
    D: Dispatcher<S> + Clone + 'static,
    F: Fn(&mut S, EventRecord) + Send + Sync + 'static,
{
    let dispatcher = dispatcher.clone();
    let f = Arc::new(f);
    Arc::new(move |record: &EventRecord| {
        let f = Arc::clone(&f);
        let record = record.clone();
        dispatcher.post(Box::new(move |state: &mut S| f(state, record)));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::EventBridge;
    use crate::traits::{Transport, TransportError};
    use std::cell::Cell;
    use std::io::{BufRead, Cursor};
    use std::rc::Rc;
    use std::thread::ThreadId;

    struct BytesTransport(&'static [u8]);

    impl Transport for BytesTransport {
        fn describe(&self) -> String {
            "bytes".into()
        }

        fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
            Ok(Box::new(Cursor::new(self.0)))
        }
    }

    #[test]
    fn run_pending_runs_in_post_order() {
        let (mut queue, dispatcher) = MainQueue::<Vec<u32>>::new();
        for i in 0..3 {
            dispatcher.post(Box::new(move |v: &mut Vec<u32>| v.push(i)));
        }
        let mut seen = Vec::new();
        assert_eq!(queue.run_pending(&mut seen), Ok(3));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(queue.run_pending(&mut seen), Ok(0));
    }

    #[test]
    fn run_for_times_out_when_idle() {
        let (mut queue, _dispatcher) = MainQueue::<()>::new();
        assert_eq!(queue.run_for(&mut (), Duration::from_millis(10)), Ok(0));
    }

    #[test]
    fn queue_reports_disconnect() {
        let (mut queue, dispatcher) = MainQueue::<()>::new();
        drop(dispatcher);
        assert_eq!(queue.run_pending(&mut ()), Err(Disconnected));
        assert_eq!(
            queue.run_for(&mut (), Duration::from_millis(10)),
            Err(Disconnected)
        );
    }

    #[test]
    fn tasks_queued_before_disconnect_still_run() {
        let (mut queue, dispatcher) = MainQueue::<u32>::new();
        dispatcher.post(Box::new(|n: &mut u32| *n += 1));
        drop(dispatcher);
        let mut n = 0;
        assert_eq!(queue.run_for(&mut n, Duration::from_millis(10)), Ok(1));
        assert_eq!(n, 1);
        assert_eq!(queue.run_pending(&mut n), Err(Disconnected));
    }

    /// Main-thread state that is deliberately not `Send`.
    struct UiState {
        seen: Vec<(String, ThreadId)>,
        redraws: Rc<Cell<u32>>,
    }

    #[test]
    fn marshaled_observer_runs_on_queue_thread() {
        let (mut queue, dispatcher) = MainQueue::<UiState>::new();

        let bridge = EventBridge::new("marshal");
        bridge.register_observer(marshal(&dispatcher, |ui: &mut UiState, record| {
            ui.seen
                .push((record.as_str().to_string(), std::thread::current().id()));
            ui.redraws.set(ui.redraws.get() + 1);
        }));
        drop(dispatcher);

        bridge
            .start(BytesTransport(b"workspace>>1\nworkspace>>2\n"))
            .unwrap()
            .join();

        let mut ui = UiState {
            seen: Vec::new(),
            redraws: Rc::new(Cell::new(0)),
        };

        // The bridge still holds the observer (and its dispatcher clone).
        assert_eq!(queue.run_pending(&mut ui), Ok(2));
        let me = std::thread::current().id();
        assert_eq!(
            ui.seen,
            vec![("workspace>>1".to_string(), me), ("workspace>>2".to_string(), me)]
        );
        assert_eq!(ui.redraws.get(), 2);
    }
}
