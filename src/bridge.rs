//! The event bridge: one background listener, many observers.
//!
//! An [`EventBridge`] owns a list of observers.  [`EventBridge::start`]
//! connects a [`Transport`] on the calling thread and then hands the
//! reader to a dedicated listener thread, which reads one line at a time
//! and calls every registered observer with the trimmed line before it
//! reads the next one.
//!
//! # Delivery guarantees
//!
//! * Records reach each observer in arrival order, exactly once.
//! * Observers run synchronously on the listener thread, in registration
//!   order.  A slow observer delays the ones after it.
//! * Records that arrive before an observer registers are not replayed.
//! * The observer list is snapshotted before each fan-out.  An observer
//!   registered from inside a callback does not see the in-flight record;
//!   it sees every record after it.
//! * A panicking observer is logged and skipped; the remaining observers
//!   still receive the record.
//!
//! Observers must not touch UI state directly.  Wrap them with
//! [`marshal`](crate::dispatch::marshal) to run the real work on the
//! consumer's thread.
//!
//! # End of stream
//!
//! When the peer closes or a read fails the listener ends quietly; there is
//! no reconnect and no synthetic record in the observer stream.  Consumers
//! that care can register an [`on_disconnect`](EventBridge::on_disconnect)
//! hook or [`join`](BridgeHandle::join) the handle.

use crate::traits::{Transport, TransportError};
use crate::types::{EndReason, EventRecord, StreamEnd};
use log::{debug, error, info, warn};
use std::io::{BufRead, ErrorKind};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// A callback invoked once per received record.
pub type Observer = Arc<dyn Fn(&EventRecord) + Send + Sync>;

/// A callback invoked once when the listener stops.
pub type DisconnectHook = Box<dyn FnOnce(&StreamEnd) + Send>;

/// Errors from starting a bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The transport could not be established.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// [`EventBridge::start`] was already called successfully.
    #[error("bridge {0:?} is already started")]
    AlreadyStarted(String),
    /// The OS refused to spawn the listener thread.
    #[error("failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),
}

#[derive(Default)]
struct DisconnectState {
    hooks: Vec<DisconnectHook>,
    end: Option<StreamEnd>,
}

struct Shared {
    name: String,
    observers: Mutex<Vec<Observer>>,
    disconnect: Mutex<DisconnectState>,
    started: AtomicBool,
    lines: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Observers never run under these locks, so a poisoned lock only means
    // a panic inside a trivial push/clone; the data is still consistent.
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn dispatch(&self, record: &EventRecord) {
        let observers: Vec<Observer> = lock(&self.observers).clone();
        for (index, observer) in observers.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer(record)));
            if outcome.is_err() {
                error!(
                    "{}: observer #{} panicked on {:?}",
                    self.name,
                    index,
                    record.as_str()
                );
            }
        }
    }

    fn finish(&self, end: StreamEnd) {
        let hooks = {
            let mut state = lock(&self.disconnect);
            state.end = Some(end.clone());
            std::mem::take(&mut state.hooks)
        };
        for hook in hooks {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(&end))).is_err() {
                error!("{}: disconnect hook panicked", self.name);
            }
        }
    }
}

/// Fans records from one transport out to any number of observers.
///
/// Cloning is cheap and every clone refers to the same bridge, so the
/// bridge can be handed to as many consumers as need it.
///
/// # Typical usage
///
/// ```ignore
/// let bridge = EventBridge::new("hyprland");
/// bridge.register(|record| {
///     if record.is("workspace") {
///         println!("now on {}", record.data().unwrap_or_default());
///     }
/// });
/// let handle = bridge.start(Socket2Transport::from_env())?;
/// ```
#[derive(Clone)]
pub struct EventBridge {
    shared: Arc<Shared>,
}

impl EventBridge {
    /// Create an idle bridge with no observers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                observers: Mutex::new(Vec::new()),
                disconnect: Mutex::new(DisconnectState::default()),
                started: AtomicBool::new(false),
                lines: AtomicU64::new(0),
            }),
        }
    }

    /// Name used in log lines, the listener thread name and
    /// [`StreamEnd::bridge`].
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Append an observer.
    ///
    /// No deduplication: registering the same callback twice delivers each
    /// record to it twice.
    pub fn register<F>(&self, observer: F)
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        self.register_observer(Arc::new(observer));
    }

    /// Append an already-shared observer.
    pub fn register_observer(&self, observer: Observer) {
        let mut observers = lock(&self.shared.observers);
        observers.push(observer);
        debug!(
            "{}: registered observer #{}",
            self.shared.name,
            observers.len() - 1
        );
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.shared.observers).len()
    }

    /// Records read and dispatched so far.
    pub fn lines_read(&self) -> u64 {
        self.shared.lines.load(Ordering::SeqCst)
    }

    /// Register a hook to run once when the listener stops.
    ///
    /// If the listener has already stopped, the hook runs immediately on
    /// the calling thread.
    pub fn on_disconnect<F>(&self, hook: F)
    where
        F: FnOnce(&StreamEnd) + Send + 'static,
    {
        let end = {
            let mut guard = lock(&self.shared.disconnect);
            let state = &mut *guard;
            match state.end.clone() {
                Some(end) => end,
                None => {
                    state.hooks.push(Box::new(hook));
                    return;
                }
            }
        };
        hook(&end);
    }

    /// Connect `transport` and start the listener thread.
    ///
    /// The connection is made on the calling thread.  If it fails the error
    /// is returned, no thread is spawned, and the bridge may be started
    /// again with another transport.  Once a start has succeeded, further
    /// calls return [`BridgeError::AlreadyStarted`].
    pub fn start<T: Transport>(&self, mut transport: T) -> Result<BridgeHandle, BridgeError> {
        let shared = &self.shared;
        if shared.started.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyStarted(shared.name.clone()));
        }

        let source = transport.describe();
        let reader = match transport.connect() {
            Ok(reader) => reader,
            Err(e) => {
                shared.started.store(false, Ordering::SeqCst);
                error!("{}: cannot connect to {}: {}", shared.name, source, e);
                return Err(e.into());
            }
        };
        info!("{}: listening on {}", shared.name, source);

        let thread_shared = Arc::clone(shared);
        let thread = std::thread::Builder::new()
            .name(format!("{}-listener", shared.name))
            .spawn(move || read_loop(&thread_shared, reader))
            .map_err(|e| {
                shared.started.store(false, Ordering::SeqCst);
                BridgeError::Spawn(e)
            })?;

        Ok(BridgeHandle {
            name: shared.name.clone(),
            thread,
        })
    }
}

/// Read lines until the stream ends, dispatching each one.
fn read_loop(shared: &Shared, mut reader: Box<dyn BufRead + Send>) -> StreamEnd {
    let mut buf = Vec::new();
    let reason = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break EndReason::EndOfStream,
            Ok(_) => {
                let record = EventRecord::new(String::from_utf8_lossy(&buf));
                shared.dispatch(&record);
                shared.lines.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => break EndReason::ReadError(e.to_string()),
        }
    };

    let end = StreamEnd {
        bridge: shared.name.clone(),
        lines: shared.lines.load(Ordering::SeqCst),
        reason,
    };
    match &end.reason {
        EndReason::EndOfStream => info!("{}: stream ended after {} lines", end.bridge, end.lines),
        EndReason::ReadError(e) => warn!("{}: read error after {} lines: {}", end.bridge, end.lines, e),
    }
    shared.finish(end.clone());
    end
}

/// Handle to a running listener thread.
///
/// Dropping the handle detaches the thread; it keeps running until its
/// transport closes.
pub struct BridgeHandle {
    name: String,
    thread: JoinHandle<StreamEnd>,
}

impl BridgeHandle {
    /// `true` once the listener has stopped reading.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the listener stops and return how it ended.
    pub fn join(self) -> StreamEnd {
        let name = self.name;
        self.thread.join().unwrap_or_else(|_| StreamEnd {
            bridge: name,
            lines: 0,
            reason: EndReason::ReadError("listener thread panicked".into()),
        })
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Write};
    use std::os::unix::net::UnixStream;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    /// Hands the listener one end of a socket pair; the test writes into
    /// the other end.
    struct PairTransport(Option<UnixStream>);

    impl Transport for PairTransport {
        fn describe(&self) -> String {
            "socket pair".into()
        }

        fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
            let stream = self
                .0
                .take()
                .ok_or_else(|| TransportError::Unavailable("already connected".into()))?;
            Ok(Box::new(BufReader::new(stream)))
        }
    }

    fn pair() -> (UnixStream, PairTransport) {
        let (ours, theirs) = UnixStream::pair().expect("socket pair");
        (ours, PairTransport(Some(theirs)))
    }

    /// A transport whose source never exists.
    struct MissingTransport;

    impl Transport for MissingTransport {
        fn describe(&self) -> String {
            "/nonexistent/.socket2.sock".into()
        }

        fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
            Err(TransportError::Unavailable(
                "socket /nonexistent/.socket2.sock does not exist".into(),
            ))
        }
    }

    struct BytesTransport(Vec<u8>);

    impl Transport for BytesTransport {
        fn describe(&self) -> String {
            "bytes".into()
        }

        fn connect(&mut self) -> Result<Box<dyn BufRead + Send>, TransportError> {
            Ok(Box::new(Cursor::new(std::mem::take(&mut self.0))))
        }
    }

    fn wait_for(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Observer that forwards every record into a channel.
    fn recorder(bridge: &EventBridge) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        bridge.register(move |r| {
            let _ = tx.lock().unwrap().send(r.as_str().to_string());
        });
        rx
    }

    #[test]
    fn no_replay_for_lines_before_registration() {
        let bridge = EventBridge::new("test");
        let (mut peer, transport) = pair();
        let handle = bridge.start(transport).unwrap();

        for i in 0..4 {
            writeln!(peer, "workspace>>{}", i).unwrap();
        }
        wait_for("4 lines", || bridge.lines_read() == 4);

        let rx = recorder(&bridge);
        drop(peer);
        let end = handle.join();

        assert_eq!(end.lines, 4);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn every_observer_gets_every_line_in_order() {
        let bridge = EventBridge::new("test");
        let receivers: Vec<_> = (0..3).map(|_| recorder(&bridge)).collect();
        let (mut peer, transport) = pair();
        let handle = bridge.start(transport).unwrap();

        let sent: Vec<String> = (0..20).map(|i| format!("event>>{}", i)).collect();
        for line in &sent {
            writeln!(peer, "{}", line).unwrap();
        }
        drop(peer);
        handle.join();

        for rx in receivers {
            let got: Vec<String> = rx.try_iter().collect();
            assert_eq!(got, sent);
        }
    }

    #[test]
    fn workspace_filter_sees_only_workspace_events() {
        let bridge = EventBridge::new("test");
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        bridge.register(move |r| {
            if r.as_str().starts_with("workspace>>") {
                let _ = tx.lock().unwrap().send(r.as_str().to_string());
            }
        });

        let transport = BytesTransport(b"workspace>>1\nother>>x\nworkspace>>2\n".to_vec());
        bridge.start(transport).unwrap().join();

        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["workspace>>1", "workspace>>2"]);
    }

    #[test]
    fn duplicate_registration_delivers_twice() {
        let bridge = EventBridge::new("test");
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let observer: Observer = Arc::new(move |r: &EventRecord| {
            let _ = tx.lock().unwrap().send(r.as_str().to_string());
        });
        bridge.register_observer(Arc::clone(&observer));
        bridge.register_observer(observer);

        bridge
            .start(BytesTransport(b"a\nb\n".to_vec()))
            .unwrap()
            .join();

        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["a", "a", "b", "b"]);
    }

    #[test]
    fn observer_registered_during_fanout_starts_with_next_record() {
        let bridge = EventBridge::new("test");
        let (tx, rx) = mpsc::channel::<String>();
        let tx = Mutex::new(tx);
        let registered = AtomicBool::new(false);
        let inner_bridge = bridge.clone();
        bridge.register(move |_| {
            if !registered.swap(true, Ordering::SeqCst) {
                let tx = Mutex::new(tx.lock().unwrap().clone());
                inner_bridge.register(move |r| {
                    let _ = tx.lock().unwrap().send(r.as_str().to_string());
                });
            }
        });

        bridge
            .start(BytesTransport(b"first\nsecond\nthird\n".to_vec()))
            .unwrap()
            .join();

        assert_eq!(bridge.observer_count(), 2);
        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["second", "third"]);
    }

    #[test]
    fn panicking_observer_does_not_block_the_rest() {
        let bridge = EventBridge::new("test");
        bridge.register(|r| {
            if r.as_str() == "boom" {
                panic!("observer failure");
            }
        });
        let rx = recorder(&bridge);

        let end = bridge
            .start(BytesTransport(b"boom\nafter\n".to_vec()))
            .unwrap()
            .join();

        assert_eq!(end.lines, 2);
        assert_eq!(end.reason, EndReason::EndOfStream);
        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["boom", "after"]);
    }

    #[test]
    fn unavailable_transport_fails_start() {
        let bridge = EventBridge::new("test");
        let hook_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&hook_ran);
        bridge.on_disconnect(move |_| flag.store(true, Ordering::SeqCst));

        let err = bridge.start(MissingTransport).err().expect("start must fail");
        assert!(matches!(
            err,
            BridgeError::Transport(TransportError::Unavailable(_))
        ));
        assert!(err.to_string().starts_with("transport unavailable"));
        assert!(!hook_ran.load(Ordering::SeqCst));
        assert_eq!(bridge.lines_read(), 0);

        // A failed start does not consume the bridge.
        let end = bridge
            .start(BytesTransport(b"x\n".to_vec()))
            .unwrap()
            .join();
        assert_eq!(end.lines, 1);
    }

    #[test]
    fn second_start_is_rejected() {
        let bridge = EventBridge::new("twice");
        let (peer, transport) = pair();
        let handle = bridge.start(transport).unwrap();

        let err = bridge
            .start(BytesTransport(Vec::new()))
            .err()
            .expect("second start must fail");
        assert!(matches!(err, BridgeError::AlreadyStarted(ref n) if n == "twice"));

        drop(peer);
        handle.join();
    }

    #[test]
    fn disconnect_hooks_run_once_with_summary() {
        let bridge = EventBridge::new("hooks");
        let (tx, rx) = mpsc::channel();
        bridge.on_disconnect(move |end| {
            let _ = tx.send(end.clone());
        });

        let handle = bridge
            .start(BytesTransport(b"one\ntwo\n".to_vec()))
            .unwrap();
        let joined = handle.join();

        let hooked = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(hooked, joined);
        assert_eq!(hooked.bridge, "hooks");
        assert_eq!(hooked.lines, 2);
        assert!(rx.try_recv().is_err());

        // Late hooks run immediately with the same summary.
        let (late_tx, late_rx) = mpsc::channel();
        bridge.on_disconnect(move |end| {
            let _ = late_tx.send(end.lines);
        });
        assert_eq!(late_rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn name_labels_listener_thread_and_summary() {
        let bridge = EventBridge::new("audio");
        assert_eq!(bridge.name(), "audio");
        let (tx, rx) = mpsc::channel();
        bridge.register(move |_| {
            let _ = tx.send(std::thread::current().name().map(str::to_string));
        });

        let end = bridge.start(BytesTransport(b"x\n".to_vec())).unwrap().join();
        let thread = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(thread, Some(format!("{}-listener", bridge.name())));
        assert_eq!(end.bridge, bridge.name());
    }

    #[test]
    fn final_line_without_newline_is_delivered() {
        let bridge = EventBridge::new("test");
        let rx = recorder(&bridge);
        bridge
            .start(BytesTransport(b"a\n  padded  \nlast".to_vec()))
            .unwrap()
            .join();
        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["a", "padded", "last"]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let bridge = EventBridge::new("test");
        let rx = recorder(&bridge);
        let end = bridge
            .start(BytesTransport(b"bad\xff>>x\nok\n".to_vec()))
            .unwrap()
            .join();
        assert_eq!(end.reason, EndReason::EndOfStream);
        let got: Vec<String> = rx.try_iter().collect();
        assert_eq!(got, vec!["bad\u{fffd}>>x", "ok"]);
    }

    #[test]
    fn peer_close_finishes_listener() {
        let bridge = EventBridge::new("test");
        let (peer, transport) = pair();
        let handle = bridge.start(transport).unwrap();
        assert!(!handle.is_finished());
        drop(peer);
        wait_for("listener exit", || handle.is_finished());
        assert_eq!(handle.join().reason, EndReason::EndOfStream);
    }
}
