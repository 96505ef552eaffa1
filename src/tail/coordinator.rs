//! # Tail: concurrent log streaming for the attachments of one tracked pod.
//!
//! [`Tail`] spawns one reader task per attached container, forwards each line to the output
//! sink as `"[<display>] <line>"` and tears every reader down on [`Tail::stop`] or when the
//! upstream token is cancelled.
//!
//! ## Architecture
//! ```text
//! attach(id) ──► readers[id] = spawn(Reader::run) ──► stdout sink
//!                                   │          └───► stderr sink (open/read errors)
//!                                   ▼
//!                               StopSignal ◄── stop()
//!                                   ▲
//!              parent ctx ──► bridge task (spawned on first attach)
//! ```
//!
//! ## Rules
//! - `attach` never waits for other attachments; an attachment is opened at most once per
//!   coordinator, so a finished step is never replayed.
//! - Failures of one attachment never affect its siblings or the coordinator.
//! - `stop` is idempotent and safe with zero attachments; `wait` is bounded after `stop`.
//! - Dropping the coordinator stops every reader it spawned.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{StopSignal, bridge};
use crate::events::{Bus, Event, EventKind};
use crate::tail::reader::{Reader, ReaderExit};
use crate::tail::{AttachmentId, LogSource, SharedSink, StderrSink, StdoutSink};

/// Coordinator of concurrent log attachments.
pub struct Tail {
    ctx: CancellationToken,
    source: Arc<dyn LogSource>,
    cfg: Config,
    stdout: SharedSink,
    stderr: SharedSink,
    bus: Option<Bus>,
    stop: Arc<StopSignal>,
    readers: Mutex<HashMap<AttachmentId, JoinHandle<ReaderExit>>>,
    attached: Mutex<HashSet<AttachmentId>>,
    bridge: Mutex<Option<JoinHandle<()>>>,
}

impl Tail {
    /// Creates a coordinator writing to the process stdout/stderr.
    pub fn new(ctx: CancellationToken, source: Arc<dyn LogSource>) -> Self {
        Self {
            ctx,
            source,
            cfg: Config::default(),
            stdout: Arc::new(StdoutSink),
            stderr: Arc::new(StderrSink),
            bus: None,
            stop: Arc::new(StopSignal::new()),
            readers: Mutex::new(HashMap::new()),
            attached: Mutex::new(HashSet::new()),
            bridge: Mutex::new(None),
        }
    }

    /// Replaces the output sink.
    pub fn with_stdout(mut self, sink: SharedSink) -> Self {
        self.stdout = sink;
        self
    }

    /// Replaces the error sink.
    pub fn with_stderr(mut self, sink: SharedSink) -> Self {
        self.stderr = sink;
        self
    }

    /// Replaces the configuration (step prefix, follow mode).
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Publishes lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Starts streaming the logs of `id` in a new reader task.
    ///
    /// Fire-and-forget: returns immediately. Ignored if `id` was attached before (running or
    /// finished) or the coordinator was stopped. Must be called within a tokio runtime.
    pub fn attach(&self, id: AttachmentId) {
        if self.is_stopped() {
            debug!(attachment = %id, "tail stopped, ignoring attach");
            return;
        }
        self.ensure_bridge();

        if !lock(&self.attached).insert(id.clone()) {
            debug!(attachment = %id, "already attached");
            self.publish(Self::attachment_event(EventKind::TailDuplicate, &id));
            return;
        }

        let reader = Reader {
            display: self.cfg.display_name(&id.container).to_string(),
            follow: self.cfg.follow,
            source: Arc::clone(&self.source),
            stdout: Arc::clone(&self.stdout),
            stderr: Arc::clone(&self.stderr),
            stop: Arc::clone(&self.stop),
            bus: self.bus.clone(),
            id: id.clone(),
        };
        info!(attachment = %id, "attaching to log stream");
        let event = Self::attachment_event(EventKind::TailAttached, &id);
        lock(&self.readers).insert(id, tokio::spawn(reader.run()));
        self.publish(event);
    }

    /// Signals every reader to close its stream and terminate.
    ///
    /// Idempotent; returns `true` only for the call that stopped the coordinator.
    pub fn stop(&self) -> bool {
        let first = self.stop.fire();
        if first {
            info!("stopping log streams");
            self.publish(Event::new(EventKind::TailStopRequested));
        }
        first
    }

    /// Returns `true` once the coordinator was stopped (explicitly or by cancellation).
    pub fn is_stopped(&self) -> bool {
        self.stop.is_fired() || self.ctx.is_cancelled()
    }

    /// Waits for every reader spawned so far, including ones attached while waiting.
    pub async fn wait(&self) {
        loop {
            let handles: Vec<(AttachmentId, JoinHandle<ReaderExit>)> =
                lock(&self.readers).drain().collect();
            if handles.is_empty() {
                return;
            }
            for (id, h) in handles {
                match h.await {
                    Ok(exit) => debug!(attachment = %id, exit = exit.as_label(), "reader joined"),
                    Err(e) => warn!(attachment = %id, error = %e, "reader task failed"),
                }
            }
        }
    }

    /// Stops every reader and waits for all of them.
    pub async fn shutdown(&self) {
        self.stop();
        self.wait().await;
    }

    /// Attachments whose reader is still running, sorted.
    pub fn active(&self) -> Vec<AttachmentId> {
        let mut ids: Vec<AttachmentId> = lock(&self.readers)
            .iter()
            .filter(|(_, h)| !h.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn ensure_bridge(&self) {
        let mut slot = lock(&self.bridge);
        if slot.is_none() {
            *slot = Some(bridge(self.ctx.clone(), Arc::clone(&self.stop)));
        }
    }

    fn attachment_event(kind: EventKind, id: &AttachmentId) -> Event {
        Event::new(kind)
            .with_namespace(id.namespace.as_str())
            .with_pod(id.pod.as_str())
            .with_container(id.container.as_str())
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}

impl Drop for Tail {
    fn drop(&mut self) {
        self.stop.fire();
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TailError;
    use crate::tail::{LineStream, LogStream, MemorySink};
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{BufReader, DuplexStream};

    enum Script {
        Lines(&'static str),
        Bytes(&'static [u8]),
        LinesThenError(&'static str),
        Blocking,
        Refuse(&'static str),
    }

    /// Stream double counting explicit closes.
    struct Counted {
        inner: Box<dyn LogStream>,
        fail_at_end: bool,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LogStream for Counted {
        async fn next_line(&mut self) -> io::Result<Option<String>> {
            match self.inner.next_line().await? {
                None if self.fail_at_end => Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
                other => Ok(other),
            }
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close().await;
        }
    }

    #[derive(Default)]
    struct FakeLogs {
        scripts: HashMap<&'static str, Script>,
        writers: Mutex<Vec<DuplexStream>>,
        closes: Arc<AtomicUsize>,
        opened: AtomicUsize,
    }

    impl FakeLogs {
        fn with(mut self, container: &'static str, script: Script) -> Self {
            self.scripts.insert(container, script);
            self
        }
    }

    #[async_trait]
    impl LogSource for FakeLogs {
        async fn open(
            &self,
            id: &AttachmentId,
            follow: bool,
        ) -> Result<Box<dyn LogStream>, TailError> {
            assert!(follow);
            self.opened.fetch_add(1, Ordering::SeqCst);
            let (inner, fail_at_end): (Box<dyn LogStream>, bool) =
                match self.scripts.get(id.container.as_str()) {
                    Some(&Script::Lines(text)) => (Box::new(LineStream::new(text.as_bytes())), false),
                    Some(&Script::Bytes(raw)) => (Box::new(LineStream::new(raw)), false),
                    Some(&Script::LinesThenError(text)) => {
                        (Box::new(LineStream::new(text.as_bytes())), true)
                    }
                    Some(&Script::Blocking) => {
                        let (reader, writer) = tokio::io::duplex(64);
                        lock(&self.writers).push(writer);
                        (Box::new(LineStream::new(BufReader::new(reader))), false)
                    }
                    Some(&Script::Refuse(msg)) => {
                        return Err(TailError::AttachmentOpen {
                            container: id.container.clone(),
                            error: msg.to_string(),
                        });
                    }
                    None => {
                        return Err(TailError::AttachmentOpen {
                            container: id.container.clone(),
                            error: "container not found".to_string(),
                        });
                    }
                };
            Ok(Box::new(Counted {
                inner,
                fail_at_end,
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    fn id(container: &str) -> AttachmentId {
        AttachmentId::new("builds", "run-1-pod", container)
    }

    struct Setup {
        tail: Tail,
        logs: Arc<FakeLogs>,
        out: Arc<MemorySink>,
        err: Arc<MemorySink>,
    }

    fn setup(ctx: CancellationToken, logs: FakeLogs) -> Setup {
        let logs = Arc::new(logs);
        let out = Arc::new(MemorySink::new());
        let err = Arc::new(MemorySink::new());
        let tail = Tail::new(ctx, logs.clone())
            .with_stdout(out.clone())
            .with_stderr(err.clone());
        Setup {
            tail,
            logs,
            out,
            err,
        }
    }

    fn lines_of(all: &[String], prefix: &str) -> Vec<String> {
        all.iter()
            .filter(|l| l.starts_with(prefix))
            .cloned()
            .collect()
    }

    async fn eventually(mut cond: impl FnMut() -> bool) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn two_streams_keep_per_stream_order() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default()
                .with("step-build", Script::Lines("a\nb\n"))
                .with("step-push", Script::Lines("x\ny\n")),
        );

        s.tail.attach(id("step-build"));
        s.tail.attach(id("step-push"));
        tokio::time::timeout(Duration::from_secs(2), s.tail.wait())
            .await
            .expect("readers should reach eof");

        let all = s.out.lines();
        assert_eq!(all.len(), 4);
        assert_eq!(lines_of(&all, "[build]"), vec!["[build] a", "[build] b"]);
        assert_eq!(lines_of(&all, "[push]"), vec!["[push] x", "[push] y"]);
        assert!(s.err.lines().is_empty());
        assert_eq!(s.logs.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn open_error_is_isolated() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default()
                .with("step-broken", Script::Refuse("pod initializing"))
                .with("step-push", Script::Lines("x\ny\n")),
        );

        s.tail.attach(id("step-broken"));
        s.tail.attach(id("step-push"));
        s.tail.wait().await;

        assert_eq!(s.out.lines(), vec!["[push] x", "[push] y"]);
        let errs = s.err.lines();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("pod initializing"), "{errs:?}");
        assert!(!s.tail.is_stopped());
    }

    #[tokio::test]
    async fn stop_twice_without_attachments() {
        let s = setup(CancellationToken::new(), FakeLogs::default());
        assert!(s.tail.stop());
        assert!(!s.tail.stop());
        tokio::time::timeout(Duration::from_secs(1), s.tail.wait())
            .await
            .expect("wait should be immediate");
        assert!(s.tail.active().is_empty());
    }

    #[tokio::test]
    async fn stop_unblocks_pending_read_and_closes_stream() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::Blocking),
        );

        s.tail.attach(id("step-build"));
        eventually(|| s.logs.opened.load(Ordering::SeqCst) == 1).await;
        assert_eq!(s.tail.active(), vec![id("step-build")]);

        s.tail.stop();
        tokio::time::timeout(Duration::from_secs(2), s.tail.wait())
            .await
            .expect("stop should unblock the reader");
        assert_eq!(s.logs.closes.load(Ordering::SeqCst), 1);
        assert!(s.tail.active().is_empty());
        s.tail.stop();
    }

    #[tokio::test]
    async fn parent_cancellation_stops_readers() {
        let ctx = CancellationToken::new();
        let s = setup(
            ctx.clone(),
            FakeLogs::default()
                .with("step-build", Script::Blocking)
                .with("step-push", Script::Blocking),
        );

        s.tail.attach(id("step-build"));
        s.tail.attach(id("step-push"));
        eventually(|| s.logs.opened.load(Ordering::SeqCst) == 2).await;

        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(2), s.tail.wait())
            .await
            .expect("cancellation should unblock readers");
        assert!(s.tail.is_stopped());
        assert_eq!(s.logs.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn read_error_reported_after_lines() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::LinesThenError("one\ntwo\n")),
        );

        s.tail.attach(id("step-build"));
        s.tail.wait().await;

        assert_eq!(s.out.lines(), vec!["[build] one", "[build] two"]);
        let errs = s.err.lines();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("connection reset"), "{errs:?}");
        assert_eq!(s.logs.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_attach_is_ignored_while_open() {
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let mut s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::Blocking),
        );
        s.tail = s.tail.with_bus(bus);

        s.tail.attach(id("step-build"));
        s.tail.attach(id("step-build"));
        eventually(|| s.logs.opened.load(Ordering::SeqCst) == 1).await;
        s.tail.shutdown().await;
        assert_eq!(s.logs.opened.load(Ordering::SeqCst), 1);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::TailDuplicate), "{kinds:?}");
        assert!(kinds.contains(&EventKind::TailStopRequested), "{kinds:?}");
        assert_eq!(kinds.last(), Some(&EventKind::TailEnded));
    }

    #[tokio::test]
    async fn attach_after_stop_is_ignored() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::Lines("a\n")),
        );
        s.tail.stop();
        s.tail.attach(id("step-build"));
        s.tail.wait().await;
        assert_eq!(s.logs.opened.load(Ordering::SeqCst), 0);
        assert!(s.out.lines().is_empty());
    }

    #[tokio::test]
    async fn custom_prefix_controls_display_name() {
        let mut s = setup(
            CancellationToken::new(),
            FakeLogs::default()
                .with("task-lint", Script::Lines("ok\n"))
                .with("step-build", Script::Lines("done\n")),
        );
        s.tail = s.tail.with_config(Config {
            step_prefix: "task-".to_string(),
            ..Config::default()
        });

        s.tail.attach(id("task-lint"));
        s.tail.attach(id("step-build"));
        s.tail.wait().await;

        let all = s.out.lines();
        assert!(all.contains(&"[lint] ok".to_string()), "{all:?}");
        assert!(all.contains(&"[step-build] done".to_string()), "{all:?}");
    }

    #[tokio::test]
    async fn non_utf8_line_does_not_end_attachment() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::Bytes(b"ok\ncaf\xe9 latin1\nafter\n")),
        );

        s.tail.attach(id("step-build"));
        s.tail.wait().await;

        assert_eq!(
            s.out.lines(),
            vec!["[build] ok", "[build] caf\u{FFFD} latin1", "[build] after"]
        );
        assert!(s.err.lines().is_empty());
    }

    #[tokio::test]
    async fn finished_attachment_is_not_replayed() {
        let s = setup(
            CancellationToken::new(),
            FakeLogs::default().with("step-build", Script::Lines("a\nb\n")),
        );

        s.tail.attach(id("step-build"));
        s.tail.wait().await;
        assert!(s.tail.active().is_empty());

        s.tail.attach(id("step-build"));
        s.tail.wait().await;

        assert_eq!(s.out.lines(), vec!["[build] a", "[build] b"]);
        assert_eq!(s.logs.opened.load(Ordering::SeqCst), 1);
    }
}
