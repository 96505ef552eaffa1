//! # In-memory watch + tail
//!
//! Drives a [`Watcher`] with a scripted pod lifecycle and attaches a [`Tail`] reader to every
//! step container as it starts. The watcher stops once the pod reports a terminal phase;
//! the tail is then shut down and lifecycle events are counted by a custom subscriber.
//!
//! ## Run
//! ```bash
//! cargo run --example tail_memory
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use podreactor::{
    AttachmentId, Bus, Event, EventKind, Exit, LogSource, LogStream, Notification, Subscribe,
    SubscriberSet, Subscription, Tail, TailError, Watcher,
};

const NAMESPACE: &str = "builds";
const POD: &str = "hello-run-pod";

#[derive(Debug, Clone)]
struct PodState {
    phase: &'static str,
    started: Vec<&'static str>,
}

impl PodState {
    fn new(phase: &'static str, started: &[&'static str]) -> Self {
        Self {
            phase,
            started: started.to_vec(),
        }
    }

    fn finished(&self) -> bool {
        matches!(self.phase, "Succeeded" | "Failed")
    }
}

struct Channel(mpsc::UnboundedReceiver<Notification<PodState>>);

#[async_trait]
impl Subscription<PodState> for Channel {
    async fn next(&mut self) -> Option<Notification<PodState>> {
        self.0.recv().await
    }

    fn stop(&mut self) {
        self.0.close();
    }
}

/// Emits a few numbered lines per container, one every 50ms.
struct Ticker {
    container: String,
    sent: u32,
}

#[async_trait]
impl LogStream for Ticker {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        if self.sent == 3 {
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.sent += 1;
        Ok(Some(format!("{} line {}", self.container, self.sent)))
    }
}

struct MemoryLogs;

#[async_trait]
impl LogSource for MemoryLogs {
    async fn open(&self, id: &AttachmentId, _follow: bool) -> Result<Box<dyn LogStream>, TailError> {
        if id.container == "step-missing" {
            return Err(TailError::AttachmentOpen {
                container: id.container.clone(),
                error: "container not found".into(),
            });
        }
        Ok(Box::new(Ticker {
            container: id.container.clone(),
            sent: 0,
        }))
    }
}

#[derive(Default)]
struct Counter {
    attached: AtomicU64,
    ended: AtomicU64,
    failed: AtomicU64,
}

#[async_trait]
impl Subscribe for Counter {
    async fn on_event(&self, ev: &Event) {
        let slot = match ev.kind {
            EventKind::TailAttached => &self.attached,
            EventKind::TailEnded => &self.ended,
            EventKind::TailOpenFailed => &self.failed,
            _ => return,
        };
        slot.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &'static str {
        "counter"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = CancellationToken::new();
    let bus = Bus::new(256);
    let counter = Arc::new(Counter::default());
    let subs = Arc::new(SubscriberSet::new(vec![counter.clone() as Arc<dyn Subscribe>], bus.clone()));
    let listening = CancellationToken::new();
    let listener = Arc::clone(&subs).listen(listening.clone());

    let tail = Arc::new(Tail::new(ctx.child_token(), Arc::new(MemoryLogs)).with_bus(bus.clone()));

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = Watcher::from_subscription(ctx.child_token(), NAMESPACE, Box::new(Channel(rx)))
        .with_bus(bus.clone());
    let handle = watcher.stop_handle();

    let on_modified = {
        let tail = Arc::clone(&tail);
        move |pod: &PodState| {
            for container in &pod.started {
                tail.attach(AttachmentId::new(NAMESPACE, POD, *container));
            }
            if pod.finished() {
                println!("pod reached phase {}", pod.phase);
                handle.stop();
            }
            Ok(())
        }
    };
    watcher = watcher
        .with_skip_fn(|pod: &PodState| pod.phase == "Pending")
        .with_on_added_fn(|pod: &PodState| {
            println!("pod added in phase {}", pod.phase);
            Ok(())
        })
        .with_on_modified_fn(on_modified);

    let script = async move {
        let steps = [
            Notification::added(PodState::new("Running", &[])),
            Notification::modified(PodState::new("Pending", &["step-source"])),
            Notification::modified(PodState::new("Running", &["step-source"])),
            Notification::modified(PodState::new("Running", &["step-source", "step-build"])),
            Notification::modified(PodState::new("Running", &["step-build", "step-missing"])),
            Notification::modified(PodState::new("Succeeded", &[])),
        ];
        for n in steps {
            tokio::time::sleep(Duration::from_millis(40)).await;
            if tx.send(n).is_err() {
                break;
            }
        }
        // keep the sender alive until the watcher stops
        std::future::pending::<()>().await;
    };

    let exit = tokio::select! {
        res = watcher.run() => res?,
        _ = script => unreachable!("script never completes"),
    };
    assert_eq!(exit, Exit::Stopped);

    tail.wait().await;
    tail.shutdown().await;

    // Nothing publishes past this point; forward what is on the bus, then flush the queues.
    listening.cancel();
    let _ = listener.await;
    if let Ok(subs) = Arc::try_unwrap(subs) {
        subs.shutdown().await;
    }
    ctx.cancel();

    println!();
    println!("Events:");
    println!(" ├─► Attached:    {}", counter.attached.load(Ordering::Relaxed));
    println!(" ├─► Ended:       {}", counter.ended.load(Ordering::Relaxed));
    println!(" └─► Open failed: {}", counter.failed.load(Ordering::Relaxed));
    Ok(())
}
