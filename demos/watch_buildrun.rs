//! # Follow the step logs of a build-run pod
//!
//! Prints the sanitized build-run request built from the flags, then watches the named pod:
//! every step container that starts is attached to the tail coordinator, and the watch ends
//! once the pod succeeds or fails. Ctrl-C cancels both.
//!
//! ## Run
//! ```bash
//! RUST_LOG=podreactor=debug cargo run --example watch_buildrun --features kube,logging -- \
//!     --namespace builds --pod hello-run-xyz-pod --buildref-name hello
//! ```

use std::sync::Arc;

use clap::Parser;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;

use podreactor::k8s::{PodEvents, PodLogs, pod};
use podreactor::logging::{self, LogFormat};
use podreactor::request::BuildRunArgs;
use podreactor::{
    AttachmentId, Bus, Config, HookError, LogWriter, Selector, Subscribe, SubscriberSet, Tail,
    Watcher, cancel_on_shutdown_signal,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "watch_buildrun", about = "Follow the step logs of a build-run pod")]
struct Cli {
    /// Namespace of the build-run pod.
    #[arg(long, short = 'n', default_value = "default")]
    namespace: String,

    /// Name of the build-run pod.
    #[arg(long)]
    pod: String,

    /// Emit diagnostics as JSON.
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    request: BuildRunArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    });

    let spec = cli.request.to_spec().sanitized();
    println!("request: {}", serde_json::to_string(&spec)?);

    let ctx = CancellationToken::new();
    let signals = cancel_on_shutdown_signal(ctx.clone());

    let cfg = Config::default();
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let subs = Arc::new(SubscriberSet::new(
        vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>],
        bus.clone(),
    ));
    let listening = CancellationToken::new();
    let listener = Arc::clone(&subs).listen(listening.clone());

    let client = Client::try_default().await?;
    let tail = Arc::new(
        Tail::new(ctx.child_token(), Arc::new(PodLogs::new(client.clone())))
            .with_config(cfg.clone())
            .with_bus(bus.clone()),
    );

    let selector = Selector::new().fields(format!("metadata.name={}", cli.pod));
    let mut watcher = Watcher::<Pod>::new(
        ctx.child_token(),
        &PodEvents::new(client),
        &cli.namespace,
        &selector,
    )
    .await?
    .with_bus(bus);
    let handle = watcher.stop_handle();

    let follow = {
        let tail = Arc::clone(&tail);
        let namespace = cli.namespace.clone();
        let prefix = cfg.step_prefix.clone();
        move |p: &Pod| {
            for container in pod::started_containers(p, &prefix) {
                tail.attach(AttachmentId::new(&namespace, pod::name(p), container));
            }
            if pod::is_finished(p) {
                println!("pod {} finished: {}", pod::name(p), pod::phase(p).unwrap_or_default());
                handle.stop();
            }
            Ok(())
        }
    };
    let on_added = follow.clone();
    watcher = watcher
        .with_on_added_fn(on_added)
        .with_on_modified_fn(follow)
        .with_on_deleted_fn(|p: &Pod| {
            Err(HookError::fatal(format!("pod {} was deleted", pod::name(p))))
        });

    let outcome = watcher.run().await;
    tail.shutdown().await;

    listening.cancel();
    let _ = listener.await;
    if let Ok(subs) = Arc::try_unwrap(subs) {
        subs.shutdown().await;
    }
    ctx.cancel();
    let _ = signals.await;

    match outcome {
        Ok(exit) => println!("watch ended: {exit:?}"),
        Err(failure) => {
            eprintln!("watch failed: {failure}");
            std::process::exit(1);
        }
    }
    Ok(())
}
