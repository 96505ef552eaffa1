use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, WatchEvent, WatchParams};
use kube::Client;
use tracing::{debug, warn};

use crate::config::Selector;
use crate::error::WatchError;
use crate::reactor::{EventSource, Notification, Subscription};

/// Opens pod watches in a namespace.
#[derive(Clone)]
pub struct PodEvents {
    client: Client,
}

impl PodEvents {
    /// Creates a source backed by `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource<Pod> for PodEvents {
    async fn subscribe(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Box<dyn Subscription<Pod>>, WatchError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut wp = WatchParams::default();
        if let Some(labels) = selector.labels.as_deref() {
            wp = wp.labels(labels);
        }
        if let Some(fields) = selector.fields.as_deref() {
            wp = wp.fields(fields);
        }

        let stream = api
            .watch(&wp, "0")
            .await
            .map_err(|e| WatchError::SubscriptionOpen {
                error: e.to_string(),
            })?;
        debug!(namespace, ?selector, "pod watch opened");
        Ok(Box::new(PodWatch {
            stream: Some(stream.boxed()),
        }))
    }
}

struct PodWatch {
    stream: Option<BoxStream<'static, kube::Result<WatchEvent<Pod>>>>,
}

#[async_trait]
impl Subscription<Pod> for PodWatch {
    async fn next(&mut self) -> Option<Notification<Pod>> {
        loop {
            let stream = self.stream.as_mut()?;
            match stream.next().await? {
                Ok(WatchEvent::Added(pod)) => return Some(Notification::added(pod)),
                Ok(WatchEvent::Modified(pod)) => return Some(Notification::modified(pod)),
                Ok(WatchEvent::Deleted(pod)) => return Some(Notification::deleted(pod)),
                Ok(WatchEvent::Bookmark(_)) => continue,
                Ok(WatchEvent::Error(status)) => {
                    warn!(?status, "watch returned an error event");
                }
                Err(e) => {
                    warn!(error = %e, "undecodable watch event");
                }
            }
        }
    }

    fn stop(&mut self) {
        // Dropping the response body closes the server-side watch.
        self.stream = None;
    }
}
