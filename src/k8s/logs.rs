use std::pin::Pin;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, LogParams};
use kube::Client;
use tokio_util::compat::FuturesAsyncReadCompatExt;

use crate::error::TailError;
use crate::tail::{AttachmentId, LineStream, LogSource, LogStream};

/// Opens container log streams.
#[derive(Clone)]
pub struct PodLogs {
    client: Client,
}

impl PodLogs {
    /// Creates a source backed by `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogSource for PodLogs {
    async fn open(&self, id: &AttachmentId, follow: bool) -> Result<Box<dyn LogStream>, TailError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &id.namespace);
        let params = LogParams {
            follow,
            container: Some(id.container.clone()),
            ..LogParams::default()
        };

        let reader = api
            .log_stream(&id.pod, &params)
            .await
            .map_err(|e| TailError::AttachmentOpen {
                container: id.container.clone(),
                error: e.to_string(),
            })?;
        let reader: Pin<Box<dyn futures::io::AsyncBufRead + Send>> = Box::pin(reader);
        Ok(Box::new(LineStream::new(reader.compat())))
    }
}
