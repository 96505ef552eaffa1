//! Helpers over pod snapshots used by build-run watchers.

use k8s_openapi::api::core::v1::Pod;

/// Pod phase reported once every container has exited successfully.
pub const PHASE_SUCCEEDED: &str = "Succeeded";
/// Pod phase reported once a container has exited with failure.
pub const PHASE_FAILED: &str = "Failed";

/// Returns the pod name, or `""` when unset.
pub fn name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or_default()
}

/// Returns the reported phase, if any.
pub fn phase(pod: &Pod) -> Option<&str> {
    pod.status.as_ref()?.phase.as_deref()
}

/// Whether the pod reached `Succeeded` or `Failed`.
pub fn is_finished(pod: &Pod) -> bool {
    matches!(phase(pod), Some(PHASE_SUCCEEDED | PHASE_FAILED))
}

/// Names of containers starting with `prefix` that are running or have terminated.
///
/// Containers still waiting have no logs to attach to yet.
pub fn started_containers<'a>(pod: &'a Pod, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    pod.status
        .iter()
        .flat_map(|s| s.container_statuses.iter().flatten())
        .filter(move |cs| cs.name.starts_with(prefix))
        .filter(|cs| {
            cs.state
                .as_ref()
                .is_some_and(|st| st.running.is_some() || st.terminated.is_some())
        })
        .map(|cs| cs.name.as_str())
}
