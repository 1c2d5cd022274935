use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use super::PodContainer;

fn created(pod: &Pod) -> Option<&Time> {
    pod.metadata.creation_timestamp.as_ref()
}

fn name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or_default()
}

/// Orders pods most recently created first. Pods without a creation
/// timestamp sort last; equal timestamps fall back to name order so repeated
/// calls always rank the same candidate first.
pub fn order_pods_by_newest(pods: &mut [Pod]) {
    pods.sort_by(|a, b| {
        created(b)
            .cmp(&created(a))
            .then_with(|| name(a).cmp(name(b)))
    });
}

/// Orders container candidates by the creation timestamp of their owning
/// pod, newest first, with pod name then container name as tie-breaks.
pub fn order_containers_by_newest(candidates: &mut [PodContainer]) {
    candidates.sort_by(|a, b| {
        created(&b.pod)
            .cmp(&created(&a.pod))
            .then_with(|| name(&a.pod).cmp(name(&b.pod)))
            .then_with(|| a.container.cmp(&b.container))
    });
}
