use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tokio::sync::Mutex;
use tokio::time::{
    Instant,
    timeout,
};
use tracing::{
    debug,
    info,
    warn,
};

use super::events::{
    ClusterEventSource,
    RelevantObject,
    event_matches,
    relevant_objects_from_pod,
};
use super::status::pod_status;

const WARNING_COOLDOWN: Duration = Duration::from_secs(10);
const EVENT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

struct PrinterState {
    last_warning: Instant,
    // Names of events already printed. Append-only for the lifetime of one
    // wait operation; acceptable only because wait operations are short.
    shown_events: Vec<String>,
}

/// Rate-limited, deduplicating diagnostics printer shared by pod-level and
/// container-level selection. All entry points serialize on a single lock so
/// concurrent pollers produce at most one warning burst per cooldown window.
pub struct PodInfoPrinter {
    namespace: String,
    events: Arc<dyn ClusterEventSource>,
    state: Mutex<PrinterState>,
}

impl PodInfoPrinter {
    pub fn new(
        namespace: &str, events: Arc<dyn ClusterEventSource>, last_warning: Instant,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            events,
            state: Mutex::new(PrinterState {
                last_warning,
                shown_events: Vec::new(),
            }),
        }
    }

    /// Logs why the pod is not ready yet and surfaces any unseen warning
    /// events about the pod or its volume claims.
    pub async fn print_pod_info(&self, pod: &Pod) {
        let mut state = self.state.lock().await;

        if state.last_warning.elapsed() > WARNING_COOLDOWN {
            let status = pod_status(pod);
            info!(
                "Still waiting, because pod {} has status: {}",
                pod.name_any(),
                status
            );

            let namespace = pod
                .metadata
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone());
            self.display_warnings(
                &relevant_objects_from_pod(pod),
                &namespace,
                &mut state.shown_events,
            )
            .await;
            state.last_warning = Instant::now();
        }
    }

    /// Logs that no candidate matched the selector and surfaces warning
    /// events from the controller kinds that commonly own pods.
    pub async fn print_not_found_warning(&self) {
        let mut state = self.state.lock().await;

        if state.last_warning.elapsed() > WARNING_COOLDOWN {
            warn!(
                "Still couldn't find any pods that match the selector. Will continue waiting, but this operation might time out"
            );

            let objects = vec![
                RelevantObject::kind("StatefulSet"),
                RelevantObject::kind("Deployment"),
                RelevantObject::kind("ReplicaSet"),
            ];
            let namespace = self.namespace.clone();
            self.display_warnings(&objects, &namespace, &mut state.shown_events)
                .await;
            state.last_warning = Instant::now();
        }
    }

    /// Logs a critical pod status. Deliberately skips the event query since
    /// this path repeats for as long as the failure persists.
    pub async fn print_pod_warning(&self, pod: &Pod) {
        let mut state = self.state.lock().await;

        if state.last_warning.elapsed() > WARNING_COOLDOWN {
            let status = pod_status(pod);
            warn!(
                "Pod {} has critical status: {}. Will continue waiting, but this operation might time out",
                pod.name_any(),
                status
            );
            state.last_warning = Instant::now();
        }
    }

    /// Fetches the namespace's events and logs every unseen warning that
    /// matches one of the relevant objects, newest first. Fetch failures are
    /// absorbed: missing diagnostics must never block the wait loop.
    async fn display_warnings(
        &self, objects: &[RelevantObject], namespace: &str, shown: &mut Vec<String>,
    ) {
        let mut events =
            match timeout(EVENT_FETCH_TIMEOUT, self.events.list_events(namespace)).await {
                Ok(Ok(events)) => events,
                Ok(Err(err)) => {
                    debug!("Error retrieving pod events: {err}");
                    return;
                }
                Err(_) => {
                    debug!("Timed out retrieving pod events");
                    return;
                }
            };

        events.sort_by(|a, b| {
            b.metadata
                .creation_timestamp
                .cmp(&a.metadata.creation_timestamp)
        });

        for event in &events {
            if event.type_.as_deref() != Some("Warning") {
                continue;
            }
            let Some(event_name) = event.metadata.name.as_deref() else {
                continue;
            };
            if shown.iter().any(|name| name == event_name) {
                continue;
            }
            if !event_matches(event, objects) {
                continue;
            }

            warn!(
                "{} {}: {} ({})",
                event.involved_object.kind.as_deref().unwrap_or_default(),
                event.involved_object.name.as_deref().unwrap_or_default(),
                event.message.as_deref().unwrap_or_default(),
                event.reason.as_deref().unwrap_or_default()
            );
            shown.push(event_name.to_string());
        }
    }
}
