pub mod events;
pub mod printer;
pub mod sort;
pub mod status;


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use tokio::time::Instant;

use crate::error::Error;
use self::events::ClusterEventSource;
use self::printer::PodInfoPrinter;

/// An ephemeral (Pod, Container) pairing representing one candidate unit for
/// container-level selection. Only lives for the duration of one selection
/// call.
#[derive(Clone, Debug)]
pub struct PodContainer {
    pub pod: Pod,
    pub container: String,
}

/// Per-tick selection contract exposed to the caller's polling loop.
///
/// `Ok(None)` means "no usable target yet, keep polling"; `Ok(Some(_))` means
/// a target was selected. An `Err` is only returned on a caller contract
/// violation, never for transient cluster state — the caller's own timeout is
/// the sole way an overall wait fails.
#[async_trait]
pub trait WaitingStrategy: Send + Sync {
    async fn select_pod(&self, pods: &mut [Pod]) -> Result<Option<Pod>, Error>;

    async fn select_container(
        &self, candidates: &mut [PodContainer],
    ) -> Result<Option<PodContainer>, Error>;
}

/// Waits until the newest matching pod / container is up and running, after
/// an initial grace period that absorbs cluster propagation lag.
pub struct UntilNewestRunning {
    initial_delay: Instant,
    printer: PodInfoPrinter,
}

impl UntilNewestRunning {
    pub fn new(
        initial_delay: Duration, events: Arc<dyn ClusterEventSource>, namespace: &str,
    ) -> Self {
        let deadline = Instant::now() + initial_delay;

        Self {
            initial_delay: deadline,
            printer: PodInfoPrinter::new(namespace, events, deadline),
        }
    }
}

#[async_trait]
impl WaitingStrategy for UntilNewestRunning {
    async fn select_pod(&self, pods: &mut [Pod]) -> Result<Option<Pod>, Error> {
        if Instant::now() < self.initial_delay {
            return Ok(None);
        }

        if pods.is_empty() {
            self.printer.print_not_found_warning().await;
            return Ok(None);
        }

        sort::order_pods_by_newest(pods);

        let pod = &pods[0];
        if pod.metadata.name.is_none() {
            return Err(Error::InvalidCandidate(
                "pod candidate has no name".to_string(),
            ));
        }

        if status::has_pod_problem(pod) {
            self.printer.print_pod_warning(pod).await;
            return Ok(None);
        } else if status::pod_status(pod) != "Running" {
            self.printer.print_pod_info(pod).await;
            return Ok(None);
        }

        Ok(Some(pod.clone()))
    }

    async fn select_container(
        &self, candidates: &mut [PodContainer],
    ) -> Result<Option<PodContainer>, Error> {
        if Instant::now() < self.initial_delay {
            return Ok(None);
        }

        if candidates.is_empty() {
            self.printer.print_not_found_warning().await;
            return Ok(None);
        }

        sort::order_containers_by_newest(candidates);

        let candidate = &candidates[0];
        if candidate.pod.metadata.name.is_none() {
            return Err(Error::InvalidCandidate(
                "container candidate has no pod name".to_string(),
            ));
        } else if candidate.container.is_empty() {
            return Err(Error::InvalidCandidate(
                "container candidate has no container name".to_string(),
            ));
        }

        if status::has_pod_problem(&candidate.pod) {
            self.printer.print_pod_warning(&candidate.pod).await;
            return Ok(None);
        } else if !status::is_container_running(candidate) {
            self.printer.print_pod_info(&candidate.pod).await;
            return Ok(None);
        }

        Ok(Some(candidate.clone()))
    }
}
