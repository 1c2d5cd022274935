use std::collections::HashSet;

use k8s_openapi::api::core::v1::Pod;
use once_cell::sync::Lazy;

use super::PodContainer;

/// Statuses considered unrecoverable without intervention.
pub static CRITICAL_STATUS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Error",
        "Unknown",
        "ImagePullBackOff",
        "CrashLoopBackOff",
        "RunContainerError",
        "ErrImagePull",
        "CreateContainerConfigError",
        "InvalidImageName",
    ])
});

/// Derives a single kubectl-style status label from the pod's phase and
/// container states. Init container failures surface as `Init:<Reason>`; a
/// set deletion timestamp always wins as `Terminating`.
pub fn pod_status(pod: &Pod) -> String {
    let Some(status) = pod.status.as_ref() else {
        return "Pending".to_string();
    };

    let mut reason = status
        .reason
        .clone()
        .filter(|r| !r.is_empty())
        .or_else(|| status.phase.clone())
        .unwrap_or_else(|| "Pending".to_string());

    let init_total = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.init_containers.as_ref())
        .map_or(0, |containers| containers.len());

    let mut initializing = false;
    for (i, cs) in status.init_container_statuses.iter().flatten().enumerate() {
        let state = cs.state.as_ref();

        if let Some(terminated) = state.and_then(|s| s.terminated.as_ref()) {
            if terminated.exit_code == 0 {
                continue;
            }
            reason = match terminated.reason.as_deref() {
                Some(r) if !r.is_empty() => format!("Init:{r}"),
                _ => match terminated.signal {
                    Some(signal) if signal != 0 => format!("Init:Signal:{signal}"),
                    _ => format!("Init:ExitCode:{}", terminated.exit_code),
                },
            };
        } else if let Some(waiting) = state.and_then(|s| s.waiting.as_ref()) {
            reason = match waiting.reason.as_deref() {
                Some(r) if !r.is_empty() && r != "PodInitializing" => format!("Init:{r}"),
                _ => format!("Init:{i}/{init_total}"),
            };
        } else {
            reason = format!("Init:{i}/{init_total}");
        }

        initializing = true;
        break;
    }

    if !initializing {
        // The first container's reason wins, same as kubectl's printer.
        for cs in status.container_statuses.iter().flatten().rev() {
            let Some(state) = cs.state.as_ref() else {
                continue;
            };

            if let Some(waiting) = state.waiting.as_ref() {
                if let Some(r) = waiting.reason.as_deref().filter(|r| !r.is_empty()) {
                    reason = r.to_string();
                }
            } else if let Some(terminated) = state.terminated.as_ref() {
                reason = match terminated.reason.as_deref() {
                    Some(r) if !r.is_empty() => r.to_string(),
                    _ => match terminated.signal {
                        Some(signal) if signal != 0 => format!("Signal:{signal}"),
                        _ => format!("ExitCode:{}", terminated.exit_code),
                    },
                };
            }
        }
    }

    if pod.metadata.deletion_timestamp.is_some() {
        reason = "Terminating".to_string();
    }

    reason
}

/// Whether the pod's derived status is in the critical table. Init container
/// failures are looked up with the `Init:` prefix stripped, so they classify
/// the same as main container failures.
pub fn has_pod_problem(pod: &Pod) -> bool {
    let status = pod_status(pod);
    let status = status.strip_prefix("Init:").unwrap_or(&status);

    CRITICAL_STATUS.contains(status)
}

/// Whether the candidate's container reports a running state. A terminating
/// pod is never considered running, regardless of container state. Missing
/// status structures are treated as "not running", never as an error.
pub fn is_container_running(candidate: &PodContainer) -> bool {
    if candidate.pod.metadata.deletion_timestamp.is_some() {
        return false;
    }

    let Some(status) = candidate.pod.status.as_ref() else {
        return false;
    };

    status
        .init_container_statuses
        .iter()
        .flatten()
        .chain(status.container_statuses.iter().flatten())
        .any(|cs| {
            cs.name == candidate.container
                && cs.state.as_ref().is_some_and(|state| state.running.is_some())
        })
}
