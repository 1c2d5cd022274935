use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Event,
    Pod,
};
use kube::api::{
    Api,
    ListParams,
};

use crate::error::Error;

/// Filter descriptor deciding which cluster events are "about" a target or
/// its dependents. Every unset field is a wildcard.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelevantObject {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub uid: Option<String>,
}

impl RelevantObject {
    pub fn kind(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }
}

/// The pod itself plus any persistent volume claims referenced by its
/// volumes, since scheduling failures often surface as PVC events.
pub fn relevant_objects_from_pod(pod: &Pod) -> Vec<RelevantObject> {
    let mut objects = vec![RelevantObject {
        kind: Some("Pod".to_string()),
        name: pod.metadata.name.clone(),
        uid: pod.metadata.uid.clone(),
    }];

    for volume in pod
        .spec
        .iter()
        .flat_map(|spec| spec.volumes.iter().flatten())
    {
        if let Some(claim) = &volume.persistent_volume_claim {
            objects.push(RelevantObject {
                kind: Some("PersistentVolumeClaim".to_string()),
                name: Some(claim.claim_name.clone()),
                uid: None,
            });
        }
    }

    objects
}

/// An event matches when every set field of at least one descriptor equals
/// the event's involved object.
pub fn event_matches(event: &Event, objects: &[RelevantObject]) -> bool {
    objects.iter().any(|object| {
        if let Some(name) = &object.name
            && event.involved_object.name.as_ref() != Some(name)
        {
            return false;
        }
        if let Some(kind) = &object.kind
            && event.involved_object.kind.as_ref() != Some(kind)
        {
            return false;
        }
        if let Some(uid) = &object.uid
            && event.involved_object.uid.as_ref() != Some(uid)
        {
            return false;
        }

        true
    })
}

/// Seam between the diagnostics printer and the cluster, so the matching and
/// rate-limit logic stays testable without a live API server.
#[async_trait]
pub trait ClusterEventSource: Send + Sync {
    /// Lists all events in the namespace. No server-side filtering is
    /// assumed available.
    async fn list_events(&self, namespace: &str) -> Result<Vec<Event>, Error>;
}

#[async_trait]
impl ClusterEventSource for kube::Client {
    async fn list_events(&self, namespace: &str) -> Result<Vec<Event>, Error> {
        let events: Api<Event> = Api::namespaced(self.clone(), namespace);

        Ok(events.list(&ListParams::default()).await?.items)
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{
        ObjectReference,
        PersistentVolumeClaimVolumeSource,
        PodSpec,
        Volume,
    };

    use super::*;

    fn event_for(kind: &str, name: &str, uid: &str) -> Event {
        Event {
            involved_object: ObjectReference {
                kind: Some(kind.to_string()),
                name: Some(name.to_string()),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_kind_only_wildcard_matches_any_name_and_uid() {
        let objects = vec![RelevantObject::kind("Deployment")];

        assert!(event_matches(
            &event_for("Deployment", "web", "uid-1"),
            &objects
        ));
        assert!(event_matches(
            &event_for("Deployment", "api", "uid-2"),
            &objects
        ));
        assert!(!event_matches(
            &event_for("StatefulSet", "web", "uid-1"),
            &objects
        ));
    }

    #[test]
    fn test_all_fields_must_match_when_set() {
        let objects = vec![RelevantObject {
            kind: Some("Pod".to_string()),
            name: Some("web-1".to_string()),
            uid: Some("uid-1".to_string()),
        }];

        assert!(event_matches(&event_for("Pod", "web-1", "uid-1"), &objects));
        assert!(!event_matches(&event_for("Pod", "web-1", "uid-2"), &objects));
        assert!(!event_matches(&event_for("Pod", "web-2", "uid-1"), &objects));
    }

    #[test]
    fn test_empty_descriptor_matches_everything() {
        let objects = vec![RelevantObject::default()];

        assert!(event_matches(&event_for("Node", "node-1", "uid-9"), &objects));
    }

    #[test]
    fn test_any_member_of_the_set_suffices() {
        let objects = vec![
            RelevantObject::kind("StatefulSet"),
            RelevantObject::kind("ReplicaSet"),
        ];

        assert!(event_matches(
            &event_for("ReplicaSet", "web-abc", "uid-3"),
            &objects
        ));
    }

    #[test]
    fn test_relevant_objects_include_pod_and_claims() {
        let mut pod = Pod::default();
        pod.metadata.name = Some("web-1".to_string());
        pod.metadata.uid = Some("uid-1".to_string());
        pod.spec = Some(PodSpec {
            volumes: Some(vec![
                Volume {
                    name: "data".to_string(),
                    persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                        claim_name: "data".to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                Volume {
                    name: "tmp".to_string(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        });

        let objects = relevant_objects_from_pod(&pod);

        assert_eq!(objects.len(), 2);
        assert_eq!(
            objects[0],
            RelevantObject {
                kind: Some("Pod".to_string()),
                name: Some("web-1".to_string()),
                uid: Some("uid-1".to_string()),
            }
        );
        assert_eq!(
            objects[1],
            RelevantObject {
                kind: Some("PersistentVolumeClaim".to_string()),
                name: Some("data".to_string()),
                uid: None,
            }
        );
    }
}
