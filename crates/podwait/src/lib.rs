pub mod error;
pub mod selector;

pub use error::Error;
pub use selector::events::{
    ClusterEventSource,
    RelevantObject,
    relevant_objects_from_pod,
};
pub use selector::printer::PodInfoPrinter;
pub use selector::status::{
    has_pod_problem,
    is_container_running,
    pod_status,
};
pub use selector::{
    PodContainer,
    UntilNewestRunning,
    WaitingStrategy,
};
