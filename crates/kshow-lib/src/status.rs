//! Status resolution for instances and units

use crate::models::{ContainerStatus, Phase, UnitCondition};

/// Reason that marks the kubelet readiness condition of a unit
pub const KUBELET_READY_REASON: &str = "KubeletReady";

/// Reported when a unit has no kubelet readiness condition
pub const NOT_READY: &str = "NotReady";

/// Resolve the status label of an instance
///
/// Running and Succeeded phases are reported as-is. Otherwise the first
/// container that is not ready and is waiting with a reason (for example
/// `CrashLoopBackOff`) wins; if none does, the phase is reported.
pub fn resolve_instance_status(phase: Phase, containers: &[ContainerStatus]) -> String {
    if matches!(phase, Phase::Running | Phase::Succeeded) {
        return phase.to_string();
    }

    containers
        .iter()
        .filter(|c| !c.ready)
        .find_map(|c| c.waiting_reason.as_deref().filter(|r| !r.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| phase.to_string())
}

/// Resolve the readiness label of a unit from its conditions
pub fn resolve_unit_status(conditions: &[UnitCondition]) -> String {
    conditions
        .iter()
        .find(|c| c.reason.as_deref() == Some(KUBELET_READY_REASON))
        .map(|c| c.condition_type.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(NOT_READY)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting(name: &str, reason: &str) -> ContainerStatus {
        ContainerStatus {
            name: name.to_string(),
            ready: false,
            restart_count: 0,
            waiting_reason: Some(reason.to_string()),
        }
    }

    fn ready(name: &str) -> ContainerStatus {
        ContainerStatus {
            name: name.to_string(),
            ready: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_running_and_succeeded_pass_through() {
        let containers = vec![waiting("app", "CrashLoopBackOff")];
        assert_eq!(resolve_instance_status(Phase::Running, &containers), "Running");
        assert_eq!(
            resolve_instance_status(Phase::Succeeded, &containers),
            "Succeeded"
        );
    }

    #[test]
    fn test_empty_containers_report_phase() {
        assert_eq!(resolve_instance_status(Phase::Pending, &[]), "Pending");
    }

    #[test]
    fn test_first_waiting_reason_wins() {
        let containers = vec![
            ready("sidecar"),
            waiting("app", "ImagePullBackOff"),
            waiting("init", "CrashLoopBackOff"),
        ];
        assert_eq!(
            resolve_instance_status(Phase::Pending, &containers),
            "ImagePullBackOff"
        );
    }

    #[test]
    fn test_not_ready_without_waiting_falls_back() {
        let containers = vec![ContainerStatus {
            name: "app".into(),
            ready: false,
            restart_count: 3,
            waiting_reason: None,
        }];
        assert_eq!(resolve_instance_status(Phase::Failed, &containers), "Failed");
    }

    #[test]
    fn test_ready_container_with_stale_reason_ignored() {
        let mut c = waiting("app", "ContainerCreating");
        c.ready = true;
        assert_eq!(resolve_instance_status(Phase::Pending, &[c]), "Pending");
    }

    #[test]
    fn test_unit_status_from_kubelet_condition() {
        let conditions = vec![
            UnitCondition {
                condition_type: "MemoryPressure".into(),
                reason: Some("KubeletHasSufficientMemory".into()),
            },
            UnitCondition {
                condition_type: "Ready".into(),
                reason: Some(KUBELET_READY_REASON.into()),
            },
        ];
        assert_eq!(resolve_unit_status(&conditions), "Ready");
    }

    #[test]
    fn test_unit_status_missing_condition() {
        let conditions = vec![UnitCondition {
            condition_type: "Ready".into(),
            reason: Some("KubeletNotReady".into()),
        }];
        assert_eq!(resolve_unit_status(&conditions), NOT_READY);
        assert_eq!(resolve_unit_status(&[]), NOT_READY);

        let untyped = vec![UnitCondition {
            condition_type: String::new(),
            reason: Some(KUBELET_READY_REASON.into()),
        }];
        assert_eq!(resolve_unit_status(&untyped), NOT_READY);
    }
}
