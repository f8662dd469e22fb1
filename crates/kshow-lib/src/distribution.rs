//! Placement distribution of a workload's instances across capacity classes

use crate::join::find_first;
use crate::models::{Instance, LabelKeys, Unit, Workload};
use crate::observability::ReportLogger;
use crate::status::resolve_instance_status;
use crate::workload::is_owned_by;
use serde::Serialize;

const ON_DEMAND_LABEL: &str = "ON_DEMAND";
const SPOT_LABEL: &str = "SPOT";

/// Pricing/availability tier of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapacityClass {
    OnDemand,
    Spot,
    /// Absent or unrecognized capacity label
    Unknown,
}

impl CapacityClass {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(ON_DEMAND_LABEL) => CapacityClass::OnDemand,
            Some(SPOT_LABEL) => CapacityClass::Spot,
            _ => CapacityClass::Unknown,
        }
    }

    pub fn of(unit: &Unit, keys: &LabelKeys) -> Self {
        Self::from_label(unit.labels.get(&keys.capacity_type))
    }
}

/// Instance counts of one workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub on_demand: usize,
    pub spot: usize,
    pub unknown: usize,
    /// Running instances whose placement matched no unit
    pub unplaced: usize,
    /// Running instances
    pub ready: usize,
    /// All owned instances
    pub total: usize,
}

impl Distribution {
    /// Running instances that were matched to a unit
    pub fn matched(&self) -> usize {
        self.ready - self.unplaced
    }

    fn record(&mut self, class: CapacityClass) {
        match class {
            CapacityClass::OnDemand => self.on_demand += 1,
            CapacityClass::Spot => self.spot += 1,
            CapacityClass::Unknown => self.unknown += 1,
        }
    }
}

/// Counts where a workload's running instances are placed
pub struct DistributionClassifier {
    logger: ReportLogger,
    keys: LabelKeys,
}

impl DistributionClassifier {
    pub fn new(logger: ReportLogger, keys: LabelKeys) -> Self {
        Self { logger, keys }
    }

    /// Unit an instance is bound to, matched on the hostname label
    pub fn placement<'a>(&self, instance: &Instance, units: &'a [Unit]) -> Option<&'a Unit> {
        let node = instance.node_name.as_deref()?;
        find_first(units, &Some(node), |u| u.hostname(&self.keys))
    }

    /// Capacity class of a unit
    pub fn class_of(&self, unit: &Unit) -> CapacityClass {
        CapacityClass::of(unit, &self.keys)
    }

    /// Instances owned by a workload, in instance order
    pub fn owned<'a>(&self, workload: &Workload, instances: &'a [Instance]) -> Vec<&'a Instance> {
        instances
            .iter()
            .filter(|i| i.namespace == workload.namespace)
            .filter(|i| is_owned_by(&i.name, &workload.name))
            .collect()
    }

    /// Classify the placement of a workload's instances
    pub fn classify(&self, workload: &Workload, instances: &[Instance], units: &[Unit]) -> Distribution {
        let mut distribution = Distribution::default();

        for instance in self.owned(workload, instances) {
            distribution.total += 1;

            let status = resolve_instance_status(instance.phase, &instance.container_statuses);
            if status != "Running" {
                continue;
            }
            distribution.ready += 1;

            match self.placement(instance, units) {
                Some(unit) => distribution.record(self.class_of(unit)),
                None => {
                    self.logger.log_unplaced_instance(
                        &instance.namespace,
                        &instance.name,
                        instance.node_name.as_deref(),
                    );
                    distribution.unplaced += 1;
                }
            }
        }

        distribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Labels, Phase};
    use chrono::Utc;

    fn unit(host: &str, class: Option<&str>) -> Unit {
        let keys = LabelKeys::default();
        let mut labels = Labels::new().with(keys.hostname.clone(), host);
        if let Some(class) = class {
            labels.insert(keys.capacity_type.clone(), class);
        }
        Unit {
            name: format!("ip-{}", host),
            created_at: Utc::now(),
            conditions: vec![],
            labels,
            kubelet_version: "v1.28.3".to_string(),
            allocatable_cpu_millicores: 2000,
            allocatable_memory_bytes: 8 << 30,
        }
    }

    fn instance(name: &str, node: Option<&str>, phase: Phase) -> Instance {
        Instance {
            name: name.to_string(),
            namespace: "default".to_string(),
            created_at: Utc::now(),
            phase,
            node_name: node.map(str::to_string),
            containers: vec![],
            container_statuses: vec![],
        }
    }

    fn workload(name: &str, replicas: u32) -> Workload {
        Workload {
            name: name.to_string(),
            namespace: "default".to_string(),
            replicas,
            tolerations: vec![],
        }
    }

    fn classifier() -> DistributionClassifier {
        DistributionClassifier::new(ReportLogger::default(), LabelKeys::default())
    }

    #[test]
    fn test_single_on_demand_instance() {
        let units = vec![unit("n1", Some("ON_DEMAND"))];
        let instances = vec![instance("api-5f6-abc12", Some("n1"), Phase::Running)];

        let d = classifier().classify(&workload("api", 1), &instances, &units);

        assert_eq!(d.on_demand, 1);
        assert_eq!(d.spot, 0);
        assert_eq!(d.ready, 1);
        assert_eq!(d.total, 1);
    }

    #[test]
    fn test_mixed_classes_sum_to_matched() {
        let units = vec![
            unit("n1", Some("ON_DEMAND")),
            unit("n2", Some("SPOT")),
            unit("n3", None),
            unit("n4", Some("RESERVED")),
        ];
        let instances = vec![
            instance("web-1a-aaaaa", Some("n1"), Phase::Running),
            instance("web-1a-bbbbb", Some("n2"), Phase::Running),
            instance("web-1a-ccccc", Some("n2"), Phase::Running),
            instance("web-1a-ddddd", Some("n3"), Phase::Running),
            instance("web-1a-eeeee", Some("n4"), Phase::Running),
            instance("web-1a-fffff", Some("gone"), Phase::Running),
            instance("web-1a-ggggg", None, Phase::Pending),
        ];

        let d = classifier().classify(&workload("web", 7), &instances, &units);

        assert_eq!(d.total, 7);
        assert_eq!(d.ready, 6);
        assert_eq!(d.on_demand, 1);
        assert_eq!(d.spot, 2);
        assert_eq!(d.unknown, 2);
        assert_eq!(d.unplaced, 1);
        assert_eq!(d.matched(), d.on_demand + d.spot + d.unknown);
        assert_eq!(d.ready, d.matched() + d.unplaced);
    }

    #[test]
    fn test_ownership_is_exact() {
        let units = vec![unit("n1", Some("SPOT"))];
        let instances = vec![
            instance("api-5f6-abc12", Some("n1"), Phase::Running),
            instance("api-canary-5f6-abc12", Some("n1"), Phase::Running),
        ];

        let d = classifier().classify(&workload("api", 1), &instances, &units);
        assert_eq!(d.total, 1);
        assert_eq!(d.spot, 1);
    }

    #[test]
    fn test_other_namespace_not_owned() {
        let units = vec![unit("n1", Some("SPOT"))];
        let mut foreign = instance("api-5f6-abc12", Some("n1"), Phase::Running);
        foreign.namespace = "staging".to_string();

        let d = classifier().classify(&workload("api", 1), &[foreign], &units);
        assert_eq!(d, Distribution::default());
    }

    #[test]
    fn test_capacity_class_labels() {
        assert_eq!(CapacityClass::from_label(Some("ON_DEMAND")), CapacityClass::OnDemand);
        assert_eq!(CapacityClass::from_label(Some("SPOT")), CapacityClass::Spot);
        assert_eq!(CapacityClass::from_label(Some("spot")), CapacityClass::Unknown);
        assert_eq!(CapacityClass::from_label(None), CapacityClass::Unknown);
    }
}
