//! Core data models for cluster reports
//!
//! Every record here is a query-scoped snapshot: built once from the
//! inventory source, read by the report components, then dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Arbitrary key/value metadata attached to a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a label. Absence is reported as `None`, never as an empty string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Well-known label keys used to classify units
///
/// Defaults match EKS managed node groups; other providers override them
/// through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelKeys {
    pub hostname: String,
    pub capacity_type: String,
    pub node_group: String,
    pub instance_type: String,
    pub arch: String,
    pub zone: String,
}

impl Default for LabelKeys {
    fn default() -> Self {
        Self {
            hostname: "kubernetes.io/hostname".to_string(),
            capacity_type: "eks.amazonaws.com/capacityType".to_string(),
            node_group: "eks.amazonaws.com/nodegroup".to_string(),
            instance_type: "node.kubernetes.io/instance-type".to_string(),
            arch: "beta.kubernetes.io/arch".to_string(),
            zone: "topology.kubernetes.io/zone".to_string(),
        }
    }
}

/// A readiness condition reported for a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCondition {
    pub condition_type: String,
    pub reason: Option<String>,
}

/// A placement target (node)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub conditions: Vec<UnitCondition>,
    pub labels: Labels,
    pub kubelet_version: String,
    pub allocatable_cpu_millicores: u64,
    pub allocatable_memory_bytes: u64,
}

impl Unit {
    /// Hostname label used as the placement identity
    pub fn hostname<'a>(&'a self, keys: &LabelKeys) -> Option<&'a str> {
        self.labels.get(&keys.hostname)
    }
}

/// Lifecycle phase of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        }
    }

    /// Parse a phase name; anything unrecognized is `Unknown`
    pub fn parse(value: &str) -> Self {
        match value {
            "Pending" => Phase::Pending,
            "Running" => Phase::Running,
            "Succeeded" => Phase::Succeeded,
            "Failed" => Phase::Failed,
            _ => Phase::Unknown,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU and memory amounts, each optional when undeclared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAmounts {
    pub cpu_millicores: Option<u64>,
    pub memory_bytes: Option<u64>,
}

impl ResourceAmounts {
    pub fn new(cpu_millicores: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millicores: Some(cpu_millicores),
            memory_bytes: Some(memory_bytes),
        }
    }
}

/// Declared resources of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub requests: ResourceAmounts,
    pub limits: ResourceAmounts,
}

/// Runtime state of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: u32,
    /// Reason of the waiting state, if the container is waiting
    pub waiting_reason: Option<String>,
}

/// A scheduled workload replica (pod)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    /// Hostname of the unit this instance is bound to
    pub node_name: Option<String>,
    pub containers: Vec<ContainerSpec>,
    pub container_statuses: Vec<ContainerStatus>,
}

impl Instance {
    /// Total requested CPU and memory across containers
    pub fn total_requests(&self) -> (u64, u64) {
        self.containers.iter().fold((0, 0), |(cpu, mem), c| {
            (
                cpu.saturating_add(c.requests.cpu_millicores.unwrap_or(0)),
                mem.saturating_add(c.requests.memory_bytes.unwrap_or(0)),
            )
        })
    }

    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }
}

/// Current usage of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerUsage {
    pub name: String,
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

/// Point-in-time usage measurement for one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSample {
    pub instance_name: String,
    pub namespace: String,
    pub containers: Vec<ContainerUsage>,
}

impl UsageSample {
    /// Total current CPU and memory across containers
    pub fn total_usage(&self) -> (u64, u64) {
        self.containers.iter().fold((0, 0), |(cpu, mem), c| {
            (
                cpu.saturating_add(c.cpu_millicores),
                mem.saturating_add(c.memory_bytes),
            )
        })
    }
}

/// Scheduling toleration declared on a workload template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    pub key: String,
    pub operator: String,
    pub value: String,
    pub effect: String,
}

impl fmt::Display for Toleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.key, self.operator, self.value, self.effect)
    }
}

/// A deployable specification (deployment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub replicas: u32,
    pub tolerations: Vec<Toleration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup_absent() {
        let labels = Labels::new().with("zone", "us-east-1a");
        assert_eq!(labels.get("zone"), Some("us-east-1a"));
        assert_eq!(labels.get("arch"), None);
    }

    #[test]
    fn test_phase_parse_unknown() {
        assert_eq!(Phase::parse("Running"), Phase::Running);
        assert_eq!(Phase::parse("Evicted"), Phase::Unknown);
        assert_eq!(Phase::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_totals_saturate() {
        let huge = ContainerSpec {
            name: "app".into(),
            requests: ResourceAmounts::new(u64::MAX - 1, 10_000_000_000_000_000_000),
            limits: ResourceAmounts::default(),
        };
        let instance = Instance {
            name: "big-5f6-abc12".into(),
            namespace: "default".into(),
            created_at: chrono::Utc::now(),
            phase: Phase::Running,
            node_name: None,
            containers: vec![huge.clone(), huge],
            container_statuses: vec![],
        };
        assert_eq!(instance.total_requests(), (u64::MAX, u64::MAX));

        let usage = ContainerUsage {
            name: "app".into(),
            cpu_millicores: u64::MAX,
            memory_bytes: u64::MAX - 5,
        };
        let sample = UsageSample {
            instance_name: "big-5f6-abc12".into(),
            namespace: "default".into(),
            containers: vec![usage.clone(), usage],
        };
        assert_eq!(sample.total_usage(), (u64::MAX, u64::MAX));
    }

    #[test]
    fn test_toleration_display() {
        let t = Toleration {
            key: "dedicated".into(),
            operator: "Equal".into(),
            value: "batch".into(),
            effect: "NoSchedule".into(),
        };
        assert_eq!(t.to_string(), "dedicated-Equal-batch-NoSchedule");
    }
}
