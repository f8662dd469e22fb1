//! Report assembly
//!
//! Turns a [`Snapshot`] into ordered rows for a presentation sink. Column
//! sets are fixed per report kind; rows follow the order of the snapshot
//! collections. Nothing here performs I/O, and the same snapshot always
//! yields the same rows.

mod row;


pub use row::{Cell, Row};

use crate::age::age_label;
use crate::capacity::{to_display_memory, CapacityAggregator, ResourceTotals};
use crate::distribution::DistributionClassifier;
use crate::inventory::{Requirements, Snapshot};
use crate::join::join_first;
use crate::models::{LabelKeys, ResourceAmounts, Unit};
use crate::observability::ReportLogger;
use crate::quantity::format_memory_quantity;
use crate::status::{resolve_instance_status, resolve_unit_status};
use crate::workload::is_malformed;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fallback for absent classification labels
pub const UNKNOWN: &str = "unknown";

/// Fallback for absent descriptive labels
pub const NONE: &str = "<none>";

/// Name of the cluster-wide row in utilization reports
pub const CLUSTER_SCOPE: &str = "*";

/// Kinds of report the assembler produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    WorkloadSummary,
    WorkloadDetailed,
    InstanceSummary,
    InstancePlacement,
    UnitSummary,
    UnitDetailed,
    UnitGroups,
    InstanceUsage,
    ContainerUsage,
    ClusterUtilization,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        ReportKind::WorkloadSummary,
        ReportKind::WorkloadDetailed,
        ReportKind::InstanceSummary,
        ReportKind::InstancePlacement,
        ReportKind::UnitSummary,
        ReportKind::UnitDetailed,
        ReportKind::UnitGroups,
        ReportKind::InstanceUsage,
        ReportKind::ContainerUsage,
        ReportKind::ClusterUtilization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::WorkloadSummary => "workload-summary",
            ReportKind::WorkloadDetailed => "workload-detailed",
            ReportKind::InstanceSummary => "instance-summary",
            ReportKind::InstancePlacement => "instance-placement",
            ReportKind::UnitSummary => "unit-summary",
            ReportKind::UnitDetailed => "unit-detailed",
            ReportKind::UnitGroups => "unit-groups",
            ReportKind::InstanceUsage => "instance-usage",
            ReportKind::ContainerUsage => "container-usage",
            ReportKind::ClusterUtilization => "cluster-utilization",
        }
    }

    /// Column names in output order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::WorkloadSummary => &["DEPLOYMENT", "NAMESPACE", "REPLICAS"],
            ReportKind::WorkloadDetailed => &[
                "DEPLOYMENT",
                "NAMESPACE",
                "READY",
                "DISTRIBUTION",
                "TOLERATIONS",
            ],
            ReportKind::InstanceSummary => {
                &["POD", "READY", "STATUS", "RESTART", "AGE", "NAMESPACE"]
            }
            ReportKind::InstancePlacement => {
                &["POD", "AGE", "STATUS", "NAMESPACE", "NODE", "TENANCY"]
            }
            ReportKind::UnitSummary => &["NODE", "STATUS", "AGE", "VERSION"],
            ReportKind::UnitDetailed => &[
                "NODE",
                "STATUS",
                "AGE",
                "NODEGROUP",
                "TENANCY",
                "INSTANCE-TYPE",
                "ARCH",
                "AWS-ZONE",
            ],
            ReportKind::UnitGroups => &["K8S-VERSION", "NODE-GROUP", "NODECOUNT"],
            ReportKind::InstanceUsage => &["NAMESPACE", "POD", "CPU", "MEMORY"],
            ReportKind::ContainerUsage => &[
                "NAMESPACE",
                "POD",
                "CONTAINER",
                "CURRENT-CPU",
                "REQUESTED-CPU",
                "LIMIT-CPU",
                "CURRENT-MEMORY",
                "REQUESTED-MEMORY",
                "LIMIT-MEMORY",
            ],
            ReportKind::ClusterUtilization => &[
                "NAMESPACE",
                "CPU",
                "CPU-CAPACITY",
                "CPU-%",
                "MEMORY",
                "MEMORY-CAPACITY",
                "MEMORY-%",
            ],
        }
    }

    /// Collections this report reads from a snapshot
    pub fn requirements(&self) -> Requirements {
        let none = Requirements::default();
        match self {
            ReportKind::WorkloadSummary => Requirements {
                workloads: true,
                ..none
            },
            ReportKind::WorkloadDetailed => Requirements {
                workloads: true,
                instances: true,
                units: true,
                ..none
            },
            ReportKind::InstanceSummary => Requirements {
                instances: true,
                ..none
            },
            ReportKind::InstancePlacement => Requirements {
                instances: true,
                units: true,
                ..none
            },
            ReportKind::UnitSummary | ReportKind::UnitDetailed | ReportKind::UnitGroups => {
                Requirements {
                    units: true,
                    ..none
                }
            }
            ReportKind::InstanceUsage => Requirements {
                usage_samples: true,
                ..none
            },
            ReportKind::ContainerUsage => Requirements {
                instances: true,
                usage_samples: true,
                ..none
            },
            ReportKind::ClusterUtilization => Requirements {
                instances: true,
                units: true,
                usage_samples: true,
                ..none
            },
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown report kind '{}'", s))
    }
}

/// Ordered rows of one report kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub rows: Vec<Row>,
}

impl Report {
    fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, cells: Vec<Cell>) {
        self.rows.push(Row::new(self.kind.columns(), cells));
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.kind.columns()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Composes joins, status resolution and aggregation into reports
pub struct ReportAssembler {
    logger: ReportLogger,
    keys: LabelKeys,
    capacity: CapacityAggregator,
    distribution: DistributionClassifier,
}

impl ReportAssembler {
    pub fn new(logger: ReportLogger, keys: LabelKeys) -> Self {
        Self {
            capacity: CapacityAggregator::new(logger.clone()),
            distribution: DistributionClassifier::new(logger.clone(), keys.clone()),
            logger,
            keys,
        }
    }

    /// Assemble one report kind from a snapshot
    pub fn assemble(&self, kind: ReportKind, snapshot: &Snapshot) -> Report {
        let report = match kind {
            ReportKind::WorkloadSummary => self.workload_summary(snapshot),
            ReportKind::WorkloadDetailed => self.workload_detailed(snapshot),
            ReportKind::InstanceSummary => self.instance_summary(snapshot),
            ReportKind::InstancePlacement => self.instance_placement(snapshot),
            ReportKind::UnitSummary => self.unit_summary(snapshot),
            ReportKind::UnitDetailed => self.unit_detailed(snapshot),
            ReportKind::UnitGroups => self.unit_groups(snapshot),
            ReportKind::InstanceUsage => self.instance_usage(snapshot),
            ReportKind::ContainerUsage => self.container_usage(snapshot),
            ReportKind::ClusterUtilization => self.cluster_utilization(snapshot),
        };
        self.logger.log_report(kind.as_str(), report.len());
        report
    }

    fn workload_summary(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::WorkloadSummary);
        for w in &snapshot.workloads {
            report.push(vec![
                Cell::text(&w.name),
                Cell::text(&w.namespace),
                Cell::Integer(u64::from(w.replicas)),
            ]);
        }
        report
    }

    fn workload_detailed(&self, snapshot: &Snapshot) -> Report {
        for i in snapshot.instances.iter().filter(|i| is_malformed(&i.name)) {
            self.logger.log_malformed_identity(&i.name);
        }

        let mut report = Report::new(ReportKind::WorkloadDetailed);
        for w in &snapshot.workloads {
            let d = self
                .distribution
                .classify(w, &snapshot.instances, &snapshot.units);
            let tolerations: Vec<String> = w.tolerations.iter().map(|t| t.to_string()).collect();

            report.push(vec![
                Cell::text(&w.name),
                Cell::text(&w.namespace),
                Cell::Text(format!("{}/{}", d.ready, w.replicas)),
                Cell::Text(format!("OD:{} SP:{}", d.on_demand, d.spot)),
                Cell::Text(tolerations.join("::")),
            ]);
        }
        report
    }

    fn instance_summary(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::InstanceSummary);
        for i in &snapshot.instances {
            let ready = i.container_statuses.iter().filter(|c| c.ready).count();
            let restarts: u64 = i
                .container_statuses
                .iter()
                .map(|c| u64::from(c.restart_count))
                .sum();

            report.push(vec![
                Cell::text(&i.name),
                Cell::Text(format!("{}/{}", ready, i.container_statuses.len())),
                Cell::Text(resolve_instance_status(i.phase, &i.container_statuses)),
                Cell::Integer(restarts),
                Cell::Text(age_label(i.created_at, snapshot.taken_at)),
                Cell::text(&i.namespace),
            ]);
        }
        report
    }

    fn instance_placement(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::InstancePlacement);
        for i in &snapshot.instances {
            let Some(unit) = self.distribution.placement(i, &snapshot.units) else {
                self.logger
                    .log_unplaced_instance(&i.namespace, &i.name, i.node_name.as_deref());
                continue;
            };

            report.push(vec![
                Cell::text(&i.name),
                Cell::Text(age_label(i.created_at, snapshot.taken_at)),
                Cell::Text(resolve_instance_status(i.phase, &i.container_statuses)),
                Cell::text(&i.namespace),
                Cell::text(i.node_name.as_deref().unwrap_or_default()),
                Cell::text(self.label(unit, &self.keys.capacity_type, UNKNOWN)),
            ]);
        }
        report
    }

    fn unit_summary(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::UnitSummary);
        for u in &snapshot.units {
            report.push(vec![
                Cell::text(&u.name),
                Cell::Text(resolve_unit_status(&u.conditions)),
                Cell::Text(age_label(u.created_at, snapshot.taken_at)),
                Cell::text(&u.kubelet_version),
            ]);
        }
        report
    }

    fn unit_detailed(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::UnitDetailed);
        for u in &snapshot.units {
            report.push(vec![
                Cell::text(&u.name),
                Cell::Text(resolve_unit_status(&u.conditions)),
                Cell::Text(age_label(u.created_at, snapshot.taken_at)),
                Cell::text(self.label(u, &self.keys.node_group, UNKNOWN)),
                Cell::text(self.label(u, &self.keys.capacity_type, UNKNOWN)),
                Cell::text(self.label(u, &self.keys.instance_type, NONE)),
                Cell::text(self.label(u, &self.keys.arch, NONE)),
                Cell::text(self.label(u, &self.keys.zone, NONE)),
            ]);
        }
        report
    }

    fn unit_groups(&self, snapshot: &Snapshot) -> Report {
        let mut versions: Vec<&str> = Vec::new();
        let mut groups: Vec<(&str, u64)> = Vec::new();

        for u in &snapshot.units {
            if !versions.contains(&u.kubelet_version.as_str()) {
                versions.push(&u.kubelet_version);
            }
            let group = self.label(u, &self.keys.node_group, UNKNOWN);
            match groups.iter_mut().find(|(g, _)| *g == group) {
                Some((_, count)) => *count += 1,
                None => groups.push((group, 1)),
            }
        }

        let mut report = Report::new(ReportKind::UnitGroups);
        for index in 0..versions.len().max(groups.len()) {
            let version = versions.get(index).copied().unwrap_or_default();
            let (group, count) = match groups.get(index) {
                Some((group, count)) => (*group, Cell::Integer(*count)),
                None => ("", Cell::text("")),
            };
            report.push(vec![Cell::text(version), Cell::text(group), count]);
        }
        report
    }

    fn instance_usage(&self, snapshot: &Snapshot) -> Report {
        let mut report = Report::new(ReportKind::InstanceUsage);
        for s in &snapshot.usage_samples {
            let (cpu, memory) = s.total_usage();
            report.push(vec![
                Cell::text(&s.namespace),
                Cell::text(&s.instance_name),
                Cell::Text(format_cpu(cpu)),
                Cell::Text(format_memory(memory)),
            ]);
        }
        report
    }

    fn container_usage(&self, snapshot: &Snapshot) -> Report {
        let joined = join_first(
            &snapshot.usage_samples,
            &snapshot.instances,
            |s| (s.namespace.as_str(), s.instance_name.as_str()),
            |i| (i.namespace.as_str(), i.name.as_str()),
        );
        for s in &joined.unmatched {
            self.logger.log_unmatched_sample(&s.namespace, &s.instance_name);
        }

        let mut report = Report::new(ReportKind::ContainerUsage);
        for (sample, instance) in joined.pairs {
            for usage in &sample.containers {
                let spec = instance.container(&usage.name);
                let requests = spec.map(|c| c.requests).unwrap_or_default();
                let limits = spec.map(|c| c.limits).unwrap_or_default();

                report.push(vec![
                    Cell::text(&sample.namespace),
                    Cell::text(&sample.instance_name),
                    Cell::text(&usage.name),
                    Cell::Text(format_cpu(usage.cpu_millicores)),
                    Cell::Text(format_declared_cpu(requests)),
                    Cell::Text(format_declared_cpu(limits)),
                    Cell::Text(format_memory(usage.memory_bytes)),
                    Cell::Text(format_declared_memory(requests)),
                    Cell::Text(format_declared_memory(limits)),
                ]);
            }
        }
        report
    }

    fn cluster_utilization(&self, snapshot: &Snapshot) -> Report {
        let capacity = self.capacity.cluster_capacity(&snapshot.units);
        let consumption = self
            .capacity
            .consumption(&snapshot.instances, &snapshot.usage_samples);

        let mut report = Report::new(ReportKind::ClusterUtilization);
        for ns in &consumption.namespaces {
            report.push(self.utilization_cells(&ns.namespace, ns.totals, capacity));
        }
        report.push(self.utilization_cells(CLUSTER_SCOPE, consumption.cluster, capacity));
        report
    }

    fn utilization_cells(
        &self,
        scope: &str,
        used: ResourceTotals,
        capacity: ResourceTotals,
    ) -> Vec<Cell> {
        vec![
            Cell::text(scope),
            Cell::Text(format_cpu(used.cpu_millicores)),
            Cell::Text(format_cpu(capacity.cpu_millicores)),
            Cell::Percent(self.capacity.percentage(
                used.cpu_millicores,
                capacity.cpu_millicores,
                scope,
                "cpu",
            )),
            Cell::Text(format_memory(used.memory_bytes)),
            Cell::Text(format_memory(capacity.memory_bytes)),
            Cell::Percent(self.capacity.percentage(
                used.memory_bytes,
                capacity.memory_bytes,
                scope,
                "memory",
            )),
        ]
    }

    fn label<'a>(&self, unit: &'a Unit, key: &str, fallback: &'a str) -> &'a str {
        unit.labels.get(key).unwrap_or(fallback)
    }
}

fn format_cpu(millicores: u64) -> String {
    format!("{}m", millicores)
}

fn format_memory(bytes: u64) -> String {
    format!("{}Mi", to_display_memory(bytes))
}

fn format_declared_cpu(amounts: ResourceAmounts) -> String {
    amounts
        .cpu_millicores
        .map(format_cpu)
        .unwrap_or_else(|| "0".to_string())
}

/// Declared memory keeps its exact quantity form
fn format_declared_memory(amounts: ResourceAmounts) -> String {
    amounts
        .memory_bytes
        .map(format_memory_quantity)
        .unwrap_or_else(|| "0".to_string())
}
