//! Capacity aggregation
//!
//! Cluster capacity is the sum of unit allocatable resources. Consumption is
//! summed per namespace from matched (instance, usage sample) pairs, taking
//! the larger of current usage and requested amount so idle reservations are
//! still counted. The cluster-wide consumption is the sum of the namespace
//! buckets, computed in the same pass.

use crate::join::join_first;
use crate::models::{Instance, Unit, UsageSample};
use crate::observability::ReportLogger;
use serde::Serialize;

/// Divisor converting bytes to the memory display unit
///
/// Slightly larger than a true MiB (1048576). Kept for output compatibility
/// with existing reports.
pub const MEMORY_DISPLAY_DIVISOR: u64 = 1_048_859;

/// CPU and memory totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTotals {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

impl ResourceTotals {
    fn add(&mut self, cpu_millicores: u64, memory_bytes: u64) {
        self.cpu_millicores = self.cpu_millicores.saturating_add(cpu_millicores);
        self.memory_bytes = self.memory_bytes.saturating_add(memory_bytes);
    }
}

/// Consumption of one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceConsumption {
    pub namespace: String,
    pub totals: ResourceTotals,
}

/// Consumption per namespace plus the cluster-wide sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Consumption {
    /// Namespaces in first-seen order
    pub namespaces: Vec<NamespaceConsumption>,
    pub cluster: ResourceTotals,
}

/// Sums capacity and consumption into scoped totals
pub struct CapacityAggregator {
    logger: ReportLogger,
}

impl CapacityAggregator {
    pub fn new(logger: ReportLogger) -> Self {
        Self { logger }
    }

    /// Allocatable capacity of the whole cluster
    pub fn cluster_capacity(&self, units: &[Unit]) -> ResourceTotals {
        units.iter().fold(ResourceTotals::default(), |mut acc, u| {
            acc.add(u.allocatable_cpu_millicores, u.allocatable_memory_bytes);
            acc
        })
    }

    /// Consumption per namespace from samples matched to instances
    ///
    /// Samples without a matching instance are skipped.
    pub fn consumption(&self, instances: &[Instance], samples: &[UsageSample]) -> Consumption {
        let joined = join_first(
            samples,
            instances,
            |s| (s.namespace.as_str(), s.instance_name.as_str()),
            |i| (i.namespace.as_str(), i.name.as_str()),
        );

        for sample in &joined.unmatched {
            self.logger
                .log_unmatched_sample(&sample.namespace, &sample.instance_name);
        }

        let mut result = Consumption::default();
        for (sample, instance) in joined.pairs {
            let (cpu, memory) = billable(instance, sample);

            let index = match result
                .namespaces
                .iter()
                .position(|n| n.namespace == instance.namespace)
            {
                Some(index) => index,
                None => {
                    result.namespaces.push(NamespaceConsumption {
                        namespace: instance.namespace.clone(),
                        totals: ResourceTotals::default(),
                    });
                    result.namespaces.len() - 1
                }
            };

            result.namespaces[index].totals.add(cpu, memory);
            result.cluster.add(cpu, memory);
        }

        result
    }

    /// Percentage of `part` in `whole`, zero when `whole` is zero
    pub fn percentage(&self, part: u64, whole: u64, scope: &str, resource: &str) -> f64 {
        if whole == 0 {
            self.logger.log_degenerate_ratio(scope, resource);
            return 0.0;
        }
        percentage(part, whole)
    }
}

/// Larger of usage and request for CPU and memory, at whole-instance granularity
pub fn billable(instance: &Instance, sample: &UsageSample) -> (u64, u64) {
    let (used_cpu, used_memory) = sample.total_usage();
    let (requested_cpu, requested_memory) = instance.total_requests();
    (used_cpu.max(requested_cpu), used_memory.max(requested_memory))
}

/// `100 * part / whole`, zero when `whole` is zero
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    100.0 * part as f64 / whole as f64
}

/// Bytes in the memory display unit, truncated
pub fn to_display_memory(bytes: u64) -> u64 {
    bytes / MEMORY_DISPLAY_DIVISOR
}
