//! Structured logging for report generation
//!
//! Components receive a [`ReportLogger`] at construction instead of reaching
//! for a global logger. Events are emitted through `tracing` with a stable
//! `event` field so JSON output can be filtered downstream.

use tracing::{debug, info, warn};

/// Structured logger for report events
///
/// Cheap to clone; every clone tags events with the same cluster context.
#[derive(Debug, Clone)]
pub struct ReportLogger {
    context: String,
}

impl Default for ReportLogger {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ReportLogger {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// A usage sample had no matching instance
    pub fn log_unmatched_sample(&self, namespace: &str, instance: &str) {
        debug!(
            event = "unmatched_reference",
            context = %self.context,
            kind = "usage_sample",
            namespace = %namespace,
            instance = %instance,
            "Usage sample has no matching instance, skipping"
        );
    }

    /// An instance is bound to a unit that is not in the snapshot
    pub fn log_unplaced_instance(&self, namespace: &str, instance: &str, node: Option<&str>) {
        debug!(
            event = "unmatched_reference",
            context = %self.context,
            kind = "placement",
            namespace = %namespace,
            instance = %instance,
            node = ?node,
            "Instance placement does not match any unit"
        );
    }

    /// An instance name could not be decomposed into workload and suffixes
    pub fn log_malformed_identity(&self, instance: &str) {
        debug!(
            event = "malformed_identity",
            context = %self.context,
            instance = %instance,
            "Instance name has no generated suffixes, using whole name"
        );
    }

    /// A percentage was requested against a zero denominator
    pub fn log_degenerate_ratio(&self, scope: &str, resource: &str) {
        warn!(
            event = "degenerate_ratio",
            context = %self.context,
            scope = %scope,
            resource = %resource,
            "Cluster capacity is zero, reporting 0%"
        );
    }

    /// A resource quantity could not be parsed and was treated as absent
    pub fn log_malformed_quantity(&self, object: &str, field: &str, value: &str) {
        warn!(
            event = "malformed_quantity",
            context = %self.context,
            object = %object,
            field = %field,
            value = %value,
            "Could not parse resource quantity, treating as absent"
        );
    }

    /// An inventory list call failed
    pub fn log_inventory_failure(&self, resource: &str, error: &str, treated_as_empty: bool) {
        if treated_as_empty {
            warn!(
                event = "inventory_unavailable",
                context = %self.context,
                resource = %resource,
                error = %error,
                "Inventory unavailable, continuing with empty collection"
            );
        } else {
            warn!(
                event = "inventory_unavailable",
                context = %self.context,
                resource = %resource,
                error = %error,
                "Inventory unavailable, aborting report"
            );
        }
    }

    /// A snapshot was captured
    pub fn log_snapshot(
        &self,
        namespace: Option<&str>,
        workloads: usize,
        instances: usize,
        units: usize,
        samples: usize,
    ) {
        debug!(
            event = "snapshot_collected",
            context = %self.context,
            namespace = namespace.unwrap_or("*"),
            workloads = workloads,
            instances = instances,
            units = units,
            samples = samples,
            "Collected inventory snapshot"
        );
    }

    /// A report was assembled
    pub fn log_report(&self, kind: &str, rows: usize) {
        info!(
            event = "report_assembled",
            context = %self.context,
            kind = %kind,
            rows = rows,
            "Assembled report"
        );
    }
}
