//! Cluster inventory boundary
//!
//! The inventory source returns full current-state collections. Reports are
//! assembled from a [`Snapshot`] captured once per report, so the rest of
//! the crate never performs I/O.

use crate::models::{Instance, Unit, UsageSample, Workload};
use crate::observability::ReportLogger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;

/// Boxed error from an inventory backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// The source could not list a collection (transport, auth or API failure)
    #[error("inventory unavailable while listing {resource}: {source}")]
    Unavailable {
        resource: &'static str,
        #[source]
        source: BoxError,
    },
}

impl InventoryError {
    pub fn unavailable(resource: &'static str, source: impl Into<BoxError>) -> Self {
        InventoryError::Unavailable {
            resource,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

/// Source of current-state cluster collections
///
/// `namespace` of `None` lists across all namespaces.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn list_workloads(&self, namespace: Option<&str>) -> Result<Vec<Workload>>;

    async fn list_instances(&self, namespace: Option<&str>) -> Result<Vec<Instance>>;

    async fn list_units(&self) -> Result<Vec<Unit>>;

    async fn list_usage_samples(&self, namespace: Option<&str>) -> Result<Vec<UsageSample>>;
}

/// What to do when a list call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort and surface the error
    #[default]
    Propagate,
    /// Log and continue with an empty collection
    TreatAsEmpty,
}

/// Collections a report needs from the inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    pub workloads: bool,
    pub instances: bool,
    pub units: bool,
    pub usage_samples: bool,
}

impl Requirements {
    pub fn all() -> Self {
        Self {
            workloads: true,
            instances: true,
            units: true,
            usage_samples: true,
        }
    }

    /// Collections needed by either side
    pub fn union(self, other: Self) -> Self {
        Self {
            workloads: self.workloads || other.workloads,
            instances: self.instances || other.instances,
            units: self.units || other.units,
            usage_samples: self.usage_samples || other.usage_samples,
        }
    }
}

/// One materialized view of the cluster
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub namespace: Option<String>,
    pub workloads: Vec<Workload>,
    pub instances: Vec<Instance>,
    pub units: Vec<Unit>,
    pub usage_samples: Vec<UsageSample>,
    /// Capture time, used as "now" for age labels
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Empty snapshot captured at `taken_at`
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self {
            namespace: None,
            workloads: Vec::new(),
            instances: Vec::new(),
            units: Vec::new(),
            usage_samples: Vec::new(),
            taken_at,
        }
    }

    /// Query the inventory for the collections in `requirements`
    pub async fn collect(
        source: &dyn ClusterInventory,
        namespace: Option<&str>,
        requirements: Requirements,
        policy: FailurePolicy,
        logger: &ReportLogger,
    ) -> Result<Self> {
        let workloads = fetch(requirements.workloads, "workloads", policy, logger, || {
            source.list_workloads(namespace)
        })
        .await?;
        let instances = fetch(requirements.instances, "instances", policy, logger, || {
            source.list_instances(namespace)
        })
        .await?;
        let units = fetch(requirements.units, "units", policy, logger, || {
            source.list_units()
        })
        .await?;
        let usage_samples = fetch(
            requirements.usage_samples,
            "usage samples",
            policy,
            logger,
            || source.list_usage_samples(namespace),
        )
        .await?;

        logger.log_snapshot(
            namespace,
            workloads.len(),
            instances.len(),
            units.len(),
            usage_samples.len(),
        );

        Ok(Self {
            namespace: namespace.map(str::to_string),
            workloads,
            instances,
            units,
            usage_samples,
            taken_at: Utc::now(),
        })
    }
}

async fn fetch<T, F, Fut>(
    needed: bool,
    resource: &str,
    policy: FailurePolicy,
    logger: &ReportLogger,
    list: F,
) -> Result<Vec<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if !needed {
        return Ok(Vec::new());
    }

    match list().await {
        Ok(items) => Ok(items),
        Err(e) => match policy {
            FailurePolicy::Propagate => {
                logger.log_inventory_failure(resource, &e.to_string(), false);
                Err(e)
            }
            FailurePolicy::TreatAsEmpty => {
                logger.log_inventory_failure(resource, &e.to_string(), true);
                Ok(Vec::new())
            }
        },
    }
}
