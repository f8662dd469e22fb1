//! Resource-correlation and aggregation engine for cluster reports
//!
//! This crate provides:
//! - Age bucketing and status resolution for units and instances
//! - Identity joins between workloads, instances, units and usage samples
//! - Capacity aggregation and placement distribution
//! - Report assembly into ordered rows for a presentation sink
//!
//! It performs no I/O; data arrives through the [`ClusterInventory`] trait.

pub mod age;
pub mod capacity;
pub mod distribution;
pub mod inventory;
pub mod join;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod report;
pub mod status;
pub mod workload;

pub use inventory::{
    ClusterInventory, FailurePolicy, InventoryError, Requirements, Snapshot,
};
pub use models::*;
pub use observability::ReportLogger;
pub use report::{Cell, Report, ReportAssembler, ReportKind, Row};
