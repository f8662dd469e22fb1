//! `get` command: workloads, pods and nodes

use anyhow::Result;
use clap::ValueEnum;
use kshow_lib::ReportKind;

use super::CommandContext;

/// Object kinds accepted by `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Object {
    #[value(name = "deployment", aliases = ["deployments", "deploy"])]
    Deployment,
    #[value(name = "pods", aliases = ["pod", "po"])]
    Pods,
    #[value(name = "nodes", aliases = ["node", "no"])]
    Nodes,
}

/// Report kinds shown for an object
pub fn kinds_for(object: Object, detailed: bool, show_tolerations: bool) -> Vec<ReportKind> {
    match object {
        Object::Deployment if detailed || show_tolerations => vec![ReportKind::WorkloadDetailed],
        Object::Deployment => vec![ReportKind::WorkloadSummary],
        Object::Pods if detailed => vec![ReportKind::InstancePlacement],
        Object::Pods => vec![ReportKind::InstanceSummary],
        Object::Nodes if detailed => vec![ReportKind::UnitGroups, ReportKind::UnitDetailed],
        Object::Nodes => vec![ReportKind::UnitSummary],
    }
}

/// Show an object listing
pub async fn get_object(
    ctx: &CommandContext,
    object: Object,
    namespace: Option<&str>,
    detailed: bool,
    show_tolerations: bool,
) -> Result<()> {
    let kinds = kinds_for(object, detailed, show_tolerations);
    ctx.show(&kinds, namespace).await
}
