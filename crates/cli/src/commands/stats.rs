//! Resource usage and utilization commands

use anyhow::Result;
use kshow_lib::ReportKind;

use super::CommandContext;

/// Show current usage per pod, or per container when detailed
pub async fn resource_stats(
    ctx: &CommandContext,
    namespace: Option<&str>,
    detailed: bool,
) -> Result<()> {
    let kind = if detailed {
        ReportKind::ContainerUsage
    } else {
        ReportKind::InstanceUsage
    };
    ctx.show(&[kind], namespace).await
}

/// Show namespace consumption against cluster capacity
pub async fn utilization(ctx: &CommandContext, namespace: Option<&str>) -> Result<()> {
    ctx.show(&[ReportKind::ClusterUtilization], namespace).await
}
