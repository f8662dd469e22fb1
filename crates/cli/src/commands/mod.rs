//! CLI command implementations

pub mod get;
pub mod stats;

use anyhow::Result;
use kshow_lib::{
    ClusterInventory, FailurePolicy, Report, ReportAssembler, ReportKind, ReportLogger,
    Requirements, Snapshot,
};

use crate::output::{print_reports, OutputFormat};

/// Everything a command needs to produce reports
pub struct CommandContext {
    pub inventory: Box<dyn ClusterInventory>,
    pub assembler: ReportAssembler,
    pub logger: ReportLogger,
    pub policy: FailurePolicy,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Capture one snapshot covering every kind, assemble and print them
    pub async fn show(&self, kinds: &[ReportKind], namespace: Option<&str>) -> Result<()> {
        let reports = self.assemble(kinds, namespace).await?;
        print_reports(&reports, self.format)
    }

    pub async fn assemble(
        &self,
        kinds: &[ReportKind],
        namespace: Option<&str>,
    ) -> Result<Vec<Report>> {
        let requirements = kinds
            .iter()
            .map(ReportKind::requirements)
            .fold(Requirements::default(), Requirements::union);

        let snapshot = Snapshot::collect(
            self.inventory.as_ref(),
            namespace,
            requirements,
            self.policy,
            &self.logger,
        )
        .await?;

        Ok(kinds
            .iter()
            .map(|kind| self.assembler.assemble(*kind, &snapshot))
            .collect())
    }
}
