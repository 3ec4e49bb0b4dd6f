use std::fmt;

use anyhow::Context;
use production_db::{ProductionRecord, ProductionStatus, ProductionStore};

/// Statuses printed after a status update.
pub const REPORTED_STATUSES: [ProductionStatus; 3] = [
    ProductionStatus::Pending,
    ProductionStatus::InProgress,
    ProductionStatus::Done,
];

/// Record counts per status, in the order they were requested.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusCounts(Vec<(ProductionStatus, u64)>);

impl StatusCounts {
    pub fn get(&self, status: ProductionStatus) -> Option<u64> {
        self.0
            .iter()
            .find(|(counted, _)| *counted == status)
            .map(|(_, count)| *count)
    }

    /// One `STATUS (description): count` line per status.
    pub fn render_described(&self) -> String {
        self.0
            .iter()
            .map(|(status, count)| format!("{status} ({}): {count}", status.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (status, count)) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{status}: {count}")?;
        }
        Ok(())
    }
}

/// One count query per status.
pub async fn count_statuses<S>(
    store: &S,
    statuses: &[ProductionStatus],
) -> anyhow::Result<StatusCounts>
where
    S: ProductionStore + ?Sized,
{
    let mut counts = Vec::with_capacity(statuses.len());
    for &status in statuses {
        let count = store
            .count_by_status(status)
            .await
            .with_context(|| format!("failed to count {status} records"))?;
        counts.push((status, count));
    }
    Ok(StatusCounts(counts))
}

/// Pretty JSON for a record, or `null` when nothing matched.
pub fn render_record(record: Option<&ProductionRecord>) -> anyhow::Result<String> {
    serde_json::to_string_pretty(&record).with_context(|| "failed to render production record")
}
