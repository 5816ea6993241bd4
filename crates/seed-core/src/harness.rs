//! Reset and benchmark harness.

use crate::coordinator::StoreTimings;
use crate::error::Result;
use crate::populator::Populator;
use crate::schema::EntityKind;
use crate::store::{DocumentFilter, DocumentStore, RelationalStore, Statement};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Number of consecutive timed runs in one benchmark.
pub const BENCHMARK_RUNS: usize = 2;

/// Delete every record from both stores, memberships first, then chats, then
/// users, and commit the relational deletes.
///
/// Counters are left alone; see [`crate::SequenceAllocator::reset_all`].
pub async fn reset_all_stores(
    documents: &dyn DocumentStore,
    relational: &dyn RelationalStore,
) -> Result<()> {
    let filter = DocumentFilter::all();
    for kind in EntityKind::DELETION_ORDER {
        let removed = documents.delete_many(kind.name(), &filter).await?;
        info!("Cleared {} documents from {}", removed, kind);
    }
    for kind in EntityKind::DELETION_ORDER {
        let removed = relational
            .execute(&Statement::DeleteAll { table: kind })
            .await?;
        info!("Cleared {} rows from {}", removed, kind);
    }
    relational.commit().await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Document,
    Relational,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Document => f.write_str("document store"),
            StoreKind::Relational => f.write_str("relational store"),
        }
    }
}

/// Timing of one `populate` run inside a benchmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunTiming {
    pub elapsed: Duration,
    pub timings: StoreTimings,
}

/// Result of [`benchmark`].
///
/// Every run writes to both stores, so run wall-clock times alone say
/// nothing about either store. The comparison uses the time each store spent
/// serving its own writes, summed over all runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    pub record_count: usize,
    pub runs: Vec<RunTiming>,
}

impl BenchmarkReport {
    pub fn totals(&self) -> StoreTimings {
        let mut totals = StoreTimings::default();
        for run in &self.runs {
            totals.accumulate(&run.timings);
        }
        totals
    }

    /// Time attributed to one store across all runs.
    ///
    /// Counter allocation runs against the document store, but it is
    /// coordination overhead shared by both write paths and is reported
    /// separately instead of being charged to either side.
    pub fn store_time(&self, store: StoreKind) -> Duration {
        let totals = self.totals();
        match store {
            StoreKind::Document => totals.document,
            StoreKind::Relational => totals.relational,
        }
    }

    /// The store that spent less time on its writes, or `None` on a tie.
    pub fn faster(&self) -> Option<StoreKind> {
        let document = self.store_time(StoreKind::Document);
        let relational = self.store_time(StoreKind::Relational);
        match document.cmp(&relational) {
            std::cmp::Ordering::Less => Some(StoreKind::Document),
            std::cmp::Ordering::Greater => Some(StoreKind::Relational),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Run `populate(count)` [`BENCHMARK_RUNS`] times back to back and collect
/// per-run and per-store timings.
pub async fn benchmark(populator: &mut Populator, count: usize) -> Result<BenchmarkReport> {
    let mut report = BenchmarkReport {
        record_count: count,
        runs: Vec::with_capacity(BENCHMARK_RUNS),
    };

    for run in 1..=BENCHMARK_RUNS {
        let summary = populator.populate(count).await?;
        info!(
            "Benchmark run {}: {:?} total, {:?} document writes, {:?} relational writes",
            run, summary.elapsed, summary.timings.document, summary.timings.relational
        );
        report.runs.push(RunTiming {
            elapsed: summary.elapsed,
            timings: summary.timings,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(document_ms: u64, relational_ms: u64) -> RunTiming {
        RunTiming {
            elapsed: Duration::from_millis(document_ms + relational_ms),
            timings: StoreTimings {
                allocation: Duration::from_millis(1),
                document: Duration::from_millis(document_ms),
                relational: Duration::from_millis(relational_ms),
            },
        }
    }

    #[test]
    fn test_faster_store_uses_summed_store_time() {
        let report = BenchmarkReport {
            record_count: 10,
            runs: vec![run(30, 10), run(5, 40)],
        };
        assert_eq!(report.store_time(StoreKind::Document), Duration::from_millis(35));
        assert_eq!(report.store_time(StoreKind::Relational), Duration::from_millis(50));
        assert_eq!(report.faster(), Some(StoreKind::Document));
        assert_eq!(report.totals().allocation, Duration::from_millis(2));
    }

    #[test]
    fn test_tie_reports_no_faster_store() {
        let report = BenchmarkReport {
            record_count: 0,
            runs: vec![run(10, 10)],
        };
        assert_eq!(report.faster(), None);
    }
}
