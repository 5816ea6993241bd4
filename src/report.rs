//! Console reporting for populate, benchmark and verify runs.

use seed_core::{BenchmarkReport, ConsistencyReport, EntityKind, PopulateSummary, StoreKind};
use std::fmt::Write;
use std::time::Duration;

/// Product name for a store role.
pub fn store_label(store: StoreKind) -> &'static str {
    match store {
        StoreKind::Document => "MongoDB",
        StoreKind::Relational => "MySQL",
    }
}

fn secs(d: Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

pub fn format_populate(summary: &PopulateSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Populated {} records in {}",
        summary.records_written(),
        secs(summary.elapsed)
    );
    let _ = writeln!(
        out,
        "  users: {}  chats: {}  members: {}",
        summary.user_ids.len(),
        summary.chat_ids.len(),
        summary.member_count
    );
    let _ = writeln!(
        out,
        "  id allocation: {}  MongoDB: {}  MySQL: {}",
        secs(summary.timings.allocation),
        secs(summary.timings.document),
        secs(summary.timings.relational)
    );
    let _ = write!(out, "  throughput: {:.1} records/s", summary.records_per_second());
    out
}

pub fn format_benchmark(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Benchmark: {} runs of {} users",
        report.runs.len(),
        report.record_count
    );
    for (i, run) in report.runs.iter().enumerate() {
        let _ = writeln!(
            out,
            "  run {}: {} total (MongoDB {}, MySQL {}, id allocation {})",
            i + 1,
            secs(run.elapsed),
            secs(run.timings.document),
            secs(run.timings.relational),
            secs(run.timings.allocation)
        );
    }
    let _ = writeln!(
        out,
        "  MongoDB write time: {}",
        secs(report.store_time(StoreKind::Document))
    );
    let _ = writeln!(
        out,
        "  MySQL write time: {}",
        secs(report.store_time(StoreKind::Relational))
    );
    let _ = writeln!(
        out,
        "  id allocation (MongoDB counters, charged to neither store): {}",
        secs(report.totals().allocation)
    );
    match report.faster() {
        Some(store) => {
            let _ = write!(out, "{} is faster", store_label(store));
        }
        None => {
            let _ = write!(out, "Both stores took the same time");
        }
    }
    out
}

pub fn format_consistency(report: &ConsistencyReport) -> String {
    let mut out = String::new();
    for kind in EntityKind::ALL {
        let (documents, rows) = report.count(kind);
        let _ = writeln!(out, "  {kind}: {documents} documents, {rows} rows");
    }
    for (kind, id) in &report.missing_in_relational {
        let _ = writeln!(out, "  {kind} {id}: missing in MySQL");
    }
    for (kind, id) in &report.missing_in_document {
        let _ = writeln!(out, "  {kind} {id}: missing in MongoDB");
    }
    for (kind, id) in &report.mismatched {
        let _ = writeln!(out, "  {kind} {id}: field values differ");
    }
    for name in &report.duplicate_user_names {
        let _ = writeln!(out, "  duplicate user_name: {name}");
    }
    for email in &report.duplicate_emails {
        let _ = writeln!(out, "  duplicate email: {email}");
    }
    for (kind, id, column, target) in &report.dangling_references {
        let _ = writeln!(out, "  {kind} {id}: {column} -> {target} does not exist");
    }
    if report.is_consistent() {
        let _ = write!(out, "Stores are consistent");
    } else {
        let _ = write!(out, "Stores are NOT consistent");
    }
    out
}
