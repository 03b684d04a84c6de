// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spindle audit` (SPEC_FULL.md §9): a read-only report over the queue
//! store, for diagnosing a host without going through the daemon's IPC
//! surface at all. This talks to the store directly rather than through
//! `DaemonClient`, since it's meant to work even against a stopped daemon.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use spindle_core::clock::SystemClock;
use spindle_core::item::WorkItem;
use spindle_core::status::Status;
use spindle_daemon::Layout;
use spindle_storage::{QueueStore, StorePaths};

use crate::output::OutputFormat;

/// The envelope stage name expected to already be present for a ready or
/// completed status, i.e. the in-flight stage whose success produced it.
/// `None` for `Pending` (nothing has run yet) and for in-flight/failed
/// statuses, which have no single deterministic expected section.
fn expected_section(status: Status) -> Option<&'static str> {
    use Status::*;
    match status {
        Identified => Some("identifying"),
        Ripped => Some("ripping"),
        EpisodeIdentified => Some("episode_identifying"),
        Encoded => Some("encoding"),
        AudioAnalyzed => Some("audio_analyzing"),
        Subtitled => Some("subtitling"),
        Completed => Some("organizing"),
        _ => None,
    }
}

struct Report {
    by_status: HashMap<Status, usize>,
    failed: Vec<(WorkItem, Status, Option<String>)>,
    missing_sections: Vec<(u64, Status, &'static str)>,
}

fn build_report(items: Vec<WorkItem>) -> Report {
    let mut by_status = HashMap::new();
    let mut failed = Vec::new();
    let mut missing_sections = Vec::new();

    for item in items {
        *by_status.entry(item.status).or_insert(0) += 1;

        if let Some(expected) = expected_section(item.status) {
            if item.envelope.section_for(expected).is_none() {
                missing_sections.push((item.id.get(), item.status, expected));
            }
        }

        if item.status == Status::Failed {
            let failed_at = item.failed_at_status.unwrap_or(Status::Pending);
            let reason = item.review_reason.clone();
            failed.push((item, failed_at, reason));
        }
    }

    Report {
        by_status,
        failed,
        missing_sections,
    }
}

pub async fn run(layout: &Layout, format: OutputFormat) -> Result<()> {
    let paths = StorePaths {
        wal_path: layout.wal_path.clone(),
        snapshot_path: layout.snapshot_path.clone(),
    };
    let store = QueueStore::open(paths, Arc::new(SystemClock))
        .context("opening queue store for audit")?;
    let report = build_report(store.list());

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &Report) {
    println!("by status:");
    for status in Status::ALL {
        if let Some(count) = report.by_status.get(&status) {
            println!("  {status}: {count}");
        }
    }

    if report.failed.is_empty() {
        println!("failed items: none");
    } else {
        println!("failed items:");
        for (item, failed_at, reason) in &report.failed {
            match reason {
                Some(reason) => println!("  [{}] failed_at={failed_at} reason={reason}", item.id),
                None => println!("  [{}] failed_at={failed_at}", item.id),
            }
        }
    }

    if report.missing_sections.is_empty() {
        println!("envelope gaps: none");
    } else {
        println!("envelope gaps:");
        for (id, status, expected) in &report.missing_sections {
            println!("  item {id} at {status} is missing its \"{expected}\" section");
        }
    }
}

fn print_json(report: &Report) {
    let by_status: serde_json::Map<String, serde_json::Value> = report
        .by_status
        .iter()
        .map(|(status, count)| (status.to_string(), serde_json::json!(count)))
        .collect();

    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|(item, failed_at, reason)| {
            serde_json::json!({
                "id": item.id.get(),
                "failed_at_status": failed_at.to_string(),
                "review_reason": reason,
            })
        })
        .collect();

    let missing: Vec<_> = report
        .missing_sections
        .iter()
        .map(|(id, status, expected)| {
            serde_json::json!({
                "id": id,
                "status": status.to_string(),
                "missing_section": expected,
            })
        })
        .collect();

    let payload = serde_json::json!({
        "by_status": by_status,
        "failed": failed,
        "missing_sections": missing,
    });
    println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
}
