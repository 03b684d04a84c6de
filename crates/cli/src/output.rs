// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use spindle_daemon::StatusPayload;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_status(status: &StatusPayload, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(status).unwrap_or_default());
        }
        OutputFormat::Text => {
            println!("running: {}", status.running);
            println!("in_flight: {}", status.in_flight_count);
            println!("failed: {}", status.failed_count);
            println!("completed: {}", status.completed_count);

            if !status.ready_counts_by_status.is_empty() {
                println!("ready by status:");
                let mut counts: Vec<_> = status.ready_counts_by_status.iter().collect();
                counts.sort_by_key(|(status, _)| format!("{status:?}"));
                for (stage, count) in counts {
                    println!("  {stage:?}: {count}");
                }
            }

            if status.workers.is_empty() {
                println!("workers: none");
            } else {
                println!("workers:");
                for (index, worker) in status.workers.iter().enumerate() {
                    match (&worker.current_item, &worker.stage) {
                        (Some(item), Some(stage)) => println!(
                            "  [{index}] {} item={} stage={:?} since={}ms",
                            worker.state, item, stage, worker.since_ms
                        ),
                        _ => println!("  [{index}] {}", worker.state),
                    }
                }
            }

            if !status.dependencies.is_empty() {
                println!("dependencies:");
                for (name, available) in &status.dependencies {
                    println!("  {name}: {}", if *available { "ok" } else { "missing" });
                }
            }
        }
    }
}

pub fn print_acted(ids: &[spindle_core::id::ItemId], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({ "ids": ids.iter().map(|i| i.get()).collect::<Vec<_>>() });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
        }
        OutputFormat::Text => {
            if ids.is_empty() {
                println!("no items acted on");
            } else {
                let ids: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
                println!("acted on: {}", ids.join(", "));
            }
        }
    }
}
