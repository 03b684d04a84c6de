// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spindle start`/`spindle stop` — process lifecycle around `spindled`.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use spindle_daemon::{Layout, Request, Response};

use crate::client::{probe_socket, ClientError};
use crate::daemon_process::{read_daemon_pid, start_daemon_background, wait_for_exit};
use crate::output::OutputFormat;

const START_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn start(config_path: &Path, layout: &Layout, format: OutputFormat) -> Result<()> {
    if probe_socket(&layout.socket_path) {
        report(format, "daemon already running", r#"{"started":false,"already_running":true}"#);
        return Ok(());
    }

    start_daemon_background(config_path)
        .map_err(|e| anyhow!("failed to spawn spindled: {e}"))?;

    let deadline = std::time::Instant::now() + START_TIMEOUT;
    while std::time::Instant::now() < deadline {
        if probe_socket(&layout.socket_path) {
            report(format, "daemon started", r#"{"started":true}"#);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    Err(anyhow!(
        "spindled did not open its socket within {}s",
        START_TIMEOUT.as_secs()
    ))
}

pub async fn stop(layout: &Layout, format: OutputFormat) -> Result<()> {
    let mut client = match super::connect(layout).await {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning(_)) => {
            report(format, "daemon not running", r#"{"stopped":false,"running":false}"#);
            return Ok(());
        }
        Err(e) => return Err(anyhow!(e)),
    };

    let pid = read_daemon_pid(&layout.lock_path);

    match client.send(Request::Shutdown).await? {
        Response::ShuttingDown => {}
        _ => return Err(anyhow!("unexpected response to Shutdown")),
    }

    if let Some(pid) = pid {
        wait_for_exit(pid, STOP_TIMEOUT).await;
    }

    report(format, "daemon stopped", r#"{"stopped":true}"#);
    Ok(())
}

fn report(format: OutputFormat, text: &str, json: &str) {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => println!("{json}"),
    }
}
