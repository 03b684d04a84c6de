// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spindle status` (spec.md §6.4).

use anyhow::{anyhow, Result};
use spindle_daemon::{Request, Response};

use crate::client::ClientError;
use crate::output::{print_status, OutputFormat};

pub async fn run(layout: &spindle_daemon::Layout, format: OutputFormat) -> Result<()> {
    let mut client = match super::connect(layout).await {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning(path)) => {
            match format {
                OutputFormat::Text => println!("daemon not running (no socket at {})", path.display()),
                OutputFormat::Json => println!(r#"{{"running":false}}"#),
            }
            return Ok(());
        }
        Err(e) => return Err(anyhow!(e)),
    };

    match client.send(Request::Status).await? {
        Response::Status { status } => {
            print_status(&status, format);
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to Status")),
    }
}
