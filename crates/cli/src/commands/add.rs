// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spindle add disc|file` — manual ingest (spec.md §4.2).

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use spindle_daemon::{Layout, Request, Response};

use crate::output::OutputFormat;

pub async fn disc(layout: &Layout, format: OutputFormat) -> Result<()> {
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(Request::AddDisc).await? {
        Response::Acted { .. } => {
            match format {
                OutputFormat::Text => println!("disc detection triggered"),
                OutputFormat::Json => println!(r#"{{"triggered":true}}"#),
            }
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to AddDisc")),
    }
}

pub async fn file(layout: &Layout, path: PathBuf, format: OutputFormat) -> Result<()> {
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(Request::AddFile { path }).await? {
        Response::Added { id } => {
            match format {
                OutputFormat::Text => println!("enqueued item {id}"),
                OutputFormat::Json => println!(r#"{{"id":{}}}"#, id.get()),
            }
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to AddFile")),
    }
}
