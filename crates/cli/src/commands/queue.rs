// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue mutation commands: retry, stop-item, clear-completed, clear-failed,
//! reset-stuck (spec.md §6.4).

use anyhow::{anyhow, Result};
use spindle_core::id::ItemId;
use spindle_daemon::{Layout, Request, Response};

use crate::output::{print_acted, OutputFormat};

pub async fn retry(layout: &Layout, ids: Vec<u64>, format: OutputFormat) -> Result<()> {
    let ids = ids.into_iter().map(ItemId::new).collect();
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(Request::Retry { ids }).await? {
        Response::Acted { ids } => {
            print_acted(&ids, format);
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to Retry")),
    }
}

pub async fn stop_item(layout: &Layout, ids: Vec<u64>, format: OutputFormat) -> Result<()> {
    let ids = ids.into_iter().map(ItemId::new).collect();
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(Request::StopItems { ids }).await? {
        Response::Acted { ids } => {
            print_acted(&ids, format);
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to StopItems")),
    }
}

pub async fn reset_stuck(layout: &Layout, format: OutputFormat) -> Result<()> {
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(Request::ResetStuck).await? {
        Response::Acted { ids } => {
            print_acted(&ids, format);
            Ok(())
        }
        _ => Err(anyhow!("unexpected response to ResetStuck")),
    }
}

pub async fn clear_completed(layout: &Layout, format: OutputFormat) -> Result<()> {
    clear(layout, Request::ClearCompleted, format).await
}

pub async fn clear_failed(layout: &Layout, format: OutputFormat) -> Result<()> {
    clear(layout, Request::ClearFailed, format).await
}

async fn clear(layout: &Layout, request: Request, format: OutputFormat) -> Result<()> {
    let mut client = super::connect(layout).await.map_err(|e| anyhow!(e))?;
    match client.send(request).await? {
        Response::Cleared { count } => {
            match format {
                OutputFormat::Text => println!("cleared {count} item(s)"),
                OutputFormat::Json => println!(r#"{{"cleared":{count}}}"#),
            }
            Ok(())
        }
        _ => Err(anyhow!("unexpected response clearing items")),
    }
}
