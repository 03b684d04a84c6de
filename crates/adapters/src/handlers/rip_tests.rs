// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use spindle_core::id::ItemId;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn stub_makemkvcon(script: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("makemkvcon");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    let existing = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{existing}", dir.path().display()));
    dir
}

fn item_with_rip_spec() -> WorkItem {
    let mut item = WorkItem::new_disc(ItemId::new(1), "Gladiator".to_string(), "FP1".to_string(), 0);
    item.rip_spec = Some(serde_json::json!({ "title_index": 0, "title_count": 1 }));
    item
}

#[tokio::test]
async fn prepare_fails_without_rip_spec() {
    let handler = RipHandler::new(TempDir::new().unwrap().path().to_path_buf(), 0);
    let mut item = item_with_rip_spec();
    item.rip_spec = None;
    let err = handler.prepare(&item).await.unwrap_err();
    assert!(err.to_string().contains("rip_spec"));
}

#[tokio::test]
#[serial_test::serial]
async fn execute_records_the_produced_mkv_file() {
    let staging_root = TempDir::new().unwrap();
    let item = item_with_rip_spec();
    let out_dir = staging_root.path().join(item.staging_dir_name());

    // The fake makemkvcon writes the output file itself, mirroring the
    // real tool writing into the directory it's given.
    let _guard = stub_makemkvcon("mkdir -p \"$4\" && touch \"$4/title0.mkv\" && exit 0");

    let handler = RipHandler::new(staging_root.path().to_path_buf(), 0);
    let ctx = StageContext::new(tokio_util::sync::CancellationToken::new());
    let patch = handler.execute(&ctx, &item).await.unwrap();

    let ripped = patch.ripped_file.unwrap();
    assert_eq!(ripped, out_dir.join("title0.mkv"));
    assert_eq!(patch.append_envelope_section.unwrap().stage, "ripping");
}

#[tokio::test]
async fn disc_dependent_is_true() {
    let handler = RipHandler::new(TempDir::new().unwrap().path().to_path_buf(), 0);
    assert!(handler.disc_dependent());
}
