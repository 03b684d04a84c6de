// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use spindle_core::id::ItemId;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn stub_ffprobe(script: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ffprobe");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    let existing = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{existing}", dir.path().display()));
    dir
}

#[tokio::test]
async fn prepare_fails_without_encoded_file() {
    let handler = AudioAnalyzeHandler::new();
    let item = WorkItem::new_file(ItemId::new(1), "/tmp/in.mkv".into(), 0);
    assert!(handler.prepare(&item).await.is_err());
}

#[tokio::test]
#[serial_test::serial]
async fn execute_records_stream_count() {
    let _guard = stub_ffprobe(r#"echo '{"streams":[{"codec_type":"video"},{"codec_type":"audio"}]}'"#);

    let mut item = WorkItem::new_file(ItemId::new(1), "/tmp/in.mkv".into(), 0);
    item.encoded_file = Some("/tmp/encoded.mkv".into());

    let handler = AudioAnalyzeHandler::new();
    let ctx = StageContext::new(tokio_util::sync::CancellationToken::new());
    let patch = handler.execute(&ctx, &item).await.unwrap();
    let section = patch.append_envelope_section.unwrap();
    assert_eq!(section.metadata["stream_count"], 2);
}
