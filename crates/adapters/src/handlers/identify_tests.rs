// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::tmdb::{FakeTmdbAdapter, TmdbLookup};
use spindle_core::id::ItemId;
use spindle_core::item::MediaKind;
use spindle_core::status::Status;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

/// Writes an executable shell script named `name` into a fresh tempdir and
/// prepends that dir to `PATH`, so `Command::new(name)` resolves to it.
/// Caller must hold the process-wide PATH mutation serialized via
/// `#[serial_test::serial]`.
fn stub_binary_on_path(name: &str, script: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    let existing = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{existing}", dir.path().display()));
    dir
}

fn movie_item() -> WorkItem {
    WorkItem::new_disc(ItemId::new(1), "Gladiator".to_string(), "FP1".to_string(), 0)
}

#[tokio::test]
async fn prepare_fails_when_title_and_source_path_are_both_absent() {
    let tmdb = Arc::new(FakeTmdbAdapter::new());
    let handler = IdentifyHandler::new(tmdb, 0);
    let mut item = movie_item();
    item.disc_title = None;
    let err = handler.prepare(&item).await.unwrap_err();
    assert!(err.to_string().contains("disc_title"));
}

#[tokio::test]
#[serial_test::serial]
async fn execute_resolves_media_kind_from_tmdb() {
    let _guard = stub_binary_on_path(
        "makemkvcon",
        "echo 'TINFO:0,2,0,\"Title\"'\necho 'TINFO:1,2,0,\"Title\"'\nexit 0",
    );
    let tmdb = Arc::new(FakeTmdbAdapter::new().with_lookup(
        "Gladiator",
        TmdbLookup {
            media_kind: MediaKind::Movie,
            tmdb_id: Some(98),
            matched_title: Some("Gladiator".to_string()),
        },
    ));
    let handler = IdentifyHandler::new(tmdb, 0);
    let item = movie_item();
    let ctx = StageContext::new(tokio_util::sync::CancellationToken::new());
    let patch = handler.execute(&ctx, &item).await.unwrap();

    assert_eq!(patch.media_kind, Some(MediaKind::Movie));
    assert_eq!(patch.disc_title.as_deref(), Some("Gladiator"));
    let section = patch.append_envelope_section.unwrap();
    assert_eq!(section.stage, Status::Identifying.as_str());
}

#[tokio::test]
async fn disc_dependent_is_true() {
    let handler = IdentifyHandler::new(Arc::new(FakeTmdbAdapter::new()), 0);
    assert!(handler.disc_dependent());
}

#[tokio::test]
#[serial_test::serial]
async fn execute_continues_unknown_when_tmdb_lookup_fails() {
    let _guard = stub_binary_on_path(
        "makemkvcon",
        "echo 'TINFO:0,2,0,\"Title\"'\nexit 0",
    );
    let tmdb = Arc::new(FakeTmdbAdapter::new().fail_identify());
    let handler = IdentifyHandler::new(tmdb, 0);
    let item = movie_item();
    let ctx = StageContext::new(tokio_util::sync::CancellationToken::new());
    let patch = handler.execute(&ctx, &item).await.unwrap();

    assert_eq!(patch.media_kind, Some(MediaKind::Unknown));
    let section = patch.append_envelope_section.unwrap();
    assert_eq!(section.stage, Status::Identifying.as_str());
}
