// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process management for `spindled`: locating the binary, spawning it in
//! the background, and polling for a clean exit on stop.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

/// Locates the `spindled` binary: a sibling of the running `spindle`
/// executable first (the common install layout), falling back to `PATH`.
pub fn find_spindled_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("spindled");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("spindled")
}

/// Spawns `spindled` detached from the CLI's own stdio, passing `config_path`
/// as its one positional argument.
pub fn start_daemon_background(config_path: &std::path::Path) -> std::io::Result<std::process::Child> {
    Command::new(find_spindled_binary())
        .arg(config_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
}

/// Reads the PID `spindled` wrote into its lock file at startup.
pub fn read_daemon_pid(lock_path: &std::path::Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
