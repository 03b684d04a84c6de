//! Commands that talk to the daemon degrade gracefully when no daemon is
//! running: they print a message and exit 0 rather than erroring, since
//! "no work in flight" is a normal state, not a failure.

use crate::prelude::*;

#[test]
fn status_with_no_daemon_running_reports_not_running_and_exits_zero() {
    let project = Project::with_minimal_config();

    project
        .spindle()
        .args(&["status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn status_json_with_no_daemon_running_reports_running_false() {
    let project = Project::with_minimal_config();

    project
        .spindle()
        .args(&["-o", "json", "status"])
        .passes()
        .stdout_has(r#""running":false"#);
}

#[test]
fn stop_with_no_daemon_running_reports_not_running_and_exits_zero() {
    let project = Project::with_minimal_config();

    project
        .spindle()
        .args(&["stop"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn retry_with_no_daemon_running_fails() {
    let project = Project::with_minimal_config();

    project.spindle().args(&["retry", "1"]).fails();
}
