//! Config-loading failures surface as exit code 2, regardless of subcommand
//! (spec.md §6.5: "Configuration or validation error").

use crate::prelude::*;

#[test]
fn status_against_a_missing_config_file_exits_with_code_2() {
    cli()
        .args(&["--config", "/nonexistent/spindle.toml", "status"])
        .run()
        .code_eq(2)
        .stderr_has("spindle.toml");
}

#[test]
fn start_against_a_missing_config_file_exits_with_code_2() {
    cli()
        .args(&["--config", "/nonexistent/spindle.toml", "start"])
        .run()
        .code_eq(2);
}

#[test]
fn status_against_a_config_with_an_invalid_heartbeat_relationship_exits_with_code_2() {
    let project = Project::with_minimal_config();
    let bad_config = format!(
        "[workflow]\nheartbeat_interval_secs = 10\nheartbeat_timeout_secs = 10\n\n[paths]\nstaging_dir = \"{}\"\nlog_dir = \"{}\"\nlibrary_dir = \"{}\"\n",
        project.config_path().parent().unwrap().join("staging").display(),
        project.log_dir().display(),
        project.config_path().parent().unwrap().join("library").display(),
    );
    std::fs::write(project.config_path(), bad_config).unwrap();

    project.spindle().args(&["status"]).run().code_eq(2);
}

#[test]
fn status_against_unparsable_toml_exits_with_code_2() {
    let project = Project::with_minimal_config();
    std::fs::write(project.config_path(), "this is not toml [[[").unwrap();

    project.spindle().args(&["status"]).run().code_eq(2);
}
