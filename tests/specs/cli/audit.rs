//! `spindle audit` reads the queue store directly, so it works even with no
//! daemon ever having run against a project (spec.md §6.4 is daemon-only;
//! audit is the one CLI command that bypasses it entirely).

use crate::prelude::*;

#[test]
fn audit_against_a_fresh_project_reports_an_empty_queue() {
    let project = Project::with_minimal_config();

    project
        .spindle()
        .args(&["audit"])
        .passes()
        .stdout_has("envelope gaps: none")
        .stdout_has("failed items: none");
}

#[test]
fn audit_json_against_a_fresh_project_reports_empty_arrays() {
    let project = Project::with_minimal_config();

    project
        .spindle()
        .args(&["-o", "json", "audit"])
        .passes()
        .stdout_has(r#""failed":[]"#)
        .stdout_has(r#""missing_sections":[]"#);
}
