//! Argument parsing failures are rejected by clap before any config file is
//! ever touched, so these need no `Project` fixture.

use crate::prelude::*;

#[test]
fn an_unknown_subcommand_is_rejected() {
    cli().args(&["bogus"]).fails();
}

#[test]
fn retry_with_a_non_numeric_id_is_rejected() {
    cli().args(&["retry", "not-a-number"]).fails();
}

#[test]
fn add_with_no_subcommand_is_rejected() {
    cli().args(&["add"]).fails();
}

#[test]
fn help_exits_successfully() {
    cli().args(&["--help"]).passes().stdout_has("spindle");
}

#[test]
fn version_exits_successfully() {
    cli().args(&["--version"]).passes();
}
