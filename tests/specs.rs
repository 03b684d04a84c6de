//! Behavioral specifications for the spindle CLI.
//!
//! These tests are black-box: they invoke the `spindle` binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli/audit.rs"]
mod cli_audit;
#[path = "specs/cli/config_errors.rs"]
mod cli_config_errors;
#[path = "specs/cli/not_running.rs"]
mod cli_not_running;
#[path = "specs/cli/parsing.rs"]
mod cli_parsing;
