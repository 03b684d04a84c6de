//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing spindle CLI behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself when
/// CARGO_MANIFEST_DIR is stale (e.g. compiled by a removed worktree into a
/// shared target directory).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn spindle_binary() -> PathBuf {
    binary_path("spindle")
}

/// Returns the path to the spindled daemon binary.
pub fn spindled_binary() -> PathBuf {
    binary_path("spindled")
}

/// Create a CLI builder for spindle commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: Vec::new(),
        }
    }

    /// Add CLI arguments.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set working directory.
    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Set environment variable.
    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string_lossy().to_string()));
        self
    }

    /// Build the command without running it.
    pub fn command(self) -> Command {
        let mut cmd = Command::new(spindle_binary());
        cmd.args(&self.args);

        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }

        // Prevent a parent SPINDLE_CONFIG from leaking into tests; each test
        // passes its own --config or sets the env explicitly.
        cmd.env_remove("SPINDLE_CONFIG");

        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    /// Run the command, returning the raw result without asserting on exit
    /// code. Use when a test needs to check a specific exit code rather
    /// than mere pass/fail.
    pub fn run(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        RunAssert { output }
    }

    /// Run and expect success (exit code 0).
    pub fn passes(self) -> RunAssert {
        let result = self.run();
        assert!(
            result.output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            result.output.status.code(),
            result.stdout(),
            result.stderr()
        );
        result
    }

    /// Run and expect failure (non-zero exit code).
    pub fn fails(self) -> RunAssert {
        let result = self.run();
        assert!(
            !result.output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            result.stdout(),
            result.stderr()
        );
        result
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    /// Get stdout as string.
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    /// Get stderr as string.
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Get the process exit code.
    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Assert the exit code equals `expected`.
    pub fn code_eq(self, expected: i32) -> Self {
        assert_eq!(
            self.code(),
            Some(expected),
            "expected exit code {expected}\nstdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    /// Assert stdout contains substring.
    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    /// Assert stderr contains substring.
    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

// =============================================================================
// Project
// =============================================================================

/// A minimal valid config file, enough to pass `SpindleConfig::validate()`.
pub const MINIMAL_CONFIG: &str = r#"
[workflow]
heartbeat_interval_secs = 5
heartbeat_timeout_secs = 20

[paths]
staging_dir = "STAGING_DIR"
log_dir = "LOG_DIR"
library_dir = "LIBRARY_DIR"
"#;

/// Temporary test project: an isolated directory holding a config file and
/// the paths it points to, so a daemon started against it never touches the
/// host filesystem.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    /// Create a project with a minimal valid config file at `spindle.toml`.
    pub fn with_minimal_config() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        let staging = project.dir.path().join("staging");
        let log_dir = project.dir.path().join("logs");
        let library = project.dir.path().join("library");
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::create_dir_all(&log_dir).unwrap();
        std::fs::create_dir_all(&library).unwrap();

        let config = MINIMAL_CONFIG
            .replace("STAGING_DIR", &staging.to_string_lossy())
            .replace("LOG_DIR", &log_dir.to_string_lossy())
            .replace("LIBRARY_DIR", &library.to_string_lossy());
        std::fs::write(project.config_path(), config).unwrap();

        project
    }

    /// Path to the project's config file.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("spindle.toml")
    }

    /// Path to the project's `log_dir`, where the daemon would place its
    /// socket and lock file.
    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    /// Run `spindle` against this project's config file.
    pub fn spindle(&self) -> CliBuilder {
        let config_path = self.config_path();
        let config_path = config_path.to_str().unwrap();
        cli().args(&["--config", config_path])
    }
}
