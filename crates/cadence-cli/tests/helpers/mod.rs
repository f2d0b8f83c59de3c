use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Runs the `cadence` binary against a throwaway database in UTC
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// A command isolated from the user's config file and local timezone
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.env("CADENCE_DATABASE_PATH", &self.db_path)
            .env("CADENCE_CONFIG", self.temp_dir.path().join("missing.toml"))
            .env("CADENCE_TIMEZONE", "UTC")
            .env_remove("CADENCE_DEFAULT_VIEW")
            .env_remove("CADENCE_MAX_ITERATIONS");
        cmd
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs `add` and returns the short ID it reports
    pub fn add(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let output = self.run_success(&full).get_output().stdout.clone();
        let stdout = strip_ansi(&String::from_utf8_lossy(&output));
        let start = stdout.find('[').expect("no ID in add output") + 1;
        let end = stdout[start..].find(']').expect("unterminated ID") + start;
        stdout[start..end].to_string()
    }

    /// Stdout of a successful run with colour codes removed
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run_success(args).get_output().stdout.clone();
        strip_ansi(&String::from_utf8_lossy(&output))
    }
}

pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
