use std::path::{Path, PathBuf};
use std::sync::Mutex;

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh `TALLY_HOME` directory that outlives the test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// The `tally` binary in script mode, isolated under `home` and pinned to `today`.
pub fn script(home: &Path, today: &str) -> Command {
    let mut cmd = Command::cargo_bin("tally").expect("tally binary");
    cmd.env("TALLY_CLI_SCRIPT", "1")
        .env("TALLY_HOME", home)
        .env("TALLY_TODAY", today)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY");
    cmd
}
