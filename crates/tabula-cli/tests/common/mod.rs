#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// A `tabula` command isolated to the given data directory.
pub fn tabula(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tabula"));
    cmd.env("TABULA_DATA_DIR", data_dir);
    cmd.env("NO_COLOR", "1");
    for var in ["TABULA_BACKEND", "TABULA_BIND", "TABULA_MODE", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Run the CLI binary with arguments.
pub fn run_cli(args: &[&str], data_dir: &Path) -> Output {
    tabula(data_dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI feeding `input` on stdin.
pub fn run_cli_with_stdin(args: &[&str], data_dir: &Path, input: &str) -> Output {
    let mut child = tabula(data_dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for CLI")
}

/// Parse the first stdout line as JSON.
pub fn first_json_line(stdout: &str) -> serde_json::Value {
    let line = stdout.lines().next().expect("no output");
    serde_json::from_str(line).expect("first line is not JSON")
}
