//! CLI integration tests against a temporary data directory.

mod common;

use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;

use common::{first_json_line, run_cli, run_cli_success, run_cli_with_stdin};

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(&["--help"], dir.path());
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("list"));
}

#[test]
fn test_create_from_file_then_get() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("contato.json");
    fs::write(&input, r#"{"nome": "Ana", "telefone": "123"}"#).unwrap();

    let stdout = run_cli_success(
        &["create", "contatos", "--json", input.to_str().unwrap()],
        dir.path(),
    );
    let created = first_json_line(&stdout);
    let id = created["id"].as_str().unwrap();
    assert!(stdout.contains(&format!("Created contatos/{id}")));

    let stdout = run_cli_success(&["get", "contatos", id], dir.path());
    let fetched: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(fetched, created);

    let on_disk: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("contatos.json")).unwrap())
            .unwrap();
    assert_eq!(on_disk[0]["nome"], "Ana");
}

#[test]
fn test_create_from_stdin_and_update() {
    let dir = TempDir::new().unwrap();

    let output = run_cli_with_stdin(
        &["create", "tarefas", "--json", "-"],
        dir.path(),
        r#"{"titulo": "Estudar Rust"}"#,
    );
    assert!(
        output.status.success(),
        "create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let created = first_json_line(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(created["concluida"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let output = run_cli_with_stdin(
        &["update", "tarefas", &id, "--json", "-"],
        dir.path(),
        r#"{"concluida": true}"#,
    );
    assert!(output.status.success());
    let updated = first_json_line(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["titulo"], "Estudar Rust");
    assert_eq!(updated["concluida"], true);
}

#[test]
fn test_validation_failure_exits_nonzero() {
    let dir = TempDir::new().unwrap();

    let output = run_cli_with_stdin(
        &["create", "contatos", "--json", "-"],
        dir.path(),
        r#"{"nome": "A", "telefone": "1", "email": "not-an-email"}"#,
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("email"), "stderr: {stderr}");

    let output = run_cli(&["list", "contatos"], dir.path());
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_delete() {
    let dir = TempDir::new().unwrap();

    let output = run_cli_with_stdin(
        &["create", "contatos", "--json", "-"],
        dir.path(),
        r#"{"nome": "A", "telefone": "1"}"#,
    );
    let created = first_json_line(&String::from_utf8_lossy(&output.stdout));
    let id = created["id"].as_str().unwrap();

    let stdout = run_cli_success(&["delete", "contatos", id], dir.path());
    assert_eq!(first_json_line(&stdout), created);

    let output = run_cli(&["get", "contatos", id], dir.path());
    assert!(!output.status.success());

    let output = run_cli(&["delete", "contatos", id], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_products_are_not_seeded_outside_serve() {
    let dir = TempDir::new().unwrap();

    let stdout = run_cli_success(&["list", "produtos"], dir.path());
    assert!(stdout.is_empty(), "stdout: {stdout}");
    assert!(dir.path().join("produtos.db").exists());

    let output = run_cli_with_stdin(
        &["create", "produtos", "--json", "-"],
        dir.path(),
        r#"{"nome": "Caneca", "preco": 25}"#,
    );
    assert!(output.status.success());

    let stdout = run_cli_success(&["list", "produtos"], dir.path());
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_backend_override() {
    let dir = TempDir::new().unwrap();

    let output = run_cli_with_stdin(
        &["--backend", "sqlite", "create", "contatos", "--json", "-"],
        dir.path(),
        &json!({"nome": "A", "telefone": "1"}).to_string(),
    );
    assert!(output.status.success());
    assert!(dir.path().join("contatos.db").exists());
    assert!(!dir.path().join("contatos.json").exists());

    let stdout = run_cli_success(&["list", "contatos", "--backend", "sqlite"], dir.path());
    assert_eq!(stdout.lines().count(), 1);
}

#[test]
fn test_corrupt_document_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("noticias.json"), "[{").unwrap();

    let output = run_cli(&["list", "noticias"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("noticias.json"), "stderr: {stderr}");
}
