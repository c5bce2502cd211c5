//! End-to-end discovery tests using fake tool executables.
//!
//! The PATH- and env-hint scenarios all live in one test function because
//! they mutate process-global environment state; the remaining tests only
//! touch absolute paths and scratch settings files.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use md2doc::detect::{probe, ToolKind, ToolLocator};
use md2doc::error::DiscoveryError;
use md2doc::settings::SettingsStore;

fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn test_discovery_stages_against_environment() {
    let settings_dir = TempDir::new().unwrap();
    let settings = SettingsStore::open(settings_dir.path().join("settings.toml"));

    let tool_dir = TempDir::new().unwrap();
    let tool = fake_tool(tool_dir.path(), "pandoc", "echo 'pandoc 2.19.2'");

    for name in ToolKind::Pandoc.env_var_names() {
        std::env::remove_var(name);
    }
    let original_path = std::env::var_os("PATH");

    // Stage 2: an env hint naming the install directory is joined with the
    // executable name and validated.
    std::env::set_var("PANDOC_HOME", tool_dir.path());
    let locator = ToolLocator::new(ToolKind::Pandoc, &settings);
    let found = locator
        .discover(&CancellationToken::new())
        .await
        .unwrap()
        .expect("env hint resolves");
    assert_eq!(found.path, tool);
    assert_eq!(found.version, "pandoc 2.19.2");
    std::env::remove_var("PANDOC_HOME");

    // Stage 3: no saved path, no env hints, bare name found on the search
    // path and resolved to an absolute location.
    std::env::set_var("PATH", tool_dir.path());
    let found = locator
        .discover(&CancellationToken::new())
        .await
        .unwrap()
        .expect("search path resolves");
    assert_eq!(
        found.path.canonicalize().unwrap(),
        tool.canonicalize().unwrap()
    );
    assert!(found.path.is_absolute());
    assert_eq!(found.version, "pandoc 2.19.2");

    // All stages missing is a normal Ok(None), not an error.
    let empty_dir = TempDir::new().unwrap();
    std::env::set_var("PATH", empty_dir.path());
    for name in ToolKind::WkHtmlToPdf.env_var_names() {
        std::env::remove_var(name);
    }
    let wkhtml = ToolLocator::new(ToolKind::WkHtmlToPdf, &settings);
    let result = wkhtml.discover(&CancellationToken::new()).await.unwrap();
    assert_eq!(result, None);

    match original_path {
        Some(path) => std::env::set_var("PATH", path),
        None => std::env::remove_var("PATH"),
    }
}

#[tokio::test]
async fn test_saved_path_short_circuit_and_persist_round_trip() {
    let settings_dir = TempDir::new().unwrap();
    let settings_file = settings_dir.path().join("settings.toml");
    let settings = SettingsStore::open(&settings_file);

    let tool_dir = TempDir::new().unwrap();
    let tool = fake_tool(tool_dir.path(), "pandoc", "echo 'pandoc 3.1.2'");

    // Manual-override flow: validate a user-chosen path, then persist it
    // as a separate explicit step.
    let found = probe::validate(
        ToolKind::Pandoc,
        tool.to_str().unwrap(),
        &CancellationToken::new(),
    )
    .await
    .expect("picked file validates");
    let locator = ToolLocator::new(ToolKind::Pandoc, &settings);
    locator.persist(&found).unwrap();

    // A fresh store over the same file short-circuits on the saved path.
    let reopened = SettingsStore::open(&settings_file);
    let locator = ToolLocator::new(ToolKind::Pandoc, &reopened);
    let rediscovered = locator
        .discover(&CancellationToken::new())
        .await
        .unwrap()
        .expect("saved path is used");
    assert_eq!(rediscovered.path, tool);
    assert_eq!(rediscovered.version, "pandoc 3.1.2");
}

#[tokio::test]
async fn test_deadline_mid_probe_reports_timeout() {
    let settings_dir = TempDir::new().unwrap();
    let settings = SettingsStore::open(settings_dir.path().join("settings.toml"));

    let tool_dir = TempDir::new().unwrap();
    let slow = fake_tool(tool_dir.path(), "pandoc", "sleep 30; echo 'pandoc 2.19.2'");
    settings
        .set(ToolKind::Pandoc.settings_key(), Some(slow.to_str().unwrap()))
        .unwrap();

    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        deadline.cancel();
    });

    let locator = ToolLocator::new(ToolKind::Pandoc, &settings);
    let start = std::time::Instant::now();
    let result = locator.discover(&cancel).await;
    assert!(matches!(result, Err(DiscoveryError::Cancelled)));
    assert!(
        start.elapsed().as_secs() < 10,
        "cancellation must kill the in-flight probe"
    );
}
