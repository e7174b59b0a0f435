use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, read_to_string, write};
use std::path::Path;
use tempfile::tempdir;

/// Writes a config with one local source holding two documents.
fn local_fixture(dir: &Path) -> std::path::PathBuf {
    let docs = dir.join("docs");
    create_dir_all(docs.join("guides")).unwrap();
    write(docs.join("index.md"), "# Index\n").unwrap();
    write(docs.join("guides/setup.md"), "# Setup\n").unwrap();

    let config = dir.join("repo-config.yaml");
    write(
        &config,
        format!(
            "output_path: {}\ncache_dir: {}\nrepositories:\n  - name: Local Docs\n    location: \"{}\"\n    is_local: true\n  - name: Nowhere\n    location: \"{}\"\n    is_local: true\n",
            dir.join("from-config.md").display(),
            dir.join("cache").display(),
            docs.display(),
            dir.join("missing").display(),
        ),
    )
    .unwrap();
    config
}

#[test]
fn combine_writes_artifact_and_prints_summary() {
    let tmp = tempdir().unwrap();
    let config = local_fixture(tmp.path());
    let output = tmp.path().join("out/combined.md");

    let mut cmd = Command::cargo_bin("md-combiner").expect("Binary exists");
    cmd.arg("combine")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .env_remove("OUTPUT_FILE")
        .env_remove("REPOS_CACHE_DIR")
        .current_dir(tmp.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Successfully combined 2 markdown files",
        ))
        .stdout(predicate::str::contains("AggregationReport {"))
        .stdout(predicate::str::contains("outcome: Completed("))
        .stderr(predicate::str::contains("Nowhere: skipped (entry point invalid)"));

    let combined = read_to_string(&output).unwrap();
    assert_eq!(
        combined,
        "\n\n# Repository: Local Docs\n\n## File: guides/setup.md\n\n# Setup\n\n\n---\n\n## File: index.md\n\n# Index\n"
    );
    assert!(!tmp.path().join("from-config.md").exists());
}

#[test]
fn output_file_env_overrides_config() {
    let tmp = tempdir().unwrap();
    let config = local_fixture(tmp.path());
    let output = tmp.path().join("env-output.md");

    let mut cmd = Command::cargo_bin("md-combiner").expect("Binary exists");
    cmd.arg("combine")
        .arg("--config")
        .arg(&config)
        .env("OUTPUT_FILE", &output)
        .current_dir(tmp.path());

    cmd.assert().success();
    assert!(read_to_string(&output)
        .unwrap()
        .contains("# Repository: Local Docs"));
}

#[test]
fn combine_with_nothing_to_do_reports_zero_documents() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("repo-config.yaml");
    write(&config, "repositories: []\n").unwrap();

    let mut cmd = Command::cargo_bin("md-combiner").expect("Binary exists");
    cmd.arg("combine")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(tmp.path().join("empty.md"))
        .current_dir(tmp.path());

    cmd.assert().success().stdout(predicate::str::contains(
        "No markdown files were processed from any repository",
    ));
    assert_eq!(read_to_string(tmp.path().join("empty.md")).unwrap(), "");
}

#[test]
fn list_prints_sources_without_writing_output() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("repo-config.yaml");
    write(
        &config,
        "output_path: never-written.md\ncache_dir: repos\nrepositories:\n  - name: Memex Prime\n    location: https://example.invalid/memex.git\n    entry_point: Projects\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("md-combiner").expect("Binary exists");
    cmd.arg("list")
        .arg("--config")
        .arg(&config)
        .env_remove("OUTPUT_FILE")
        .env_remove("REPOS_CACHE_DIR")
        .current_dir(tmp.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1. Memex Prime [remote]"))
        .stdout(predicate::str::contains("entry point: Projects"))
        .stdout(predicate::str::contains("memex-prime"));
    assert!(!tmp.path().join("never-written.md").exists());
}

#[test]
fn missing_config_fails() {
    let tmp = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("md-combiner").expect("Binary exists");
    cmd.arg("combine")
        .arg("--config")
        .arg(tmp.path().join("absent.yaml"))
        .current_dir(tmp.path());
    cmd.assert().failure();
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let msg = format!("{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use md_combiner::cli::{run, Cli, Commands};

    let cli = Cli {
        verbose: 0,
        command: Commands::List {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
