//! Integration tests for the console controller.

use pretty_assertions::assert_eq;
use query_console::console::{
    Confirmation, Console, ConsoleSettings, Output, RenderedTable, DEFAULT_QUERY,
};
use query_console::engine::{spawn_worker, SqliteEngine};
use query_console::persistence::StateStore;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

async fn create_console(
    threshold: usize,
    export_path: PathBuf,
    store: Option<StateStore>,
) -> Console {
    let engine = SqliteEngine::new().await.unwrap();
    let (handle, _task) = spawn_worker(Box::new(engine));
    Console::new(
        handle,
        store,
        ConsoleSettings {
            threshold,
            export_path,
        },
    )
    .await
}

fn tables(console: &Console) -> &[RenderedTable] {
    match console.output() {
        Output::Tables(tables) => tables,
        other => panic!("Expected tables, got {other:?}"),
    }
}

fn first_column(table: &RenderedTable) -> Vec<&str> {
    table.body.iter().map(|row| row[0].text.as_str()).collect()
}

/// Builds a database file with the given tables via a console save.
async fn build_database(dir: &Path, name: &str, tables: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut console = create_console(100, path.clone(), None).await;
    for table in tables {
        let pending = console.execute(&format!("CREATE TABLE {table} (id INTEGER);"));
        console.run(pending).await;
    }
    let pending = console.save();
    console.run(pending).await;
    assert!(console.error().is_none(), "{:?}", console.error());
    path
}

#[tokio::test]
async fn test_schema_query_lists_tables_of_loaded_file() {
    let dir = tempdir().unwrap();
    let first = build_database(dir.path(), "first.db", &["customers", "orders"]).await;
    let second = build_database(dir.path(), "second.db", &["tracks"]).await;

    let mut console = create_console(100, dir.path().join("out.db"), None).await;
    assert_eq!(console.query(), DEFAULT_QUERY);

    let pending = console.load_file(&first).await.unwrap();
    console.run(pending).await;
    assert_eq!(first_column(&tables(&console)[0]), vec!["customers", "orders"]);

    let pending = console.load_file(&second).await.unwrap();
    console.run(pending).await;
    assert_eq!(console.database_label(), Some("second.db"));
    assert_eq!(first_column(&tables(&console)[0]), vec!["tracks"]);
}

#[tokio::test]
async fn test_threshold_scenario() {
    let dir = tempdir().unwrap();
    let mut console = create_console(5000, dir.path().join("sql.db"), None).await;

    let series = "WITH RECURSIVE s(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM s WHERE n < 12000) \
                  SELECT n, n * 2 AS double FROM s";

    let pending = console.execute(series);
    console.run(pending).await;
    assert_eq!(
        console.output(),
        &Output::AwaitingConfirmation {
            row_count: 12_000,
            threshold: 5000
        }
    );

    assert!(console.confirm(Confirmation::ShowPartial));
    let table = &tables(&console)[0];
    assert_eq!(table.shown_rows(), 5000);
    assert_eq!(table.header, vec!["n", "double"]);
    assert_eq!(table.body[4999][1].text, "10000");

    let pending = console.execute(series);
    console.run(pending).await;
    assert!(console.confirm(Confirmation::ShowAll));
    assert_eq!(tables(&console)[0].shown_rows(), 12_000);
}

#[tokio::test]
async fn test_engine_error_never_renders_table() {
    let dir = tempdir().unwrap();
    let mut console = create_console(100, dir.path().join("sql.db"), None).await;

    let pending = console.execute("SELECT 1;");
    console.run(pending).await;
    assert_eq!(tables(&console).len(), 1);

    let pending = console.execute("INSERT INTO missing VALUES (1);");
    console.run(pending).await;
    assert_eq!(console.error(), Some("no such table: missing"));
    assert_eq!(console.output(), &Output::Empty);
}

#[tokio::test]
async fn test_last_query_survives_restart() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.db");

    let store = StateStore::open(&state_path).await.unwrap();
    let mut console = create_console(100, dir.path().join("sql.db"), Some(store.clone())).await;
    assert_eq!(console.query(), DEFAULT_QUERY);
    console.set_query("SELECT 'remembered'").await;
    console.set_query("").await;
    store.close().await;

    let store = StateStore::open(&state_path).await.unwrap();
    let console = create_console(100, dir.path().join("sql.db"), Some(store.clone())).await;
    assert_eq!(console.query(), "SELECT 'remembered'");
    store.close().await;
}

#[tokio::test]
async fn test_loaded_file_runs_remembered_query() {
    let dir = tempdir().unwrap();
    let db = build_database(dir.path(), "music.db", &["albums", "artists"]).await;

    let store = StateStore::open(&dir.path().join("state.db")).await.unwrap();
    let mut console = create_console(100, dir.path().join("sql.db"), Some(store.clone())).await;
    console
        .set_query("SELECT count(*) AS tables FROM sqlite_master WHERE type = 'table'")
        .await;

    let pending = console.load_file(&db).await.unwrap();
    console.run(pending).await;

    let table = &tables(&console)[0];
    assert_eq!(table.header, vec!["tables"]);
    assert_eq!(table.body[0][0].text, "2");
    store.close().await;
}

#[tokio::test]
async fn test_saved_file_round_trips_data() {
    let dir = tempdir().unwrap();
    let export = dir.path().join("nested").join("sql.db");

    let mut source = create_console(100, export.clone(), None).await;
    let pending = source.execute(
        "CREATE TABLE notes (id INTEGER, body TEXT, score REAL, raw BLOB);
         INSERT INTO notes VALUES (1, 'first', 1.5, x'0102'), (2, NULL, NULL, NULL);",
    );
    source.run(pending).await;
    let pending = source.save();
    source.run(pending).await;

    let mut target = create_console(100, dir.path().join("unused.db"), None).await;
    let pending = target.load_file(&export).await.unwrap();
    target.run(pending).await;
    let pending = target.execute("SELECT * FROM notes ORDER BY id;");
    target.run(pending).await;

    let table = &tables(&target)[0];
    let texts: Vec<Vec<&str>> = table
        .body
        .iter()
        .map(|row| row.iter().map(|cell| cell.text.as_str()).collect())
        .collect();
    assert_eq!(
        texts,
        vec![
            vec!["1", "first", "1.5", "<2 bytes>"],
            vec!["2", "NULL", "NULL", "NULL"],
        ]
    );
    assert!(table.body[1][1].null);
}
