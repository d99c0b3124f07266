//! Integration tests for the engine worker.

use query_console::engine::{spawn_worker, EngineReply, EngineRequest, SqliteEngine, Value};

#[tokio::test]
async fn test_requests_from_many_tasks_all_get_answers() {
    let engine = SqliteEngine::new().await.unwrap();
    let (handle, _task) = spawn_worker(Box::new(engine));

    let tasks: Vec<_> = (0..20i64)
        .map(|n| {
            let handle = handle.clone();
            tokio::spawn(async move { handle.exec(format!("SELECT {n} AS n;")).await })
        })
        .collect();

    for (n, task) in tasks.into_iter().enumerate() {
        let results = task.await.unwrap().unwrap();
        assert_eq!(results[0].values[0][0], Value::Int(n as i64));
    }
}

#[tokio::test]
async fn test_open_none_resets_to_empty_database() {
    let engine = SqliteEngine::new().await.unwrap();
    let (handle, _task) = spawn_worker(Box::new(engine));

    handle.exec("CREATE TABLE t (x);").await.unwrap();
    handle.open(None).await.unwrap();

    let results = handle
        .exec("SELECT name FROM sqlite_master WHERE type = 'table';")
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_statements_without_rows_yield_no_results() {
    let engine = SqliteEngine::new().await.unwrap();
    let (handle, _task) = spawn_worker(Box::new(engine));

    let reply = handle
        .request(EngineRequest::Exec {
            sql: "CREATE TABLE t (x); INSERT INTO t VALUES (1); SELECT x FROM t; DELETE FROM t;"
                .to_string(),
        })
        .await
        .unwrap();

    match reply {
        EngineReply::Results(results) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].columns, vec!["x"]);
        }
        other => panic!("Expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn test_worker_stops_on_shutdown() {
    let engine = SqliteEngine::new().await.unwrap();
    let (handle, task) = spawn_worker(Box::new(engine));

    handle.exec("SELECT 1;").await.unwrap();
    handle.shutdown();
    task.await.unwrap();

    let err = handle.export().await.unwrap_err();
    assert_eq!(err.category(), "Worker Error");
}
