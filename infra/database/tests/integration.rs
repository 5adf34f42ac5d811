use rollcall_database::*;

const SCRIPT: &str = "DEFINE TABLE note SCHEMAFULL;
DEFINE FIELD body ON note TYPE string;
DEFINE INDEX note_body ON note FIELDS body UNIQUE;";

#[derive(Debug, SurrealValue)]
struct Note {
    body: String,
}

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    db.health().await.expect("health check");
    assert_eq!(db.namespace(), "test_ns");
    assert_eq!(db.database(), "test_db");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn migrations_define_schema_and_unique_index_is_detected() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .migration(Migration::new("notes", "0001", SCRIPT))
        .init()
        .await
        .expect("init with migration");

    db.query("CREATE note SET body = $body")
        .bind(("body", "hello".to_owned()))
        .await
        .expect("first insert")
        .check()
        .expect("first insert accepted");

    let duplicate = db
        .query("CREATE note SET body = $body")
        .bind(("body", "hello".to_owned()))
        .await
        .context("second insert")
        .and_then(|response| response.check().map_err(|e| surrealdb_error(e.into())));
    let err = duplicate.expect_err("unique index must reject the duplicate");
    assert!(err.is_unique_violation(), "unexpected error: {err}");

    let notes = db
        .query("SELECT body FROM note")
        .await
        .expect("select")
        .take::<Vec<Note>>(0)
        .expect("decode");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].body, "hello");

    let applied = db
        .query("SELECT VALUE version FROM migration WHERE slice = 'notes'")
        .await
        .expect("select migrations")
        .take::<Vec<String>>(0)
        .expect("decode migrations");
    assert_eq!(applied, vec!["0001".to_owned()]);
}

#[tokio::test]
async fn retry_conflicts_returns_other_errors_without_retrying() {
    let db = Database::builder().url("mem://").session("test_ns", "test_db").init().await.unwrap();
    let calls = std::sync::atomic::AtomicU32::new(0);

    let result: Result<(), DatabaseError> = db
        .retry_conflicts(|| async {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(DatabaseError::Validation { message: "bad input".into(), context: None })
        })
        .await;

    assert!(matches!(result, Err(DatabaseError::Validation { .. })));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_unique_writes_end_as_one_insert_and_index_violations() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .migration(Migration::new("notes", "0001", SCRIPT))
        .init()
        .await
        .unwrap();

    let writers = (0..8).map(|_| {
        let db = db.clone();
        tokio::spawn(async move {
            let handle = &db;
            handle
                .retry_conflicts(move || async move {
                    handle
                        .query("CREATE note SET body = $body RETURN NONE")
                        .bind(("body", "race".to_owned()))
                        .await
                        .context("insert")?
                        .check()
                        .map_err(|e| surrealdb_error(e.into()))
                        .map(|_| ())
                })
                .await
        })
    });

    let mut inserted = 0;
    for writer in writers.collect::<Vec<_>>() {
        match writer.await.unwrap() {
            Ok(()) => inserted += 1,
            Err(err) => assert!(err.is_unique_violation(), "unexpected error: {err}"),
        }
    }
    assert_eq!(inserted, 1);
}

fn surrealdb_error(source: surrealdb::Error) -> DatabaseError {
    DatabaseError::from(source)
}
