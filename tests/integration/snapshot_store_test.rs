use plant_diagnostics::models::{NetworkSnapshot, NodeId};
use plant_diagnostics::network::BaselinePolicy;
use plant_diagnostics::{db, ingest, Config, DiagnosticsError};
use rusqlite::Connection;
use tempfile::TempDir;

const PAYLOAD: &str = r#"{
  "nodes": [{"id": "R", "x": 10, "y": 20}, {"id": "T"}, {"id": "C"}],
  "pipes": [
    {"from": "R", "to": "T", "flow": 140, "normal_pressure": 100, "current_pressure": 69, "label": "main"},
    {"from": "T", "to": "C", "flow": 50, "normal_pressure": 100, "current_pressure": 70},
    {"from": "T", "to": "C", "flow": 20, "normal_pressure": 80, "current_pressure": 79}
  ]
}"#;

fn open(config: &Config) -> Connection {
    let conn = Connection::open(&config.database).unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn test_absent_store_loads_empty() {
    let dir = TempDir::new().unwrap();
    let conn = open(&Config::new(dir.path()));

    let snapshot = db::load_network(&conn).unwrap();
    assert_eq!(snapshot, NetworkSnapshot::default());
    assert_eq!(
        serde_json::to_value(&snapshot).unwrap(),
        serde_json::json!({"nodes": [], "pipes": []})
    );
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    let mut conn = open(&config);

    let payload = ingest::parse_network(PAYLOAD).unwrap();
    let outcome = db::save_network(&mut conn, payload, config.baseline_policy, None).unwrap();
    assert_eq!(outcome.version, 1);
    assert_eq!(outcome.pipes, 3);
    assert_eq!(outcome.leaks, 1);

    // a fresh connection sees exactly what was saved
    let reopened = open(&config);
    let loaded = db::load_network(&reopened).unwrap();
    let leaks: Vec<_> = loaded.pipes.iter().map(|p| p.leak).collect();
    assert_eq!(leaks, vec![true, false, false]);
    assert_eq!(loaded.pipes[0].extra["label"], "main");
    assert_eq!(loaded.nodes[0]["x"], 10);

    // duplicate (from, to) pipes stay separate entries
    assert_eq!(loaded.pipes[1].flow, 50.0);
    assert_eq!(loaded.pipes[2].flow, 20.0);

    let resaved = db::save_network(&mut conn, loaded.clone(), config.baseline_policy, None).unwrap();
    assert_eq!(resaved.snapshot, loaded);
}

#[test]
fn test_concurrent_writers_detect_conflict() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    let mut first = open(&config);
    let mut second = open(&config);

    let payload = ingest::parse_network(PAYLOAD).unwrap();
    db::save_network(&mut first, payload.clone(), BaselinePolicy::Payload, None).unwrap();

    // both editors loaded version 1
    let seen = db::current_version(&second).unwrap();
    assert_eq!(seen, 1);

    let mut edit = payload.clone();
    edit.pipes[1].current_pressure = 10.0;
    db::save_network(&mut first, edit, BaselinePolicy::Payload, Some(seen)).unwrap();

    let err = db::save_network(&mut second, payload, BaselinePolicy::Payload, Some(seen)).unwrap_err();
    assert!(matches!(
        err,
        DiagnosticsError::WriteConflict {
            expected: 1,
            found: 2
        }
    ));

    let stored = db::load_snapshot(&second).unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert!(stored.snapshot.pipes[1].leak);
}

#[test]
fn test_malformed_document_fails_load_and_save() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    let mut conn = open(&config);
    conn.execute(
        "INSERT INTO network_snapshot (id, version, document) VALUES (1, 1, 'not json')",
        [],
    )
    .unwrap();

    assert!(matches!(
        db::load_network(&conn),
        Err(DiagnosticsError::MalformedSnapshot(_))
    ));

    let payload = ingest::parse_network(PAYLOAD).unwrap();
    assert!(matches!(
        db::save_network(&mut conn, payload, BaselinePolicy::Payload, None),
        Err(DiagnosticsError::MalformedSnapshot(_))
    ));
}

#[test]
fn test_numeric_node_ids_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    let mut conn = open(&config);

    let payload = ingest::parse_network(
        r#"{"nodes":[{"id":1},{"id":2}],"pipes":[{"from":1,"to":2,"flow":5,"normal_pressure":100,"current_pressure":69}]}"#,
    )
    .unwrap();
    let outcome = db::save_network(&mut conn, payload, config.baseline_policy, None).unwrap();
    assert_eq!(outcome.leaks, 1);

    let loaded = db::load_network(&conn).unwrap();
    assert_eq!(loaded.pipes[0].from, NodeId::from(1u64));
    assert_eq!(loaded.pipes[0].to, NodeId::from(2u64));
    assert!(loaded.pipes[0].leak);

    let value = serde_json::to_value(&loaded).unwrap();
    assert_eq!(value["pipes"][0]["from"], 1);
    assert_eq!(value["pipes"][0]["to"], 2);
}
