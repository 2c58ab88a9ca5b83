//! Database schema and network snapshot operations

use log::info;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::error::{DiagnosticsError, Result};
use crate::models::{NetworkSnapshot, StoredSnapshot};
use crate::network::{self, BaselinePolicy};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- The pipe network is stored as a single document, replaced on every save
        CREATE TABLE IF NOT EXISTS network_snapshot (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            document TEXT NOT NULL,
            saved_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;
    Ok(())
}

/// Read the stored snapshot, if any.
///
/// A document that does not have the `{nodes, pipes}` shape is an error: saving
/// over it would silently drop whatever it held.
pub fn load_snapshot(conn: &Connection) -> Result<Option<StoredSnapshot>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT version, document FROM network_snapshot WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((version, document)) = row else {
        return Ok(None);
    };

    let snapshot: NetworkSnapshot = serde_json::from_str(&document)
        .map_err(|e| DiagnosticsError::MalformedSnapshot(format!("version {}: {}", version, e)))?;

    Ok(Some(StoredSnapshot { version, snapshot }))
}

/// Load the network, treating a missing snapshot as an empty one
pub fn load_network(conn: &Connection) -> Result<NetworkSnapshot> {
    Ok(load_snapshot(conn)?
        .map(|stored| stored.snapshot)
        .unwrap_or_default())
}

/// Current snapshot version, 0 when nothing has been saved yet
pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn
        .query_row("SELECT version FROM network_snapshot WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn write_snapshot(conn: &Connection, version: i64, snapshot: &NetworkSnapshot) -> Result<()> {
    let document = serde_json::to_string(snapshot)?;
    conn.execute(
        "INSERT OR REPLACE INTO network_snapshot (id, version, document, saved_at)
         VALUES (1, ?1, ?2, datetime('now'))",
        (version, &document),
    )?;
    Ok(())
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub version: i64,
    pub pipes: usize,
    pub leaks: usize,
    pub snapshot: NetworkSnapshot,
}

/// Detect leaks on `payload` and persist it as the new snapshot.
///
/// The whole load-check-write cycle runs under an immediate write transaction,
/// so concurrent savers are serialized. When `expected_version` is given the
/// save is refused unless the stored snapshot still has that version.
pub fn save_network(
    conn: &mut Connection,
    payload: NetworkSnapshot,
    policy: BaselinePolicy,
    expected_version: Option<i64>,
) -> Result<SaveOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let previous = load_snapshot(&tx)?;
    let found = previous.as_ref().map_or(0, |stored| stored.version);
    if let Some(expected) = expected_version {
        if expected != found {
            return Err(DiagnosticsError::WriteConflict { expected, found });
        }
    }

    let mut payload = payload;
    if policy == BaselinePolicy::Retained {
        if let Some(stored) = &previous {
            network::retain_baselines(&mut payload, &stored.snapshot);
        }
    }

    let snapshot = network::detect_leaks(payload)?;
    let version = found + 1;
    write_snapshot(&tx, version, &snapshot)?;
    tx.commit()?;

    let leaks = network::leak_count(&snapshot);
    info!(
        "saved network snapshot v{} ({} pipes, {} leaking)",
        version,
        snapshot.pipes.len(),
        leaks
    );

    Ok(SaveOutcome {
        version,
        pipes: snapshot.pipes.len(),
        leaks,
        snapshot,
    })
}

/// Remove the stored snapshot
pub fn clear_snapshot(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM network_snapshot", [])?;
    Ok(())
}
