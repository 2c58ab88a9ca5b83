//! Raw input parsing for batch records, machine telemetry and network payloads
//!
//! Parse failures are reported as `InvalidRecord` errors naming the row or
//! machine they came from, so an operator can find the bad entry.

use std::fs;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DiagnosticsError, Result};
use crate::models::{Batch, BatchTelemetry, MachineTelemetry, NetworkSnapshot};

/// Parse batch records from CSV with a header row
pub fn parse_batches<R: Read>(reader: R) -> Result<Vec<Batch>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut batches = Vec::new();

    for (index, result) in reader.deserialize::<Batch>().enumerate() {
        let batch = result.map_err(|e| {
            // the header occupies line 1
            let line = e.position().map_or(index as u64 + 2, |p| p.line());
            DiagnosticsError::invalid(format!("CSV row {}", line), csv_reason(&e))
        })?;
        batches.push(batch);
    }

    debug!("parsed {} batch records", batches.len());
    Ok(batches)
}

fn csv_reason(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(field) => format!("field {}: {}", field + 1, err.kind()),
            None => err.kind().to_string(),
        },
        _ => err.to_string(),
    }
}

pub fn read_batches(path: &Path) -> Result<Vec<Batch>> {
    let file = fs::File::open(path)?;
    parse_batches(file)
}

#[derive(Deserialize)]
struct MachineDocument {
    machines: Map<String, Value>,
}

#[derive(Deserialize)]
struct MachineEntry {
    batches: Vec<BatchTelemetry>,
}

/// Parse the machine telemetry document.
///
/// Machines come back in document order.
pub fn parse_machines(json: &str) -> Result<Vec<MachineTelemetry>> {
    let document: MachineDocument = serde_json::from_str(json)
        .map_err(|e| DiagnosticsError::invalid("machine telemetry document", e.to_string()))?;

    let mut machines = Vec::with_capacity(document.machines.len());
    for (name, value) in document.machines {
        let entry: MachineEntry = serde_json::from_value(value)
            .map_err(|e| DiagnosticsError::invalid(format!("machine '{}'", name), e.to_string()))?;
        machines.push(MachineTelemetry {
            name,
            batches: entry.batches,
        });
    }

    debug!("parsed telemetry for {} machines", machines.len());
    Ok(machines)
}

pub fn read_machines(path: &Path) -> Result<Vec<MachineTelemetry>> {
    let json = fs::read_to_string(path)?;
    parse_machines(&json)
}

/// Parse a network payload submitted for saving
pub fn parse_network(json: &str) -> Result<NetworkSnapshot> {
    serde_json::from_str(json).map_err(|e| DiagnosticsError::invalid("network payload", e.to_string()))
}

pub fn read_network(path: &Path) -> Result<NetworkSnapshot> {
    let json = fs::read_to_string(path)?;
    parse_network(&json)
}
