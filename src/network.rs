//! Pressure-drop leak detection over the pipe network
//!
//! Each pipe is judged on its own readings; node topology is never traversed.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{check_non_negative, DiagnosticsError, Result};
use crate::models::{NetworkSnapshot, NodeId, Pipe};

/// A pipe whose pressure falls below this fraction of its baseline is leaking
pub const LEAK_PRESSURE_FRACTION: f64 = 0.7;

/// Where a save takes each pipe's `normal_pressure` from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Trust the baseline carried by the incoming payload
    #[default]
    Payload,
    /// Keep the baseline already stored for the same (from, to) pipe
    Retained,
}

pub fn compute_leak(normal_pressure: f64, current_pressure: f64) -> bool {
    current_pressure < LEAK_PRESSURE_FRACTION * normal_pressure
}

fn pipe_entity(position: usize, pipe: &Pipe) -> String {
    format!("pipe #{} ({} -> {})", position, pipe.from, pipe.to)
}

fn validate(position: usize, pipe: &Pipe) -> Result<()> {
    let entity = pipe_entity(position, pipe);
    if !pipe.flow.is_finite() {
        return Err(DiagnosticsError::invalid(
            entity,
            format!("flow is not a finite number ({})", pipe.flow),
        ));
    }
    check_non_negative(&entity, "normal_pressure", pipe.normal_pressure)?;
    check_non_negative(&entity, "current_pressure", pipe.current_pressure)?;
    Ok(())
}

/// Annotate every pipe of a snapshot with its leak flag.
///
/// Any `leak` value already present in the input is overwritten.
pub fn detect_leaks(mut snapshot: NetworkSnapshot) -> Result<NetworkSnapshot> {
    for (position, pipe) in snapshot.pipes.iter_mut().enumerate() {
        validate(position, pipe)?;
        pipe.leak = compute_leak(pipe.normal_pressure, pipe.current_pressure);
        if pipe.leak {
            warn!(
                "leak suspected on {}: {} below {:.0}% of baseline {}",
                pipe_entity(position, pipe),
                pipe.current_pressure,
                LEAK_PRESSURE_FRACTION * 100.0,
                pipe.normal_pressure
            );
        }
    }

    debug!(
        "checked {} pipes across {} nodes",
        snapshot.pipes.len(),
        snapshot.nodes.len()
    );
    Ok(snapshot)
}

/// Replace incoming baselines with the ones already persisted.
///
/// Pipes are matched on `(from, to)`; when the same pair occurs several times
/// the n-th incoming pipe takes the n-th stored baseline. Pipes without a
/// stored counterpart keep the baseline they arrived with.
pub fn retain_baselines(incoming: &mut NetworkSnapshot, previous: &NetworkSnapshot) {
    let mut stored: HashMap<(NodeId, NodeId), VecDeque<f64>> = HashMap::new();
    for pipe in &previous.pipes {
        stored
            .entry((pipe.from.clone(), pipe.to.clone()))
            .or_default()
            .push_back(pipe.normal_pressure);
    }

    for pipe in &mut incoming.pipes {
        let key = (pipe.from.clone(), pipe.to.clone());
        let baseline = stored.get_mut(&key).and_then(VecDeque::pop_front);
        if let Some(baseline) = baseline {
            pipe.normal_pressure = baseline;
        }
    }
}

pub fn leak_count(snapshot: &NetworkSnapshot) -> usize {
    snapshot.pipes.iter().filter(|p| p.leak).count()
}
