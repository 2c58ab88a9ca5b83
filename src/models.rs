//! Data models for plant batches, machine telemetry and the pipe network

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A production batch as recorded by the plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub machine: String,
    pub shift: String,
    pub input_liters: f64,
    pub output_liters: f64,
    pub recorded_waste_liters: f64,
}

/// A batch together with its derived invisible-loss figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchAnalysis {
    #[serde(flatten)]
    pub batch: Batch,
    pub invisible_waste_liters: f64,
    pub invisible_waste_percent: f64,
    pub high_invisible_waste: bool,
    pub invisible_waste_cost: f64,
}

/// One batch worth of machine telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTelemetry {
    pub input_liters: f64,
    pub output_liters: f64,
    pub waste_liters: f64,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineTelemetry {
    pub name: String,
    pub batches: Vec<BatchTelemetry>,
}

/// Recommended maintenance action for a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Repair,
    None,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Repair => f.pad("REPAIR"),
            Action::None => f.pad("NONE"),
        }
    }
}

/// Mass/energy balance of one machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSummary {
    pub name: String,
    pub total_input: f64,
    pub total_output: f64,
    pub total_waste: f64,
    pub energy_kwh: f64,
    pub waste_ratio: f64, // rounded to 3 decimals
    pub efficiency: f64,  // rounded to 3 decimals
    pub faulty: bool,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MachineAssessment {
    Evaluated(MachineSummary),
    NoData { name: String },
}

impl MachineAssessment {
    pub fn name(&self) -> &str {
        match self {
            MachineAssessment::Evaluated(summary) => &summary.name,
            MachineAssessment::NoData { name } => name,
        }
    }

    pub fn summary(&self) -> Option<&MachineSummary> {
        match self {
            MachineAssessment::Evaluated(summary) => Some(summary),
            MachineAssessment::NoData { .. } => None,
        }
    }
}

/// Identifier of a network node, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Name(String),
    Number(Number),
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Name(name) => f.pad(name),
            NodeId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        NodeId::Name(name.to_string())
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId::Number(id.into())
    }
}

/// A pipe between two network nodes.
///
/// Attributes the diagnostics do not use (drawing hints and the like) are
/// kept in `extra` so a snapshot survives a save unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub from: NodeId,
    pub to: NodeId,
    pub flow: f64,
    pub normal_pressure: f64,
    pub current_pressure: f64,
    #[serde(default)]
    pub leak: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pipe {
    pub fn new<N: Into<NodeId>>(
        from: N,
        to: N,
        flow: f64,
        normal_pressure: f64,
        current_pressure: f64,
    ) -> Self {
        Pipe {
            from: from.into(),
            to: to.into(),
            flow,
            normal_pressure,
            current_pressure,
            leak: false,
            extra: Map::new(),
        }
    }
}

/// The full state of the pipe network, saved and loaded wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<Value>,
    pub pipes: Vec<Pipe>,
}

/// A snapshot as persisted, with its write counter
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub version: i64,
    pub snapshot: NetworkSnapshot,
}
