//! Machine health evaluation from batch telemetry

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{check_non_negative, DiagnosticsError, Result};
use crate::models::{Action, BatchTelemetry, MachineAssessment, MachineSummary, MachineTelemetry};
use crate::round_to;

/// A machine losing more than this fraction of its input is faulty
pub const WASTE_RATIO_LIMIT: f64 = 0.08;

/// A machine converting less than this fraction of input + energy into output is faulty
pub const EFFICIENCY_FLOOR: f64 = 0.85;

/// Fault rule. Both comparisons are strict: values exactly at a limit pass.
pub fn is_faulty(waste_ratio: f64, efficiency: f64) -> bool {
    waste_ratio > WASTE_RATIO_LIMIT || efficiency < EFFICIENCY_FLOOR
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    input: f64,
    output: f64,
    waste: f64,
    energy: f64,
}

impl Totals {
    fn add(&mut self, batch: &BatchTelemetry) {
        self.input += batch.input_liters;
        self.output += batch.output_liters;
        self.waste += batch.waste_liters;
        self.energy += batch.energy_kwh;
    }
}

fn validate(name: &str, position: usize, batch: &BatchTelemetry) -> Result<()> {
    let entity = format!("machine '{}' batch #{}", name, position);
    check_non_negative(&entity, "input_liters", batch.input_liters)?;
    check_non_negative(&entity, "output_liters", batch.output_liters)?;
    check_non_negative(&entity, "waste_liters", batch.waste_liters)?;
    check_non_negative(&entity, "energy_kwh", batch.energy_kwh)?;
    Ok(())
}

/// Summarize one machine from its summed telemetry
pub fn summarize(
    name: &str,
    total_input: f64,
    total_output: f64,
    total_waste: f64,
    total_energy: f64,
) -> Result<MachineSummary> {
    let entity = format!("machine '{}'", name);
    check_non_negative(&entity, "total_input", total_input)?;
    check_non_negative(&entity, "total_output", total_output)?;
    check_non_negative(&entity, "total_waste", total_waste)?;
    check_non_negative(&entity, "energy_kwh", total_energy)?;

    if total_input == 0.0 {
        return Err(DiagnosticsError::undefined_ratio(entity, "waste_ratio"));
    }

    let waste_ratio = total_waste / total_input;
    let efficiency = total_output / (total_input + total_energy);
    let faulty = is_faulty(waste_ratio, efficiency);

    Ok(MachineSummary {
        name: name.to_string(),
        total_input,
        total_output,
        total_waste,
        energy_kwh: total_energy,
        waste_ratio: round_to(waste_ratio, 3),
        efficiency: round_to(efficiency, 3),
        faulty,
        action: if faulty { Action::Repair } else { Action::None },
    })
}

/// Evaluate every machine.
///
/// Entries sharing a name are merged; results follow the order in which each
/// machine first appears. A machine without any batches is reported as
/// `NoData` rather than evaluated.
pub fn evaluate(machines: &[MachineTelemetry]) -> Result<Vec<MachineAssessment>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut grouped: Vec<(&str, Totals, usize)> = Vec::new();

    for machine in machines {
        let slot = *index.entry(machine.name.as_str()).or_insert_with(|| {
            grouped.push((machine.name.as_str(), Totals::default(), 0));
            grouped.len() - 1
        });

        let entry = &mut grouped[slot];
        for batch in &machine.batches {
            validate(&machine.name, entry.2, batch)?;
            entry.1.add(batch);
            entry.2 += 1;
        }
    }

    let mut results = Vec::with_capacity(grouped.len());
    for (name, totals, batch_count) in grouped {
        if batch_count == 0 {
            debug!("machine {} has no batches", name);
            results.push(MachineAssessment::NoData {
                name: name.to_string(),
            });
            continue;
        }

        let summary = summarize(name, totals.input, totals.output, totals.waste, totals.energy)?;
        if summary.faulty {
            warn!(
                "machine {} flagged for repair (waste ratio {:.3}, efficiency {:.3})",
                name, summary.waste_ratio, summary.efficiency
            );
        }
        results.push(MachineAssessment::Evaluated(summary));
    }

    Ok(results)
}

/// Wrapper for printing a machine report
pub struct MachineReport<'a>(pub &'a [MachineAssessment]);

impl std::fmt::Display for MachineReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Machine Health ===")?;
        writeln!(
            f,
            "{:<16} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8} {:>8}",
            "Machine", "Input (L)", "Output (L)", "Waste (L)", "Energy", "Ratio", "Eff.", "Action"
        )?;
        writeln!(f, "{}", "-".repeat(86))?;

        for assessment in self.0 {
            match assessment {
                MachineAssessment::Evaluated(m) => writeln!(
                    f,
                    "{:<16} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>8.3} {:>8.3} {:>8}",
                    m.name,
                    m.total_input,
                    m.total_output,
                    m.total_waste,
                    m.energy_kwh,
                    m.waste_ratio,
                    m.efficiency,
                    m.action
                )?,
                MachineAssessment::NoData { name } => writeln!(f, "{:<16} (no batch data)", name)?,
            }
        }

        let faulty = self
            .0
            .iter()
            .filter_map(MachineAssessment::summary)
            .filter(|m| m.faulty)
            .count();
        writeln!(f)?;
        writeln!(f, "Machines needing repair: {}", faulty)?;

        Ok(())
    }
}
