//! Invisible-loss analysis over production batches
//!
//! Invisible waste is the volume a batch cannot account for: what went in
//! minus what came out minus the waste that was actually recorded.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{check_non_negative, DiagnosticsError, Result};
use crate::models::{Batch, BatchAnalysis};
use crate::round_to;

/// Cost of one liter of unaccounted loss, in plant currency units
pub const UNIT_COST_PER_LITER: f64 = 12.0;

/// Batches losing more than this share of their input are flagged
pub const HIGH_INVISIBLE_WASTE_PERCENT: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WasteTotals {
    pub total_waste: f64,
    pub total_cost: f64,
    pub high_batch_count: usize,
}

/// Mean invisible waste of one machine or shift
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    pub key: String,
    pub avg_waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub batch_id: String,
    pub waste: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WasteReport {
    pub per_batch: Vec<BatchAnalysis>,
    pub totals: WasteTotals,
    pub by_machine: Vec<GroupAverage>,
    pub by_shift: Vec<GroupAverage>,
    pub trend: Vec<TrendPoint>,
}

/// Derive the invisible-loss figures for a single batch
pub fn analyze_batch(batch: &Batch) -> Result<BatchAnalysis> {
    let entity = format!("batch '{}'", batch.batch_id);
    check_non_negative(&entity, "input_liters", batch.input_liters)?;
    check_non_negative(&entity, "output_liters", batch.output_liters)?;
    check_non_negative(&entity, "recorded_waste_liters", batch.recorded_waste_liters)?;

    if batch.input_liters == 0.0 {
        return Err(DiagnosticsError::undefined_ratio(entity, "invisible_waste_percent"));
    }

    let invisible = batch.input_liters - batch.output_liters - batch.recorded_waste_liters;
    let percent = invisible / batch.input_liters * 100.0;
    let high = percent > HIGH_INVISIBLE_WASTE_PERCENT;
    let cost = invisible * UNIT_COST_PER_LITER;

    Ok(BatchAnalysis {
        batch: batch.clone(),
        invisible_waste_liters: invisible,
        invisible_waste_percent: percent,
        high_invisible_waste: high,
        invisible_waste_cost: cost,
    })
}

/// Analyze a sequence of batches.
///
/// Fails on the first invalid batch; nothing is computed for the rest.
pub fn analyze(batches: &[Batch]) -> Result<WasteReport> {
    let per_batch = batches
        .iter()
        .map(analyze_batch)
        .collect::<Result<Vec<_>>>()?;

    let total_waste: f64 = per_batch.iter().map(|b| b.invisible_waste_liters).sum();
    let total_cost: f64 = per_batch.iter().map(|b| b.invisible_waste_cost).sum();
    let high_batch_count = per_batch.iter().filter(|b| b.high_invisible_waste).count();

    for analysis in per_batch.iter().filter(|b| b.high_invisible_waste) {
        warn!(
            "batch {} on {} lost {:.2}% of its input invisibly",
            analysis.batch.batch_id, analysis.batch.machine, analysis.invisible_waste_percent
        );
    }

    let by_machine = group_average(&per_batch, |b| &b.batch.machine);
    let by_shift = group_average(&per_batch, |b| &b.batch.shift);

    let trend = per_batch
        .iter()
        .map(|b| TrendPoint {
            batch_id: b.batch.batch_id.clone(),
            waste: b.invisible_waste_liters,
        })
        .collect();

    debug!(
        "analyzed {} batches ({} machines, {} shifts)",
        per_batch.len(),
        by_machine.len(),
        by_shift.len()
    );

    Ok(WasteReport {
        totals: WasteTotals {
            total_waste: round_to(total_waste, 2),
            total_cost: round_to(total_cost, 2),
            high_batch_count,
        },
        per_batch,
        by_machine,
        by_shift,
        trend,
    })
}

/// Mean invisible waste per key, keys in first-encounter order
fn group_average<F>(rows: &[BatchAnalysis], key: F) -> Vec<GroupAverage>
where
    F: Fn(&BatchAnalysis) -> &String,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();

    for row in rows {
        let k = key(row).as_str();
        let slot = *index.entry(k).or_insert_with(|| {
            groups.push((k, 0.0, 0));
            groups.len() - 1
        });
        groups[slot].1 += row.invisible_waste_liters;
        groups[slot].2 += 1;
    }

    groups
        .into_iter()
        .map(|(k, sum, count)| GroupAverage {
            key: k.to_string(),
            avg_waste: sum / count as f64,
        })
        .collect()
}

impl std::fmt::Display for WasteReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Invisible Waste Report ===")?;
        writeln!(
            f,
            "{:<12} {:<12} {:<8} {:>10} {:>10} {:>10} {:>8}",
            "Batch", "Machine", "Shift", "Input (L)", "Lost (L)", "Cost", "Lost %"
        )?;
        writeln!(f, "{}", "-".repeat(76))?;
        for row in &self.per_batch {
            writeln!(
                f,
                "{:<12} {:<12} {:<8} {:>10.1} {:>10.2} {:>10.2} {:>7.2}%{}",
                row.batch.batch_id,
                row.batch.machine,
                row.batch.shift,
                row.batch.input_liters,
                row.invisible_waste_liters,
                row.invisible_waste_cost,
                row.invisible_waste_percent,
                if row.high_invisible_waste { "  HIGH" } else { "" }
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Totals:")?;
        writeln!(f, "  Invisible waste: {:.2} L", self.totals.total_waste)?;
        writeln!(f, "  Cost:            {:.2}", self.totals.total_cost)?;
        writeln!(f, "  High batches:    {}", self.totals.high_batch_count)?;
        writeln!(f)?;

        writeln!(f, "Average invisible waste by machine:")?;
        for group in &self.by_machine {
            writeln!(f, "  {:<12} {:.2} L", group.key, group.avg_waste)?;
        }
        writeln!(f)?;

        writeln!(f, "Average invisible waste by shift:")?;
        for group in &self.by_shift {
            writeln!(f, "  {:<12} {:.2} L", group.key, group.avg_waste)?;
        }

        Ok(())
    }
}
