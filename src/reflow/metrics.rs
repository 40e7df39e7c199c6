//! Delay and utilization metrics over a finished reflow.

use std::collections::BTreeMap;

use crate::models::{ReflowMetrics, WorkCenterDoc, WorkOrderChange, WorkOrderDoc};

/// Builds the aggregate metrics for a successful reflow.
///
/// Total delay sums positive delays only: a change that finishes earlier
/// still counts as affected but does not reduce the total. Utilization is
/// working minutes booked on a center over its weekly shift minutes, as a
/// percentage with two decimals; a center with no shift minutes reports 0.
pub fn build_metrics(
    changes: &[WorkOrderChange],
    work_orders: &[WorkOrderDoc],
    work_centers: &[WorkCenterDoc],
) -> ReflowMetrics {
    let total_delay_minutes = changes.iter().map(|c| c.delay_minutes.max(0)).sum();

    let mut utilization = BTreeMap::new();
    for wc in work_centers {
        let weekly_minutes: i64 = wc
            .data
            .shifts
            .iter()
            .filter(|s| s.end_hour > s.start_hour)
            .map(|s| i64::from(s.end_hour - s.start_hour) * 60)
            .sum();
        let booked_minutes: i64 = work_orders
            .iter()
            .filter(|wo| wo.data.work_center_id == wc.doc_id)
            .map(|wo| wo.data.duration_minutes)
            .sum();
        let percent = if weekly_minutes > 0 {
            round2(100.0 * booked_minutes as f64 / weekly_minutes as f64)
        } else {
            0.0
        };
        utilization.insert(wc.doc_id.clone(), percent);
    }

    ReflowMetrics {
        total_delay_minutes,
        work_orders_affected: changes.len(),
        work_center_utilization: utilization,
    }
}

/// Human-readable one-line summary of what the reflow did.
pub fn build_explanation(changes: &[WorkOrderChange], metrics: &ReflowMetrics) -> String {
    if changes.is_empty() {
        return "No changes needed".to_string();
    }
    let average = metrics.total_delay_minutes as f64 / changes.len() as f64;
    format!(
        "Rescheduled {} work order(s). Total delay {} minutes. Average delay {:.1} minutes.",
        changes.len(),
        metrics.total_delay_minutes,
        average
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
