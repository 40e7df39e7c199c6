//! Post-scheduling constraint validation.
//!
//! Proves a schedule valid by checking every hard constraint on the final
//! work order set: dependency ordering, work-center exclusivity, shift
//! containment of start instants, and maintenance-window avoidance, plus a
//! defensive cycle re-check. Nothing short-circuits: all violations are
//! collected so a failing call reports every problem at once.

use rustc_hash::FxHashMap;

use crate::calendar::{overlaps, overlaps_maintenance, ShiftCalendar};
use crate::graph::{DependencyGraph, GraphError};
use crate::models::{WorkCenterDoc, WorkOrderDoc};

/// Categories of constraint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    CircularDependency,
    DependencyViolation,
    WorkCenterConflict,
    ShiftViolation,
    MaintenanceConflict,
}

impl ViolationKind {
    /// Wire type tag for this violation category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
            Self::DependencyViolation => "DEPENDENCY_VIOLATION",
            Self::WorkCenterConflict => "WORK_CENTER_CONFLICT",
            Self::ShiftViolation => "SHIFT_VIOLATION",
            Self::MaintenanceConflict => "MAINTENANCE_CONFLICT",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken constraint, with the work orders involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    pub message: String,
    pub work_order_ids: Vec<String>,
}

impl ConstraintViolation {
    fn new(kind: ViolationKind, message: impl Into<String>, work_order_ids: Vec<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            work_order_ids,
        }
    }
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Checks every hard constraint over a work order set.
///
/// Returns all violations found; an empty vector means the schedule is
/// valid. Only the start instant is checked against shift windows; the
/// duration-inside-shift property is established structurally by the
/// shift-aware end computation.
pub fn validate_schedule(
    work_orders: &[WorkOrderDoc],
    work_centers: &[WorkCenterDoc],
) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    check_cycles(work_orders, &mut violations);
    check_dependency_order(work_orders, &mut violations);
    check_center_conflicts(work_orders, &mut violations);
    check_shifts_and_maintenance(work_orders, work_centers, &mut violations);

    violations
}

fn check_cycles(work_orders: &[WorkOrderDoc], violations: &mut Vec<ConstraintViolation>) {
    match DependencyGraph::build(work_orders) {
        Ok(graph) => {
            if let Some(path) = graph.detect_cycle() {
                violations.push(ConstraintViolation::new(
                    ViolationKind::CircularDependency,
                    format!("Circular dependency: {}", path.join(" -> ")),
                    path,
                ));
            }
        }
        Err(GraphError::DanglingDependency {
            work_order_id,
            missing_id,
        }) => {
            violations.push(ConstraintViolation::new(
                ViolationKind::DependencyViolation,
                format!(
                    "Work order {} depends on unknown work order {}",
                    work_order_id, missing_id
                ),
                vec![work_order_id, missing_id],
            ));
        }
        Err(GraphError::CircularDependency { path }) => {
            violations.push(ConstraintViolation::new(
                ViolationKind::CircularDependency,
                format!("Circular dependency: {}", path.join(" -> ")),
                path,
            ));
        }
    }
}

fn check_dependency_order(work_orders: &[WorkOrderDoc], violations: &mut Vec<ConstraintViolation>) {
    let by_id: FxHashMap<&str, &WorkOrderDoc> = work_orders
        .iter()
        .map(|wo| (wo.doc_id.as_str(), wo))
        .collect();

    for child in work_orders {
        for dep_id in &child.data.depends_on_work_order_ids {
            let Some(parent) = by_id.get(dep_id.as_str()) else {
                continue; // reported by the cycle/dangling check
            };
            // Finishing exactly when the child starts is legal
            if parent.data.end_date > child.data.start_date {
                violations.push(ConstraintViolation::new(
                    ViolationKind::DependencyViolation,
                    format!(
                        "Work order {} starts at {} before its dependency {} ends at {}",
                        child.doc_id, child.data.start_date, parent.doc_id, parent.data.end_date
                    ),
                    vec![child.doc_id.clone(), parent.doc_id.clone()],
                ));
            }
        }
    }
}

fn check_center_conflicts(work_orders: &[WorkOrderDoc], violations: &mut Vec<ConstraintViolation>) {
    // Group by work center in first-appearance order so reporting stays
    // deterministic, then sort each group by start and scan forward.
    let mut group_of: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, wo) in work_orders.iter().enumerate() {
        let group = *group_of
            .entry(wo.data.work_center_id.as_str())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[group].push(i);
    }

    for group in &mut groups {
        group.sort_by_key(|&i| work_orders[i].data.start_date);
        for (pos, &i) in group.iter().enumerate() {
            let a = &work_orders[i].data;
            for &j in &group[pos + 1..] {
                let b = &work_orders[j].data;
                // Sorted by start: once b starts at or after a ends, no
                // later entry can overlap a either.
                if b.start_date >= a.end_date {
                    break;
                }
                if overlaps(a.start_date, a.end_date, b.start_date, b.end_date) {
                    violations.push(ConstraintViolation::new(
                        ViolationKind::WorkCenterConflict,
                        format!(
                            "Work orders {} and {} overlap on work center {}",
                            work_orders[i].doc_id, work_orders[j].doc_id, a.work_center_id
                        ),
                        vec![work_orders[i].doc_id.clone(), work_orders[j].doc_id.clone()],
                    ));
                }
            }
        }
    }
}

fn check_shifts_and_maintenance(
    work_orders: &[WorkOrderDoc],
    work_centers: &[WorkCenterDoc],
    violations: &mut Vec<ConstraintViolation>,
) {
    let centers: FxHashMap<&str, &WorkCenterDoc> = work_centers
        .iter()
        .map(|wc| (wc.doc_id.as_str(), wc))
        .collect();
    let calendars: FxHashMap<&str, ShiftCalendar> = work_centers
        .iter()
        .map(|wc| (wc.doc_id.as_str(), ShiftCalendar::new(&wc.data.shifts)))
        .collect();

    for wo in work_orders {
        let wc_id = wo.data.work_center_id.as_str();
        let Some(center) = centers.get(wc_id) else {
            violations.push(ConstraintViolation::new(
                ViolationKind::ShiftViolation,
                format!(
                    "Work order {} references unknown work center {}",
                    wo.doc_id, wc_id
                ),
                vec![wo.doc_id.clone()],
            ));
            continue;
        };

        let calendar = &calendars[wc_id];
        if !calendar.has_shifts() {
            violations.push(ConstraintViolation::new(
                ViolationKind::ShiftViolation,
                format!(
                    "Work center {} has no shifts but work order {} is scheduled on it",
                    wc_id, wo.doc_id
                ),
                vec![wo.doc_id.clone()],
            ));
        } else if !calendar.within_shift(wo.data.start_date) {
            violations.push(ConstraintViolation::new(
                ViolationKind::ShiftViolation,
                format!(
                    "Work order {} starts at {} outside the shifts of work center {}",
                    wo.doc_id, wo.data.start_date, wc_id
                ),
                vec![wo.doc_id.clone()],
            ));
        }

        if overlaps_maintenance(
            wo.data.start_date,
            wo.data.end_date,
            &center.data.maintenance_windows,
        ) {
            violations.push(ConstraintViolation::new(
                ViolationKind::MaintenanceConflict,
                format!(
                    "Work order {} overlaps a maintenance window on work center {}",
                    wo.doc_id, wc_id
                ),
                vec![wo.doc_id.clone()],
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MaintenanceWindow, Shift, WorkCenter, WorkOrder};
    use chrono::{DateTime, TimeZone, Utc};

    fn dt(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, minute, 0).unwrap()
    }

    fn center(doc_id: &str) -> WorkCenterDoc {
        WorkCenterDoc::new(
            doc_id,
            WorkCenter {
                name: doc_id.to_uppercase(),
                shifts: (1..=5).map(|d| Shift::new(d, 8, 17)).collect(),
                maintenance_windows: vec![],
            },
        )
    }

    fn wo(
        doc_id: &str,
        wc: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        deps: &[&str],
    ) -> WorkOrderDoc {
        WorkOrderDoc::new(
            doc_id,
            WorkOrder {
                work_order_number: doc_id.to_uppercase(),
                manufacturing_order_id: "mo-1".to_string(),
                work_center_id: wc.to_string(),
                start_date: start,
                end_date: end,
                duration_minutes: (end - start).num_minutes(),
                is_maintenance: false,
                depends_on_work_order_ids: deps.iter().map(|d| d.to_string()).collect(),
                setup_time_minutes: None,
            },
        )
    }

    #[test]
    fn test_valid_schedule_has_no_violations() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[]),
            wo("b", "wc-1", dt(10, 10, 0), dt(10, 12, 0), &["a"]),
        ];
        let centers = vec![center("wc-1")];
        assert!(validate_schedule(&orders, &centers).is_empty());
    }

    #[test]
    fn test_dependency_violation_strict() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 11, 0), &[]),
            wo("b", "wc-2", dt(10, 10, 0), dt(10, 12, 0), &["a"]),
        ];
        let centers = vec![center("wc-1"), center("wc-2")];
        let violations = validate_schedule(&orders, &centers);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DependencyViolation);
        assert_eq!(violations[0].work_order_ids, vec!["b", "a"]);
    }

    #[test]
    fn test_dependency_touching_is_legal() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[]),
            wo("b", "wc-2", dt(10, 10, 0), dt(10, 12, 0), &["a"]),
        ];
        let centers = vec![center("wc-1"), center("wc-2")];
        assert!(validate_schedule(&orders, &centers).is_empty());
    }

    #[test]
    fn test_work_center_conflict() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[]),
            wo("b", "wc-1", dt(10, 9, 0), dt(10, 11, 0), &[]),
        ];
        let centers = vec![center("wc-1")];
        let violations = validate_schedule(&orders, &centers);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WorkCenterConflict);
    }

    #[test]
    fn test_adjacent_orders_do_not_conflict() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[]),
            wo("b", "wc-1", dt(10, 10, 0), dt(10, 12, 0), &[]),
        ];
        let centers = vec![center("wc-1")];
        assert!(validate_schedule(&orders, &centers).is_empty());
    }

    #[test]
    fn test_unknown_work_center() {
        let orders = vec![wo("a", "wc-missing", dt(10, 8, 0), dt(10, 10, 0), &[])];
        let violations = validate_schedule(&orders, &[]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ShiftViolation);
        assert_eq!(violations[0].kind.as_str(), "SHIFT_VIOLATION");
    }

    #[test]
    fn test_shiftless_work_center() {
        let mut empty = center("wc-1");
        empty.data.shifts.clear();
        let orders = vec![wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[])];
        let violations = validate_schedule(&orders, &[empty]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ShiftViolation);
    }

    #[test]
    fn test_start_outside_shift() {
        let orders = vec![wo("a", "wc-1", dt(10, 6, 0), dt(10, 10, 0), &[])];
        let violations = validate_schedule(&orders, &[center("wc-1")]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ShiftViolation);
    }

    #[test]
    fn test_maintenance_conflict() {
        let mut wc = center("wc-1");
        wc.data
            .maintenance_windows
            .push(MaintenanceWindow::new(dt(10, 9, 0), dt(10, 11, 0)));
        let orders = vec![wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[])];
        let violations = validate_schedule(&orders, &[wc]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MaintenanceConflict);
        assert_eq!(violations[0].kind.as_str(), "MAINTENANCE_CONFLICT");
    }

    #[test]
    fn test_cycle_reported() {
        let orders = vec![
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 9, 0), &["b"]),
            wo("b", "wc-1", dt(10, 9, 0), dt(10, 10, 0), &["a"]),
        ];
        let violations = validate_schedule(&orders, &[center("wc-1")]);
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::CircularDependency));
    }

    #[test]
    fn test_multiple_violations_all_collected() {
        let mut wc = center("wc-1");
        wc.data
            .maintenance_windows
            .push(MaintenanceWindow::new(dt(10, 9, 0), dt(10, 10, 0)));
        let orders = vec![
            // Overlaps b on the same center and the maintenance window
            wo("a", "wc-1", dt(10, 8, 0), dt(10, 10, 0), &[]),
            wo("b", "wc-1", dt(10, 9, 0), dt(10, 11, 0), &[]),
            // Starts before its dependency ends
            wo("c", "wc-1", dt(10, 6, 0), dt(10, 7, 0), &["a"]),
        ];
        let violations = validate_schedule(&orders, &[wc]);
        assert!(violations.len() >= 4);
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::WorkCenterConflict));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::MaintenanceConflict));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::DependencyViolation));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::ShiftViolation));
    }
}
