//! The reflow engine: rewrites work order start/end times after a
//! disruption so every hard constraint holds again.
//!
//! Orders are processed strictly in topological order. For each movable
//! order the engine computes the earliest start that satisfies dependency
//! completion, shift alignment, work-center availability and maintenance
//! avoidance, books the slot, and records what changed and why. When two
//! unrelated orders compete for the same slot, the one processed first
//! wins; the engine is greedy, not optimal.

use chrono::{DateTime, Duration, Utc};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::calendar::ShiftCalendar;
use crate::config::ReflowConfig;
use crate::graph::{DependencyGraph, GraphError};
use crate::models::{
    MaintenanceWindow, ReflowInput, ReflowResult, WorkCenterDoc, WorkOrderChange, WorkOrderDoc,
};
use crate::reflow::center_schedule::CenterSchedule;
use crate::reflow::metrics::{build_explanation, build_metrics};
use crate::reflow::validation::{validate_schedule, ConstraintViolation};
use crate::{log_changes, log_checks, log_debug};

/// Errors that abort a reflow call.
///
/// Callers treat a failed call as all-or-nothing: no partially mutated
/// schedule escapes.
#[derive(Error, Debug)]
pub enum ReflowError {
    #[error("Circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },
    #[error("Work order {work_order_id} depends on unknown work order {missing_id}")]
    DanglingDependency {
        work_order_id: String,
        missing_id: String,
    },
    #[error("Slot search for work order {work_order_id} exceeded {limit} iterations")]
    SafetyCapExceeded { work_order_id: String, limit: usize },
    #[error("Schedule validation failed with {} violation(s)", .violations.len())]
    ValidationFailed { violations: Vec<ConstraintViolation> },
}

impl ReflowError {
    /// Wire type tag for this error.
    ///
    /// A validation failure is tagged by its first violation so the caller
    /// sees a concrete constraint; every violation travels with the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::DanglingDependency { .. } => "DANGLING_DEPENDENCY",
            Self::SafetyCapExceeded { .. } => "SAFETY_CAP",
            // Never constructed empty: the engine only raises this when
            // validation reported at least one violation.
            Self::ValidationFailed { violations } => violations[0].kind.as_str(),
        }
    }

    /// Work order ids involved in this error.
    pub fn work_order_ids(&self) -> Vec<String> {
        match self {
            Self::CircularDependency { path } => path.clone(),
            Self::DanglingDependency {
                work_order_id,
                missing_id,
            } => vec![work_order_id.clone(), missing_id.clone()],
            Self::SafetyCapExceeded { work_order_id, .. } => vec![work_order_id.clone()],
            Self::ValidationFailed { violations } => {
                let mut ids: Vec<String> = Vec::new();
                for violation in violations {
                    for id in &violation.work_order_ids {
                        if !ids.contains(id) {
                            ids.push(id.clone());
                        }
                    }
                }
                ids
            }
        }
    }
}

impl From<GraphError> for ReflowError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::DanglingDependency {
                work_order_id,
                missing_id,
            } => ReflowError::DanglingDependency {
                work_order_id,
                missing_id,
            },
            GraphError::CircularDependency { path } => ReflowError::CircularDependency { path },
        }
    }
}

/// What finally determined a rescheduled order's new start.
#[derive(Clone, Copy, Debug)]
enum Cause {
    /// A dependency finishing later than the order's old start.
    Dependency(usize),
    /// Another work order holding the center.
    Occupant(usize),
    /// A maintenance window on the center.
    Maintenance,
    /// The old start fell outside any shift window.
    ShiftAlignment,
}

/// One reflow call's working state: cloned orders, center lookups, config.
pub struct ReflowEngine {
    work_orders: Vec<WorkOrderDoc>,
    work_centers: Vec<WorkCenterDoc>,
    center_index: FxHashMap<String, usize>,
    calendars: FxHashMap<String, ShiftCalendar>,
    config: ReflowConfig,
}

impl ReflowEngine {
    /// Clones the input; the caller's documents are never mutated.
    pub fn new(input: &ReflowInput, config: ReflowConfig) -> Self {
        let center_index = input
            .work_centers
            .iter()
            .enumerate()
            .map(|(i, wc)| (wc.doc_id.clone(), i))
            .collect();
        let calendars = input
            .work_centers
            .iter()
            .map(|wc| (wc.doc_id.clone(), ShiftCalendar::new(&wc.data.shifts)))
            .collect();
        Self {
            work_orders: input.work_orders.clone(),
            work_centers: input.work_centers.clone(),
            center_index,
            calendars,
            config,
        }
    }

    /// Runs the full reflow: order, place, validate, summarize.
    pub fn run(mut self) -> Result<ReflowResult, ReflowError> {
        let graph = DependencyGraph::build(&self.work_orders)?;
        if let Some(path) = graph.detect_cycle() {
            return Err(ReflowError::CircularDependency { path });
        }
        let order = graph.toposort()?;

        let mut schedules: FxHashMap<String, CenterSchedule> = self
            .work_centers
            .iter()
            .map(|wc| (wc.doc_id.clone(), CenterSchedule::new()))
            .collect();

        // Immovable maintenance orders claim their intervals up front so
        // every movable order flows around them.
        for (idx, wo) in self.work_orders.iter().enumerate() {
            if wo.data.is_maintenance {
                if let Some(schedule) = schedules.get_mut(&wo.data.work_center_id) {
                    schedule.book(idx, wo.data.start_date, wo.data.end_date);
                }
            }
        }

        let verbosity = self.config.verbosity;
        let mut changes: Vec<WorkOrderChange> = Vec::new();
        for idx in order {
            if self.work_orders[idx].data.is_maintenance {
                log_debug!(
                    verbosity,
                    "  Skipping maintenance work order {}",
                    self.work_orders[idx].doc_id
                );
                continue;
            }

            let wc_id = self.work_orders[idx].data.work_center_id.clone();
            let Some(&center_pos) = self.center_index.get(&wc_id) else {
                // Left untouched; validation reports the unknown center.
                log_checks!(
                    verbosity,
                    "  Work order {} references unknown work center {}",
                    self.work_orders[idx].doc_id,
                    wc_id
                );
                continue;
            };
            let Some(calendar) = self.calendars.get(&wc_id) else {
                continue;
            };
            if !calendar.has_shifts() {
                log_checks!(
                    verbosity,
                    "  Work center {} has no shifts; leaving {} in place",
                    wc_id,
                    self.work_orders[idx].doc_id
                );
                continue;
            }
            let Some(schedule) = schedules.get(&wc_id) else {
                continue;
            };
            let windows = &self.work_centers[center_pos].data.maintenance_windows;

            let original_start = self.work_orders[idx].data.start_date;
            let original_end = self.work_orders[idx].data.end_date;
            let duration = self.work_orders[idx].data.duration_minutes;

            let (new_start, cause) =
                self.earliest_start(idx, graph.parents_of(idx), calendar, schedule, windows)?;

            if new_start == original_start {
                // Unchanged orders keep their booked interval so later
                // orders still flow around them.
                if let Some(schedule) = schedules.get_mut(&wc_id) {
                    schedule.book(idx, original_start, original_end);
                }
                continue;
            }

            let new_end = calendar
                .end_after_working(new_start, duration, self.config.max_shift_walk_iterations)
                .ok_or_else(|| ReflowError::SafetyCapExceeded {
                    work_order_id: self.work_orders[idx].doc_id.clone(),
                    limit: self.config.max_shift_walk_iterations,
                })?;
            let reason = self.describe_cause(cause);
            let delay_minutes = (new_end - original_end).num_minutes();

            log_changes!(
                verbosity,
                "  Rescheduled {}: {} -> {} ({})",
                self.work_orders[idx].doc_id,
                original_start,
                new_start,
                reason
            );

            changes.push(WorkOrderChange {
                work_order_id: self.work_orders[idx].doc_id.clone(),
                work_order_number: self.work_orders[idx].data.work_order_number.clone(),
                original_start_date: original_start,
                original_end_date: original_end,
                new_start_date: new_start,
                new_end_date: new_end,
                delay_minutes,
                reason,
            });

            let data = &mut self.work_orders[idx].data;
            data.start_date = new_start;
            data.end_date = new_end;
            if let Some(schedule) = schedules.get_mut(&wc_id) {
                schedule.book(idx, new_start, new_end);
            }
        }

        let violations = validate_schedule(&self.work_orders, &self.work_centers);
        if !violations.is_empty() {
            return Err(ReflowError::ValidationFailed { violations });
        }

        let metrics = build_metrics(&changes, &self.work_orders, &self.work_centers);
        let explanation = build_explanation(&changes, &metrics);
        Ok(ReflowResult {
            updated_work_orders: self.work_orders,
            changes,
            explanation,
            metrics,
        })
    }

    /// Earliest valid start for one work order against the current state.
    ///
    /// Starts from the order's own start, floors it at the latest dependency
    /// end (dependencies already carry their reflowed times), then searches
    /// forward: align onto a shift, compute the shift-aware end, and either
    /// take the slot or jump to the earliest release among the blockers.
    fn earliest_start(
        &self,
        idx: usize,
        parents: &[usize],
        calendar: &ShiftCalendar,
        schedule: &CenterSchedule,
        windows: &[MaintenanceWindow],
    ) -> Result<(DateTime<Utc>, Option<Cause>), ReflowError> {
        let verbosity = self.config.verbosity;
        let data = &self.work_orders[idx].data;
        let mut candidate = data.start_date;
        let mut cause: Option<Cause> = None;

        for &parent in parents {
            let parent_end = self.work_orders[parent].data.end_date;
            if parent_end > candidate {
                candidate = parent_end;
                cause = Some(Cause::Dependency(parent));
            }
        }

        for _ in 0..self.config.max_slot_search_iterations {
            let aligned = calendar
                .align_to_shift(candidate, self.config.max_shift_scan_days)
                .ok_or_else(|| self.safety_cap(idx, self.config.max_shift_scan_days))?;
            if aligned != candidate {
                log_debug!(
                    verbosity,
                    "    Aligned candidate for {} from {} to {}",
                    self.work_orders[idx].doc_id,
                    candidate,
                    aligned
                );
                if cause.is_none() {
                    cause = Some(Cause::ShiftAlignment);
                }
            }

            let end = calendar
                .end_after_working(
                    aligned,
                    data.duration_minutes,
                    self.config.max_shift_walk_iterations,
                )
                .ok_or_else(|| self.safety_cap(idx, self.config.max_shift_walk_iterations))?;

            let busy = schedule.earliest_release(aligned, end);
            let maintenance = windows
                .iter()
                .filter(|w| crate::calendar::overlaps(aligned, end, w.start, w.end))
                .map(|w| w.end)
                .min();

            let next = match (busy, maintenance) {
                (None, None) => return Ok((aligned, cause)),
                (Some(booking), None) => {
                    cause = Some(Cause::Occupant(booking.work_order));
                    booking.end
                }
                (None, Some(window_end)) => {
                    cause = Some(Cause::Maintenance);
                    window_end
                }
                (Some(booking), Some(window_end)) => {
                    if booking.end <= window_end {
                        cause = Some(Cause::Occupant(booking.work_order));
                        booking.end
                    } else {
                        cause = Some(Cause::Maintenance);
                        window_end
                    }
                }
            };

            log_checks!(
                verbosity,
                "    Slot {} .. {} blocked for {}; retrying at {}",
                aligned,
                end,
                self.work_orders[idx].doc_id,
                next
            );

            // A blocker's release is always past the candidate; the hour
            // bump only fires if that ever stops holding.
            candidate = if next > aligned {
                next
            } else {
                aligned + Duration::hours(1)
            };
        }

        Err(self.safety_cap(idx, self.config.max_slot_search_iterations))
    }

    fn safety_cap(&self, idx: usize, limit: usize) -> ReflowError {
        ReflowError::SafetyCapExceeded {
            work_order_id: self.work_orders[idx].doc_id.clone(),
            limit,
        }
    }

    fn describe_cause(&self, cause: Option<Cause>) -> String {
        match cause {
            Some(Cause::Dependency(parent)) => format!(
                "Waiting for dependency {} to complete",
                self.work_orders[parent].data.work_order_number
            ),
            Some(Cause::Occupant(holder)) => format!(
                "Work center occupied by {}",
                self.work_orders[holder].data.work_order_number
            ),
            Some(Cause::Maintenance) => "Work center maintenance window".to_string(),
            Some(Cause::ShiftAlignment) => "Moved to the next shift window".to_string(),
            None => "Rescheduled".to_string(),
        }
    }
}
