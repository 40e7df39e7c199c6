//! Shift-aware production schedule reflow.
//!
//! Given work orders, work centers, and manufacturing orders, rewrites work
//! order start/end times after a disruption so that every hard constraint
//! (dependency completion, work-center exclusivity, shift containment,
//! maintenance avoidance) holds again, and reports what changed and why.
//!
//! The engine is single-threaded and synchronous; a call owns its state
//! exclusively, inputs are cloned before mutation, and independent calls can
//! run in parallel without coordination. The algorithm is greedy, not
//! optimal: orders are placed in topological order and the first taker of a
//! contested slot wins.
//!
//! Entry point: [`reflow`] (or [`reflow_with_config`] for explicit safety
//! caps and verbosity).

pub mod calendar;
pub mod config;
pub mod graph;
pub mod logging;
pub mod models;
pub mod reflow;

pub use config::ReflowConfig;
pub use models::{
    ManufacturingOrder, ManufacturingOrderDoc, MaintenanceWindow, ReflowInput, ReflowMetrics,
    ReflowResult, Shift, WorkCenter, WorkCenterDoc, WorkOrder, WorkOrderChange, WorkOrderDoc,
};
pub use reflow::{
    reflow, reflow_with_config, ConstraintViolation, ReflowEngine, ReflowError, ViolationKind,
    validate_schedule,
};
