//! Core data types for the reflow engine.
//!
//! Wire-facing structs mirror the JSON document shapes consumed and produced
//! by the scheduling service: every document is a `{ docId, docType, data }`
//! envelope, and field names are camelCase on the wire. Instants are UTC
//! (ISO 8601 with `Z` or an explicit offset on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A weekly-recurring shift window on a work center.
///
/// `day_of_week` uses Sunday = 0 through Saturday = 6. Hours are whole UTC
/// hours with `start_hour < end_hour`; a day without a shift entry is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub day_of_week: u8,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Shift {
    pub fn new(day_of_week: u8, start_hour: u8, end_hour: u8) -> Self {
        Self {
            day_of_week,
            start_hour,
            end_hour,
        }
    }
}

/// An immovable `[start, end)` interval during which a work center is down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MaintenanceWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A production step executed on one work center.
///
/// `duration_minutes` counts working minutes only; time outside shift windows
/// does not count. When `is_maintenance` is set the order is immovable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub work_order_number: String,
    pub manufacturing_order_id: String,
    pub work_center_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default)]
    pub is_maintenance: bool,
    #[serde(default)]
    pub depends_on_work_order_ids: Vec<String>,
    /// Carried through untouched; the engine does not model setup times.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_time_minutes: Option<i64>,
}

/// A single-threaded machine or station with a weekly shift schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenter {
    pub name: String,
    #[serde(default)]
    pub shifts: Vec<Shift>,
    #[serde(default)]
    pub maintenance_windows: Vec<MaintenanceWindow>,
}

/// A customer-facing production request. Read-only context for the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrder {
    pub manufacturing_order_number: String,
    pub item_id: String,
    pub quantity: f64,
    pub due_date: DateTime<Utc>,
}

/// Document envelope for a work order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderDoc {
    pub doc_id: String,
    pub doc_type: String,
    pub data: WorkOrder,
}

impl WorkOrderDoc {
    pub fn new(doc_id: impl Into<String>, data: WorkOrder) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_type: "workOrder".to_string(),
            data,
        }
    }
}

/// Document envelope for a work center.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenterDoc {
    pub doc_id: String,
    pub doc_type: String,
    pub data: WorkCenter,
}

impl WorkCenterDoc {
    pub fn new(doc_id: impl Into<String>, data: WorkCenter) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_type: "workCenter".to_string(),
            data,
        }
    }
}

/// Document envelope for a manufacturing order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrderDoc {
    pub doc_id: String,
    pub doc_type: String,
    pub data: ManufacturingOrder,
}

impl ManufacturingOrderDoc {
    pub fn new(doc_id: impl Into<String>, data: ManufacturingOrder) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_type: "manufacturingOrder".to_string(),
            data,
        }
    }
}

/// Everything a reflow call consumes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowInput {
    #[serde(default)]
    pub work_orders: Vec<WorkOrderDoc>,
    #[serde(default)]
    pub work_centers: Vec<WorkCenterDoc>,
    #[serde(default)]
    pub manufacturing_orders: Vec<ManufacturingOrderDoc>,
}

/// Records one reschedule: where a work order was and where it landed.
///
/// `delay_minutes` is signed (new end minus original end); a change can be
/// zero or negative when the order shifted without finishing later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderChange {
    pub work_order_id: String,
    pub work_order_number: String,
    pub original_start_date: DateTime<Utc>,
    pub original_end_date: DateTime<Utc>,
    pub new_start_date: DateTime<Utc>,
    pub new_end_date: DateTime<Utc>,
    pub delay_minutes: i64,
    pub reason: String,
}

impl WorkOrderChange {
    /// Whether this change pushed the order's completion later.
    pub fn is_delay(&self) -> bool {
        self.delay_minutes > 0
    }
}

/// Aggregate metrics over a successful reflow.
///
/// `total_delay_minutes` sums positive delays only; changes that finish
/// earlier count toward `work_orders_affected` but not the total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowMetrics {
    pub total_delay_minutes: i64,
    pub work_orders_affected: usize,
    /// Percent of weekly shift minutes consumed per work center, two decimals.
    pub work_center_utilization: BTreeMap<String, f64>,
}

/// The product of a reflow call: updated orders, what moved, and why.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflowResult {
    pub updated_work_orders: Vec<WorkOrderDoc>,
    pub changes: Vec<WorkOrderChange>,
    pub explanation: String,
    pub metrics: ReflowMetrics,
}
