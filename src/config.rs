//! Configuration for the reflow engine.

/// Tuning knobs and safety caps for a reflow run.
///
/// The caps guard against misconfigured inputs (a work center whose shifts
/// can never absorb a duration, a slot search that never converges). When a
/// cap is hit the engine fails with a diagnostic naming the work order
/// instead of looping.
#[derive(Clone, Debug)]
pub struct ReflowConfig {
    /// Maximum candidate slots tried per work order before giving up.
    pub max_slot_search_iterations: usize,
    /// Maximum day-steps when accumulating working minutes across shifts.
    pub max_shift_walk_iterations: usize,
    /// Maximum days scanned when looking for the next shift start.
    pub max_shift_scan_days: usize,
    /// Logging verbosity (0 = silent, see `logging`).
    pub verbosity: u8,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            max_slot_search_iterations: 1000,
            max_shift_walk_iterations: 1000,
            max_shift_scan_days: 100,
            verbosity: 0,
        }
    }
}
