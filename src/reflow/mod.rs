//! Reflow module: greedy slot assignment, constraint validation, metrics.

mod center_schedule;
mod engine;
mod metrics;
mod validation;

pub use center_schedule::{Booking, CenterSchedule};
pub use engine::{ReflowEngine, ReflowError};
pub use validation::{validate_schedule, ConstraintViolation, ViolationKind};

use crate::config::ReflowConfig;
use crate::models::{ReflowInput, ReflowResult};

/// Reflows a schedule with the default configuration.
pub fn reflow(input: &ReflowInput) -> Result<ReflowResult, ReflowError> {
    reflow_with_config(input, ReflowConfig::default())
}

/// Reflows a schedule with explicit safety caps and verbosity.
pub fn reflow_with_config(
    input: &ReflowInput,
    config: ReflowConfig,
) -> Result<ReflowResult, ReflowError> {
    ReflowEngine::new(input, config).run()
}
