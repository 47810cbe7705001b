//! The post-booking progress checklist.
//!
//! The checklist is empty until a request is doubly accepted. It is then
//! seeded once with [`CHECKLIST_STEPS`], the first step already done.
//! After seeding only the `done` flags change.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STEP_BOOKED: &str = "Vendor booked";
pub const STEP_ARRIVED: &str = "Vendor arrived";
pub const STEP_DEPARTED: &str = "Vendor departed";

/// The fixed, ordered milestones of an engagement.
pub const CHECKLIST_STEPS: &[&str] = &[STEP_BOOKED, STEP_ARRIVED, STEP_DEPARTED];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub step: String,
    pub done: bool,
}

/// The checklist written at the moment of mutual acceptance.
pub fn initial_checklist() -> Vec<ProgressStep> {
    CHECKLIST_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| ProgressStep {
            step: (*step).to_string(),
            done: i == 0,
        })
        .collect()
}

/// Flip the `done` flag of the step named exactly `name`.
pub fn set_step(steps: &mut [ProgressStep], name: &str, done: bool) -> Result<(), CoreError> {
    let step = steps
        .iter_mut()
        .find(|s| s.step == name)
        .ok_or_else(|| CoreError::MissingKey {
            entity: "Progress step",
            key: name.to_string(),
        })?;
    step.done = done;
    Ok(())
}
