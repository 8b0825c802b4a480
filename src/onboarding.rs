//! Tutor onboarding step state machine.
//!
//! Profile completion is tracked across four steps:
//! 1. basic profile, 2. identity document, 3. certificate, 4. teaching info.
//!
//! Step completion is inferred from which fields a request carries, matching
//! the platform's established behavior: submitting an identity number
//! completes step 2, adding a certificate completes step 3, and submitting
//! subjects/grades completes step 4. Completing the teaching-info step pins
//! `current_step` at 4 instead of advancing past the last step.

use serde_json::Value;

pub const STEP_BASIC_PROFILE: i32 = 1;
pub const STEP_IDENTITY: i32 = 2;
pub const STEP_CERTIFICATE: i32 = 3;
pub const STEP_TEACHING_INFO: i32 = 4;

const ALL_STEPS: [i32; 4] = [1, 2, 3, 4];

/// Mutable view of a tutor's onboarding progress, detached from the entity
/// so transitions can be unit-tested without a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub current_step: i32,
    pub completed_steps: Vec<i32>,
    pub is_profile_complete: bool,
}

impl Progress {
    /// Progress of a freshly created profile: step 1 done, step 2 next.
    #[must_use]
    pub fn after_step_one() -> Self {
        Self {
            current_step: STEP_IDENTITY,
            completed_steps: vec![STEP_BASIC_PROFILE],
            is_profile_complete: false,
        }
    }

    /// Rebuild progress from persisted columns.
    #[must_use]
    pub fn from_parts(current_step: i32, completed_steps: &Value, is_profile_complete: bool) -> Self {
        Self {
            current_step,
            completed_steps: steps_from_json(completed_steps),
            is_profile_complete,
        }
    }

    /// Mark `step` complete, with set semantics: re-completing a step is a
    /// no-op for the set but never an error. Returns `true` if this call
    /// turned the profile complete.
    pub fn complete(&mut self, step: i32) -> bool {
        if !self.completed_steps.contains(&step) {
            self.completed_steps.push(step);
            self.current_step = if step == STEP_TEACHING_INFO {
                STEP_TEACHING_INFO
            } else {
                step + 1
            };
        }

        let was_complete = self.is_profile_complete;
        self.is_profile_complete = ALL_STEPS
            .iter()
            .all(|s| self.completed_steps.contains(s));
        self.is_profile_complete && !was_complete
    }

    /// Serialize the completed-steps set back to its JSON column form.
    #[must_use]
    pub fn steps_json(&self) -> Value {
        Value::from(self.completed_steps.clone())
    }
}

/// Which step a profile update completes, based on field presence.
///
/// Teaching info takes precedence when a request carries both an identity
/// number and subjects/grades, matching the established behavior.
#[must_use]
pub const fn step_for_update(has_identity: bool, has_teaching_info: bool) -> Option<i32> {
    if has_teaching_info {
        Some(STEP_TEACHING_INFO)
    } else if has_identity {
        Some(STEP_IDENTITY)
    } else {
        None
    }
}

/// Decode a JSON array column into a step list, ignoring malformed entries.
#[must_use]
pub fn steps_from_json(value: &Value) -> Vec<i32> {
    value.as_array().map_or_else(Vec::new, |arr| {
        arr.iter()
            .filter_map(Value::as_i64)
            .filter_map(|n| i32::try_from(n).ok())
            .collect()
    })
}
