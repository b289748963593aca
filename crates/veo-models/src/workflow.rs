//! Workflow step log models.
//!
//! A workflow executes eagerly; the step log is a parallel record kept for
//! serialization and diagnostics, append-only during construction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Action performed by a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Remote generation call
    Generate,
    /// Register an externally supplied artifact
    AddMedia,
    /// Concatenate accumulated artifacts
    Stitch,
    /// Finalize and copy the current artifact
    Save,
    /// Generate a transition clip between the last two artifacts
    GenerateTransition,
}

impl StepAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::Generate => "generate",
            StepAction::AddMedia => "add_media",
            StepAction::Stitch => "stitch",
            StepAction::Save => "save",
            StepAction::GenerateTransition => "generate_transition",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowStep {
    /// What the step did
    pub action: StepAction,
    /// Arbitrary step parameters
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl WorkflowStep {
    pub fn new(action: StepAction) -> Self {
        Self {
            action,
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Serializable record of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowRecord {
    /// Workflow ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Ordered step log
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step to the log.
    pub fn push(&mut self, step: WorkflowStep) {
        self.steps.push(step);
    }

    /// Flat JSON record for serialization.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "steps": self.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_log_round_trip() {
        let mut record = WorkflowRecord::new("demo");
        record.push(WorkflowStep::new(StepAction::Generate).with_param("prompt", "a dog"));
        record.push(WorkflowStep::new(StepAction::AddMedia).with_param("path", "clip.mp4"));
        record.push(WorkflowStep::new(StepAction::Stitch).with_param("overlap", 1.0));

        let value = record.to_value();
        let parsed: WorkflowRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.steps.len(), 3);
        assert_eq!(parsed.steps[0].action, StepAction::Generate);
        assert_eq!(parsed.steps[2].action, StepAction::Stitch);
        assert_eq!(parsed.steps[2].params["overlap"], 1.0);
    }
}
