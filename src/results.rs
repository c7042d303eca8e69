//! Per-run accumulation of task results.
//!
//! One playbook-level operation usually issues several controller requests.
//! [`Results`] keeps four index-aligned histories (diff, raw response,
//! classified result, metadata), tags every registration with a strictly
//! increasing sequence number, and OR-reduces per-call `changed`/`failed`
//! booleans into the aggregate the task reports at the end.

use crate::response::RequestResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

/// Metadata attached to each registered task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// The logical action being performed (e.g. "fabric_create")
    pub action: String,
    /// Whether the call ran under check mode
    pub check_mode: bool,
    /// The requested playbook state (merged, deleted, replaced, query)
    pub state: String,
    /// Position of this record in the run, starting at 1
    pub sequence_number: u64,
}

/// The collapsed output of a run, ready for task-level reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResult {
    /// True iff at least one registered call changed controller state
    pub changed: bool,
    /// True iff at least one registered call failed
    pub failed: bool,
    /// Per-call semantic diffs
    pub diff: Vec<Value>,
    /// Per-call raw response envelopes
    pub response: Vec<Value>,
    /// Per-call classified results
    pub result: Vec<Value>,
    /// Per-call metadata
    pub metadata: Vec<TaskMetadata>,
}

/// Accumulator for every controller call made within one task run.
///
/// Lives for the whole run: created at task start, fed once per request,
/// collapsed once at the end with [`build_final_result`](Results::build_final_result).
/// All four histories grow in lockstep and share index-aligned sequence
/// numbers.
#[derive(Debug, Clone, Default)]
pub struct Results {
    action: String,
    state: String,
    check_mode: bool,
    diff: Vec<Value>,
    response: Vec<Value>,
    result: Vec<Value>,
    metadata: Vec<TaskMetadata>,
    changed: bool,
    failed: bool,
    sequence: u64,
}

impl Results {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logical action tagged onto subsequent registrations.
    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = action.into();
    }

    /// Sets the playbook state tagged onto subsequent registrations.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    /// Sets the check-mode flag tagged onto subsequent registrations.
    pub fn set_check_mode(&mut self, check_mode: bool) {
        self.check_mode = check_mode;
    }

    /// Builder-style variant of [`set_action`](Results::set_action).
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.set_action(action);
        self
    }

    /// Builder-style variant of [`set_state`](Results::set_state).
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.set_state(state);
        self
    }

    /// Appends one call's outcome to the histories.
    ///
    /// `changed` for the record is derived here, not taken on faith:
    /// check-mode runs never change anything, pure reads (`action ==
    /// "query"`) never change anything, otherwise the classified
    /// `result.changed` decides, falling back to "the diff is non-empty"
    /// for verbs that carry no changed flag.
    ///
    /// Returns the sequence number assigned to the record.
    pub fn register_task_result(
        &mut self,
        diff: Value,
        response: Value,
        result: &RequestResult,
    ) -> u64 {
        self.sequence += 1;

        let changed = if self.check_mode || self.action == "query" {
            false
        } else {
            result.changed.unwrap_or_else(|| !value_is_empty(&diff))
        };
        self.changed |= changed;
        self.failed |= !result.success;

        trace!(
            sequence = self.sequence,
            action = %self.action,
            changed,
            failed = !result.success,
            "registered task result"
        );

        self.metadata.push(TaskMetadata {
            action: self.action.clone(),
            check_mode: self.check_mode,
            state: self.state.clone(),
            sequence_number: self.sequence,
        });
        self.diff.push(diff);
        self.response.push(response);
        self.result.push(result.to_value());

        self.sequence
    }

    /// True iff any registered call changed controller state.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// True iff any registered call failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Number of registered calls.
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// True when nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// The raw response envelopes registered so far.
    pub fn responses(&self) -> &[Value] {
        &self.response
    }

    /// The per-call metadata registered so far.
    pub fn metadata(&self) -> &[TaskMetadata] {
        &self.metadata
    }

    /// Collapses the histories into the final task-level report.
    pub fn build_final_result(&self) -> FinalResult {
        FinalResult {
            changed: self.changed,
            failed: self.failed,
            diff: self.diff.clone(),
            response: self.response.clone(),
            result: self.result.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// An empty diff means "nothing to change": null, `{}`, `[]`, or `""`.
fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
