//! Switch ISSU state as reported by the controller.
//!
//! The image-management endpoint returns one row per switch with the staged /
//! upgrade / validation status of the running image workflow.
//! [`SwitchIssuDetails`] caches a snapshot of those rows and answers "does
//! this switch still have actions in progress?", keyed by serial number, IP
//! address, or device name. [`WaitForControllerDone`](crate::wait_for::WaitForControllerDone)
//! polls this view until a workflow settles.

use crate::error::{Error, Result};
use crate::rest_send::RestSend;
use crate::sender::{Sender, Verb};
use crate::wait_for::ControllerView;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Image-management ISSU status endpoint.
pub const ISSU_PATH: &str = "/appcenter/cisco/ndfc/api/v1/imagemanagement/rest/packagemgnt/issu";

/// Workflow fields that signal an action is still running.
const ACTION_FIELDS: [&str; 3] = ["imageStaged", "upgrade", "validated"];

/// How switches are identified when filtering the ISSU view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// Match on the switch serial number
    SerialNumber,
    /// Match on the switch management IP address
    IpAddress,
    /// Match on the switch device name
    DeviceName,
}

impl FilterKey {
    /// The controller response field this filter matches against.
    pub fn response_field(self) -> &'static str {
        match self {
            FilterKey::SerialNumber => "serialNumber",
            FilterKey::IpAddress => "ipAddress",
            FilterKey::DeviceName => "deviceName",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.response_field())
    }
}

/// Cached snapshot of the per-switch ISSU rows.
#[derive(Debug, Clone, Default)]
pub struct SwitchIssuDetails {
    switches: Vec<Value>,
}

impl SwitchIssuDetails {
    /// Creates an empty view; call [`refresh`](SwitchIssuDetails::refresh)
    /// before querying it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a view from already-fetched rows. Test seam.
    pub fn from_rows(switches: Vec<Value>) -> Self {
        Self { switches }
    }

    /// Re-fetches the ISSU rows from the controller.
    ///
    /// Reads must happen even when the surrounding task runs under check
    /// mode, so the rest_send settings are saved, forced to
    /// `check_mode = false` with a one-second budget, and restored
    /// afterwards.
    pub fn refresh<S: Sender>(&mut self, rest_send: &mut RestSend<S>) -> Result<()> {
        rest_send.save_settings()?;
        rest_send.set_check_mode(false);
        rest_send.set_timeout(Duration::from_secs(1));
        let outcome = rest_send.commit(Verb::Get, ISSU_PATH, None);
        rest_send.restore_settings()?;

        let result = outcome?;
        if !result.success {
            let response = rest_send.response_current();
            let return_code = response
                .get("RETURN_CODE")
                .and_then(Value::as_i64)
                .unwrap_or(-1);
            let message = response
                .get("MESSAGE")
                .and_then(Value::as_str)
                .unwrap_or("unknown controller error");
            return Err(Error::controller_response(
                Verb::Get,
                ISSU_PATH,
                return_code,
                message,
            ));
        }

        self.switches = rest_send
            .response_current()
            .get("DATA")
            .and_then(|data| data.get("lastOperDataObject"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(switches = self.switches.len(), "refreshed ISSU details");
        Ok(())
    }

    /// The row matching `key` under the given filter, if any.
    pub fn filtered(&self, filter: FilterKey, key: &str) -> Option<&Value> {
        let field = filter.response_field();
        self.switches
            .iter()
            .find(|row| row.get(field).and_then(Value::as_str) == Some(key))
    }

    /// True when any workflow field of the matching switch is `In-Progress`.
    ///
    /// # Errors
    ///
    /// `SwitchNotFound` when no row matches `key`.
    pub fn actions_in_progress(&self, filter: FilterKey, key: &str) -> Result<bool> {
        let row = self.filtered(filter, key).ok_or_else(|| Error::SwitchNotFound {
            filter: filter.response_field(),
            key: key.to_string(),
        })?;
        Ok(ACTION_FIELDS
            .iter()
            .any(|field| row.get(*field).and_then(Value::as_str) == Some("In-Progress")))
    }
}

impl<S: Sender> ControllerView<S> for SwitchIssuDetails {
    fn refresh(&mut self, rest_send: &mut RestSend<S>) -> Result<()> {
        SwitchIssuDetails::refresh(self, rest_send)
    }

    fn in_progress(&self, filter: FilterKey, key: &str) -> Result<bool> {
        self.actions_in_progress(filter, key)
    }
}
