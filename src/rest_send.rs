//! Per-operation request orchestration.
//!
//! [`RestSend`] wraps one logical controller operation: it dispatches through
//! the injected [`Sender`], classifies the envelope, applies check-mode
//! suppression and the poll-until-success budget, and registers every
//! outcome with the embedded [`Results`] accumulator.
//!
//! Mutating calls are never retried on failure; callers drop the timeout to
//! one second around POST/PUT/DELETE so a rejected change is reported, not
//! re-sent. The only looping that happens here is idempotent re-reading.

use crate::error::{Error, Result};
use crate::response::{RequestResult, ResponseHandler};
use crate::results::Results;
use crate::sender::{Sender, Verb};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Tunables for one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Dry-run: report intended changes without touching the controller
    pub check_mode: bool,
    /// Total budget for poll-until-success on unsuccessful responses
    pub timeout: Duration,
    /// Sleep between polling attempts
    pub send_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_mode: false,
            timeout: Duration::from_secs(300),
            send_interval: Duration::from_secs(5),
        }
    }
}

/// Orchestrates controller requests for one task run.
///
/// Owns the transport and the [`Results`] accumulator so that every call,
/// including check-mode calls that never reach the wire, leaves a record.
pub struct RestSend<S: Sender> {
    sender: S,
    settings: Settings,
    saved: Option<Settings>,
    results: Results,
    response_current: Value,
    result_current: Option<RequestResult>,
}

impl<S: Sender> RestSend<S> {
    /// Creates an orchestrator over the given transport with default settings.
    pub fn new(sender: S) -> Self {
        Self {
            sender,
            settings: Settings::default(),
            saved: None,
            results: Results::new(),
            response_current: Value::Null,
            result_current: None,
        }
    }

    /// Builder-style check-mode toggle.
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.settings.check_mode = check_mode;
        self
    }

    /// Builder-style timeout override.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Builder-style send-interval override.
    pub fn with_send_interval(mut self, send_interval: Duration) -> Self {
        self.settings.send_interval = send_interval;
        self
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Overrides the check-mode flag.
    pub fn set_check_mode(&mut self, check_mode: bool) {
        self.settings.check_mode = check_mode;
    }

    /// Overrides the polling budget.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.settings.timeout = timeout;
    }

    /// Overrides the sleep between polling attempts.
    pub fn set_send_interval(&mut self, send_interval: Duration) {
        self.settings.send_interval = send_interval;
    }

    /// Snapshots the current settings so a sub-operation can override them.
    ///
    /// The slot is single-depth and enforced: saving again before a restore
    /// fails rather than silently dropping the outer snapshot.
    pub fn save_settings(&mut self) -> Result<()> {
        if self.saved.is_some() {
            return Err(Error::SettingsAlreadySaved);
        }
        self.saved = Some(self.settings);
        Ok(())
    }

    /// Restores the settings saved by [`save_settings`](RestSend::save_settings).
    pub fn restore_settings(&mut self) -> Result<()> {
        self.settings = self.saved.take().ok_or(Error::NoSavedSettings)?;
        Ok(())
    }

    /// The accumulator fed by every commit.
    pub fn results(&self) -> &Results {
        &self.results
    }

    /// Mutable access for callers that tag action/state between commits.
    pub fn results_mut(&mut self) -> &mut Results {
        &mut self.results
    }

    /// Consumes the orchestrator, yielding the accumulated results.
    pub fn into_results(self) -> Results {
        self.results
    }

    /// The raw envelope from the most recent commit.
    pub fn response_current(&self) -> &Value {
        &self.response_current
    }

    /// The classified result from the most recent commit, if any.
    pub fn result_current(&self) -> Option<RequestResult> {
        self.result_current
    }

    /// Issues one logical operation and registers its outcome.
    ///
    /// Under check mode the transport is never touched; a synthetic
    /// `{RETURN_CODE: 200, MESSAGE: "OK", CHECK_MODE: true}` envelope is
    /// classified in its place so the run still records what would have
    /// happened. In normal mode unsuccessful responses are re-polled every
    /// `send_interval` until the `timeout` budget runs out; the last
    /// response is recorded either way and the classified result returned
    /// for the caller to inspect.
    ///
    /// # Errors
    ///
    /// `NotConfigured` when `path` is empty; `InvalidPayload` when a payload
    /// is present but not a JSON object; transport and envelope-contract
    /// errors propagate from the layers below.
    pub fn commit(&mut self, verb: Verb, path: &str, payload: Option<Value>) -> Result<RequestResult> {
        if path.is_empty() {
            return Err(Error::NotConfigured(format!(
                "path must be set before commit ({verb})"
            )));
        }
        if let Some(ref body) = payload {
            if !body.is_object() {
                return Err(Error::InvalidPayload {
                    verb,
                    path: path.to_string(),
                });
            }
        }

        let (response, result) = if self.settings.check_mode {
            self.commit_check_mode(verb, payload.as_ref())?
        } else {
            self.commit_normal_mode(verb, path, payload.as_ref())?
        };

        // Mutating payloads double as the semantic diff; reads diff nothing.
        let diff = match (verb.is_mutating(), payload) {
            (true, Some(body)) => body,
            _ => json!({}),
        };

        self.results.set_check_mode(self.settings.check_mode);
        self.results
            .register_task_result(diff, response.clone(), &result);

        self.response_current = response;
        self.result_current = Some(result);
        Ok(result)
    }

    fn commit_check_mode(
        &self,
        verb: Verb,
        payload: Option<&Value>,
    ) -> Result<(Value, RequestResult)> {
        debug!(%verb, "check mode: synthesizing controller response");
        let response = json!({
            "RETURN_CODE": 200,
            "MESSAGE": "OK",
            "CHECK_MODE": true,
            "DATA": payload.cloned().unwrap_or_else(|| json!({})),
        });
        let result = ResponseHandler::classify(&response, verb)?;
        Ok((response, result))
    }

    fn commit_normal_mode(
        &mut self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<(Value, RequestResult)> {
        let mut remaining = self.settings.timeout;
        loop {
            let response = self.sender.send(verb, path, payload)?;
            let result = ResponseHandler::classify(&response, verb)?;
            if result.success {
                return Ok((response, result));
            }

            remaining = remaining.saturating_sub(self.settings.send_interval);
            if remaining.is_zero() {
                debug!(%verb, path, "polling budget exhausted, recording last response");
                return Ok((response, result));
            }

            debug!(
                %verb,
                path,
                remaining_secs = remaining.as_secs(),
                "unsuccessful response, polling again"
            );
            thread::sleep(self.settings.send_interval);
        }
    }
}
